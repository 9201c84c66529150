//! Core library for the `munchies` service.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Provider abstractions (travel time, restaurants, forecast) and their HTTP clients
//! - Shared domain models (requests, responses) and the error taxonomy
//! - The aggregator that composes the three providers into one response
//!
//! It is used by `munchies-cli`, but can also be embedded in other binaries or services.

pub mod aggregator;
pub mod config;
pub mod error;
pub mod model;
pub mod provider;

pub use aggregator::MunchieAggregator;
pub use config::{Config, ProviderConfig, ServerConfig};
pub use error::MunchieError;
pub use model::{
    ArrivalTime, MunchieAttributes, MunchieEnvelope, MunchieRequest, MunchieResponse,
    RestaurantInfo, TravelTime,
};
pub use provider::{ForecastProvider, ProviderId, RestaurantFinder, TravelTimeProvider};
