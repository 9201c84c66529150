use crate::{
    Config,
    error::MunchieError,
    model::{ArrivalTime, RestaurantInfo, TravelTime},
    provider::{google::GoogleDirectionsProvider, openweather::OpenWeatherProvider, yelp::YelpProvider},
};
use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use std::{convert::TryFrom, fmt::Debug, time::Duration};

pub mod google;
pub mod openweather;
pub mod yelp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    Google,
    Yelp,
    OpenWeather,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Google => "google",
            ProviderId::Yelp => "yelp",
            ProviderId::OpenWeather => "openweather",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::Google, ProviderId::Yelp, ProviderId::OpenWeather]
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "google" => Ok(ProviderId::Google),
            "yelp" => Ok(ProviderId::Yelp),
            "openweather" => Ok(ProviderId::OpenWeather),
            _ => Err(anyhow::anyhow!(
                "Unknown provider '{value}'. Supported providers: google, yelp, openweather."
            )),
        }
    }
}

/// Estimates driving time between two free-text locations.
#[async_trait]
pub trait TravelTimeProvider: Send + Sync + Debug {
    async fn travel_time(&self, start: &str, end: &str) -> Result<TravelTime, MunchieError>;
}

/// Finds one establishment serving `cuisine` that is open at `open_at`.
#[async_trait]
pub trait RestaurantFinder: Send + Sync + Debug {
    async fn find_open(
        &self,
        location: &str,
        cuisine: &str,
        open_at: ArrivalTime,
    ) -> Result<RestaurantInfo, MunchieError>;
}

/// Describes the expected weather at a location and time.
#[async_trait]
pub trait ForecastProvider: Send + Sync + Debug {
    async fn forecast_at(&self, location: &str, at: ArrivalTime) -> Result<String, MunchieError>;
}

/// Per-call timeout applied to every outbound provider request.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

pub(crate) fn http_client() -> anyhow::Result<Client> {
    Client::builder()
        .timeout(DEFAULT_HTTP_TIMEOUT)
        .build()
        .context("Failed to build HTTP client")
}

/// API key and optional base URL override for `id`, or a hint on how to configure it.
fn credentials(id: ProviderId, config: &Config) -> anyhow::Result<(String, Option<String>)> {
    let provider = config.provider_config(id).ok_or_else(|| {
        anyhow::anyhow!(
            "No API key configured for provider '{id}'.\n\
                 Hint: run `munchies configure {id}` and enter your API key."
        )
    })?;

    Ok((provider.api_key.clone(), provider.base_url.clone()))
}

pub fn travel_time_provider_from_config(
    config: &Config,
) -> anyhow::Result<Box<dyn TravelTimeProvider>> {
    let (api_key, base_url) = credentials(ProviderId::Google, config)?;
    let provider = match base_url {
        Some(url) => GoogleDirectionsProvider::with_base_url(api_key, url)?,
        None => GoogleDirectionsProvider::new(api_key)?,
    };
    Ok(Box::new(provider))
}

pub fn restaurant_finder_from_config(config: &Config) -> anyhow::Result<Box<dyn RestaurantFinder>> {
    let (api_key, base_url) = credentials(ProviderId::Yelp, config)?;
    let provider = match base_url {
        Some(url) => YelpProvider::with_base_url(api_key, url)?,
        None => YelpProvider::new(api_key)?,
    };
    Ok(Box::new(provider))
}

pub fn forecast_provider_from_config(config: &Config) -> anyhow::Result<Box<dyn ForecastProvider>> {
    let (api_key, base_url) = credentials(ProviderId::OpenWeather, config)?;
    let provider = match base_url {
        Some(url) => OpenWeatherProvider::with_base_url(api_key, url)?,
        None => OpenWeatherProvider::new(api_key)?,
    };
    Ok(Box::new(provider))
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}
