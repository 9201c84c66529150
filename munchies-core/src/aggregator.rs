//! The munchies pipeline: travel time, then restaurant and forecast side by side.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info};

use crate::{
    Config,
    error::MunchieError,
    model::{ArrivalTime, MunchieRequest, MunchieResponse},
    provider::{
        ForecastProvider, ProviderId, RestaurantFinder, TravelTimeProvider,
        forecast_provider_from_config, restaurant_finder_from_config,
        travel_time_provider_from_config,
    },
};

#[derive(Debug, Clone)]
pub struct MunchieAggregator {
    travel: Arc<dyn TravelTimeProvider>,
    restaurants: Arc<dyn RestaurantFinder>,
    forecasts: Arc<dyn ForecastProvider>,
}

impl MunchieAggregator {
    pub fn new(
        travel: Arc<dyn TravelTimeProvider>,
        restaurants: Arc<dyn RestaurantFinder>,
        forecasts: Arc<dyn ForecastProvider>,
    ) -> Self {
        Self { travel, restaurants, forecasts }
    }

    /// Wire the HTTP providers using the credentials in `config`.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self::new(
            Arc::from(travel_time_provider_from_config(config)?),
            Arc::from(restaurant_finder_from_config(config)?),
            Arc::from(forecast_provider_from_config(config)?),
        ))
    }

    pub async fn handle(&self, request: &MunchieRequest) -> Result<MunchieResponse, MunchieError> {
        self.handle_at(request, Utc::now()).await
    }

    /// Run the pipeline as if departing at `now`.
    pub async fn handle_at(
        &self,
        request: &MunchieRequest,
        now: DateTime<Utc>,
    ) -> Result<MunchieResponse, MunchieError> {
        let travel_time = self.travel.travel_time(&request.start, &request.end).await?;

        let arrival = ArrivalTime::after(now, &travel_time).ok_or_else(|| {
            MunchieError::no_result(
                ProviderId::Google,
                format!("travel duration of {}s is out of range", travel_time.value),
            )
        })?;

        debug!(
            end = %request.end,
            travel_secs = travel_time.value,
            arrival = arrival.epoch_seconds(),
            "computed arrival"
        );

        // Dropping the losing future on the first error cancels its request.
        let (restaurant, forecast) = tokio::try_join!(
            self.restaurants.find_open(&request.end, &request.food, arrival),
            self.forecasts.forecast_at(&request.end, arrival),
        )?;

        info!(end = %request.end, food = %request.food, restaurant = %restaurant.name, "munchie assembled");

        Ok(MunchieResponse::new(request.end.clone(), travel_time, forecast, restaurant))
    }
}
