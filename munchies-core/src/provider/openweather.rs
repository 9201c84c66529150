use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::{
    error::MunchieError,
    model::ArrivalTime,
    provider::{ProviderId, http_client, truncate_body},
};

use super::ForecastProvider;

const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

/// Forecast entries are three hours apart; an arrival further than this from
/// the nearest entry is outside the forecast window (past, or beyond five days).
const SLOT_TOLERANCE_SECS: i64 = 3 * 3600;

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> anyhow::Result<Self> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL.to_string())
    }

    pub fn with_base_url(api_key: String, base_url: String) -> anyhow::Result<Self> {
        Ok(Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            http: http_client()?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    #[serde(default)]
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    #[serde(default)]
    list: Vec<OwForecastEntry>,
}

#[async_trait]
impl ForecastProvider for OpenWeatherProvider {
    async fn forecast_at(&self, location: &str, at: ArrivalTime) -> Result<String, MunchieError> {
        let provider = ProviderId::OpenWeather;
        let target_ts = at.epoch_seconds();
        let url = format!("{}/data/2.5/forecast", self.base_url);

        debug!(%provider, location, target_ts, "requesting forecast");

        let res = self
            .http
            .get(&url)
            .query(&[
                ("q", location),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
            ])
            .send()
            .await
            .map_err(|e| {
                MunchieError::unavailable(provider, format!("failed to send forecast request: {e}"))
            })?;

        let status = res.status();
        let body = res.text().await.map_err(|e| {
            MunchieError::unavailable(provider, format!("failed to read forecast response: {e}"))
        })?;

        if !status.is_success() {
            return Err(MunchieError::unavailable(
                provider,
                format!("forecast request failed with status {}: {}", status, truncate_body(&body)),
            ));
        }

        let parsed: OwForecastResponse = serde_json::from_str(&body).map_err(|e| {
            MunchieError::unavailable(provider, format!("failed to parse forecast JSON: {e}"))
        })?;

        let entry = parsed
            .list
            .iter()
            .min_by_key(|e| (e.dt - target_ts).abs())
            .ok_or_else(|| MunchieError::no_result(provider, "forecast response contained no data"))?;

        if (entry.dt - target_ts).abs() > SLOT_TOLERANCE_SECS {
            return Err(MunchieError::no_result(
                provider,
                format!("arrival {} is outside the forecast window", at.as_datetime()),
            ));
        }

        let description = entry
            .weather
            .first()
            .map(|w| w.description.clone())
            .ok_or_else(|| MunchieError::no_result(provider, "forecast slot has no description"))?;

        Ok(description)
    }
}
