use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::{
    error::MunchieError,
    model::TravelTime,
    provider::{ProviderId, http_client, truncate_body},
};

use super::TravelTimeProvider;

const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com";

/// Driving time from the Google Directions API.
#[derive(Debug, Clone)]
pub struct GoogleDirectionsProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl GoogleDirectionsProvider {
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
struct GdDuration {
    text: String,
    value: u64,
}

#[derive(Debug, Deserialize)]
struct GdLeg {
    duration: GdDuration,
}

#[derive(Debug, Deserialize)]
struct GdRoute {
    #[serde(default)]
    legs: Vec<GdLeg>,
}

#[derive(Debug, Deserialize)]
struct GdResponse {
    status: String,
    #[serde(default)]
    routes: Vec<GdRoute>,
    error_message: Option<String>,
}

#[async_trait]
impl TravelTimeProvider for GoogleDirectionsProvider {
    async fn travel_time(&self, start: &str, end: &str) -> Result<TravelTime, MunchieError> {
        let provider = ProviderId::Google;
        let url = format!("{}/maps/api/directions/json", self.base_url);

        debug!(%provider, start, end, "requesting travel time");

        let res = self
            .http
            .get(&url)
            .query(&[
                ("origin", start),
                ("destination", end),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                MunchieError::unavailable(provider, format!("failed to send directions request: {e}"))
            })?;

        let status = res.status();
        let body = res.text().await.map_err(|e| {
            MunchieError::unavailable(provider, format!("failed to read directions response: {e}"))
        })?;

        if !status.is_success() {
            return Err(MunchieError::unavailable(
                provider,
                format!("directions request failed with status {}: {}", status, truncate_body(&body)),
            ));
        }

        let parsed: GdResponse = serde_json::from_str(&body).map_err(|e| {
            MunchieError::unavailable(provider, format!("failed to parse directions JSON: {e}"))
        })?;

        match parsed.status.as_str() {
            "OK" => {}
            "ZERO_RESULTS" | "NOT_FOUND" => {
                return Err(MunchieError::no_result(
                    provider,
                    format!("no route from '{start}' to '{end}' ({})", parsed.status),
                ));
            }
            other => {
                let detail = parsed.error_message.unwrap_or_default();
                return Err(MunchieError::unavailable(
                    provider,
                    format!("directions status {other}: {detail}"),
                ));
            }
        }

        let leg = parsed
            .routes
            .into_iter()
            .next()
            .and_then(|route| route.legs.into_iter().next())
            .ok_or_else(|| MunchieError::no_result(provider, "directions response contained no legs"))?;

        Ok(TravelTime { text: leg.duration.text, value: leg.duration.value })
    }
}
