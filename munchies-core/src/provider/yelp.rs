use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::{
    error::MunchieError,
    model::{ArrivalTime, RestaurantInfo},
    provider::{ProviderId, http_client, truncate_body},
};

use super::RestaurantFinder;

const DEFAULT_BASE_URL: &str = "https://api.yelp.com";

/// Restaurant lookup through the Yelp Fusion business search.
#[derive(Debug, Clone)]
pub struct YelpProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl YelpProvider {
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
struct YpLocation {
    #[serde(default)]
    display_address: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct YpBusiness {
    name: String,
    location: Option<YpLocation>,
}

#[derive(Debug, Deserialize)]
struct YpSearchResponse {
    #[serde(default)]
    businesses: Vec<YpBusiness>,
}

#[async_trait]
impl RestaurantFinder for YelpProvider {
    async fn find_open(
        &self,
        location: &str,
        cuisine: &str,
        open_at: ArrivalTime,
    ) -> Result<RestaurantInfo, MunchieError> {
        let provider = ProviderId::Yelp;
        let url = format!("{}/v3/businesses/search", self.base_url);
        let open_at = open_at.epoch_seconds().to_string();

        debug!(%provider, location, cuisine, open_at = %open_at, "searching open restaurants");

        let res = self
            .http
            .get(&url)
            .bearer_auth(&self.api_key)
            .query(&[
                ("location", location),
                ("categories", cuisine),
                ("open_at", open_at.as_str()),
                ("limit", "1"),
            ])
            .send()
            .await
            .map_err(|e| {
                MunchieError::unavailable(provider, format!("failed to send business search: {e}"))
            })?;

        let status = res.status();
        let body = res.text().await.map_err(|e| {
            MunchieError::unavailable(provider, format!("failed to read business search body: {e}"))
        })?;

        if !status.is_success() {
            return Err(MunchieError::unavailable(
                provider,
                format!("business search failed with status {}: {}", status, truncate_body(&body)),
            ));
        }

        let parsed: YpSearchResponse = serde_json::from_str(&body).map_err(|e| {
            MunchieError::unavailable(provider, format!("failed to parse business search JSON: {e}"))
        })?;

        let business = parsed.businesses.into_iter().next().ok_or_else(|| {
            MunchieError::no_result(
                provider,
                format!("no '{cuisine}' restaurant open in '{location}' at {open_at}"),
            )
        })?;

        let address = business
            .location
            .map(|loc| loc.display_address.join(", "))
            .filter(|address| !address.trim().is_empty())
            .ok_or_else(|| {
                MunchieError::no_result(provider, format!("'{}' has no address", business.name))
            })?;

        Ok(RestaurantInfo { name: business.name, address })
    }
}
