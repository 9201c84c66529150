use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::error::MunchieError;

/// Literal `type` tag of every munchie resource.
pub const MUNCHIE_TYPE: &str = "munchie";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MunchieRequest {
    pub start: String,
    pub end: String,
    pub food: String,
}

impl MunchieRequest {
    /// Build a request from possibly-absent parameters.
    ///
    /// Every parameter must be present and contain something other than
    /// whitespace. Accepted values are stored verbatim.
    pub fn try_new(
        start: Option<String>,
        end: Option<String>,
        food: Option<String>,
    ) -> Result<Self, MunchieError> {
        let missing: Vec<&str> = [("start", &start), ("end", &end), ("food", &food)]
            .into_iter()
            .filter(|(_, value)| value.as_deref().is_none_or(|v| v.trim().is_empty()))
            .map(|(name, _)| name)
            .collect();

        match (start, end, food) {
            (Some(start), Some(end), Some(food)) if missing.is_empty() => {
                Ok(Self { start, end, food })
            }
            _ => Err(MunchieError::InvalidInput(format!(
                "missing or empty parameter(s): {}",
                missing.join(", ")
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TravelTime {
    /// Human readable duration, e.g. "1 hour 48 mins".
    pub text: String,
    /// Duration in seconds.
    pub value: u64,
}

/// Estimated arrival at the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrivalTime(DateTime<Utc>);

impl ArrivalTime {
    /// `now` shifted by the travel duration, or `None` if it does not fit a timestamp.
    pub fn after(now: DateTime<Utc>, travel: &TravelTime) -> Option<Self> {
        let secs = i64::try_from(travel.value).ok()?;
        let delta = TimeDelta::try_seconds(secs)?;
        now.checked_add_signed(delta).map(Self)
    }

    pub fn epoch_seconds(&self) -> i64 {
        self.0.timestamp()
    }

    pub fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestaurantInfo {
    pub name: String,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MunchieAttributes {
    pub end_location: String,
    pub travel_time: TravelTime,
    pub forecast: String,
    pub restaurant: RestaurantInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MunchieResponse {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub attributes: MunchieAttributes,
}

impl MunchieResponse {
    pub fn new(
        end_location: String,
        travel_time: TravelTime,
        forecast: String,
        restaurant: RestaurantInfo,
    ) -> Self {
        Self {
            id: None,
            kind: MUNCHIE_TYPE.to_string(),
            attributes: MunchieAttributes {
                end_location,
                travel_time,
                forecast,
                restaurant,
            },
        }
    }
}

/// Top-level `{ "data": ... }` document returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MunchieEnvelope {
    pub data: MunchieResponse,
}

impl From<MunchieResponse> for MunchieEnvelope {
    fn from(data: MunchieResponse) -> Self {
        Self { data }
    }
}
