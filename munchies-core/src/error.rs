//! Failure taxonomy of the aggregation pipeline.

use thiserror::Error;

use crate::provider::ProviderId;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MunchieError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{provider} is unavailable: {reason}")]
    UpstreamUnavailable { provider: ProviderId, reason: String },

    #[error("{provider} returned no usable result: {reason}")]
    NoResultFound { provider: ProviderId, reason: String },
}

impl MunchieError {
    pub fn unavailable(provider: ProviderId, reason: impl Into<String>) -> Self {
        Self::UpstreamUnavailable { provider, reason: reason.into() }
    }

    pub fn no_result(provider: ProviderId, reason: impl Into<String>) -> Self {
        Self::NoResultFound { provider, reason: reason.into() }
    }

    /// Provider that caused the failure, if any.
    pub fn provider(&self) -> Option<ProviderId> {
        match self {
            Self::InvalidInput(_) => None,
            Self::UpstreamUnavailable { provider, .. } | Self::NoResultFound { provider, .. } => {
                Some(*provider)
            }
        }
    }
}
