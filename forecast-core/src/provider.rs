use async_trait::async_trait;
use reqwest::StatusCode;
use std::fmt::Debug;
use thiserror::Error;

use crate::model::WeatherResponse;

pub mod cwa;

pub use cwa::CwaProvider;

/// Why a fetch did not produce a [`WeatherResponse`].
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid request target: {0}")]
    InvalidRequestTarget(String),

    #[error("unexpected response (HTTP {status}): {body}")]
    MalformedResponseEnvelope { status: StatusCode, body: String },

    #[error("response body was empty")]
    EmptyBody,

    #[error("failed to decode forecast JSON: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("network request failed: {0}")]
    Transport(#[source] reqwest::Error),
}

/// Source of forecast payloads for a location name.
///
/// Implementations issue exactly one request per call and do not retry.
#[async_trait]
pub trait ForecastProvider: Send + Sync + Debug {
    async fn fetch_weather_by_location(
        &self,
        location_name: &str,
    ) -> Result<WeatherResponse, FetchError>;
}
