use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, Url};
use std::time::Duration;
use tracing::{debug, instrument};

use crate::{
    config::Config,
    model::WeatherResponse,
    provider::{FetchError, ForecastProvider},
};

/// Base URL of the CWA open-data REST datastore.
pub const DEFAULT_BASE_URL: &str = "https://opendata.cwa.gov.tw/api/v1/rest/datastore";

/// 36-hour general forecast for cities and counties.
pub const FORECAST_DATASET: &str = "F-C0032-001";

/// Client for the Central Weather Administration open-data API.
#[derive(Debug, Clone)]
pub struct CwaProvider {
    api_key: Option<String>,
    base_url: String,
    http: Client,
}

impl CwaProvider {
    pub fn new(api_key: Option<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key,
            base_url: base_url.into(),
            http: Client::new(),
        }
    }

    /// Build a provider from stored configuration, honouring its timeout.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            api_key: config.api_key(),
            base_url: config.base_url.clone(),
            http,
        })
    }

    fn forecast_url(&self, location_name: &str) -> Result<Url, FetchError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            FetchError::InvalidRequestTarget(
                "no API key configured (run `forecast configure` or set CWA_API_KEY)".to_string(),
            )
        })?;

        let endpoint = format!("{}/{}", self.base_url.trim_end_matches('/'), FORECAST_DATASET);

        Url::parse_with_params(
            &endpoint,
            &[
                ("Authorization", api_key),
                ("format", "JSON"),
                ("locationName", location_name),
            ],
        )
        .map_err(|e| FetchError::InvalidRequestTarget(format!("{endpoint}: {e}")))
    }
}

#[async_trait]
impl ForecastProvider for CwaProvider {
    #[instrument(skip(self))]
    async fn fetch_weather_by_location(
        &self,
        location_name: &str,
    ) -> Result<WeatherResponse, FetchError> {
        let url = self.forecast_url(location_name)?;

        let res = self.http.get(url).send().await.map_err(FetchError::Transport)?;

        let status = res.status();
        debug!(%status, "CWA responded");

        let body = res.text().await.map_err(FetchError::Transport)?;

        if !status.is_success() {
            return Err(FetchError::MalformedResponseEnvelope {
                status,
                body: truncate_body(&body),
            });
        }

        if body.trim().is_empty() {
            return Err(FetchError::EmptyBody);
        }

        let parsed: WeatherResponse = serde_json::from_str(&body).map_err(FetchError::Decode)?;

        debug!(locations = parsed.records.location.len(), "decoded forecast payload");

        Ok(parsed)
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}
