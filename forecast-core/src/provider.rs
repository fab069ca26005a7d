use crate::{Config, Coordinate, Forecast, provider::tomorrow::TomorrowIoProvider};
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

pub mod tomorrow;

/// Why a forecast request produced no forecast.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// No response, or a non-2xx response.
    #[error("Network error: {0}")]
    Network(String),

    /// The response body was not JSON.
    #[error("Failed to parse forecast JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Network(err.to_string())
    }
}

/// Source of forecasts for a coordinate. One call is one request.
#[async_trait]
pub trait ForecastProvider: Send + Sync + Debug {
    async fn fetch(&self, coord: Coordinate) -> Result<Forecast, FetchError>;
}

/// Construct the forecast provider described by `config`.
///
/// A missing API key is not rejected here; the provider will refuse the
/// request and the fetch fails like any other.
pub fn provider_from_config(config: &Config) -> Arc<dyn ForecastProvider> {
    let api_key = config.api_key().unwrap_or_else(|| {
        tracing::warn!(
            "No API key configured; the forecast request will be rejected. \
             Hint: run `forecast configure` or set TOMORROW_API_KEY."
        );
        ""
    });

    let mut provider = TomorrowIoProvider::new(api_key.to_owned());
    if let Some(url) = config.base_url.as_deref() {
        provider = provider.with_base_url(url);
    }

    Arc::new(provider)
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
