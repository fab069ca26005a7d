use async_trait::async_trait;
use reqwest::{Client, header::ACCEPT};

use crate::{
    model::{Coordinate, Forecast},
    provider::{FetchError, truncate_body},
};

use super::ForecastProvider;

pub const DEFAULT_FORECAST_URL: &str = "https://api.tomorrow.io/v4/weather/forecast";

#[derive(Clone)]
pub struct TomorrowIoProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl std::fmt::Debug for TomorrowIoProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TomorrowIoProvider")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl TomorrowIoProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_FORECAST_URL.to_string(),
            http: Client::new(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

#[async_trait]
impl ForecastProvider for TomorrowIoProvider {
    async fn fetch(&self, coord: Coordinate) -> Result<Forecast, FetchError> {
        tracing::debug!(lat = coord.latitude, lon = coord.longitude, "requesting forecast");

        let res = self
            .http
            .get(&self.base_url)
            .query(&[("location", coord.as_query()), ("apikey", self.api_key.clone())])
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(FetchError::Network(format!(
                "forecast request failed with status {}: {}",
                status,
                truncate_body(&body),
            )));
        }

        let doc: serde_json::Value = serde_json::from_str(&body)?;

        Ok(Forecast::from_json(doc))
    }
}
