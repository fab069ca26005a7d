use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::{fmt::Debug, sync::Arc, time::Duration};

use crate::{Config, GeolocationMode, model::Coordinate};

pub const DEFAULT_IP_LOOKUP_URL: &str = "http://ip-api.com/json";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Why a position could not be obtained.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeolocationError {
    #[error("Geolocation is not supported on this device")]
    GeolocationUnavailable,
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Position unavailable: {0}")]
    PositionUnavailable(String),
    #[error("Location request timed out")]
    Timeout,
}

/// A position report from a geolocation capability.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

/// A device capability that can report the current position once.
#[async_trait]
pub trait Geolocation: Send + Sync + Debug {
    async fn current_position(&self) -> Result<Position, GeolocationError>;
}

/// Resolve the current coordinate with a single request to `capability`.
///
/// `None` means the device has no geolocation at all, which fails before any
/// request is made.
pub async fn resolve(capability: Option<&dyn Geolocation>) -> Result<Coordinate, GeolocationError> {
    let Some(capability) = capability else {
        return Err(GeolocationError::GeolocationUnavailable);
    };

    let position = capability.current_position().await?;

    Coordinate::new(position.latitude, position.longitude).ok_or_else(|| {
        GeolocationError::PositionUnavailable(format!(
            "reported position {}, {} is out of range",
            position.latitude, position.longitude
        ))
    })
}

/// Position supplied up front, e.g. from command-line arguments.
#[derive(Debug, Clone, Copy)]
pub struct FixedPosition(pub Position);

impl FixedPosition {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self(Position { latitude, longitude })
    }
}

#[async_trait]
impl Geolocation for FixedPosition {
    async fn current_position(&self) -> Result<Position, GeolocationError> {
        Ok(self.0)
    }
}

/// Approximate position from the caller's public IP address.
#[derive(Debug, Clone)]
pub struct IpGeolocation {
    url: String,
    timeout: Duration,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct IpLookupResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lon: Option<f64>,
}

impl IpGeolocation {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: DEFAULT_TIMEOUT,
            http: Client::new(),
        }
    }

    /// How long to wait for the lookup before failing with `Timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for IpGeolocation {
    fn default() -> Self {
        Self::new(DEFAULT_IP_LOOKUP_URL)
    }
}

#[async_trait]
impl Geolocation for IpGeolocation {
    async fn current_position(&self) -> Result<Position, GeolocationError> {
        tracing::debug!(url = %self.url, "requesting IP geolocation");

        let res = self
            .http
            .get(&self.url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GeolocationError::Timeout
                } else {
                    GeolocationError::PositionUnavailable(e.to_string())
                }
            })?;

        let status = res.status();
        if matches!(status, StatusCode::FORBIDDEN | StatusCode::UNAUTHORIZED) {
            return Err(GeolocationError::PermissionDenied);
        }
        if !status.is_success() {
            return Err(GeolocationError::PositionUnavailable(format!(
                "lookup failed with status {status}"
            )));
        }

        let body: IpLookupResponse = res
            .json()
            .await
            .map_err(|e| GeolocationError::PositionUnavailable(e.to_string()))?;

        match (body.status.as_str(), body.lat, body.lon) {
            ("success", Some(latitude), Some(longitude)) => Ok(Position { latitude, longitude }),
            _ => Err(GeolocationError::PositionUnavailable(
                body.message.unwrap_or_else(|| format!("lookup status '{}'", body.status)),
            )),
        }
    }
}

/// Geolocation capability described by `config`; `None` when disabled.
pub fn geolocation_from_config(config: &Config) -> Option<Arc<dyn Geolocation>> {
    match config.geolocation {
        GeolocationMode::Disabled => None,
        GeolocationMode::Ip => {
            let url = config.geolocation_url.as_deref().unwrap_or(DEFAULT_IP_LOOKUP_URL);
            Some(Arc::new(IpGeolocation::new(url)))
        }
    }
}
