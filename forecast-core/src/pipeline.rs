//! One-shot location-to-forecast pipeline.
//!
//! A [`Pipeline`] is built once by the host, observed through
//! [`Pipeline::subscribe`], and driven by a single call to [`Pipeline::start`].
//! `start` consumes the pipeline, so a run cannot be repeated or re-entered.
//!
//! Steps only move forward:
//! `LoadingCoords -> LoadingForecast -> LoadedAll`.
//! A resolver failure leaves the run in `LoadingCoords`; a fetch failure
//! still reaches `LoadedAll`, with an empty forecast.

use std::sync::Arc;

use tokio::sync::watch;

use crate::{
    geolocation::{self, Geolocation},
    model::{Coordinate, Forecast},
    provider::ForecastProvider,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Step {
    #[default]
    LoadingCoords,
    LoadingForecast,
    LoadedAll,
}

/// Everything a consumer may read about the current run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PipelineState {
    pub step: Step,
    /// `None` until the resolver succeeds.
    pub coordinate: Option<Coordinate>,
    pub forecast: Forecast,
    /// Message of the failure that stopped the run or emptied the forecast.
    pub last_error: Option<String>,
}

pub struct Pipeline {
    geolocation: Option<Arc<dyn Geolocation>>,
    provider: Arc<dyn ForecastProvider>,
    state: watch::Sender<PipelineState>,
}

impl Pipeline {
    /// `geolocation: None` models a device without a geolocation capability.
    pub fn new(
        geolocation: Option<Arc<dyn Geolocation>>,
        provider: Arc<dyn ForecastProvider>,
    ) -> Self {
        let (state, _) = watch::channel(PipelineState::default());
        Self {
            geolocation,
            provider,
            state,
        }
    }

    /// Read-only view of the state, updated on every transition.
    pub fn subscribe(&self) -> watch::Receiver<PipelineState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> PipelineState {
        self.state.borrow().clone()
    }

    /// Run the pipeline to its resting state and return that state.
    ///
    /// Never fails: resolver and fetcher errors are logged and recorded in
    /// [`PipelineState::last_error`].
    pub async fn start(self) -> PipelineState {
        let coord = match geolocation::resolve(self.geolocation.as_deref()).await {
            Ok(coord) => coord,
            Err(e) => {
                tracing::error!(error = %e, "could not resolve coordinates; forecast will not be fetched");
                self.state.send_modify(|s| s.last_error = Some(e.to_string()));
                return self.state();
            }
        };

        tracing::info!(lat = coord.latitude, lon = coord.longitude, "coordinates resolved");
        self.state.send_modify(|s| {
            s.coordinate = Some(coord);
            s.step = Step::LoadingForecast;
        });

        let outcome = self.provider.fetch(coord).await;

        self.state.send_modify(|s| {
            match outcome {
                Ok(forecast) => {
                    tracing::info!(
                        days = forecast.daily().len(),
                        has_data = !forecast.is_empty(),
                        "forecast loaded"
                    );
                    s.forecast = forecast;
                }
                Err(e) => {
                    tracing::error!(error = %e, "forecast request failed");
                    s.last_error = Some(e.to_string());
                }
            }
            s.step = Step::LoadedAll;
        });

        self.state()
    }
}
