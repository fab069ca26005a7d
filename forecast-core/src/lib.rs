//! Core library for the `forecast` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Coordinate resolution over a geolocation capability
//! - The forecast provider client and its response model
//! - The one-shot pipeline tying them together, and the view mapping over it
//!
//! It is used by `forecast-cli`, but any host that can call
//! [`Pipeline::start`] once can drive it.

pub mod config;
pub mod geolocation;
pub mod model;
pub mod pipeline;
pub mod provider;
pub mod view;

pub use config::{Config, GeolocationMode};
pub use geolocation::{
    FixedPosition, Geolocation, GeolocationError, IpGeolocation, Position, geolocation_from_config,
};
pub use model::{
    Coordinate, DailyForecastValue, DailyTimelineValue, Forecast, ForecastLocation, ForecastValue,
    TimelineValue, Timelines, WeatherCondition,
};
pub use pipeline::{Pipeline, PipelineState, Step};
pub use provider::{FetchError, ForecastProvider, provider_from_config};
pub use view::{DayRow, DisplayToggle, ForecastDisplay, View, select_view};
