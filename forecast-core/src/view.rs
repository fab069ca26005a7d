//! Pure mapping from pipeline state to what should be on screen.

use std::fmt;

use crate::{
    model::{Coordinate, DailyTimelineValue, Forecast, WeatherCondition},
    pipeline::{PipelineState, Step},
};

/// Which forecast sub-view is shown once everything is loaded.
///
/// Owned by the display layer and flipped by user interaction only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayToggle {
    #[default]
    Compact,
    Expanded,
}

impl DisplayToggle {
    pub fn toggled(self) -> Self {
        match self {
            DisplayToggle::Compact => DisplayToggle::Expanded,
            DisplayToggle::Expanded => DisplayToggle::Compact,
        }
    }

    pub fn toggle(&mut self) {
        *self = self.toggled();
    }
}

/// One row of the expanded daily view.
#[derive(Debug, Clone, PartialEq)]
pub struct DayRow {
    /// Day of month parsed from the entry's `time`; `None` if it doesn't parse.
    pub day: Option<u32>,
    pub apparent_avg: f64,
}

impl From<&DailyTimelineValue> for DayRow {
    fn from(entry: &DailyTimelineValue) -> Self {
        Self {
            day: entry.day_of_month(),
            apparent_avg: entry.values.temperature_apparent_avg,
        }
    }
}

impl fmt::Display for DayRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.day {
            Some(day) => write!(f, "{day} average {} C", self.apparent_avg),
            None => write!(f, "? average {} C", self.apparent_avg),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ForecastDisplay {
    /// Single icon for current conditions; `None` when there is no data.
    Compact { condition: Option<WeatherCondition> },
    /// Every daily entry, in provider order.
    Expanded { days: Vec<DayRow> },
}

#[derive(Debug, Clone, PartialEq)]
pub enum View {
    LoadingCoordinates,
    LoadingForecast,
    Loaded {
        coordinate: Coordinate,
        place: Option<String>,
        display: ForecastDisplay,
    },
    /// State that no run can produce, e.g. past `LoadingCoords` without a coordinate.
    Undetermined,
}

pub fn select_view(state: &PipelineState, toggle: DisplayToggle) -> View {
    match (state.step, state.coordinate) {
        (Step::LoadingCoords, _) => View::LoadingCoordinates,
        (Step::LoadingForecast, Some(_)) => View::LoadingForecast,
        (Step::LoadedAll, Some(coordinate)) => View::Loaded {
            coordinate,
            place: state.forecast.location().and_then(|l| l.name.clone()),
            display: forecast_display(&state.forecast, toggle),
        },
        (_, None) => View::Undetermined,
    }
}

fn forecast_display(forecast: &Forecast, toggle: DisplayToggle) -> ForecastDisplay {
    match toggle {
        DisplayToggle::Compact => ForecastDisplay::Compact {
            condition: forecast
                .current()
                .and_then(|v| v.weather_code)
                .map(WeatherCondition::from_code),
        },
        DisplayToggle::Expanded => ForecastDisplay::Expanded {
            days: forecast.daily().iter().map(DayRow::from).collect(),
        },
    }
}
