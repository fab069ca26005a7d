use forecast_core::{ForecastDisplay, View};

/// Turns a [`View`] into text. Renderers differ in presentation only.
pub trait Renderer {
    fn render(&self, view: &View) -> String;

    /// Whether the renderer distinguishes compact and expanded display.
    fn supports_toggle(&self) -> bool {
        true
    }
}

fn loading(title: &str) -> String {
    format!("Loading {title}")
}

/// Location line plus the compact icon or the expanded day list.
#[derive(Debug, Default)]
pub struct ToggleRenderer;

impl Renderer for ToggleRenderer {
    fn render(&self, view: &View) -> String {
        match view {
            View::LoadingCoordinates => loading("Coordinates"),
            View::LoadingForecast => loading("Forecast"),
            View::Loaded {
                coordinate,
                place,
                display,
            } => {
                let mut out = match place {
                    Some(name) => format!("Current Location: {name} ({coordinate})"),
                    None => format!("Current Location: {coordinate}"),
                };
                match display {
                    ForecastDisplay::Compact { condition: Some(c) } => {
                        out.push_str(&format!("\n{} {}", c.icon(), c.description()));
                    }
                    ForecastDisplay::Compact { condition: None } => out.push_str("\n-"),
                    ForecastDisplay::Expanded { days } => {
                        for day in days {
                            out.push_str(&format!("\n{day}"));
                        }
                    }
                }
                out
            }
            View::Undetermined => "Unable to determine view".to_string(),
        }
    }
}

/// Location line and the daily list, without a compact mode.
#[derive(Debug, Default)]
pub struct PlainRenderer;

impl Renderer for PlainRenderer {
    fn render(&self, view: &View) -> String {
        match view {
            View::Loaded {
                coordinate,
                display: ForecastDisplay::Expanded { days },
                ..
            } => {
                let mut out = format!("Current Location: {coordinate}");
                for day in days {
                    out.push_str(&format!("\n{day}"));
                }
                out
            }
            other => ToggleRenderer.render(other),
        }
    }

    fn supports_toggle(&self) -> bool {
        false
    }
}
