use std::sync::Arc;

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use forecast_core::{
    Config, DisplayToggle, FixedPosition, Geolocation, Pipeline, PipelineState, Step, View,
    geolocation_from_config, provider_from_config, select_view,
};
use inquire::{InquireError, Password, Select};

use crate::render::{PlainRenderer, Renderer, ToggleRenderer};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "forecast", version, about = "Daily forecast for where you are")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the weather provider API key.
    Configure,

    /// Locate this device and show its forecast.
    Show {
        /// Latitude to use instead of looking up the position.
        #[arg(long, requires = "lon", allow_negative_numbers = true)]
        lat: Option<f64>,

        /// Longitude to use instead of looking up the position.
        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lon: Option<f64>,

        /// Behave as a device without geolocation.
        #[arg(long, conflicts_with_all = ["lat", "lon"])]
        no_locate: bool,

        /// Start with the daily list instead of the current-conditions icon.
        #[arg(long)]
        expanded: bool,

        /// Keep prompting to toggle between compact and expanded views.
        #[arg(long, short)]
        interactive: bool,

        /// Minimal output: location and the daily list only.
        #[arg(long, conflicts_with = "interactive")]
        plain: bool,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show {
                lat,
                lon,
                no_locate,
                expanded,
                interactive,
                plain,
            } => {
                let config = Config::load()?;

                let geolocation: Option<Arc<dyn Geolocation>> = match (lat, lon) {
                    _ if no_locate => None,
                    (Some(lat), Some(lon)) => Some(Arc::new(FixedPosition::new(lat, lon))),
                    _ => geolocation_from_config(&config),
                };

                let renderer: Box<dyn Renderer> = if plain {
                    Box::new(PlainRenderer)
                } else {
                    Box::new(ToggleRenderer)
                };

                let toggle = if expanded || !renderer.supports_toggle() {
                    DisplayToggle::Expanded
                } else {
                    DisplayToggle::Compact
                };

                let pipeline = Pipeline::new(geolocation, provider_from_config(&config));
                let state = show(pipeline, renderer.as_ref(), toggle).await?;

                if let Some(hint) = location_hint(&state, lat.is_some()) {
                    eprintln!("{hint}");
                }

                if interactive && state.step == Step::LoadedAll {
                    toggle_loop(&state, renderer.as_ref(), toggle)?;
                }

                Ok(())
            }
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("Tomorrow.io API key:")
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    config.set_api_key(api_key.trim().to_string());
    let path = config.save()?;

    println!("Saved API key to {}", path.display());
    Ok(())
}

/// Start the pipeline and print every distinct view until it comes to rest.
async fn show(
    pipeline: Pipeline,
    renderer: &dyn Renderer,
    toggle: DisplayToggle,
) -> anyhow::Result<PipelineState> {
    let mut rx = pipeline.subscribe();
    let run = tokio::spawn(pipeline.start());

    let mut last: Option<View> = None;
    loop {
        let view = select_view(&rx.borrow_and_update(), toggle);
        if last.as_ref() != Some(&view) {
            println!("{}", renderer.render(&view));
            last = Some(view);
        }
        if rx.changed().await.is_err() {
            break;
        }
    }

    let state = run.await.context("Forecast pipeline task failed")?;

    let view = select_view(&state, toggle);
    if last.as_ref() != Some(&view) {
        println!("{}", renderer.render(&view));
    }

    Ok(state)
}

/// Explanation for a run that never got a coordinate.
fn location_hint(state: &PipelineState, explicit_position: bool) -> Option<String> {
    if state.step != Step::LoadingCoords {
        return None;
    }

    let reason = state.last_error.as_deref().unwrap_or("unknown error");
    let hint = if explicit_position {
        format!(
            "Could not use the given coordinates: {reason}.\n\
             Hint: --lat must be within [-90, 90] and --lon within [-180, 180]."
        )
    } else {
        format!(
            "Could not determine your location: {reason}.\n\
             Hint: pass --lat and --lon to choose one."
        )
    };

    Some(hint)
}

fn toggle_loop(
    state: &PipelineState,
    renderer: &dyn Renderer,
    mut toggle: DisplayToggle,
) -> anyhow::Result<()> {
    const TOGGLE: &str = "Toggle view";
    const QUIT: &str = "Quit";

    loop {
        let choice = match Select::new("", vec![TOGGLE, QUIT]).prompt() {
            Ok(choice) => choice,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => break,
            Err(e) => return Err(e).context("Failed to read selection"),
        };

        if choice == QUIT {
            break;
        }

        toggle.toggle();
        println!("{}", renderer.render(&select_view(state, toggle)));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn show_accepts_negative_coordinates() {
        let cli = Cli::try_parse_from(["forecast", "show", "--lat", "51.5", "--lon", "-0.12"])
            .expect("valid args");

        let Command::Show { lat, lon, .. } = cli.command else {
            panic!("expected show");
        };
        assert_eq!(lat, Some(51.5));
        assert_eq!(lon, Some(-0.12));
    }

    #[test]
    fn lat_requires_lon() {
        assert!(Cli::try_parse_from(["forecast", "show", "--lat", "51.5"]).is_err());
    }

    #[test]
    fn no_locate_conflicts_with_coordinates() {
        let args = ["forecast", "show", "--no-locate", "--lat", "1", "--lon", "2"];
        assert!(Cli::try_parse_from(args).is_err());
    }

    fn stuck(error: &str) -> PipelineState {
        PipelineState {
            last_error: Some(error.to_string()),
            ..PipelineState::default()
        }
    }

    #[test]
    fn hint_for_out_of_range_coordinates_names_the_ranges() {
        let state = stuck("Position unavailable: reported position 123, 0 is out of range");
        let hint = location_hint(&state, true).expect("hint for stuck run");

        assert!(hint.contains("out of range"));
        assert!(hint.contains("--lat must be within [-90, 90]"));
        assert!(!hint.contains("pass --lat and --lon"));
    }

    #[test]
    fn hint_for_failed_lookup_suggests_coordinates() {
        let hint = location_hint(&stuck("Location permission denied"), false).expect("hint");

        assert!(hint.contains("Location permission denied"));
        assert!(hint.contains("pass --lat and --lon"));
    }

    #[test]
    fn no_hint_once_located() {
        let state = PipelineState {
            step: Step::LoadedAll,
            ..PipelineState::default()
        };
        assert_eq!(location_hint(&state, false), None);
    }

    #[test]
    fn verbosity_counts() {
        let cli = Cli::try_parse_from(["forecast", "-vv", "configure"]).expect("valid args");
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Command::Configure));
    }
}
