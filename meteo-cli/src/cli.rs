use std::sync::Arc;

use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use inquire::{Confirm, CustomType, Select};
use meteo_core::{
    AppController, Config, Coordinates, FileStore, FixedGeolocator, LocationSearch, Providers,
    SearchDriver, SelectedLocation, UnitSettings, UnitSettingsPatch, UnitSystem,
    presenter::present_suggestions,
    providers_from_config,
    units::{PrecipitationUnit, TemperatureUnit, WindUnit},
};
use tokio::sync::mpsc;

use crate::output::TerminalRenderer;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "meteo", version, about = "Current, daily and hourly weather for any city")]
pub struct Cli {
    /// Device latitude, used at startup when no city has been searched yet.
    #[arg(long, global = true, requires = "lon", allow_hyphen_values = true)]
    pub lat: Option<f64>,

    /// Device longitude.
    #[arg(long, global = true, requires = "lat", allow_hyphen_values = true)]
    pub lon: Option<f64>,

    /// Print debug logs to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the forecast for the last searched city, or the device location.
    Show {
        /// Day (0 = today) whose hourly forecast is listed.
        #[arg(long)]
        day: Option<usize>,
    },

    /// Search for a city, pick a match and show its forecast.
    Search {
        /// City name, at least two characters.
        query: String,

        /// Pick the N-th suggestion (1-based) instead of prompting.
        #[arg(long)]
        pick: Option<usize>,

        /// Day (0 = today) whose hourly forecast is listed.
        #[arg(long)]
        day: Option<usize>,
    },

    /// Change display units. Prompts when no option is given.
    Units {
        /// Temperature unit: C or F.
        #[arg(long, value_parser = parse_temperature)]
        temperature: Option<TemperatureUnit>,

        /// Wind speed unit: kmh or mph.
        #[arg(long, value_parser = parse_wind)]
        wind: Option<WindUnit>,

        /// Precipitation unit: mm or in.
        #[arg(long, value_parser = parse_precipitation)]
        precipitation: Option<PrecipitationUnit>,

        /// Switch all units at once: metric or imperial.
        #[arg(long, value_parser = parse_system, conflicts_with_all = ["temperature", "wind", "precipitation"])]
        system: Option<UnitSystem>,
    },

    /// Interactively edit the configuration file.
    Configure,
}

fn parse_temperature(s: &str) -> Result<TemperatureUnit, String> {
    TemperatureUnit::try_from(s).map_err(|e| e.to_string())
}

fn parse_wind(s: &str) -> Result<WindUnit, String> {
    WindUnit::try_from(s).map_err(|e| e.to_string())
}

fn parse_precipitation(s: &str) -> Result<PrecipitationUnit, String> {
    PrecipitationUnit::try_from(s).map_err(|e| e.to_string())
}

fn parse_system(s: &str) -> Result<UnitSystem, String> {
    UnitSystem::try_from(s).map_err(|e| e.to_string())
}

impl Cli {
    fn device_coordinates(&self, config: &Config) -> Option<Coordinates> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some(Coordinates::new(lat, lon)),
            _ => config.device_coordinates(),
        }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let config = Config::load()?;
        let geolocator = FixedGeolocator::new(self.device_coordinates(&config));
        let mut out = TerminalRenderer::stdout();

        match self.command.unwrap_or(Command::Show { day: None }) {
            Command::Show { day } => {
                let (_, mut app) = open_app(&config)?;
                let result = app.startup(&geolocator, &mut out).await;
                if let Some(day) = day {
                    app.select_day(day, &mut out);
                }
                out.finish()?;
                result?;
            }
            Command::Search { query, pick, day } => {
                let (providers, mut app) = open_app(&config)?;
                let Some(selected) =
                    search_location(&providers, &config, &query, pick, &mut out).await?
                else {
                    out.finish()?;
                    return Ok(());
                };

                let result = app.select_location(selected, &mut out).await;
                if let Some(day) = day {
                    app.select_day(day, &mut out);
                }
                out.finish()?;
                result?;
            }
            Command::Units { temperature, wind, precipitation, system } => {
                let (_, mut app) = open_app(&config)?;
                let patch = match system {
                    Some(system) => system.patch(),
                    None => UnitSettingsPatch { temperature, wind, precipitation },
                };
                let patch = if patch.is_empty() { prompt_units(app.units())? } else { patch };

                let settings = app.set_units(patch, &mut out)?;
                out.finish()?;
                println!("{}", describe_units(&settings));
            }
            Command::Configure => configure(config)?,
        }

        Ok(())
    }
}

fn open_app(config: &Config) -> anyhow::Result<(Providers, AppController)> {
    let store = FileStore::open(Config::state_file_path()?)?;
    tracing::debug!(path = %store.path().display(), "opened state store");

    let providers = providers_from_config(config)?;
    let app = AppController::new(&providers, Arc::new(store));
    Ok((providers, app))
}

/// Run `query` through the debounced search and let the user pick a match.
async fn search_location(
    providers: &Providers,
    config: &Config,
    query: &str,
    pick: Option<usize>,
    out: &mut TerminalRenderer<std::io::Stdout>,
) -> anyhow::Result<Option<SelectedLocation>> {
    if query.trim().chars().count() < config.search.min_query_len {
        return Err(anyhow!(
            "Search text must be at least {} characters long.",
            config.search.min_query_len
        ));
    }

    let (input_tx, input_rx) = mpsc::channel(1);
    let (updates_tx, mut updates_rx) = mpsc::unbounded_channel();
    input_tx.send(query.to_string()).await.context("Search input channel closed")?;
    drop(input_tx);

    let driver =
        SearchDriver::new(Arc::clone(&providers.geocoding), LocationSearch::new(&config.search));
    let handle = tokio::spawn(driver.run(input_rx, updates_tx));

    while let Some(state) = updates_rx.recv().await {
        out.suggestions(&present_suggestions(&state))?;
    }
    let mut search = handle.await.context("Location search task failed")?;

    let names: Vec<String> = search.candidates().iter().map(|c| c.display_name.clone()).collect();
    if names.is_empty() {
        return Ok(None);
    }

    let index = match pick {
        Some(n) if (1..=names.len()).contains(&n) => n - 1,
        Some(n) => {
            return Err(anyhow!("There is no suggestion number {n}; {} found.", names.len()));
        }
        None if names.len() == 1 => 0,
        None => Select::new("Select a location:", names).raw_prompt()?.index,
    };

    Ok(search.select(index))
}

fn prompt_units(current: UnitSettings) -> anyhow::Result<UnitSettingsPatch> {
    const CUSTOM: &str = "custom";

    let mut choices: Vec<&str> = UnitSystem::all().iter().map(|s| s.as_str()).collect();
    choices.push(CUSTOM);

    let choice = Select::new("Unit system:", choices).prompt()?;
    if let Ok(system) = UnitSystem::try_from(choice) {
        return Ok(system.patch());
    }

    let temperature = Select::new("Temperature:", TemperatureUnit::all().to_vec())
        .with_starting_cursor(position(TemperatureUnit::all(), &current.temperature))
        .prompt()?;
    let wind = Select::new("Wind speed:", WindUnit::all().to_vec())
        .with_starting_cursor(position(WindUnit::all(), &current.wind))
        .prompt()?;
    let precipitation = Select::new("Precipitation:", PrecipitationUnit::all().to_vec())
        .with_starting_cursor(position(PrecipitationUnit::all(), &current.precipitation))
        .prompt()?;

    Ok(UnitSettingsPatch {
        temperature: Some(temperature),
        wind: Some(wind),
        precipitation: Some(precipitation),
    })
}

fn position<T: PartialEq>(all: &[T], current: &T) -> usize {
    all.iter().position(|u| u == current).unwrap_or(0)
}

fn describe_units(settings: &UnitSettings) -> String {
    let system = settings.system().map(|s| format!(" ({s})")).unwrap_or_default();
    format!(
        "Units: temperature {}, wind {}, precipitation {}{system}",
        settings.temperature, settings.wind, settings.precipitation
    )
}

fn configure(mut config: Config) -> anyhow::Result<()> {
    let has_location = config.location.is_some();
    let set_location = Confirm::new("Use a fixed device location at startup?")
        .with_default(has_location)
        .with_help_message("Used when no city has been searched yet")
        .prompt()?;

    if set_location {
        let current = config.device_coordinates();
        let mut latitude = CustomType::<f64>::new("Latitude:")
            .with_error_message("Please type a decimal number");
        let mut longitude = CustomType::<f64>::new("Longitude:")
            .with_error_message("Please type a decimal number");
        if let Some(c) = current {
            latitude = latitude.with_default(c.latitude);
            longitude = longitude.with_default(c.longitude);
        }
        let coords = Coordinates::new(latitude.prompt()?, longitude.prompt()?);
        config.set_device_location(Some(coords));
    } else {
        config.set_device_location(None);
    }

    config.search.debounce_ms = CustomType::<u64>::new("Search debounce (ms):")
        .with_default(config.search.debounce_ms)
        .prompt()?;

    config.validate()?;
    config.save()?;
    println!("Configuration saved to {}", Config::config_file_path()?.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_units_subcommand() {
        let cli = Cli::try_parse_from(["meteo", "units", "--temperature", "F", "--wind", "mph"])
            .unwrap();

        match cli.command {
            Some(Command::Units { temperature, wind, precipitation, system }) => {
                assert_eq!(temperature, Some(TemperatureUnit::Fahrenheit));
                assert_eq!(wind, Some(WindUnit::Mph));
                assert_eq!(precipitation, None);
                assert_eq!(system, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn system_conflicts_with_single_units() {
        let err = Cli::try_parse_from(["meteo", "units", "--system", "imperial", "--wind", "kmh"])
            .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn rejects_unknown_unit() {
        assert!(Cli::try_parse_from(["meteo", "units", "--temperature", "K"]).is_err());
    }

    #[test]
    fn coordinates_accept_negative_values() {
        let cli =
            Cli::try_parse_from(["meteo", "show", "--lat", "-33.87", "--lon", "151.21"]).unwrap();
        let coords = cli.device_coordinates(&Config::default());
        assert_eq!(coords, Some(Coordinates::new(-33.87, 151.21)));
    }

    #[test]
    fn lat_requires_lon() {
        assert!(Cli::try_parse_from(["meteo", "--lat", "1.0"]).is_err());
    }

    #[test]
    fn no_subcommand_means_show() {
        let cli = Cli::try_parse_from(["meteo"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn search_with_pick() {
        let cli = Cli::try_parse_from(["meteo", "search", "London", "--pick", "2"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::Search { ref query, pick: Some(2), day: None }) if query == "London"
        ));
    }

    #[test]
    fn describes_imperial_units() {
        let text = describe_units(&UnitSystem::Imperial.settings());
        assert_eq!(text, "Units: temperature °F, wind mph, precipitation in (imperial)");
    }
}
