//! Core library for the `meteo` weather lookup tool.
//!
//! This crate defines:
//! - Configuration and persisted preferences
//! - Geocoding, forecast and reverse-geocoding providers
//! - The debounced location search state machine
//! - Unit conversion and forecast presentation
//! - The application controller tying them together
//!
//! It is used by `meteo-cli`, but any front end implementing [`Renderer`]
//! can drive it.

pub mod app;
pub mod config;
pub mod error;
pub mod location;
pub mod model;
pub mod prefs;
pub mod presenter;
pub mod provider;
pub mod render;
pub mod search;
pub mod store;
pub mod units;

pub use app::{AppController, AppState};
pub use config::Config;
pub use error::{LocationError, StoreError, WeatherError};
pub use location::{FixedGeolocator, Geolocator};
pub use model::{Coordinates, ForecastPayload, LocationCandidate, SelectedLocation};
pub use prefs::UnitPreferences;
pub use presenter::{ForecastView, SuggestionsView, WeatherIcon};
pub use provider::{Providers, providers_from_config};
pub use render::Renderer;
pub use search::{LocationSearch, SearchDriver, SearchState};
pub use store::{FileStore, KeyValueStore, MemoryStore};
pub use units::{UnitSettings, UnitSettingsPatch, UnitSystem};
