//! Application controller: startup, location selection, forecast fetch and
//! re-rendering on unit or day changes.

use std::sync::Arc;

use crate::{
    error::{StoreError, WeatherError},
    location::{CURRENT_LOCATION_LABEL, Geolocator, place_name},
    model::{Coordinates, ForecastPayload, SelectedLocation},
    prefs::UnitPreferences,
    presenter::present,
    provider::{ForecastProvider, Providers, ReverseGeocoder},
    render::Renderer,
    store::{KeyValueStore, load_last_location, save_last_location},
    units::{UnitSettings, UnitSettingsPatch, UnitSystem},
};

pub const LOCATION_UNAVAILABLE: &str =
    "Your location is unavailable. Search for a city to see its forecast.";

#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub location: Option<SelectedLocation>,
    /// Latest successful fetch for `location`.
    pub forecast: Option<ForecastPayload>,
    /// Day whose hours are shown; reset on every fetch.
    pub day: usize,
}

#[derive(Debug)]
pub struct AppController {
    forecast: Arc<dyn ForecastProvider>,
    reverse: Arc<dyn ReverseGeocoder>,
    store: Arc<dyn KeyValueStore>,
    prefs: UnitPreferences,
    state: AppState,
}

impl AppController {
    pub fn new(providers: &Providers, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            forecast: Arc::clone(&providers.forecast),
            reverse: Arc::clone(&providers.reverse),
            prefs: UnitPreferences::load(Arc::clone(&store)),
            store,
            state: AppState::default(),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn units(&self) -> UnitSettings {
        self.prefs.get()
    }

    /// Show the last searched location, or else the device position.
    ///
    /// A missing device position is reported through a notice, not an error.
    pub async fn startup(
        &mut self,
        geolocator: &dyn Geolocator,
        renderer: &mut dyn Renderer,
    ) -> Result<(), WeatherError> {
        if let Some(last) = load_last_location(self.store.as_ref()) {
            tracing::info!(name = %last.name, "restoring last searched location");
            self.state.location = Some(last);
            return self.refresh(renderer).await;
        }

        match geolocator.locate().await {
            Ok(coords) => {
                let location = self.resolve_device_location(coords).await;
                self.state.location = Some(location);
                self.refresh(renderer).await
            }
            Err(err) => {
                tracing::warn!(error = %err, "no device location available");
                renderer.notice(LOCATION_UNAVAILABLE);
                Ok(())
            }
        }
    }

    async fn resolve_device_location(&self, coords: Coordinates) -> SelectedLocation {
        let name = match self.reverse.reverse(coords).await {
            Ok(place) => place_name(&place),
            Err(err) => {
                tracing::warn!(error = %err, "reverse geocoding failed");
                CURRENT_LOCATION_LABEL.to_string()
            }
        };

        tracing::info!(%name, "resolved device location");
        SelectedLocation { latitude: coords.latitude, longitude: coords.longitude, name }
    }

    /// Make `location` current, remember it for the next start, and fetch.
    pub async fn select_location(
        &mut self,
        location: SelectedLocation,
        renderer: &mut dyn Renderer,
    ) -> Result<(), WeatherError> {
        if let Err(err) = save_last_location(self.store.as_ref(), &location) {
            tracing::warn!(error = %err, "failed to persist last searched location");
        }
        self.state.location = Some(location);
        self.refresh(renderer).await
    }

    /// Fetch the forecast for the current location: loading first, then the
    /// forecast or the error screen.
    pub async fn refresh(&mut self, renderer: &mut dyn Renderer) -> Result<(), WeatherError> {
        let Some(location) = self.state.location.clone() else {
            renderer.notice(LOCATION_UNAVAILABLE);
            return Ok(());
        };

        renderer.loading(&location.name);

        match self.forecast.fetch(location.coordinates()).await {
            Ok(payload) => {
                self.state.forecast = Some(payload);
                self.state.day = 0;
                self.render(renderer);
                Ok(())
            }
            Err(err) => {
                tracing::error!(error = %err, name = %location.name, "forecast fetch failed");
                self.state.forecast = None;
                renderer.forecast_failed(&err);
                Err(err)
            }
        }
    }

    /// Persist new units and redraw from the last payload. Never fetches.
    pub fn set_units(
        &mut self,
        patch: UnitSettingsPatch,
        renderer: &mut dyn Renderer,
    ) -> Result<UnitSettings, StoreError> {
        let settings = self.prefs.set(patch)?;
        self.render(renderer);
        Ok(settings)
    }

    pub fn set_unit_system(
        &mut self,
        system: UnitSystem,
        renderer: &mut dyn Renderer,
    ) -> Result<UnitSettings, StoreError> {
        self.set_units(system.patch(), renderer)
    }

    /// Show the hours of another day from the current payload.
    pub fn select_day(&mut self, day: usize, renderer: &mut dyn Renderer) {
        let Some(payload) = &self.state.forecast else {
            return;
        };
        self.state.day = day.min(payload.daily.len().saturating_sub(1));
        self.render(renderer);
    }

    fn render(&self, renderer: &mut dyn Renderer) {
        let (Some(payload), Some(location)) = (&self.state.forecast, &self.state.location) else {
            return;
        };
        renderer.forecast(&present(payload, &location.name, self.prefs.get(), self.state.day));
    }
}
