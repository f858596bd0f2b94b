use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::{fmt::Debug, sync::Arc};

use crate::{
    Config,
    error::WeatherError,
    model::{Coordinates, ForecastPayload, LocationCandidate, ReversePlace},
    provider::{
        nominatim::Nominatim,
        open_meteo::{OpenMeteoForecast, OpenMeteoGeocoder},
    },
};

pub mod nominatim;
pub mod open_meteo;

/// Place name → coordinate candidates.
#[async_trait]
pub trait GeocodingProvider: Send + Sync + Debug {
    /// An empty result set is `Ok(vec![])`, not an error.
    async fn search(&self, query: &str) -> Result<Vec<LocationCandidate>, WeatherError>;
}

#[async_trait]
pub trait ForecastProvider: Send + Sync + Debug {
    async fn fetch(&self, coords: Coordinates) -> Result<ForecastPayload, WeatherError>;
}

/// Coordinates → human-readable place.
#[async_trait]
pub trait ReverseGeocoder: Send + Sync + Debug {
    async fn reverse(&self, coords: Coordinates) -> Result<ReversePlace, WeatherError>;
}

/// The three services the application talks to.
#[derive(Debug, Clone)]
pub struct Providers {
    pub geocoding: Arc<dyn GeocodingProvider>,
    pub forecast: Arc<dyn ForecastProvider>,
    pub reverse: Arc<dyn ReverseGeocoder>,
}

/// Construct all providers from the configured endpoints.
pub fn providers_from_config(config: &Config) -> Result<Providers, WeatherError> {
    let http = Client::builder()
        .user_agent(config.http.user_agent.as_str())
        .build()
        .map_err(|source| WeatherError::Transport { service: "http client", source })?;

    Ok(Providers {
        geocoding: Arc::new(OpenMeteoGeocoder::new(
            http.clone(),
            &config.endpoints.geocoding,
            &config.search,
        )),
        forecast: Arc::new(OpenMeteoForecast::new(http.clone(), &config.endpoints.forecast)),
        reverse: Arc::new(Nominatim::new(http, &config.endpoints.reverse_geocoding)),
    })
}

/// Issue a GET request, fail on non-2xx, and decode the JSON body.
pub(crate) async fn get_json<T: DeserializeOwned>(
    http: &Client,
    service: &'static str,
    url: &str,
    query: &[(&str, String)],
) -> Result<T, WeatherError> {
    tracing::debug!(service, url, ?query, "sending request");

    let res = http
        .get(url)
        .query(query)
        .send()
        .await
        .map_err(|source| WeatherError::Transport { service, source })?;

    let status = res.status();
    let body = res.text().await.map_err(|source| WeatherError::Transport { service, source })?;

    if !status.is_success() {
        return Err(WeatherError::Status { service, status, body: truncate_body(&body) });
    }

    serde_json::from_str(&body).map_err(|source| WeatherError::Decode { service, source })
}

pub(crate) fn endpoint(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
