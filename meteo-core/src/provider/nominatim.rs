use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    error::WeatherError,
    model::{Coordinates, ReversePlace},
};

use super::{ReverseGeocoder, endpoint, get_json};

/// Reverse geocoding through OpenStreetMap Nominatim. No API key, but the
/// service rejects requests without a user agent.
#[derive(Debug, Clone)]
pub struct Nominatim {
    http: Client,
    url: String,
}

impl Nominatim {
    pub fn new(http: Client, base_url: &str) -> Self {
        Self { http, url: endpoint(base_url, "reverse") }
    }
}

#[derive(Debug, Deserialize)]
struct NominatimResponse {
    address: Option<NominatimAddress>,
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NominatimAddress {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    country: Option<String>,
}

#[async_trait]
impl ReverseGeocoder for Nominatim {
    async fn reverse(&self, coords: Coordinates) -> Result<ReversePlace, WeatherError> {
        let parsed: NominatimResponse = get_json(
            &self.http,
            "reverse geocoding",
            &self.url,
            &[
                ("format", "json".to_string()),
                ("lat", coords.latitude.to_string()),
                ("lon", coords.longitude.to_string()),
            ],
        )
        .await?;

        let (city, country) = match parsed.address {
            Some(addr) => (addr.city.or(addr.town).or(addr.village), addr.country),
            None => (None, None),
        };

        Ok(ReversePlace { city, country, display_name: parsed.display_name })
    }
}
