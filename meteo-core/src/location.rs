//! Device position and the name shown for it.

use async_trait::async_trait;
use std::fmt::Debug;

use crate::{
    error::LocationError,
    model::{Coordinates, ReversePlace},
};

pub const CURRENT_LOCATION_LABEL: &str = "Current Location";

#[async_trait]
pub trait Geolocator: Send + Sync + Debug {
    async fn locate(&self) -> Result<Coordinates, LocationError>;
}

/// Position taken from configuration or command-line flags.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedGeolocator {
    coords: Option<Coordinates>,
}

impl FixedGeolocator {
    pub fn new(coords: Option<Coordinates>) -> Self {
        Self { coords }
    }
}

#[async_trait]
impl Geolocator for FixedGeolocator {
    async fn locate(&self) -> Result<Coordinates, LocationError> {
        self.coords.ok_or(LocationError::Unavailable)
    }
}

/// "City, Country" when both are known, else the raw display name, else a
/// generic label.
pub fn place_name(place: &ReversePlace) -> String {
    match (&place.city, &place.country) {
        (Some(city), Some(country)) => format!("{city}, {country}"),
        _ => place
            .display_name
            .clone()
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| CURRENT_LOCATION_LABEL.to_string()),
    }
}
