use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// One geocoding match shown in the suggestion list.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationCandidate {
    pub latitude: f64,
    pub longitude: f64,
    pub display_name: String,
}

impl LocationCandidate {
    pub fn new(name: &str, country: Option<&str>, latitude: f64, longitude: f64) -> Self {
        let display_name = match country {
            Some(country) if !country.is_empty() => format!("{name}, {country}"),
            _ => name.to_string(),
        };

        Self { latitude, longitude, display_name }
    }

    pub fn to_selected(&self) -> SelectedLocation {
        SelectedLocation {
            latitude: self.latitude,
            longitude: self.longitude,
            name: self.display_name.clone(),
        }
    }
}

/// The location all forecast fetches are made for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub name: String,
}

impl SelectedLocation {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}

/// Reverse-geocoding answer for a coordinate pair.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReversePlace {
    pub city: Option<String>,
    pub country: Option<String>,
    pub display_name: Option<String>,
}

/// Current conditions, metric units as returned by the forecast API.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentConditions {
    pub time: NaiveDateTime,
    pub temperature_c: f64,
    pub apparent_temperature_c: f64,
    pub humidity_pct: f64,
    pub precipitation_mm: f64,
    pub wind_speed_kmh: f64,
    pub weather_code: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailyEntry {
    pub date: NaiveDate,
    pub temp_max_c: f64,
    pub temp_min_c: f64,
    pub precipitation_sum_mm: f64,
    pub weather_code: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HourlyEntry {
    pub time: NaiveDateTime,
    pub temperature_c: f64,
    pub weather_code: i32,
}

/// Snapshot of one forecast fetch. Replaced wholesale by the next fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastPayload {
    pub current: CurrentConditions,
    pub daily: Vec<DailyEntry>,
    pub hourly: Vec<HourlyEntry>,
}
