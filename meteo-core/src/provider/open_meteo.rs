use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use reqwest::Client;
use serde::Deserialize;

use crate::{
    config::SearchConfig,
    error::WeatherError,
    model::{
        Coordinates, CurrentConditions, DailyEntry, ForecastPayload, HourlyEntry,
        LocationCandidate,
    },
};

use super::{ForecastProvider, GeocodingProvider, endpoint, get_json};

const CURRENT_FIELDS: &str = "temperature_2m,apparent_temperature,relative_humidity_2m,precipitation,weather_code,wind_speed_10m";
const DAILY_FIELDS: &str = "temperature_2m_max,temperature_2m_min,precipitation_sum,weather_code";
const HOURLY_FIELDS: &str = "temperature_2m,weather_code";

#[derive(Debug, Clone)]
pub struct OpenMeteoGeocoder {
    http: Client,
    url: String,
    count: u32,
    language: String,
}

impl OpenMeteoGeocoder {
    pub fn new(http: Client, base_url: &str, search: &SearchConfig) -> Self {
        Self {
            http,
            url: endpoint(base_url, "v1/search"),
            count: search.result_count,
            language: search.language.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OmSearchResponse {
    #[serde(default)]
    results: Option<Vec<OmPlace>>,
}

#[derive(Debug, Deserialize)]
struct OmPlace {
    name: String,
    #[serde(default)]
    country: Option<String>,
    latitude: f64,
    longitude: f64,
}

#[async_trait]
impl GeocodingProvider for OpenMeteoGeocoder {
    async fn search(&self, query: &str) -> Result<Vec<LocationCandidate>, WeatherError> {
        let parsed: OmSearchResponse = get_json(
            &self.http,
            "geocoding",
            &self.url,
            &[
                ("name", query.to_string()),
                ("count", self.count.to_string()),
                ("language", self.language.clone()),
                ("format", "json".to_string()),
            ],
        )
        .await?;

        let candidates: Vec<_> = parsed
            .results
            .unwrap_or_default()
            .iter()
            .map(|p| LocationCandidate::new(&p.name, p.country.as_deref(), p.latitude, p.longitude))
            .collect();

        tracing::debug!(query, found = candidates.len(), "geocoding finished");
        Ok(candidates)
    }
}

#[derive(Debug, Clone)]
pub struct OpenMeteoForecast {
    http: Client,
    url: String,
}

impl OpenMeteoForecast {
    pub fn new(http: Client, base_url: &str) -> Self {
        Self { http, url: endpoint(base_url, "v1/forecast") }
    }
}

#[derive(Debug, Deserialize)]
struct OmCurrent {
    time: String,
    temperature_2m: f64,
    apparent_temperature: f64,
    relative_humidity_2m: f64,
    precipitation: f64,
    weather_code: i32,
    wind_speed_10m: f64,
}

#[derive(Debug, Deserialize)]
struct OmDaily {
    time: Vec<NaiveDate>,
    temperature_2m_max: Vec<Option<f64>>,
    temperature_2m_min: Vec<Option<f64>>,
    precipitation_sum: Vec<Option<f64>>,
    weather_code: Vec<Option<i32>>,
}

#[derive(Debug, Deserialize)]
struct OmHourly {
    time: Vec<String>,
    temperature_2m: Vec<Option<f64>>,
    weather_code: Vec<Option<i32>>,
}

#[derive(Debug, Deserialize)]
struct OmForecastResponse {
    current: OmCurrent,
    daily: OmDaily,
    hourly: OmHourly,
}

impl OmForecastResponse {
    /// Missing samples (`null`) in the daily and hourly columns read as zero.
    fn into_payload(self) -> Result<ForecastPayload, WeatherError> {
        let OmForecastResponse { current, daily, hourly } = self;

        let days = daily.time.len();
        check_len("daily.temperature_2m_max", daily.temperature_2m_max.len(), days)?;
        check_len("daily.temperature_2m_min", daily.temperature_2m_min.len(), days)?;
        check_len("daily.precipitation_sum", daily.precipitation_sum.len(), days)?;
        check_len("daily.weather_code", daily.weather_code.len(), days)?;

        let hours = hourly.time.len();
        check_len("hourly.temperature_2m", hourly.temperature_2m.len(), hours)?;
        check_len("hourly.weather_code", hourly.weather_code.len(), hours)?;

        let daily = (0..days)
            .map(|i| DailyEntry {
                date: daily.time[i],
                temp_max_c: daily.temperature_2m_max[i].unwrap_or_default(),
                temp_min_c: daily.temperature_2m_min[i].unwrap_or_default(),
                precipitation_sum_mm: daily.precipitation_sum[i].unwrap_or_default(),
                weather_code: daily.weather_code[i].unwrap_or_default(),
            })
            .collect();

        let hourly = hourly
            .time
            .iter()
            .zip(hourly.temperature_2m.iter().zip(hourly.weather_code.iter()))
            .map(|(time, (temp, code))| {
                Ok(HourlyEntry {
                    time: parse_local_time(time)?,
                    temperature_c: temp.unwrap_or_default(),
                    weather_code: code.unwrap_or_default(),
                })
            })
            .collect::<Result<Vec<_>, WeatherError>>()?;

        Ok(ForecastPayload {
            current: CurrentConditions {
                time: parse_local_time(&current.time)?,
                temperature_c: current.temperature_2m,
                apparent_temperature_c: current.apparent_temperature,
                humidity_pct: current.relative_humidity_2m,
                precipitation_mm: current.precipitation,
                wind_speed_kmh: current.wind_speed_10m,
                weather_code: current.weather_code,
            },
            daily,
            hourly,
        })
    }
}

fn check_len(column: &str, len: usize, expected: usize) -> Result<(), WeatherError> {
    if len != expected {
        return Err(WeatherError::Malformed(format!(
            "column {column} has {len} entries, expected {expected}"
        )));
    }
    Ok(())
}

/// Open-Meteo reports local wall-clock times without seconds, e.g. `2025-08-05T14:15`.
pub(crate) fn parse_local_time(raw: &str) -> Result<NaiveDateTime, WeatherError> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .map_err(|e| WeatherError::Malformed(format!("invalid timestamp '{raw}': {e}")))
}

#[async_trait]
impl ForecastProvider for OpenMeteoForecast {
    async fn fetch(&self, coords: Coordinates) -> Result<ForecastPayload, WeatherError> {
        let parsed: OmForecastResponse = get_json(
            &self.http,
            "forecast",
            &self.url,
            &[
                ("latitude", coords.latitude.to_string()),
                ("longitude", coords.longitude.to_string()),
                ("current", CURRENT_FIELDS.to_string()),
                ("daily", DAILY_FIELDS.to_string()),
                ("hourly", HOURLY_FIELDS.to_string()),
                ("timezone", "auto".to_string()),
            ],
        )
        .await?;

        let payload = parsed.into_payload()?;
        tracing::info!(
            latitude = coords.latitude,
            longitude = coords.longitude,
            days = payload.daily.len(),
            hours = payload.hourly.len(),
            "forecast fetched"
        );
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minute_and_second_timestamps() {
        let a = parse_local_time("2025-08-05T14:15").unwrap();
        let b = parse_local_time("2025-08-05T14:15:00").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_garbage_timestamp() {
        let err = parse_local_time("yesterday").unwrap_err();
        assert!(err.to_string().contains("invalid timestamp"));
    }

    #[test]
    fn mismatched_columns_are_malformed() {
        let json = serde_json::json!({
            "current": {
                "time": "2025-08-05T14:00",
                "temperature_2m": 20.0,
                "apparent_temperature": 19.0,
                "relative_humidity_2m": 50.0,
                "precipitation": 0.0,
                "weather_code": 0,
                "wind_speed_10m": 5.0
            },
            "daily": {
                "time": ["2025-08-05", "2025-08-06"],
                "temperature_2m_max": [25.0],
                "temperature_2m_min": [15.0, 14.0],
                "precipitation_sum": [0.0, 0.0],
                "weather_code": [0, 1]
            },
            "hourly": { "time": [], "temperature_2m": [], "weather_code": [] }
        });

        let parsed: OmForecastResponse = serde_json::from_value(json).unwrap();
        let err = parsed.into_payload().unwrap_err();
        assert!(matches!(err, WeatherError::Malformed(_)));
        assert!(err.to_string().contains("daily.temperature_2m_max"));
    }

    #[test]
    fn null_samples_read_as_zero() {
        let json = serde_json::json!({
            "current": {
                "time": "2025-08-05T14:00",
                "temperature_2m": 20.0,
                "apparent_temperature": 19.0,
                "relative_humidity_2m": 50.0,
                "precipitation": 0.0,
                "weather_code": 3,
                "wind_speed_10m": 5.0
            },
            "daily": {
                "time": ["2025-08-05"],
                "temperature_2m_max": [25.0],
                "temperature_2m_min": [null],
                "precipitation_sum": [null],
                "weather_code": [61]
            },
            "hourly": {
                "time": ["2025-08-05T00:00", "2025-08-05T01:00"],
                "temperature_2m": [null, 16.5],
                "weather_code": [2, null]
            }
        });

        let parsed: OmForecastResponse = serde_json::from_value(json).unwrap();
        let payload = parsed.into_payload().unwrap();

        assert_eq!(payload.daily[0].temp_max_c, 25.0);
        assert_eq!(payload.daily[0].temp_min_c, 0.0);
        assert_eq!(payload.daily[0].precipitation_sum_mm, 0.0);
        assert_eq!(payload.hourly[0].temperature_c, 0.0);
        assert_eq!(payload.hourly[0].weather_code, 2);
        assert_eq!(payload.hourly[1].temperature_c, 16.5);
        assert_eq!(payload.hourly[1].weather_code, 0);
    }
}
