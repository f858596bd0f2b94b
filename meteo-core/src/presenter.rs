//! Turns a forecast payload and unit settings into render-ready view data.

use chrono::NaiveTime;

use crate::{
    model::{ForecastPayload, HourlyEntry},
    search::SearchState,
    units::{UnitSettings, celsius_to, format_precipitation, kmh_to},
};

pub const NO_RESULTS: &str = "No results found";
pub const SEARCH_FAILED: &str = "Error fetching results";
pub const SEARCH_IN_PROGRESS: &str = "Search in progress";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WeatherIcon {
    Sunny,
    PartlyCloudy,
    Overcast,
    Fog,
    Rain,
    Snow,
}

impl WeatherIcon {
    /// Map a WMO weather code. Codes outside the table (drizzle variants,
    /// thunderstorms, ...) fall back to `Sunny`.
    pub fn from_code(code: i32) -> Self {
        match code {
            0 | 1 => WeatherIcon::Sunny,
            2 => WeatherIcon::PartlyCloudy,
            3 => WeatherIcon::Overcast,
            45 | 48 => WeatherIcon::Fog,
            51 | 61 | 80 => WeatherIcon::Rain,
            71 | 85 => WeatherIcon::Snow,
            _ => {
                tracing::debug!(code, "unmapped weather code, using sunny icon");
                WeatherIcon::Sunny
            }
        }
    }

    pub fn asset(&self) -> &'static str {
        match self {
            WeatherIcon::Sunny => "icon-sunny.webp",
            WeatherIcon::PartlyCloudy => "icon-partly-cloudy.webp",
            WeatherIcon::Overcast => "icon-overcast.webp",
            WeatherIcon::Fog => "icon-fog.webp",
            WeatherIcon::Rain => "icon-rain.webp",
            WeatherIcon::Snow => "icon-snow.webp",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            WeatherIcon::Sunny => "Sunny",
            WeatherIcon::PartlyCloudy => "Partly cloudy",
            WeatherIcon::Overcast => "Overcast",
            WeatherIcon::Fog => "Fog",
            WeatherIcon::Rain => "Rain",
            WeatherIcon::Snow => "Snow",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeaderView {
    pub location: String,
    pub date: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CurrentView {
    pub temperature: String,
    pub feels_like: String,
    pub humidity: String,
    pub wind: String,
    pub precipitation: String,
    pub icon: WeatherIcon,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayView {
    pub weekday: String,
    pub max: String,
    pub min: String,
    pub precipitation: String,
    pub icon: WeatherIcon,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HourView {
    pub label: String,
    pub temperature: String,
    pub icon: WeatherIcon,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForecastView {
    pub header: HeaderView,
    pub current: CurrentView,
    pub days: Vec<DayView>,
    /// Long weekday names for the hourly day selector.
    pub day_options: Vec<String>,
    pub selected_day: usize,
    pub hours: Vec<HourView>,
    pub units: UnitSettings,
}

/// What the suggestion list under the search box shows.
#[derive(Debug, Clone, PartialEq)]
pub enum SuggestionsView {
    Hidden,
    Loading(&'static str),
    Items(Vec<String>),
    Message(&'static str),
}

fn degrees(value: i64) -> String {
    format!("{value}°")
}

/// Hourly entries inside day `day`: `[daily[day], daily[day + 1])`, or up to
/// and including the last hourly timestamp for the final day.
pub fn hours_for_day(payload: &ForecastPayload, day: usize) -> Vec<&HourlyEntry> {
    let Some(entry) = payload.daily.get(day) else {
        return Vec::new();
    };
    let start = entry.date.and_time(NaiveTime::MIN);

    match payload.daily.get(day + 1) {
        Some(next) => {
            let end = next.date.and_time(NaiveTime::MIN);
            payload.hourly.iter().filter(|h| h.time >= start && h.time < end).collect()
        }
        None => {
            let Some(last) = payload.hourly.iter().map(|h| h.time).max() else {
                return Vec::new();
            };
            payload.hourly.iter().filter(|h| h.time >= start && h.time <= last).collect()
        }
    }
}

pub fn present(
    payload: &ForecastPayload,
    location: &str,
    units: UnitSettings,
    day: usize,
) -> ForecastView {
    let current = &payload.current;
    let selected_day = day.min(payload.daily.len().saturating_sub(1));

    let header = HeaderView {
        location: location.to_string(),
        date: current.time.format("%A, %b %-d, %Y").to_string(),
    };

    let current_view = CurrentView {
        temperature: degrees(celsius_to(current.temperature_c, units.temperature)),
        feels_like: format!(
            "{}{}",
            celsius_to(current.apparent_temperature_c, units.temperature),
            units.temperature.symbol()
        ),
        humidity: format!("{}%", current.humidity_pct.round() as i64),
        wind: format!("{} {}", kmh_to(current.wind_speed_kmh, units.wind), units.wind.symbol()),
        precipitation: format!(
            "{} {}",
            format_precipitation(current.precipitation_mm, units.precipitation),
            units.precipitation.symbol()
        ),
        icon: WeatherIcon::from_code(current.weather_code),
    };

    let days = payload
        .daily
        .iter()
        .map(|d| DayView {
            weekday: d.date.format("%a").to_string(),
            max: degrees(celsius_to(d.temp_max_c, units.temperature)),
            min: degrees(celsius_to(d.temp_min_c, units.temperature)),
            precipitation: format!(
                "{} {}",
                format_precipitation(d.precipitation_sum_mm, units.precipitation),
                units.precipitation.symbol()
            ),
            icon: WeatherIcon::from_code(d.weather_code),
        })
        .collect();

    let day_options = payload.daily.iter().map(|d| d.date.format("%A").to_string()).collect();

    let hours = hours_for_day(payload, selected_day)
        .into_iter()
        .map(|h| HourView {
            label: h.time.format("%-I %p").to_string(),
            temperature: degrees(celsius_to(h.temperature_c, units.temperature)),
            icon: WeatherIcon::from_code(h.weather_code),
        })
        .collect();

    ForecastView {
        header,
        current: current_view,
        days,
        day_options,
        selected_day,
        hours,
        units,
    }
}

pub fn present_suggestions(state: &SearchState) -> SuggestionsView {
    match state {
        SearchState::Idle => SuggestionsView::Hidden,
        SearchState::Querying { .. } => SuggestionsView::Loading(SEARCH_IN_PROGRESS),
        SearchState::Showing(candidates) if candidates.is_empty() => {
            SuggestionsView::Message(NO_RESULTS)
        }
        SearchState::Showing(candidates) => {
            SuggestionsView::Items(candidates.iter().map(|c| c.display_name.clone()).collect())
        }
        SearchState::Error(_) => SuggestionsView::Message(SEARCH_FAILED),
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    use crate::model::{CurrentConditions, DailyEntry, ForecastPayload, HourlyEntry};

    pub fn day(n: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, 5).unwrap() + Duration::days(n)
    }

    pub fn at(day_offset: i64, hour: u32) -> NaiveDateTime {
        day(day_offset).and_hms_opt(hour, 0, 0).unwrap()
    }

    /// Three days starting Tuesday 2025-08-05 with 72 hourly entries.
    pub fn payload() -> ForecastPayload {
        let daily = (0..3)
            .map(|i| DailyEntry {
                date: day(i),
                temp_max_c: 25.0 + i as f64,
                temp_min_c: 15.0 - i as f64,
                precipitation_sum_mm: 2.6,
                weather_code: [0, 61, 99][i as usize],
            })
            .collect();

        let hourly = (0..72)
            .map(|h| HourlyEntry {
                time: at(0, 0) + Duration::hours(h),
                temperature_c: 10.0 + (h % 24) as f64 * 0.5,
                weather_code: 3,
            })
            .collect();

        ForecastPayload {
            current: CurrentConditions {
                time: day(0).and_hms_opt(14, 15, 0).unwrap(),
                temperature_c: 21.7,
                apparent_temperature_c: 20.2,
                humidity_pct: 64.6,
                precipitation_mm: 1.0,
                wind_speed_kmh: 16.0,
                weather_code: 2,
            },
            daily,
            hourly,
        }
    }
}
