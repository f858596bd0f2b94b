//! Display units and the conversions applied to forecast values.
//!
//! Forecast payloads are always requested in metric units (°C, km/h, mm);
//! conversion to the user's units happens at presentation time, so switching
//! units never needs another network round trip.

use serde::{Deserialize, Serialize};
use std::{convert::TryFrom, fmt};

const MPH_PER_KMH: f64 = 0.621371;
const MM_PER_INCH: f64 = 25.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TemperatureUnit {
    #[default]
    #[serde(rename = "C")]
    Celsius,
    #[serde(rename = "F")]
    Fahrenheit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WindUnit {
    #[default]
    #[serde(rename = "kmh")]
    KmH,
    #[serde(rename = "mph")]
    Mph,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PrecipitationUnit {
    #[default]
    #[serde(rename = "mm")]
    Mm,
    #[serde(rename = "in")]
    Inch,
}

impl TemperatureUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "C",
            TemperatureUnit::Fahrenheit => "F",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "°C",
            TemperatureUnit::Fahrenheit => "°F",
        }
    }

    pub const fn all() -> &'static [TemperatureUnit] {
        &[TemperatureUnit::Celsius, TemperatureUnit::Fahrenheit]
    }
}

impl WindUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            WindUnit::KmH => "kmh",
            WindUnit::Mph => "mph",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            WindUnit::KmH => "km/h",
            WindUnit::Mph => "mph",
        }
    }

    pub const fn all() -> &'static [WindUnit] {
        &[WindUnit::KmH, WindUnit::Mph]
    }
}

impl PrecipitationUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrecipitationUnit::Mm => "mm",
            PrecipitationUnit::Inch => "in",
        }
    }

    pub fn symbol(&self) -> &'static str {
        self.as_str()
    }

    pub const fn all() -> &'static [PrecipitationUnit] {
        &[PrecipitationUnit::Mm, PrecipitationUnit::Inch]
    }
}

impl fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl fmt::Display for WindUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl fmt::Display for PrecipitationUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl TryFrom<&str> for TemperatureUnit {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "c" | "°c" | "celsius" => Ok(TemperatureUnit::Celsius),
            "f" | "°f" | "fahrenheit" => Ok(TemperatureUnit::Fahrenheit),
            _ => Err(anyhow::anyhow!(
                "Unknown temperature unit '{value}'. Supported units: C, F."
            )),
        }
    }
}

impl TryFrom<&str> for WindUnit {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "kmh" | "km/h" | "kph" => Ok(WindUnit::KmH),
            "mph" => Ok(WindUnit::Mph),
            _ => Err(anyhow::anyhow!("Unknown wind unit '{value}'. Supported units: kmh, mph.")),
        }
    }
}

impl TryFrom<&str> for PrecipitationUnit {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "mm" | "millimeters" => Ok(PrecipitationUnit::Mm),
            "in" | "inch" | "inches" => Ok(PrecipitationUnit::Inch),
            _ => Err(anyhow::anyhow!(
                "Unknown precipitation unit '{value}'. Supported units: mm, in."
            )),
        }
    }
}

/// The user's chosen display units. Always a complete triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UnitSettings {
    pub temperature: TemperatureUnit,
    pub wind: WindUnit,
    pub precipitation: PrecipitationUnit,
}

/// Partial update merged into [`UnitSettings`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UnitSettingsPatch {
    pub temperature: Option<TemperatureUnit>,
    pub wind: Option<WindUnit>,
    pub precipitation: Option<PrecipitationUnit>,
}

impl UnitSettingsPatch {
    pub fn is_empty(&self) -> bool {
        self.temperature.is_none() && self.wind.is_none() && self.precipitation.is_none()
    }
}

impl UnitSettings {
    pub fn merge(self, patch: UnitSettingsPatch) -> Self {
        Self {
            temperature: patch.temperature.unwrap_or(self.temperature),
            wind: patch.wind.unwrap_or(self.wind),
            precipitation: patch.precipitation.unwrap_or(self.precipitation),
        }
    }

    /// Which system the triple corresponds to, if it is not a mix.
    pub fn system(&self) -> Option<UnitSystem> {
        UnitSystem::all()
            .iter()
            .copied()
            .find(|system| system.settings() == *self)
    }
}

/// Combined metric/imperial toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitSystem {
    Metric,
    Imperial,
}

impl UnitSystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "metric",
            UnitSystem::Imperial => "imperial",
        }
    }

    pub const fn all() -> &'static [UnitSystem] {
        &[UnitSystem::Metric, UnitSystem::Imperial]
    }

    pub fn settings(&self) -> UnitSettings {
        match self {
            UnitSystem::Metric => UnitSettings::default(),
            UnitSystem::Imperial => UnitSettings {
                temperature: TemperatureUnit::Fahrenheit,
                wind: WindUnit::Mph,
                precipitation: PrecipitationUnit::Inch,
            },
        }
    }

    pub fn patch(&self) -> UnitSettingsPatch {
        let settings = self.settings();
        UnitSettingsPatch {
            temperature: Some(settings.temperature),
            wind: Some(settings.wind),
            precipitation: Some(settings.precipitation),
        }
    }
}

impl fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for UnitSystem {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "metric" => Ok(UnitSystem::Metric),
            "imperial" => Ok(UnitSystem::Imperial),
            _ => Err(anyhow::anyhow!(
                "Unknown unit system '{value}'. Supported systems: metric, imperial."
            )),
        }
    }
}

/// Convert a Celsius reading; rounding happens after conversion.
pub fn celsius_to(celsius: f64, unit: TemperatureUnit) -> i64 {
    let value = match unit {
        TemperatureUnit::Celsius => celsius,
        TemperatureUnit::Fahrenheit => celsius * 9.0 / 5.0 + 32.0,
    };
    value.round() as i64
}

pub fn kmh_to(kmh: f64, unit: WindUnit) -> i64 {
    let value = match unit {
        WindUnit::KmH => kmh,
        WindUnit::Mph => kmh * MPH_PER_KMH,
    };
    value.round() as i64
}

/// Millimetres are rounded to whole numbers, inches keep two decimals.
pub fn format_precipitation(mm: f64, unit: PrecipitationUnit) -> String {
    match unit {
        PrecipitationUnit::Mm => format!("{}", mm.round() as i64),
        PrecipitationUnit::Inch => format!("{:.2}", mm / MM_PER_INCH),
    }
}
