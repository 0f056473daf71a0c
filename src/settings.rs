//! Display unit preferences chosen on the settings page
//!
//! The page stores its form as a JSON blob under the `settings` key, e.g.
//! `{"unitOfDistance": "km", "unitOfTemperature": "C"}`.

use crate::error::Result;
use crate::logging::get_logger;
use crate::persistence::KeyValueStore;
use crate::session::SETTINGS_KEY;
use serde::{Deserialize, Serialize};

const KM_PER_MILE: f64 = 1.60934;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DistanceUnit {
    #[default]
    #[serde(rename = "km")]
    Kilometers,
    #[serde(rename = "mi")]
    Miles,
}

impl DistanceUnit {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Kilometers => "km",
            Self::Miles => "mi",
        }
    }

    /// Multiplier from API miles to this unit
    pub fn factor(&self) -> f64 {
        match self {
            Self::Kilometers => KM_PER_MILE,
            Self::Miles => 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TemperatureUnit {
    #[default]
    #[serde(rename = "C")]
    Celsius,
    #[serde(rename = "F")]
    Fahrenheit,
}

impl TemperatureUnit {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Celsius => "C",
            Self::Fahrenheit => "F",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Settings {
    pub distance_unit: DistanceUnit,
    pub temperature_unit: TemperatureUnit,
}

/// Form fields as the settings page names them
#[derive(Debug, Default, Deserialize)]
struct SettingsBlob {
    #[serde(default, rename = "unitOfDistance")]
    unit_of_distance: Option<String>,
    #[serde(default, rename = "unitOfTemperature")]
    unit_of_temperature: Option<String>,
}

impl Settings {
    /// Parse the settings blob.
    ///
    /// Distances stay in API miles unless the unit is absent or `km`; an
    /// unknown temperature unit falls back to Celsius.
    pub fn from_blob(raw: &str) -> Result<Self> {
        let blob: SettingsBlob = serde_json::from_str(raw)?;
        let distance_unit = match blob.unit_of_distance.as_deref().map(str::trim) {
            None | Some("" | "km") => DistanceUnit::Kilometers,
            Some(_) => DistanceUnit::Miles,
        };
        let temperature_unit = match blob.unit_of_temperature.as_deref().map(str::trim) {
            Some("F" | "f") => TemperatureUnit::Fahrenheit,
            _ => TemperatureUnit::Celsius,
        };
        Ok(Self {
            distance_unit,
            temperature_unit,
        })
    }

    /// Load from the store, using defaults when absent or unreadable
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let Some(raw) = store.get(SETTINGS_KEY) else {
            return Self::default();
        };
        Self::from_blob(&raw).unwrap_or_else(|e| {
            get_logger("settings").warn(&format!("Failed to parse settings: {}", e));
            Self::default()
        })
    }

    /// Convert an API distance (miles) to the preferred unit
    pub fn distance(&self, miles: f64) -> f64 {
        miles * self.distance_unit.factor()
    }

    /// Convert an API temperature (Celsius) to the preferred unit
    pub fn temperature(&self, celsius: f64) -> f64 {
        match self.temperature_unit {
            TemperatureUnit::Celsius => celsius,
            TemperatureUnit::Fahrenheit => celsius * 9.0 / 5.0 + 32.0,
        }
    }
}
