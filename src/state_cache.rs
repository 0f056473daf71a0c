//! Most recently fetched vehicle state
//!
//! Snapshots are decoded leniently: every field the API may omit (for
//! example while the car is asleep or on older firmware) defaults to `None`.

use serde::{Deserialize, Serialize};

pub use crate::fleet::StateKind;

/// `climate_state` payload (temperatures in Celsius)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClimateSnapshot {
    #[serde(default)]
    pub inside_temp: Option<f64>,
    #[serde(default)]
    pub outside_temp: Option<f64>,
    #[serde(default)]
    pub is_auto_conditioning_on: Option<bool>,
    #[serde(default)]
    pub driver_temp_setting: Option<f64>,
}

/// `charge_state` payload (distances in miles)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChargeSnapshot {
    #[serde(default)]
    pub battery_level: Option<f64>,
    #[serde(default)]
    pub ideal_battery_range: Option<f64>,
    #[serde(default)]
    pub charging_state: Option<String>,
    #[serde(default)]
    pub charge_rate: Option<f64>,
    /// Hours until full, fractional
    #[serde(default)]
    pub time_to_full_charge: Option<f64>,
}

impl ChargeSnapshot {
    pub fn is_charging(&self) -> bool {
        self.charging_state.as_deref() == Some("Charging")
    }
}

/// `vehicle_state` payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VehicleStateSnapshot {
    #[serde(default)]
    pub vehicle_name: Option<String>,
    #[serde(default)]
    pub locked: Option<bool>,
    /// Miles
    #[serde(default)]
    pub odometer: Option<f64>,
    #[serde(default)]
    pub car_version: Option<String>,
}

/// A decoded `data_request` response
#[derive(Debug, Clone, PartialEq)]
pub enum StateSnapshot {
    Climate(ClimateSnapshot),
    Charge(ChargeSnapshot),
    Vehicle(VehicleStateSnapshot),
}

impl StateSnapshot {
    pub fn kind(&self) -> StateKind {
        match self {
            Self::Climate(_) => StateKind::ClimateState,
            Self::Charge(_) => StateKind::ChargeState,
            Self::Vehicle(_) => StateKind::VehicleState,
        }
    }
}

/// Climate and charge snapshots, cleared around every command
#[derive(Debug, Clone, Default)]
pub struct RemoteStateCache {
    climate: Option<ClimateSnapshot>,
    charge: Option<ChargeSnapshot>,
}

impl RemoteStateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a freshly fetched snapshot. Vehicle info is not cached.
    pub fn record(&mut self, snapshot: &StateSnapshot) {
        match snapshot {
            StateSnapshot::Climate(c) => self.climate = Some(c.clone()),
            StateSnapshot::Charge(c) => self.charge = Some(c.clone()),
            StateSnapshot::Vehicle(_) => {}
        }
    }

    pub fn climate(&self) -> Option<&ClimateSnapshot> {
        self.climate.as_ref()
    }

    pub fn charge(&self) -> Option<&ChargeSnapshot> {
        self.charge.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.climate.is_none() && self.charge.is_none()
    }

    pub fn invalidate(&mut self) {
        self.climate = None;
        self.charge = None;
    }
}
