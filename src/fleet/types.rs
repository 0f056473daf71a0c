use crate::session::{VehicleIdentity, expiry_from_epoch};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which `data_request` endpoint to read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateKind {
    ClimateState,
    ChargeState,
    VehicleState,
}

impl StateKind {
    pub fn as_path(&self) -> &'static str {
        match self {
            Self::ClimateState => "climate_state",
            Self::ChargeState => "charge_state",
            Self::VehicleState => "vehicle_state",
        }
    }
}

impl std::fmt::Display for StateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_path())
    }
}

/// Epoch-like instant as sent by the auth service (number or numeric string)
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum EpochInstant {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl EpochInstant {
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        let raw = match self {
            Self::Integer(v) => Some(*v),
            #[allow(clippy::cast_possible_truncation)]
            Self::Float(v) if v.is_finite() => Some(v.trunc() as i64),
            Self::Float(_) => None,
            Self::Text(s) => s.trim().parse::<i64>().ok(),
        };
        raw.and_then(expiry_from_epoch)
    }
}

/// Success body of the token refresh endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_at: Option<EpochInstant>,
}

/// One entry of the vehicle list; the API sends `id_s`, a numeric `id`, or both
#[derive(Debug, Clone, Deserialize)]
pub struct VehicleRecord {
    #[serde(default)]
    pub id_s: Option<String>,
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl VehicleRecord {
    /// Prefer `id_s`; fall back to `id` rendered as a string
    pub fn vehicle_id(&self) -> Option<String> {
        if let Some(id) = self.id_s.as_deref().filter(|s| !s.is_empty()) {
            return Some(id.to_string());
        }
        match self.id.as_ref()? {
            serde_json::Value::Number(n) => Some(n.to_string()),
            serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
            _ => None,
        }
    }

    pub fn identity(&self) -> Option<VehicleIdentity> {
        let id = self.vehicle_id()?;
        let display_name = self
            .display_name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| format!("Vehicle {}", id));
        Some(VehicleIdentity { id, display_name })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct VehicleListResponse {
    #[serde(default)]
    pub response: Vec<VehicleRecord>,
}

/// `{response: {...}}` wrapper used by the data_request endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct StateEnvelope<T> {
    pub response: T,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommandResult {
    #[serde(default)]
    pub result: bool,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommandResponse {
    #[serde(default)]
    pub response: Option<CommandResult>,
}
