use std::collections::VecDeque;

/// A unit of remote work requested by the user or by startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    FetchClimate,
    FetchCharge,
    FetchVehicleInfo,
    /// Remote command by API name, with the label shown to the user
    Command { name: String, label: String },
    /// Action name nothing knows how to run; skipped with a warning
    Unsupported(String),
}

impl Intent {
    pub fn command(name: &str, label: &str) -> Self {
        Self::Command {
            name: name.to_string(),
            label: label.to_string(),
        }
    }

    /// Map a legacy action name onto an intent
    pub fn from_action_name(name: &str) -> Self {
        match name {
            "getClimateState" | "fetch_climate" => Self::FetchClimate,
            "getChargedState" | "getChargeState" | "fetch_charge" => Self::FetchCharge,
            "getVehicleInfo" | "getVehicleState" | "fetch_vehicle_info" => {
                Self::FetchVehicleInfo
            }
            "startAC" => Self::command("auto_conditioning_start", "AC On"),
            "stopAC" => Self::command("auto_conditioning_stop", "AC Off"),
            "openChargePort" => Self::command("charge_port_door_open", "Charge port"),
            "startCharging" => Self::command("charge_start", "Start charging"),
            "stopCharging" => Self::command("charge_stop", "Stop charging"),
            "lockCar" => Self::command("door_lock", "Lock car"),
            "honkHorn" => Self::command("honk_horn", "Honk horn"),
            "flashLights" => Self::command("flash_lights", "Flash lights"),
            other => Self::Unsupported(other.to_string()),
        }
    }

    /// Label of a command, used to title its result notifications
    pub fn label(&self) -> Option<&str> {
        match self {
            Self::Command { label, .. } => Some(label),
            _ => None,
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FetchClimate => f.write_str("fetch_climate"),
            Self::FetchCharge => f.write_str("fetch_charge"),
            Self::FetchVehicleInfo => f.write_str("fetch_vehicle_info"),
            Self::Command { name, .. } => write!(f, "command:{}", name),
            Self::Unsupported(name) => write!(f, "unsupported:{}", name),
        }
    }
}

/// Ordered intents awaiting execution, consumed front to back
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingQueue {
    items: VecDeque<Intent>,
}

impl PendingQueue {
    pub fn pop_front(&mut self) -> Option<Intent> {
        self.items.pop_front()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Remove and return everything still queued
    pub fn drain(&mut self) -> Vec<Intent> {
        self.items.drain(..).collect()
    }
}

impl FromIterator<Intent> for PendingQueue {
    fn from_iter<I: IntoIterator<Item = Intent>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl From<Vec<Intent>> for PendingQueue {
    fn from(items: Vec<Intent>) -> Self {
        Self {
            items: items.into(),
        }
    }
}
