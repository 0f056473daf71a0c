//! Watch menu entries
//!
//! The watch reports a numeric index when an entry is selected. Indices are
//! fixed by the watch app and grouped by screen: 0-9 climate, 10-19 charging,
//! 20-29 vehicle, 99 for the app-loaded signal.

use crate::dispatch::Intent;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuAction {
    /// Run these intents in order
    Dispatch(Vec<Intent>),
    /// Forget the vehicle and look it up again
    Reconnect,
    About,
    /// The watch app finished loading
    AppLoaded,
    Unknown(u32),
}

impl MenuAction {
    pub fn from_index(index: u32) -> Self {
        let single = |intent: Intent| Self::Dispatch(vec![intent]);
        match index {
            0 => single(Intent::command("auto_conditioning_start", "AC On")),
            1 => single(Intent::FetchClimate),
            10 => Self::Dispatch(vec![
                Intent::command("charge_port_door_open", "Charge port"),
                Intent::command("charge_start", "Start charging"),
            ]),
            11 => single(Intent::FetchCharge),
            12 => single(Intent::command("charge_stop", "Stop charging")),
            20 => single(Intent::command("door_lock", "Lock car")),
            21 => single(Intent::command("honk_horn", "Honk horn")),
            22 => single(Intent::command("flash_lights", "Flash lights")),
            23 => Self::Reconnect,
            24 => single(Intent::FetchVehicleInfo),
            25 => single(Intent::command("auto_conditioning_stop", "AC Off")),
            26 => Self::About,
            99 => Self::AppLoaded,
            other => Self::Unknown(other),
        }
    }
}

/// Body of the About notification
pub fn about_text() -> String {
    format!(
        "Sonic v{}\nControl your car from your wrist.",
        env!("APP_VERSION")
    )
}
