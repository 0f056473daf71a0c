//! Human-readable summaries and compact status strings

use crate::error::SonicError;
use crate::settings::Settings;
use crate::state_cache::{ChargeSnapshot, ClimateSnapshot, VehicleStateSnapshot};

const PLACEHOLDER: &str = "--";

#[allow(clippy::cast_possible_truncation)]
fn rounded(value: Option<f64>) -> String {
    value
        .filter(|v| v.is_finite())
        .map_or_else(|| PLACEHOLDER.to_string(), |v| (v.round() as i64).to_string())
}

/// Pop-up body for a climate fetch
pub fn climate_summary(climate: &ClimateSnapshot, settings: &Settings) -> String {
    let unit = settings.temperature_unit.label();
    let ac = match climate.is_auto_conditioning_on {
        Some(true) => "ON",
        Some(false) => "OFF",
        None => PLACEHOLDER,
    };
    format!(
        "AC: {}\nInside: {}\u{00B0}{}\nOutside: {}\u{00B0}{}",
        ac,
        rounded(climate.inside_temp.map(|t| settings.temperature(t))),
        unit,
        rounded(climate.outside_temp.map(|t| settings.temperature(t))),
        unit
    )
}

/// `"inside/outside"` in Celsius, as the watch expects
pub fn climate_status(climate: &ClimateSnapshot) -> String {
    format!(
        "{}/{}",
        rounded(climate.inside_temp),
        rounded(climate.outside_temp)
    )
}

/// Pop-up body for a charge fetch
pub fn charge_summary(charge: &ChargeSnapshot, settings: &Settings) -> String {
    let unit = settings.distance_unit.label();
    let mut msg = format!(
        "Battery: {}%\nRange: {} {}\nState: {}",
        rounded(charge.battery_level),
        rounded(charge.ideal_battery_range.map(|r| settings.distance(r))),
        unit,
        charge.charging_state.as_deref().unwrap_or(PLACEHOLDER)
    );

    if charge.is_charging() {
        msg.push_str(&format!(
            "\nRate: {} {}/hr",
            rounded(charge.charge_rate.map(|r| settings.distance(r))),
            unit
        ));
        if let Some(hours) = charge.time_to_full_charge.filter(|h| *h > 0.0) {
            let (h, m) = split_hours(hours);
            msg.push_str(&format!("\nTime left: {}h {}m", h, m));
        }
    }
    msg
}

/// `"80% 350km Charging"`
pub fn charge_status(charge: &ChargeSnapshot, settings: &Settings) -> String {
    format!(
        "{}% {}{} {}",
        rounded(charge.battery_level),
        rounded(charge.ideal_battery_range.map(|r| settings.distance(r))),
        settings.distance_unit.label(),
        charge.charging_state.as_deref().unwrap_or(PLACEHOLDER)
    )
}

/// Pop-up body for the car info entry
pub fn vehicle_summary(state: &VehicleStateSnapshot, settings: &Settings) -> String {
    let doors = match state.locked {
        Some(true) => "Locked",
        Some(false) => "Unlocked",
        None => PLACEHOLDER,
    };
    format!(
        "{}\nDoors: {}\nOdometer: {} {}\nSoftware: {}",
        state.vehicle_name.as_deref().unwrap_or(PLACEHOLDER),
        doors,
        rounded(state.odometer.map(|o| settings.distance(o))),
        settings.distance_unit.label(),
        state.car_version.as_deref().unwrap_or(PLACEHOLDER)
    )
}

#[allow(clippy::cast_possible_truncation)]
fn split_hours(hours: f64) -> (i64, i64) {
    let whole = hours.floor();
    let mut h = whole as i64;
    let mut m = ((hours - whole) * 60.0).round() as i64;
    if m == 60 {
        h += 1;
        m = 0;
    }
    (h, m)
}

/// Title and body of the single notification a failed cycle produces.
///
/// `label` is the display label of the command that failed, if any.
pub fn error_notification(err: &SonicError, label: Option<&str>) -> (String, String) {
    let titled = |fallback: &str| label.map_or_else(|| fallback.to_string(), str::to_string);
    match err {
        SonicError::NoRefreshToken => (
            "Auth Error".into(),
            "Please re-authenticate in Settings.".into(),
        ),
        SonicError::SessionExpired | SonicError::Auth { .. } => (
            "Auth Error".into(),
            "Session expired. Please re-authenticate in Settings.".into(),
        ),
        SonicError::Network { .. } => (
            "Network Error".into(),
            if label.is_some() {
                "Could not send command.".into()
            } else {
                "Could not connect. Check your connection.".into()
            },
        ),
        SonicError::NoVehicles => (
            "No Vehicles".into(),
            "No vehicles found on your account.".into(),
        ),
        SonicError::NoVehicle => ("Error".into(), "No vehicle selected.".into()),
        SonicError::Parse { .. } => ("Error".into(), "Failed to parse vehicle data.".into()),
        SonicError::VehicleAsleep => (
            titled("Vehicle"),
            "Vehicle is asleep. Try waking it first.".into(),
        ),
        SonicError::Rejected { reason } => (titled("Command"), format!("Failed: {}", reason)),
        SonicError::Remote { status } => (titled("Error"), format!("Failed: {}", status)),
        other => ("Error".into(), other.to_string()),
    }
}
