use super::Intent;
use crate::error::SonicError;

/// Whether a dispatch was requested by the user or runs in the background
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    /// Startup refresh: fetch results update status strings only
    Passive,
    /// User-triggered: every result is also shown as a notification
    Active,
}

impl DispatchMode {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

/// Where the dispatcher currently is in a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchStage {
    #[default]
    Idle,
    TokenCheck,
    VehicleCheck,
    Executing,
    /// Last cycle stopped on an error; the next dispatch starts over
    Failed,
}

/// What one dispatch cycle did
#[derive(Debug, Default)]
pub struct DispatchReport {
    pub cycle_id: String,
    /// Intents that ran to completion, in order
    pub completed: Vec<Intent>,
    /// Unsupported intents passed over
    pub skipped: Vec<Intent>,
    /// Intents discarded after the cycle stopped early
    pub dropped: Vec<Intent>,
    pub error: Option<SonicError>,
}

impl DispatchReport {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}
