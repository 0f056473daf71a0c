//! OAuth session state for Sonic
//!
//! This module holds the token triple, the active vehicle identity, and the
//! `TokenStore` that mirrors both into the persistent key/value store.

use crate::error::Result;
use crate::logging::get_logger;
use crate::persistence::KeyValueStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";
pub const EXPIRES_AT_KEY: &str = "expires_at";
pub const VEHICLE_KEY: &str = "vehicle";
pub const SETTINGS_KEY: &str = "settings";

/// Epoch values below this are read as seconds, at or above as milliseconds
const EPOCH_MILLIS_THRESHOLD: i64 = 1_000_000_000_000;

/// Access/refresh token pair with its absolute expiry
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl Session {
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            access_token: Some(access_token.into()),
            refresh_token,
            expires_at,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none() && self.expires_at.is_none()
    }

    pub fn has_access_token(&self) -> bool {
        self.access_token.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// Whether the access token is missing, expired, or inside the safety margin.
    ///
    /// A token with no known expiry is taken as usable.
    pub fn needs_refresh(&self, now: DateTime<Utc>, margin: chrono::Duration) -> bool {
        if !self.has_access_token() {
            return true;
        }
        match self.expires_at {
            // An unrepresentable deadline counts as already reached
            Some(expires_at) => expires_at
                .checked_sub_signed(margin)
                .is_none_or(|deadline| now >= deadline),
            None => false,
        }
    }
}

/// Convert an epoch-like instant (seconds or milliseconds) to a timestamp
pub fn expiry_from_epoch(value: i64) -> Option<DateTime<Utc>> {
    if value <= 0 {
        None
    } else if value < EPOCH_MILLIS_THRESHOLD {
        DateTime::from_timestamp(value, 0)
    } else {
        DateTime::from_timestamp_millis(value)
    }
}

/// The single active vehicle of the account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleIdentity {
    pub id: String,
    pub display_name: String,
}

/// Mirrors session and vehicle identity into a key/value store
pub struct TokenStore {
    store: Box<dyn KeyValueStore>,
}

impl TokenStore {
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn load_session(&self) -> Session {
        let non_empty = |key: &str| self.store.get(key).filter(|v| !v.is_empty());
        Session {
            access_token: non_empty(ACCESS_TOKEN_KEY),
            refresh_token: non_empty(REFRESH_TOKEN_KEY),
            expires_at: non_empty(EXPIRES_AT_KEY)
                .and_then(|v| v.trim().parse::<i64>().ok())
                .and_then(expiry_from_epoch),
        }
    }

    pub fn save_session(&mut self, session: &Session) -> Result<()> {
        self.put(ACCESS_TOKEN_KEY, session.access_token.clone())?;
        self.put(REFRESH_TOKEN_KEY, session.refresh_token.clone())?;
        self.put(
            EXPIRES_AT_KEY,
            session.expires_at.map(|t| t.timestamp_millis().to_string()),
        )
    }

    pub fn load_vehicle(&self) -> Option<VehicleIdentity> {
        self.store
            .get(VEHICLE_KEY)
            .and_then(|raw| serde_json::from_str(&raw).ok())
    }

    pub fn save_vehicle(&mut self, vehicle: Option<&VehicleIdentity>) -> Result<()> {
        let raw = vehicle.map(serde_json::to_string).transpose()?;
        self.put(VEHICLE_KEY, raw)
    }

    /// Remove every persisted credential and the vehicle identity
    pub fn clear(&mut self) -> Result<()> {
        for key in [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, EXPIRES_AT_KEY, VEHICLE_KEY] {
            self.store.remove(key)?;
        }
        Ok(())
    }

    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    pub fn store_mut(&mut self) -> &mut dyn KeyValueStore {
        self.store.as_mut()
    }

    fn put(&mut self, key: &str, value: Option<String>) -> Result<()> {
        match value {
            Some(v) => self.store.set(key, &v),
            None => self.store.remove(key),
        }
    }
}

/// Process-wide session state, written only by the dispatcher during a cycle
pub struct SessionContext {
    session: Session,
    vehicle: Option<VehicleIdentity>,
    tokens: TokenStore,
    logger: crate::logging::StructuredLogger,
}

impl SessionContext {
    /// Restore session and vehicle from the store
    pub fn load(store: Box<dyn KeyValueStore>) -> Self {
        let tokens = TokenStore::new(store);
        let session = tokens.load_session();
        let vehicle = tokens.load_vehicle();
        let logger = get_logger("session");
        logger.info(&format!(
            "Restored session: access_token={}, refresh_token={}, vehicle={}",
            session.has_access_token(),
            session.refresh_token.is_some(),
            vehicle.as_ref().map_or("none", |v| v.id.as_str())
        ));
        Self {
            session,
            vehicle,
            tokens,
            logger,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn access_token(&self) -> Option<&str> {
        self.session.access_token.as_deref().filter(|t| !t.is_empty())
    }

    pub fn vehicle(&self) -> Option<&VehicleIdentity> {
        self.vehicle.as_ref()
    }

    /// Persist a complete new session, then make it current
    pub fn replace_session(&mut self, session: Session) -> Result<()> {
        if let Err(e) = self.tokens.save_session(&session) {
            // Put the previous triple back so the store never mixes two sessions
            if let Err(restore) = self.tokens.save_session(&self.session) {
                self.logger
                    .error(&format!("Failed to restore persisted session: {}", restore));
            }
            return Err(e);
        }
        self.session = session;
        Ok(())
    }

    pub fn set_vehicle(&mut self, vehicle: VehicleIdentity) -> Result<()> {
        self.tokens.save_vehicle(Some(&vehicle))?;
        self.vehicle = Some(vehicle);
        Ok(())
    }

    pub fn clear_vehicle(&mut self) {
        self.vehicle = None;
        if let Err(e) = self.tokens.save_vehicle(None) {
            self.logger
                .warn(&format!("Failed to remove persisted vehicle: {}", e));
        }
    }

    /// Drop session and vehicle, in memory and in the store. Idempotent.
    pub fn clear(&mut self) {
        self.session = Session::default();
        self.vehicle = None;
        if let Err(e) = self.tokens.clear() {
            self.logger
                .warn(&format!("Failed to clear persisted session: {}", e));
        }
    }

    pub fn store(&self) -> &dyn KeyValueStore {
        self.tokens.store()
    }

    pub fn store_mut(&mut self) -> &mut dyn KeyValueStore {
        self.tokens.store_mut()
    }
}
