//! Remote API boundary for Sonic
//!
//! The companion talks to two services: the auth service that exchanges
//! refresh tokens, and the vehicle Fleet API. Both sit behind
//! `FleetTransport` so the session and dispatch layers can be driven by a
//! scripted transport in tests.

pub mod client;
#[cfg(test)]
pub(crate) mod testing;
pub mod types;

pub use client::FleetClient;
pub use types::{
    CommandResponse, CommandResult, EpochInstant, RefreshResponse, StateEnvelope, StateKind,
    VehicleListResponse, VehicleRecord,
};

use crate::error::{Result, SonicError};
use serde::de::DeserializeOwned;

/// Status and raw body of any HTTP response the remote produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }

    /// Decode the body, mapping failures to `Parse`
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.body).map_err(|e| SonicError::parse(e.to_string()))
    }
}

/// Remote calls issued by the companion.
///
/// Every HTTP response, whatever its status, is returned as `Ok(HttpReply)`;
/// `Err` is reserved for transport failures (`SonicError::Network`).
#[async_trait::async_trait]
pub trait FleetTransport: Send + Sync {
    /// `POST <auth>/api/tesla/auth/refresh` with `{refresh_token}`
    async fn refresh(&self, refresh_token: &str) -> Result<HttpReply>;

    /// `GET <api>/api/1/vehicles`
    async fn list_vehicles(&self, access_token: &str) -> Result<HttpReply>;

    /// `GET <api>/api/1/vehicles/{id}/data_request/{kind}`
    async fn fetch_state(
        &self,
        access_token: &str,
        vehicle_id: &str,
        kind: StateKind,
    ) -> Result<HttpReply>;

    /// `POST <api>/api/1/vehicles/{id}/command/{name}`
    async fn send_command(
        &self,
        access_token: &str,
        vehicle_id: &str,
        command: &str,
    ) -> Result<HttpReply>;
}
