//! Vehicle resolution for Sonic
//!
//! The account's vehicle list is fetched only when no vehicle identity is
//! held. The first vehicle becomes the active one and is persisted so later
//! runs skip the lookup.

use crate::auth::TokenManager;
use crate::display::DisplaySink;
use crate::error::{Result, SonicError};
use crate::fleet::{FleetTransport, VehicleListResponse};
use crate::logging::get_logger;
use crate::session::{SessionContext, VehicleIdentity};
use std::sync::Arc;

pub struct VehicleResolver {
    transport: Arc<dyn FleetTransport>,
    tokens: Arc<TokenManager>,
    logger: crate::logging::StructuredLogger,
}

impl VehicleResolver {
    pub fn new(transport: Arc<dyn FleetTransport>, tokens: Arc<TokenManager>) -> Self {
        Self {
            transport,
            tokens,
            logger: get_logger("vehicle"),
        }
    }

    /// Look up the account's vehicles and select the first one.
    ///
    /// Announces the selection on the display. A 401 invalidates the
    /// session; every other failure leaves the context as it was.
    pub async fn resolve(
        &self,
        ctx: &mut SessionContext,
        display: &DisplaySink,
    ) -> Result<VehicleIdentity> {
        let access_token = ctx
            .access_token()
            .ok_or_else(|| SonicError::auth("No access token for vehicle lookup"))?
            .to_string();

        let reply = self.transport.list_vehicles(&access_token).await?;
        if reply.is_unauthorized() {
            self.tokens.invalidate(ctx);
            return Err(SonicError::auth("Vehicle list rejected the access token"));
        }
        if !reply.is_success() {
            self.logger
                .warn(&format!("Vehicle list failed: HTTP {}", reply.status));
            return Err(SonicError::remote(reply.status));
        }

        let list: VehicleListResponse = reply.json()?;
        let total = list.response.len();
        let Some(first) = list.response.first() else {
            self.logger.warn("Account has no vehicles");
            return Err(SonicError::NoVehicles);
        };
        let identity = first
            .identity()
            .ok_or_else(|| SonicError::parse("First vehicle carries no id"))?;

        ctx.set_vehicle(identity.clone())?;
        self.logger.info(&format!(
            "Selected vehicle {} ({}) of {}",
            identity.id, identity.display_name, total
        ));

        if total > 1 {
            display.notify(
                "Vehicles",
                format!(
                    "Found {} vehicles. Using: {}",
                    total, identity.display_name
                ),
            );
        } else {
            display.notify("Vehicle Found", identity.display_name.clone());
        }
        Ok(identity)
    }
}
