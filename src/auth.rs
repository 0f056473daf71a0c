//! Token lifecycle management for Sonic
//!
//! Expiry is checked proactively before every remote call: the common case
//! is a single clock comparison, and a refresh happens only inside the
//! safety margin. A rejected refresh discards the whole session; a transport
//! failure leaves it untouched so the user can simply try again.

use crate::error::{Result, SonicError};
use crate::fleet::{FleetTransport, RefreshResponse};
use crate::logging::get_logger;
use crate::session::{Session, SessionContext};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Default lead time before expiry at which a refresh is triggered
pub const DEFAULT_REFRESH_MARGIN_SECS: i64 = 5 * 60;

pub struct TokenManager {
    transport: Arc<dyn FleetTransport>,
    margin: chrono::Duration,
    logger: crate::logging::StructuredLogger,
}

impl TokenManager {
    pub fn new(transport: Arc<dyn FleetTransport>, margin: chrono::Duration) -> Self {
        Self {
            transport,
            margin,
            logger: get_logger("auth"),
        }
    }

    /// Make sure the access token is usable now, refreshing if needed
    pub async fn ensure_valid(&self, ctx: &mut SessionContext) -> Result<()> {
        self.ensure_valid_at(ctx, Utc::now()).await
    }

    /// As `ensure_valid`, against an explicit clock reading
    pub async fn ensure_valid_at(&self, ctx: &mut SessionContext, now: DateTime<Utc>) -> Result<()> {
        if !ctx.session().needs_refresh(now, self.margin) {
            return Ok(());
        }
        self.logger.info("Token expired or expiring soon, refreshing");
        self.refresh(ctx).await
    }

    /// Exchange the refresh token for a new session.
    ///
    /// - no refresh token: `NoRefreshToken`, session unchanged
    /// - non-2xx: session invalidated, `SessionExpired`
    /// - transport failure: session unchanged, `Network`
    /// - 2xx with an unreadable body: session unchanged, `Parse`
    pub async fn refresh(&self, ctx: &mut SessionContext) -> Result<()> {
        let Some(refresh_token) = ctx
            .session()
            .refresh_token
            .clone()
            .filter(|t| !t.is_empty())
        else {
            self.logger.warn("No refresh token available");
            return Err(SonicError::NoRefreshToken);
        };

        let reply = match self.transport.refresh(&refresh_token).await {
            Ok(reply) => reply,
            Err(e) => {
                self.logger
                    .warn(&format!("Token refresh transport failure: {}", e));
                return Err(e);
            }
        };

        if !reply.is_success() {
            self.logger
                .warn(&format!("Token refresh rejected: HTTP {}", reply.status));
            self.invalidate(ctx);
            return Err(SonicError::SessionExpired);
        }

        let body: RefreshResponse = reply.json()?;
        if body.access_token.is_empty() {
            return Err(SonicError::parse("Refresh response carried an empty access token"));
        }

        // Build the complete replacement before touching the context
        let session = Session {
            access_token: Some(body.access_token),
            refresh_token: body
                .refresh_token
                .filter(|t| !t.is_empty())
                .or(Some(refresh_token)),
            expires_at: body.expires_at.as_ref().and_then(|e| e.to_datetime()),
        };
        let expires_at = session.expires_at;
        ctx.replace_session(session)?;

        self.logger.info(&format!(
            "Token refreshed successfully, expires_at={}",
            expires_at.map_or_else(|| "unknown".to_string(), |t| t.to_rfc3339())
        ));
        Ok(())
    }

    /// Forget session and vehicle, including persisted copies. Idempotent.
    pub fn invalidate(&self, ctx: &mut SessionContext) {
        ctx.clear();
        self.logger.info("Session invalidated");
    }
}
