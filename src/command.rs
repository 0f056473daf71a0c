//! Remote command execution
//!
//! A command reply is classified into a `CommandOutcome` by status code and
//! body. Commands are never retried here: a 408 means the car is asleep and
//! the user decides whether to wake it.

use crate::auth::TokenManager;
use crate::error::{Result, SonicError};
use crate::fleet::{CommandResponse, FleetTransport, HttpReply};
use crate::logging::get_logger;
use crate::session::SessionContext;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// 2xx with `response.result == true`
    Success,
    /// 2xx whose body could not be read; the car may or may not have acted
    Unconfirmed,
    /// 2xx with `response.result == false` or no `response` at all
    Rejected { reason: String },
    /// 408
    VehicleAsleep,
    /// Any other non-2xx
    RemoteError { status: u16 },
}

impl CommandOutcome {
    pub fn classify(reply: &HttpReply) -> Self {
        if reply.status == 408 {
            return Self::VehicleAsleep;
        }
        if !reply.is_success() {
            return Self::RemoteError {
                status: reply.status,
            };
        }
        let Ok(parsed) = reply.json::<CommandResponse>() else {
            return Self::Unconfirmed;
        };
        match parsed.response {
            Some(result) if result.result => Self::Success,
            other => Self::Rejected {
                reason: other
                    .and_then(|r| r.reason)
                    .filter(|r| !r.is_empty())
                    .unwrap_or_else(|| "Unknown error".to_string()),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// The error a non-successful outcome aborts the queue with
    pub fn to_error(&self) -> Option<SonicError> {
        match self {
            Self::Success | Self::Unconfirmed => None,
            Self::Rejected { reason } => Some(SonicError::rejected(reason.clone())),
            Self::VehicleAsleep => Some(SonicError::VehicleAsleep),
            Self::RemoteError { status } => Some(SonicError::remote(*status)),
        }
    }
}

pub struct CommandExecutor {
    transport: Arc<dyn FleetTransport>,
    tokens: Arc<TokenManager>,
    logger: crate::logging::StructuredLogger,
}

impl CommandExecutor {
    pub fn new(transport: Arc<dyn FleetTransport>, tokens: Arc<TokenManager>) -> Self {
        Self {
            transport,
            tokens,
            logger: get_logger("command"),
        }
    }

    /// Send one named command to the active vehicle
    pub async fn execute(&self, ctx: &mut SessionContext, command: &str) -> Result<CommandOutcome> {
        let vehicle_id = ctx.vehicle().ok_or(SonicError::NoVehicle)?.id.clone();
        let access_token = ctx
            .access_token()
            .ok_or_else(|| SonicError::auth("No access token for command"))?
            .to_string();

        self.logger
            .info(&format!("Sending {} to vehicle {}", command, vehicle_id));
        let reply = self
            .transport
            .send_command(&access_token, &vehicle_id, command)
            .await?;

        if reply.is_unauthorized() {
            self.tokens.invalidate(ctx);
            return Err(SonicError::auth("Command rejected the access token"));
        }

        let outcome = CommandOutcome::classify(&reply);
        match &outcome {
            CommandOutcome::Success => self.logger.info(&format!("{} succeeded", command)),
            CommandOutcome::Unconfirmed => self.logger.warn(&format!(
                "{} returned HTTP {} with an unreadable body",
                command, reply.status
            )),
            other => self
                .logger
                .warn(&format!("{} failed: {:?}", command, other)),
        }
        Ok(outcome)
    }
}
