//! Dependency-aware dispatch of remote work
//!
//! Every intent runs through the same stages: the access token is checked
//! (and refreshed if needed), a vehicle is resolved if none is held, then
//! the intent itself executes. Intents run strictly one after another. The
//! first failure ends the cycle, drops whatever is still queued and shows
//! exactly one error notification.

mod intent;
mod types;

pub use intent::{Intent, PendingQueue};
pub use types::{DispatchMode, DispatchReport, DispatchStage};

use crate::auth::TokenManager;
use crate::command::{CommandExecutor, CommandOutcome};
use crate::display::{DisplaySink, StatusKey, format};
use crate::error::{Result, SonicError};
use crate::fleet::{FleetTransport, StateEnvelope, StateKind};
use crate::logging::{LogContext, StructuredLogger, get_logger, get_logger_with_context};
use crate::session::SessionContext;
use crate::settings::Settings;
use crate::state_cache::{
    ChargeSnapshot, ClimateSnapshot, RemoteStateCache, StateSnapshot, VehicleStateSnapshot,
};
use std::sync::Arc;
use tokio::sync::watch;

/// How an executed intent affects the rest of the queue
enum Step {
    Continue,
    /// Stop quietly; the remaining intents are dropped without an error
    Halt,
}

pub struct Dispatcher {
    transport: Arc<dyn FleetTransport>,
    ctx: SessionContext,
    cache: RemoteStateCache,
    settings: Settings,
    tokens: Arc<TokenManager>,
    resolver: crate::vehicle::VehicleResolver,
    executor: CommandExecutor,
    display: DisplaySink,
    stage: watch::Sender<DispatchStage>,
    logger: StructuredLogger,
}

impl Dispatcher {
    pub fn new(
        transport: Arc<dyn FleetTransport>,
        ctx: SessionContext,
        display: DisplaySink,
        refresh_margin: chrono::Duration,
    ) -> Self {
        let tokens = Arc::new(TokenManager::new(transport.clone(), refresh_margin));
        let resolver = crate::vehicle::VehicleResolver::new(transport.clone(), tokens.clone());
        let executor = CommandExecutor::new(transport.clone(), tokens.clone());
        let settings = Settings::load(ctx.store());
        let (stage, _) = watch::channel(DispatchStage::Idle);
        Self {
            transport,
            ctx,
            cache: RemoteStateCache::new(),
            settings,
            tokens,
            resolver,
            executor,
            display,
            stage,
            logger: get_logger("dispatch"),
        }
    }

    pub fn stage(&self) -> DispatchStage {
        *self.stage.borrow()
    }

    pub fn session_context(&self) -> &SessionContext {
        &self.ctx
    }

    pub fn session_context_mut(&mut self) -> &mut SessionContext {
        &mut self.ctx
    }

    pub fn cache(&self) -> &RemoteStateCache {
        &self.cache
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Re-read unit preferences from the store
    pub fn reload_settings(&mut self) {
        self.settings = Settings::load(self.ctx.store());
        self.logger.debug(&format!("Settings reloaded: {:?}", self.settings));
    }

    /// Drop the selected vehicle and any state cached for it
    pub fn forget_vehicle(&mut self) {
        self.ctx.clear_vehicle();
        self.cache.invalidate();
    }

    /// Discard session, vehicle and cache
    pub fn invalidate_session(&mut self) {
        self.tokens.invalidate(&mut self.ctx);
        self.cache.invalidate();
    }

    fn set_stage(&self, stage: DispatchStage) {
        self.stage.send_replace(stage);
    }

    /// Run a queue to completion or to its first failure
    pub async fn dispatch(&mut self, mut queue: PendingQueue, mode: DispatchMode) -> DispatchReport {
        let cycle_id = uuid::Uuid::new_v4().to_string();
        let mut context = LogContext::new("dispatch").with_cycle_id(cycle_id.clone());
        if let Some(vehicle) = self.ctx.vehicle() {
            context = context.with_vehicle_id(vehicle.id.clone());
        }
        let logger = get_logger_with_context(context);
        logger.info(&format!(
            "Dispatching {} intent(s), mode={:?}",
            queue.len(),
            mode
        ));

        let mut report = DispatchReport {
            cycle_id,
            ..Default::default()
        };

        while let Some(intent) = queue.pop_front() {
            if let Intent::Unsupported(name) = &intent {
                logger.warn(&format!("Skipping unsupported action '{}'", name));
                report.skipped.push(intent);
                continue;
            }

            match self.run_intent(&intent, mode, &logger).await {
                Ok(Step::Continue) => report.completed.push(intent),
                Ok(Step::Halt) => {
                    report.completed.push(intent);
                    report.dropped = queue.drain();
                    if !report.dropped.is_empty() {
                        logger.warn(&format!(
                            "Dropping {} queued intent(s) after unconfirmed command",
                            report.dropped.len()
                        ));
                    }
                    break;
                }
                Err(e) => {
                    let label = match self.stage() {
                        DispatchStage::Executing => intent.label(),
                        _ => None,
                    };
                    logger.error(&format!(
                        "{} failed during {:?}: {}",
                        intent,
                        self.stage(),
                        e
                    ));
                    if e.is_auth_failure() {
                        // Snapshots from a revoked session must not outlive it
                        self.cache.invalidate();
                    }
                    let (title, body) = format::error_notification(&e, label);
                    self.display.notify(title, body);
                    self.set_stage(DispatchStage::Failed);
                    report.dropped = queue.drain();
                    report.error = Some(e);
                    return report;
                }
            }
        }

        self.set_stage(DispatchStage::Idle);
        logger.info(&format!(
            "Dispatch complete: {} completed, {} skipped",
            report.completed.len(),
            report.skipped.len()
        ));
        report
    }

    async fn run_intent(
        &mut self,
        intent: &Intent,
        mode: DispatchMode,
        logger: &StructuredLogger,
    ) -> Result<Step> {
        self.set_stage(DispatchStage::TokenCheck);
        self.tokens.ensure_valid(&mut self.ctx).await?;

        self.set_stage(DispatchStage::VehicleCheck);
        if self.ctx.vehicle().is_none() {
            logger.info("No vehicle selected, resolving");
            self.resolver.resolve(&mut self.ctx, &self.display).await?;
        }

        self.set_stage(DispatchStage::Executing);
        match intent {
            Intent::FetchClimate => self.fetch(StateKind::ClimateState, mode).await,
            Intent::FetchCharge => self.fetch(StateKind::ChargeState, mode).await,
            Intent::FetchVehicleInfo => self.fetch(StateKind::VehicleState, mode).await,
            Intent::Command { name, label } => self.run_command(name, label).await,
            Intent::Unsupported(_) => Ok(Step::Continue),
        }
    }

    async fn fetch(&mut self, kind: StateKind, mode: DispatchMode) -> Result<Step> {
        let vehicle_id = self.ctx.vehicle().ok_or(SonicError::NoVehicle)?.id.clone();
        let access_token = self
            .ctx
            .access_token()
            .ok_or_else(|| SonicError::auth("No access token for state fetch"))?
            .to_string();

        let reply = self
            .transport
            .fetch_state(&access_token, &vehicle_id, kind)
            .await?;
        if reply.is_unauthorized() {
            self.invalidate_session();
            return Err(SonicError::auth("State fetch rejected the access token"));
        }
        if reply.status == 408 {
            return Err(SonicError::VehicleAsleep);
        }
        if !reply.is_success() {
            return Err(SonicError::remote(reply.status));
        }

        let snapshot = match kind {
            StateKind::ClimateState => {
                StateSnapshot::Climate(reply.json::<StateEnvelope<ClimateSnapshot>>()?.response)
            }
            StateKind::ChargeState => {
                StateSnapshot::Charge(reply.json::<StateEnvelope<ChargeSnapshot>>()?.response)
            }
            StateKind::VehicleState => StateSnapshot::Vehicle(
                reply
                    .json::<StateEnvelope<VehicleStateSnapshot>>()?
                    .response,
            ),
        };
        self.cache.record(&snapshot);
        self.publish(&snapshot, mode);
        Ok(Step::Continue)
    }

    fn publish(&self, snapshot: &StateSnapshot, mode: DispatchMode) {
        match snapshot {
            StateSnapshot::Climate(c) => {
                if mode.is_active() {
                    self.display
                        .notify("Climate", format::climate_summary(c, &self.settings));
                }
                self.display
                    .status(StatusKey::InteriorTemp, format::climate_status(c));
            }
            StateSnapshot::Charge(c) => {
                if mode.is_active() {
                    self.display
                        .notify("Battery", format::charge_summary(c, &self.settings));
                }
                self.display.status(
                    StatusKey::BatteryPerc,
                    format::charge_status(c, &self.settings),
                );
            }
            StateSnapshot::Vehicle(v) => {
                if mode.is_active() {
                    self.display
                        .notify("Vehicle Info", format::vehicle_summary(v, &self.settings));
                }
            }
        }
    }

    async fn run_command(&mut self, name: &str, label: &str) -> Result<Step> {
        self.cache.invalidate();
        let result = self.executor.execute(&mut self.ctx, name).await;
        self.cache.invalidate();

        let outcome = result?;
        if let Some(err) = outcome.to_error() {
            return Err(err);
        }
        match outcome {
            CommandOutcome::Unconfirmed => {
                self.display.notify(label, "Command sent");
                Ok(Step::Halt)
            }
            _ => {
                self.display.notify(label, "Success!");
                Ok(Step::Continue)
            }
        }
    }
}
