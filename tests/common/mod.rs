#![allow(dead_code)]

use chrono::Utc;
use sonic::display::{DisplayMessage, DisplaySink};
use sonic::fleet::{FleetTransport, HttpReply, StateKind};
use sonic::persistence::MemoryStore;
use sonic::session::{Session, SessionContext, VehicleIdentity};
use sonic::{Dispatcher, Result};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::UnboundedReceiver;

pub const CLIMATE_BODY: &str =
    r#"{"response":{"inside_temp":20.6,"outside_temp":11.2,"is_auto_conditioning_on":true}}"#;
pub const CHARGE_BODY: &str = r#"{"response":{"battery_level":64,"ideal_battery_range":180.5,"charging_state":"Charging","charge_rate":18,"time_to_full_charge":2.25}}"#;
pub const OK_COMMAND: &str = r#"{"response":{"result":true,"reason":""}}"#;
pub const ONE_VEHICLE: &str = r#"{"response":[{"id_s":"1001","display_name":"Roadrunner"}]}"#;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Refresh(String),
    ListVehicles(String),
    FetchState { token: String, vehicle: String, kind: StateKind },
    Command { vehicle: String, name: String },
}

/// Records every call in order and answers from per-endpoint scripts
#[derive(Default)]
pub struct RecordingTransport {
    calls: Mutex<Vec<Call>>,
    refresh: Mutex<VecDeque<Result<HttpReply>>>,
    vehicles: Mutex<VecDeque<Result<HttpReply>>>,
    states: Mutex<VecDeque<Result<HttpReply>>>,
    commands: Mutex<VecDeque<Result<HttpReply>>>,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn refresh_reply(&self, reply: Result<HttpReply>) {
        self.refresh.lock().unwrap().push_back(reply);
    }

    pub fn vehicles_reply(&self, reply: Result<HttpReply>) {
        self.vehicles.lock().unwrap().push_back(reply);
    }

    pub fn state_reply(&self, reply: Result<HttpReply>) {
        self.states.lock().unwrap().push_back(reply);
    }

    pub fn command_reply(&self, reply: Result<HttpReply>) {
        self.commands.lock().unwrap().push_back(reply);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| pred(c)).count()
    }

    fn answer(&self, queue: &Mutex<VecDeque<Result<HttpReply>>>, call: Call) -> Result<HttpReply> {
        self.calls.lock().unwrap().push(call);
        queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(HttpReply::new(500, "unscripted")))
    }
}

#[async_trait::async_trait]
impl FleetTransport for RecordingTransport {
    async fn refresh(&self, refresh_token: &str) -> Result<HttpReply> {
        self.answer(&self.refresh, Call::Refresh(refresh_token.to_string()))
    }

    async fn list_vehicles(&self, access_token: &str) -> Result<HttpReply> {
        self.answer(&self.vehicles, Call::ListVehicles(access_token.to_string()))
    }

    async fn fetch_state(
        &self,
        access_token: &str,
        vehicle_id: &str,
        kind: StateKind,
    ) -> Result<HttpReply> {
        self.answer(
            &self.states,
            Call::FetchState {
                token: access_token.to_string(),
                vehicle: vehicle_id.to_string(),
                kind,
            },
        )
    }

    async fn send_command(
        &self,
        _access_token: &str,
        vehicle_id: &str,
        command: &str,
    ) -> Result<HttpReply> {
        self.answer(
            &self.commands,
            Call::Command {
                vehicle: vehicle_id.to_string(),
                name: command.to_string(),
            },
        )
    }
}

pub fn fresh_session() -> Session {
    Session::new(
        "access-1",
        Some("refresh-1".to_string()),
        Some(Utc::now() + chrono::Duration::hours(8)),
    )
}

pub fn expiring_session() -> Session {
    Session::new(
        "access-1",
        Some("refresh-1".to_string()),
        Some(Utc::now() + chrono::Duration::seconds(30)),
    )
}

pub fn vehicle() -> VehicleIdentity {
    VehicleIdentity {
        id: "1001".to_string(),
        display_name: "Roadrunner".to_string(),
    }
}

pub fn context(store: &MemoryStore, session: Session, vehicle: Option<VehicleIdentity>) -> SessionContext {
    let mut ctx = SessionContext::load(Box::new(store.clone()));
    ctx.replace_session(session).unwrap();
    if let Some(v) = vehicle {
        ctx.set_vehicle(v).unwrap();
    }
    ctx
}

pub fn dispatcher(
    transport: Arc<RecordingTransport>,
    ctx: SessionContext,
) -> (Dispatcher, UnboundedReceiver<DisplayMessage>) {
    let (display, rx) = DisplaySink::channel();
    let d = Dispatcher::new(transport, ctx, display, chrono::Duration::minutes(5));
    (d, rx)
}

pub fn drain(rx: &mut UnboundedReceiver<DisplayMessage>) -> Vec<DisplayMessage> {
    let mut out = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        out.push(msg);
    }
    out
}

pub fn titles(msgs: &[DisplayMessage]) -> Vec<String> {
    msgs.iter()
        .filter_map(|m| match m {
            DisplayMessage::Notification { title, .. } => Some(title.clone()),
            DisplayMessage::Status { .. } => None,
        })
        .collect()
}
