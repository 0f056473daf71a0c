//! Scripted transport for unit tests

use super::{FleetTransport, HttpReply, StateKind};
use crate::error::Result;
use std::collections::VecDeque;
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Refresh,
    ListVehicles,
    FetchState(StateKind),
    Command(String),
}

/// Replies are consumed per endpoint in FIFO order; an empty queue answers 500
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    refresh: Mutex<VecDeque<Result<HttpReply>>>,
    vehicles: Mutex<VecDeque<Result<HttpReply>>>,
    states: Mutex<VecDeque<Result<HttpReply>>>,
    commands: Mutex<VecDeque<Result<HttpReply>>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn on_refresh(self, reply: Result<HttpReply>) -> Self {
        self.refresh.lock().unwrap().push_back(reply);
        self
    }

    pub(crate) fn on_vehicles(self, reply: Result<HttpReply>) -> Self {
        self.vehicles.lock().unwrap().push_back(reply);
        self
    }

    pub(crate) fn on_state(self, reply: Result<HttpReply>) -> Self {
        self.states.lock().unwrap().push_back(reply);
        self
    }

    pub(crate) fn on_command(self, reply: Result<HttpReply>) -> Self {
        self.commands.lock().unwrap().push_back(reply);
        self
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn next(&self, queue: &Mutex<VecDeque<Result<HttpReply>>>, call: Call) -> Result<HttpReply> {
        self.calls.lock().unwrap().push(call);
        queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(HttpReply::new(500, "")))
    }
}

#[async_trait::async_trait]
impl FleetTransport for ScriptedTransport {
    async fn refresh(&self, _refresh_token: &str) -> Result<HttpReply> {
        self.next(&self.refresh, Call::Refresh)
    }

    async fn list_vehicles(&self, _access_token: &str) -> Result<HttpReply> {
        self.next(&self.vehicles, Call::ListVehicles)
    }

    async fn fetch_state(
        &self,
        _access_token: &str,
        _vehicle_id: &str,
        kind: StateKind,
    ) -> Result<HttpReply> {
        self.next(&self.states, Call::FetchState(kind))
    }

    async fn send_command(
        &self,
        _access_token: &str,
        _vehicle_id: &str,
        command: &str,
    ) -> Result<HttpReply> {
        self.next(&self.commands, Call::Command(command.to_string()))
    }
}
