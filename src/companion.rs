//! Companion event loop
//!
//! Events from the watch and the settings page arrive on an mpsc channel and
//! are handled one at a time, so at most one dispatch cycle is ever in
//! flight.

use crate::dispatch::{DispatchMode, DispatchReport, Dispatcher, Intent, PendingQueue};
use crate::display::DisplaySink;
use crate::error::{Result, SonicError};
use crate::fleet::EpochInstant;
use crate::logging::get_logger;
use crate::menu::{MenuAction, about_text};
use crate::session::{SETTINGS_KEY, Session};
use serde::Deserialize;
use tokio::sync::mpsc;

/// Inputs the companion reacts to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompanionEvent {
    /// The companion app started
    Ready,
    /// A watch menu entry was selected
    MenuSelected(u32),
    /// The settings page closed with this (URL-encoded) JSON payload
    ConfigurationClosed(String),
    /// Named actions to run in order, e.g. `getClimateState`
    ActionsRequested(Vec<String>),
    Shutdown,
}

/// Token fields the settings page may hand over after sign-in
#[derive(Debug, Default, Deserialize)]
struct ConfigurationTokens {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_at: Option<EpochInstant>,
}

const TOKEN_FIELDS: [&str; 3] = ["access_token", "refresh_token", "expires_at"];

pub struct Companion {
    dispatcher: Dispatcher,
    display: DisplaySink,
    events_rx: mpsc::UnboundedReceiver<CompanionEvent>,
    logger: crate::logging::StructuredLogger,
}

impl Companion {
    pub fn new(
        dispatcher: Dispatcher,
        display: DisplaySink,
        events_rx: mpsc::UnboundedReceiver<CompanionEvent>,
    ) -> Self {
        Self {
            dispatcher,
            display,
            events_rx,
            logger: get_logger("companion"),
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Consume events until `Shutdown` or until every sender is gone
    pub async fn run(&mut self) -> Result<()> {
        self.logger.info("Companion started");
        while let Some(event) = self.events_rx.recv().await {
            if event == CompanionEvent::Shutdown {
                self.logger.info("Shutdown requested");
                break;
            }
            self.handle_event(event).await;
        }
        self.logger.info("Companion stopped");
        Ok(())
    }

    /// Handle one event; returns the dispatch report if a cycle ran
    pub async fn handle_event(&mut self, event: CompanionEvent) -> Option<DispatchReport> {
        match event {
            CompanionEvent::Ready => self.on_ready().await,
            CompanionEvent::MenuSelected(index) => self.on_menu(index).await,
            CompanionEvent::ConfigurationClosed(payload) => {
                match self.on_configuration(&payload).await {
                    Ok(report) => report,
                    Err(e) => {
                        self.logger
                            .warn(&format!("Ignoring configuration payload: {}", e));
                        None
                    }
                }
            }
            CompanionEvent::ActionsRequested(names) => self.on_actions(&names).await,
            CompanionEvent::Shutdown => None,
        }
    }

    fn fetch_both() -> PendingQueue {
        vec![Intent::FetchClimate, Intent::FetchCharge].into()
    }

    async fn on_ready(&mut self) -> Option<DispatchReport> {
        if !self.dispatcher.session_context().session().has_access_token() {
            self.logger.info("No access token, prompting for sign-in");
            self.display.notify(
                "Sonic",
                "Please open Settings on your phone to connect your Tesla account.",
            );
            return None;
        }
        Some(
            self.dispatcher
                .dispatch(Self::fetch_both(), DispatchMode::Passive)
                .await,
        )
    }

    async fn on_menu(&mut self, index: u32) -> Option<DispatchReport> {
        self.logger.debug(&format!("Menu entry {} selected", index));
        match MenuAction::from_index(index) {
            MenuAction::Dispatch(intents) => Some(
                self.dispatcher
                    .dispatch(intents.into(), DispatchMode::Active)
                    .await,
            ),
            MenuAction::Reconnect => {
                self.display
                    .notify("Reconnect", "Reconnecting to your vehicle...");
                self.dispatcher.forget_vehicle();
                Some(
                    self.dispatcher
                        .dispatch(Self::fetch_both(), DispatchMode::Active)
                        .await,
                )
            }
            MenuAction::About => {
                self.display.notify("About Sonic", about_text());
                None
            }
            MenuAction::AppLoaded => {
                self.logger.info("Watch app loaded");
                None
            }
            MenuAction::Unknown(other) => {
                self.logger.warn(&format!("Unknown menu entry {}", other));
                None
            }
        }
    }

    async fn on_actions(&mut self, names: &[String]) -> Option<DispatchReport> {
        if names.is_empty() {
            return None;
        }
        let queue: PendingQueue = names
            .iter()
            .map(|name| Intent::from_action_name(name))
            .collect();
        Some(self.dispatcher.dispatch(queue, DispatchMode::Active).await)
    }

    async fn on_configuration(&mut self, payload: &str) -> Result<Option<DispatchReport>> {
        let raw = if payload.trim_start().starts_with('{') {
            payload.to_string()
        } else {
            decode_uri_component(payload)
                .ok_or_else(|| SonicError::parse("Malformed percent-encoding"))?
        };
        let mut value: serde_json::Value = serde_json::from_str(&raw)?;
        let tokens: ConfigurationTokens = serde_json::from_value(value.clone())?;

        // Tokens live under their own keys, never inside the settings blob
        if let Some(fields) = value.as_object_mut() {
            for key in TOKEN_FIELDS {
                fields.remove(key);
            }
        }
        self.dispatcher
            .session_context_mut()
            .store_mut()
            .set(SETTINGS_KEY, &value.to_string())?;
        self.dispatcher.reload_settings();

        let access_token = tokens.access_token.filter(|t| !t.is_empty());
        let signed_in = access_token.is_some();
        if let Some(access_token) = access_token {
            let session = Session::new(
                access_token,
                tokens.refresh_token.filter(|t| !t.is_empty()),
                tokens.expires_at.as_ref().and_then(EpochInstant::to_datetime),
            );
            self.dispatcher.session_context_mut().replace_session(session)?;
            self.dispatcher.forget_vehicle();
            self.logger.info("Stored new session from settings page");
        }

        self.display
            .notify("Settings Saved", "Your preferences have been updated.");

        if !signed_in {
            return Ok(None);
        }
        Ok(Some(
            self.dispatcher
                .dispatch(Self::fetch_both(), DispatchMode::Passive)
                .await,
        ))
    }
}

/// Parse one line of the companion's text protocol
pub fn parse_command_line(line: &str) -> Option<CompanionEvent> {
    let line = line.trim();
    let (verb, rest) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(v, r)| (v, r.trim()));
    match verb {
        "ready" => Some(CompanionEvent::Ready),
        "menu" => rest.parse().ok().map(CompanionEvent::MenuSelected),
        "config" if !rest.is_empty() => Some(CompanionEvent::ConfigurationClosed(rest.to_string())),
        "run" if !rest.is_empty() => Some(CompanionEvent::ActionsRequested(
            rest.split_whitespace().map(str::to_string).collect(),
        )),
        "quit" | "exit" => Some(CompanionEvent::Shutdown),
        _ => None,
    }
}

/// Percent-decode a URI component; `+` is left as is
fn decode_uri_component(input: &str) -> Option<String> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = bytes.get(i + 1..i + 3)?;
            let hex = std::str::from_utf8(hex).ok()?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}
