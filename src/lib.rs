//! # Sonic - companion client for remote vehicle control
//!
//! Sonic runs on the phone side of a smartwatch app. It keeps an OAuth
//! session with the vehicle Fleet API alive, finds the account's vehicle,
//! and turns watch menu selections into state fetches and remote commands
//! whose results are relayed back to the watch.
//!
//! ## Architecture
//!
//! - `config`: YAML configuration with validation and env overrides
//! - `logging`: Structured logging and tracing
//! - `persistence`: Key/value store backing the session
//! - `session`: Tokens, vehicle identity and their persisted copies
//! - `fleet`: Remote API boundary and its reqwest implementation
//! - `auth`: Token expiry checks and refresh
//! - `vehicle`: Vehicle lookup and selection
//! - `state_cache`: Last fetched climate and charge state
//! - `command`: Remote command execution and outcome classification
//! - `dispatch`: Ordered, dependency-aware execution of intents
//! - `display`: Messages sent to the watch and their formatting
//! - `settings`: Unit preferences
//! - `menu`: Watch menu entries
//! - `companion`: Event loop tying everything together

pub mod auth;
pub mod command;
pub mod companion;
pub mod config;
pub mod dispatch;
pub mod display;
pub mod error;
pub mod fleet;
pub mod logging;
pub mod menu;
pub mod persistence;
pub mod session;
pub mod settings;
pub mod state_cache;
pub mod vehicle;

// Re-export commonly used types
pub use companion::{Companion, CompanionEvent};
pub use config::Config;
pub use dispatch::{DispatchMode, Dispatcher, Intent, PendingQueue};
pub use error::{Result, SonicError};
