//! Outward channel to the display device
//!
//! The watch understands two kinds of message: a transient pop-up
//! notification, and small keyed status strings that it shows as menu
//! subtitles.

pub mod format;

use crate::logging::get_logger;
use tokio::sync::mpsc;

/// Keys of the compact status strings understood by the watch app
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusKey {
    /// `"inside/outside"` temperatures
    InteriorTemp,
    /// `"battery% range state"`
    BatteryPerc,
}

impl StatusKey {
    /// Numeric dictionary key used on the wire
    pub fn wire_key(&self) -> u32 {
        match self {
            Self::InteriorTemp => 1,
            Self::BatteryPerc => 2,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::InteriorTemp => "interiorTemp",
            Self::BatteryPerc => "batteryPerc",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayMessage {
    Notification { title: String, body: String },
    Status { key: StatusKey, value: String },
}

/// Sending half of the display channel. Sends never fail the caller.
#[derive(Debug, Clone)]
pub struct DisplaySink {
    tx: mpsc::UnboundedSender<DisplayMessage>,
    logger: crate::logging::StructuredLogger,
}

impl DisplaySink {
    pub fn new(tx: mpsc::UnboundedSender<DisplayMessage>) -> Self {
        Self {
            tx,
            logger: get_logger("display"),
        }
    }

    /// Create a sink together with the receiving end
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<DisplayMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    pub fn notify(&self, title: impl Into<String>, body: impl Into<String>) {
        let title = title.into();
        self.logger.debug(&format!("Notification: {}", title));
        self.send(DisplayMessage::Notification {
            title,
            body: body.into(),
        });
    }

    pub fn status(&self, key: StatusKey, value: impl Into<String>) {
        self.send(DisplayMessage::Status {
            key,
            value: value.into(),
        });
    }

    fn send(&self, msg: DisplayMessage) {
        if self.tx.send(msg).is_err() {
            self.logger
                .debug("Display channel closed, dropping message");
        }
    }
}
