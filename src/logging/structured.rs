use std::collections::BTreeMap;
use std::fmt::Write as _;
use tracing::{Level, debug, error, info, trace, warn};

/// Fields attached to every line a logger emits
#[derive(Debug, Clone)]
pub struct LogContext {
    /// Component name (e.g., "auth", "dispatch", "fleet")
    pub component: String,
    /// Correlates the calls made by one dispatch cycle
    pub cycle_id: Option<String>,
    /// Active vehicle, once resolved
    pub vehicle_id: Option<String>,
    pub extra_fields: BTreeMap<String, String>,
}

impl LogContext {
    pub fn new(component: &str) -> Self {
        Self {
            component: component.to_string(),
            cycle_id: None,
            vehicle_id: None,
            extra_fields: BTreeMap::new(),
        }
    }

    pub fn with_cycle_id(mut self, cycle_id: String) -> Self {
        self.cycle_id = Some(cycle_id);
        self
    }

    pub fn with_vehicle_id(mut self, vehicle_id: String) -> Self {
        self.vehicle_id = Some(vehicle_id);
        self
    }

    pub fn with_field(mut self, key: &str, value: impl ToString) -> Self {
        self.extra_fields.insert(key.to_string(), value.to_string());
        self
    }
}

/// Component logger; every message carries its context as a `fields` value
#[derive(Debug, Clone)]
pub struct StructuredLogger {
    context: LogContext,
}

impl StructuredLogger {
    pub fn new(context: LogContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &LogContext {
        &self.context
    }

    pub fn error(&self, message: &str) {
        self.emit(Level::ERROR, message);
    }

    pub fn warn(&self, message: &str) {
        self.emit(Level::WARN, message);
    }

    pub fn info(&self, message: &str) {
        self.emit(Level::INFO, message);
    }

    pub fn debug(&self, message: &str) {
        self.emit(Level::DEBUG, message);
    }

    pub fn trace(&self, message: &str) {
        self.emit(Level::TRACE, message);
    }

    fn emit(&self, level: Level, message: &str) {
        let fields = self.format_fields();
        if level == Level::ERROR {
            error!(%fields, "{}", message);
        } else if level == Level::WARN {
            warn!(%fields, "{}", message);
        } else if level == Level::INFO {
            info!(%fields, "{}", message);
        } else if level == Level::DEBUG {
            debug!(%fields, "{}", message);
        } else {
            trace!(%fields, "{}", message);
        }
    }

    fn format_fields(&self) -> String {
        let ctx = &self.context;
        let mut out = format!("component={}", ctx.component);
        let known = [("cycle_id", &ctx.cycle_id), ("vehicle_id", &ctx.vehicle_id)];
        for (key, value) in known {
            if let Some(value) = value {
                let _ = write!(out, ",{}={}", key, value);
            }
        }
        for (key, value) in &ctx.extra_fields {
            let _ = write!(out, ",{}={}", key, value);
        }
        out
    }
}

pub fn get_logger(component: &str) -> StructuredLogger {
    StructuredLogger::new(LogContext::new(component))
}

pub fn get_logger_with_context(context: LogContext) -> StructuredLogger {
    StructuredLogger::new(context)
}
