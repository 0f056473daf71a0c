//! Structured logging and tracing for Sonic
//!
//! `init_logging` installs one global subscriber: an env filter, a daily
//! rolling log file and a console layer on stderr. Stdout is left alone
//! because the binary uses it for the display stream.

use crate::config::LoggingConfig;
use crate::error::{Result, SonicError};
use once_cell::sync::OnceCell;
use std::path::Path;
use std::sync::Once;
use tracing::{Level, Subscriber, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

mod level;
mod structured;

pub use level::{level_rank, min_level, parse_log_level};
pub use structured::{LogContext, StructuredLogger, get_logger, get_logger_with_context};

type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync>;

// Dropping the guard stops the file writer, so it lives as long as the process
static FILE_GUARD: OnceCell<WorkerGuard> = OnceCell::new();
static INIT: Once = Once::new();
static INIT_FAILURE: OnceCell<String> = OnceCell::new();

/// Install the global subscriber. Later calls return the first outcome.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    INIT.call_once(|| {
        if let Err(e) = install(config) {
            let _ = INIT_FAILURE.set(e.to_string());
        }
    });
    match INIT_FAILURE.get() {
        Some(message) => Err(SonicError::config(message.clone())),
        None => Ok(()),
    }
}

fn install(config: &LoggingConfig) -> Result<()> {
    let base = parse_log_level(&config.level)?;
    let override_or_base = |raw: &Option<String>| {
        raw.as_deref()
            .and_then(|s| parse_log_level(s).ok())
            .unwrap_or(base)
    };
    let console_level = override_or_base(&config.console_level);
    let file_level = override_or_base(&config.file_level);

    let to_file = !console_only();
    let filter_level = if to_file {
        min_level(console_level, file_level)
    } else {
        console_level
    };

    let file = if to_file {
        Some(file_layer(config, file_level)?)
    } else {
        None
    };
    let console = (config.console_output || !to_file)
        .then(|| console_layer(config.json_format, console_level));

    let installed = tracing_subscriber::registry()
        .with(env_filter(filter_level))
        .with(file)
        .with(console)
        .try_init();

    match installed {
        Ok(()) => {
            info!(
                "Logging initialized - console_level: {:?}, file_level: {}",
                console_level,
                if to_file {
                    format!("{:?} in {}", file_level, log_dir(&config.file).display())
                } else {
                    "off".to_string()
                }
            );
            Ok(())
        }
        // Test harnesses may have installed their own subscriber first
        Err(_) if !to_file => Ok(()),
        Err(e) => Err(SonicError::config(format!(
            "Failed to install subscriber: {}",
            e
        ))),
    }
}

fn env_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("sonic={},reqwest=warn,hyper=warn", level))
    })
}

fn console_only() -> bool {
    cfg!(test) || std::env::var_os("SONIC_DISABLE_FILE_LOG").is_some()
}

/// `file` may name a log file (its directory is used) or a directory
fn log_dir(file: &str) -> &Path {
    let path = Path::new(file);
    if path.extension().is_some() {
        path.parent().unwrap_or(path)
    } else {
        path
    }
}

fn console_layer<S>(json: bool, level: Level) -> BoxedLayer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);
    if json {
        layer.json().with_filter(LevelFilter::from_level(level)).boxed()
    } else {
        layer.with_filter(LevelFilter::from_level(level)).boxed()
    }
}

fn file_layer<S>(config: &LoggingConfig, level: Level) -> Result<BoxedLayer<S>>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let appender = rolling::Builder::new()
        .rotation(rolling::Rotation::DAILY)
        .filename_prefix("sonic")
        .filename_suffix("log")
        .max_log_files(config.backup_count.max(1) as usize)
        .build(log_dir(&config.file))
        .map_err(|e| SonicError::io(format!("Failed to create log file appender: {}", e)))?;

    let (writer, guard) = non_blocking(appender);
    let _ = FILE_GUARD.set(guard);

    let layer = fmt::layer()
        .with_writer(writer)
        .with_target(false)
        .with_ansi(false);
    Ok(if config.json_format {
        layer.json().with_filter(LevelFilter::from_level(level)).boxed()
    } else {
        layer.with_filter(LevelFilter::from_level(level)).boxed()
    })
}
