use anyhow::Result;
use sonic::display::{DisplayMessage, DisplaySink};
use sonic::fleet::{FleetClient, FleetTransport};
use sonic::persistence::FileStore;
use sonic::session::SessionContext;
use sonic::{Companion, CompanionEvent, Config, Dispatcher};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// One display message per line on stdout
fn render(msg: &DisplayMessage) -> String {
    match msg {
        DisplayMessage::Notification { title, body } => {
            format!("[{}] {}", title, body.replace('\n', " | "))
        }
        DisplayMessage::Status { key, value } => {
            format!("{}({})={}", key.name(), key.wire_key(), value)
        }
    }
}

async fn read_stdin(events_tx: mpsc::UnboundedSender<CompanionEvent>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) if line.trim().is_empty() => {}
            Ok(Some(line)) => match sonic::companion::parse_command_line(&line) {
                Some(event) => {
                    let last = event == CompanionEvent::Shutdown;
                    if events_tx.send(event).is_err() || last {
                        return;
                    }
                }
                None => warn!("Unrecognised input: {}", line.trim()),
            },
            Ok(None) => break,
            Err(e) => {
                error!("Failed to read stdin: {}", e);
                break;
            }
        }
    }
    let _ = events_tx.send(CompanionEvent::Shutdown);
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        e
    })?;
    sonic::logging::init_logging(&config.logging)?;

    info!("Sonic v{} starting up", env!("APP_VERSION"));

    let store = FileStore::open(&config.store_path)
        .map_err(|e| anyhow::anyhow!("Failed to open store {}: {}", config.store_path, e))?;
    let transport: Arc<dyn FleetTransport> = Arc::new(FleetClient::new(&config.api)?);

    let (display, mut display_rx) = DisplaySink::channel();
    let printer = tokio::spawn(async move {
        while let Some(msg) = display_rx.recv().await {
            println!("{}", render(&msg));
        }
    });

    let dispatcher = Dispatcher::new(
        transport,
        SessionContext::load(Box::new(store)),
        display.clone(),
        config.session.refresh_margin()?,
    );

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let mut companion = Companion::new(dispatcher, display, events_rx);
    events_tx.send(CompanionEvent::Ready)?;
    let input = tokio::spawn(read_stdin(events_tx));

    let outcome = companion.run().await;
    input.abort();
    drop(companion);
    let _ = printer.await;

    match outcome {
        Ok(()) => {
            info!("Sonic shutdown complete");
            Ok(())
        }
        Err(e) => {
            error!("Companion failed with error: {}", e);
            Err(anyhow::anyhow!("Companion error: {}", e))
        }
    }
}
