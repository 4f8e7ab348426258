use std::path::PathBuf;
use std::time::Duration;

use agentscope_protocol::EventSink;
use agentscope_replay::{MAX_FILE_SIZE, PlayerConfig, ReplayPlayer, read_event_log};
use agentscope_store::{DEFAULT_CAPACITY, EventStore, StoreConfig};
use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "agentscoped")]
#[command(about = "Replay recorded agent runs into an in-memory event store")]
struct Cli {
    /// Emit logs as JSON lines instead of the compact format.
    #[arg(long, global = true)]
    json_logs: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Play a JSONL event log in (scaled) real time, then print the store snapshot.
    Replay {
        path: PathBuf,
        #[arg(long, default_value_t = 1.0)]
        speed: f64,
        #[arg(long, default_value_t = 100)]
        tick_ms: u64,
        #[arg(long, default_value_t = DEFAULT_CAPACITY)]
        capacity: usize,
    },
    /// Ingest a JSONL event log at once and print the store snapshot.
    Summary {
        path: PathBuf,
        #[arg(long, default_value_t = DEFAULT_CAPACITY)]
        capacity: usize,
    },
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.compact().init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    match cli.command {
        Command::Replay {
            path,
            speed,
            tick_ms,
            capacity,
        } => {
            let player = ReplayPlayer::new(PlayerConfig::new().default_speed(speed));
            let total = player
                .load_file(&path)
                .with_context(|| format!("loading {}", path.display()))?;
            let store = EventStore::new(StoreConfig::new().capacity(capacity));
            info!(total, speed = player.speed(), "replay starting");

            let delivered = drive(&player, &store, Duration::from_millis(tick_ms)).await;
            let metrics = store.metrics();
            info!(
                delivered,
                errors = metrics.error_count,
                warnings = store.warning_count(),
                "replay finished"
            );
            println!("{}", serde_json::to_string(&store.snapshot())?);
        }
        Command::Summary { path, capacity } => {
            let events = read_event_log(&path, MAX_FILE_SIZE)
                .with_context(|| format!("loading {}", path.display()))?;
            let store = EventStore::new(StoreConfig::new().capacity(capacity));
            for event in events {
                store.add_event(event);
            }
            info!(
                events = store.event_count(),
                agents = store.agents().len(),
                tasks = store.tasks().len(),
                "summary built"
            );
            println!("{}", serde_json::to_string_pretty(&store.snapshot())?);
        }
    }

    Ok(())
}

/// Play `player` from its cursor and push newly visible events into `sink`
/// once per tick until every loaded event has been delivered.
///
/// Returns the number of events delivered.
async fn drive(player: &ReplayPlayer, sink: &impl EventSink, tick: Duration) -> usize {
    let total = player.total();
    let mut delivered = 0;
    if total == 0 {
        return delivered;
    }

    player.play();
    let mut interval = tokio::time::interval(tick.max(Duration::from_millis(1)));
    while delivered < total {
        interval.tick().await;
        let fresh = player.events_until_from(delivered, Utc::now());
        if fresh.is_empty() {
            continue;
        }
        delivered += fresh.len();
        for event in fresh {
            sink.add_event(event);
        }
        debug!(delivered, total, "replay progress");
    }
    player.pause();
    delivered
}
