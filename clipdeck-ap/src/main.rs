//! Clip player (clipdeck-ap) - Main entry point
//!
//! Plays configured clips in order through a playback session backed by the
//! simulated resource, printing every session event as a JSON line.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use clipdeck_ap::playback::{SimulatedResource, TokioScheduler};
use clipdeck_ap::{PlaybackSession, PlayerConfig};
use clipdeck_common::events::ClipdeckEvent;
use tokio::signal;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for clipdeck-ap
#[derive(Parser, Debug)]
#[command(name = "clipdeck-ap")]
#[command(about = "Sequential clip player with per-clip resume positions")]
#[command(version)]
struct Args {
    /// Config file (overrides CLIPDECK_CONFIG and the per-user default)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Clip ids to play, in order (default: every configured clip)
    clips: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = PlayerConfig::load(args.config.as_deref()).context("Failed to load configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting clipdeck-ap v{} ({}, built {}, {})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE"),
    );

    let playlist = config
        .select_clips(&args.clips)
        .context("Failed to resolve clip selection")?;
    if playlist.is_empty() {
        warn!("Nothing to play: no clips configured");
        return Ok(());
    }
    info!("Playing {} clip(s)", playlist.len());

    let (session, task) = PlaybackSession::spawn(
        SimulatedResource::factory(Arc::new(config.catalog())),
        TokioScheduler::new(),
        &config.session,
    );

    // Subscribe before playing so the first events are not missed
    let mut events = session.subscribe_events();
    session.play_in_order(playlist);

    loop {
        tokio::select! {
            received = events.recv() => match received {
                Ok(event) => {
                    println!("{}", serde_json::to_string(&event).context("Failed to encode event")?);
                    if is_final(&event) {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Event output lagged, {} events skipped", skipped);
                }
                Err(RecvError::Closed) => break,
            },
            _ = signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down");
                break;
            }
        }
    }

    session.teardown();
    task.await.context("Playback session task failed")?;

    info!("Shutdown complete");
    Ok(())
}

/// Events after which there is nothing left to play
fn is_final(event: &ClipdeckEvent) -> bool {
    matches!(
        event,
        ClipdeckEvent::PlaybackFailed { .. } | ClipdeckEvent::ClipCompleted { remaining: 0, .. }
    )
}
