//! Monitor stream probe
//!
//! Connects to one monitor task's frame stream and logs what arrives.
//! Useful for checking a backend without the dashboard in front of it.
//!
//! Environment:
//! - `FRAMELINK_WS_URL`      socket base, e.g. ws://localhost:8000
//! - `FRAMELINK_MONITOR_ID`  monitor task id (default 1)
//! - `FRAMELINK_TOKEN`       bearer token for the handshake (optional)
//! - `FRAMELINK_API_URL`     REST base; when set, the task is started
//!   before streaming and stopped on exit

use framelink::{ControlClient, StaticToken, StreamConfig, StreamRegistry};
use framelink::{NoToken, TokenProvider};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = StreamConfig::from_env()?;
    let monitor_id: i64 = std::env::var("FRAMELINK_MONITOR_ID")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(1);
    let token = std::env::var("FRAMELINK_TOKEN").ok();
    let api_url = std::env::var("FRAMELINK_API_URL").ok();

    let control = api_url.map(|base| match &token {
        Some(token) => ControlClient::with_token(base, token.clone()),
        None => ControlClient::new(base),
    });

    if let Some(control) = &control {
        control.start_task(monitor_id).await?;
    }

    let tokens: Arc<dyn TokenProvider> = match token {
        Some(token) => Arc::new(StaticToken::new(token)),
        None => Arc::new(NoToken),
    };
    let registry = StreamRegistry::with_token_provider(config, tokens);

    let frames = Arc::new(AtomicU64::new(0));
    let counter = Arc::clone(&frames);
    registry.start_monitoring(monitor_id, move |frame: &[u8]| {
        let n = counter.fetch_add(1, Ordering::Relaxed) + 1;
        info!("frame {} ({} bytes)", n, frame.len());
    });

    info!("Streaming monitor task {} — Ctrl-C to stop", monitor_id);
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = tokio::time::sleep(Duration::from_millis(500)) => {
                for event in registry.collect_events() {
                    info!("event: {:?}", event);
                }
            }
        }
    }

    registry.stop_monitoring(monitor_id);
    if let Some(control) = &control {
        control.stop_task(monitor_id).await?;
    }
    info!("Done; {} frames received", frames.load(Ordering::Relaxed));
    Ok(())
}
