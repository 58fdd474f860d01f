//! Resolve one key, wait for its group to land, and resolve again.
//!
//! Usage: lingo <path> <key> [default]
//! Host, language and timeout come from LINGO_HOST, LINGO_LANGUAGE and
//! LINGO_TIMEOUT_SECS.

use std::time::Duration;

use lingo::{SessionConfig, Translation};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    lingo::init_tracing();

    let mut args = std::env::args().skip(1);
    let (Some(path), Some(key)) = (args.next(), args.next()) else {
        eprintln!("usage: lingo <path> <key> [default]");
        std::process::exit(2);
    };
    let default = args.next().unwrap_or_default();

    let config = match SessionConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            std::process::exit(2);
        }
    };
    let translation = match Translation::new(&config) {
        Ok(t) => t,
        Err(e) => {
            error!(error = %e, "failed to start translation session");
            std::process::exit(1);
        }
    };

    let mut updates = translation.subscribe();
    let first = translation.t_or(&path, &key, &default);
    println!("initial: {first}");

    let wait = config.request_timeout() + Duration::from_secs(1);
    match tokio::time::timeout(wait, updates.changed()).await {
        Ok(Ok(())) => info!("group update received"),
        Ok(Err(_)) => warn!("session closed before update"),
        Err(_) => warn!(waited_ms = wait.as_millis() as u64, "no update, load failed or timed out"),
    }

    let resolved = translation.t_or(&path, &key, &default);
    println!("resolved: {resolved}");
    info!(stats = ?translation.metrics(), "done");
}
