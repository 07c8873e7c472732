//! Periodic clock push
//!
//! Pushes the current wall-clock time to a configured user on a fixed
//! interval. Purely a demonstration trigger for the router's push API; an
//! offline target is logged by the router and skipped.

use std::time::Duration;

use chrono::Local;
use pigeon_config::PushConfig;
use pigeon_gateway::MessageRouter;
use tokio::time::interval;
use tracing::{debug, info};

/// Current time as the wire payload
fn clock_text() -> String {
    Local::now().format("%H:%M:%S").to_string()
}

/// Run the pusher until the task is dropped
pub async fn run_clock_pusher(router: MessageRouter, config: PushConfig) {
    info!(
        "Clock pusher started: every {}s to user {}",
        config.interval_secs, config.target_user
    );
    let mut ticker = interval(Duration::from_secs(config.interval_secs));
    loop {
        ticker.tick().await;
        let text = clock_text();
        debug!("Clock tick: {}", text);
        router.push_to_user(&config.target_user, &text);
    }
}
