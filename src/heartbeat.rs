//! Liveness watchdog for the browser page.
//!
//! The page posts `/heartbeat` every second. Once the first beat has arrived,
//! a silence longer than the timeout ends the server.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::info;

pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Clone, Default)]
pub struct Heartbeat {
    last: Arc<Mutex<Option<Instant>>>,
}

impl Heartbeat {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn beat(&self) {
        *self.last.lock().await = Some(Instant::now());
    }

    pub async fn last_beat(&self) -> Option<Instant> {
        *self.last.lock().await
    }

    /// Never true before the first beat.
    pub async fn is_expired_at(&self, now: Instant, timeout: Duration) -> bool {
        match self.last_beat().await {
            Some(last) => now.saturating_duration_since(last) > timeout,
            None => false,
        }
    }
}

/// Resolves once the page has gone quiet for longer than `timeout`.
pub async fn wait_for_silence(heartbeat: Heartbeat, timeout: Duration, poll: Duration) {
    let mut ticker = tokio::time::interval(poll);
    loop {
        ticker.tick().await;
        if heartbeat.is_expired_at(Instant::now(), timeout).await {
            info!("no heartbeat for {}s, shutting down", timeout.as_secs_f32());
            return;
        }
    }
}
