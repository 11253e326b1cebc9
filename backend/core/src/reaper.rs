/// Session reaper - drops order sessions that have been idle too long.
///
/// Abandoned conversations would otherwise keep their session in memory for
/// the life of the process. The reaper only runs when the store has an idle
/// TTL configured.
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::MissedTickBehavior;
use tracing::info;

use orderdesk_logging::{OrderEventLogger, OrderLogEvent};

use crate::session::ConversationId;
use crate::store::SessionStore;

pub struct SessionReaper {
    store: Arc<SessionStore>,
    interval: Duration,
}

impl SessionReaper {
    pub fn new(store: Arc<SessionStore>, interval: Duration) -> Self {
        Self { store, interval }
    }

    /// One sweep. Returns the ids that were dropped.
    pub fn reap_once(&self) -> Vec<ConversationId> {
        let reaped = self.store.reap_idle(Utc::now());
        let idle_secs = self.store.idle_ttl().map(|d| d.as_secs()).unwrap_or(0);
        for id in &reaped {
            OrderEventLogger::log_event(id.as_str(), OrderLogEvent::SessionReaped { idle_secs });
        }
        reaped
    }

    /// Sweep forever on the configured interval. Spawn this on the runtime.
    pub async fn run(self) {
        info!(
            interval_secs = self.interval.as_secs(),
            ttl_secs = ?self.store.idle_ttl().map(|d| d.as_secs()),
            "[SessionReaper] started"
        );
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; nothing can be idle yet.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            self.reap_once();
        }
    }
}
