//! Usage analytics. Purely observational: nothing in the index depends on what these calls do.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};

pub trait Analytics: Send + Sync {
    fn track_event(&self, category: &str, action: &str, label: Option<&str>, value: Option<u64>);

    fn track_timing(&self, category: &str, action: &str, duration: Duration);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAnalytics;

impl Analytics for NoopAnalytics {
    fn track_event(&self, _: &str, _: &str, _: Option<&str>, _: Option<u64>) {}

    fn track_timing(&self, _: &str, _: &str, _: Duration) {}
}

/// Emits analytics as `tracing` events on the `analytics` target once a client id is known.
pub struct TracingAnalytics {
    enabled: AtomicBool,
    client_id: RwLock<Option<String>>,
}

impl TracingAnalytics {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
            client_id: RwLock::new(None),
        }
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn init(&self, client_id: impl Into<String>) {
        if let Ok(mut slot) = self.client_id.write() {
            *slot = Some(client_id.into());
        }
    }

    fn client_id(&self) -> Option<String> {
        if !self.is_enabled() {
            return None;
        }
        self.client_id.read().ok().and_then(|id| id.clone())
    }
}

impl Analytics for TracingAnalytics {
    fn track_event(&self, category: &str, action: &str, label: Option<&str>, value: Option<u64>) {
        if let Some(client) = self.client_id() {
            tracing::debug!(target: "analytics", %client, category, action, ?label, ?value, "event");
        }
    }

    fn track_timing(&self, category: &str, action: &str, duration: Duration) {
        if let Some(client) = self.client_id() {
            let millis = duration.as_millis() as u64;
            tracing::debug!(target: "analytics", %client, category, action, millis, "timing");
        }
    }
}

/// Report how long an operation took and, for list results, how many items it produced.
pub struct Timer {
    category: &'static str,
    action: &'static str,
    started: Instant,
}

impl Timer {
    pub fn start(category: &'static str, action: &'static str) -> Self {
        Self {
            category,
            action,
            started: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn finish(self, analytics: &dyn Analytics, results: Option<usize>) {
        match results {
            Some(count) => analytics.track_event(
                self.category,
                self.action,
                Some("results"),
                Some(count as u64),
            ),
            None => analytics.track_event(self.category, self.action, None, None),
        }
        analytics.track_timing(self.category, self.action, self.elapsed());
    }
}
