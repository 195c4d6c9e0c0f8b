//! Metrics for observability
//!
//! The engine records through the `metrics` facade only. Installing a
//! recorder is left to the host application; without one every call is a
//! no-op.

use metrics::{describe_counter, describe_histogram, histogram};
use std::time::Instant;

/// Initialize metrics with descriptions
pub fn init_metrics() {
    // Inbound
    describe_counter!("chatstream.sendables.received", "Sendables delivered by live feeds");
    describe_counter!(
        "chatstream.sendables.unclassified",
        "Sendables whose kind has no typed channel"
    );
    describe_counter!("chatstream.adapter.errors", "Failures reported by the remote adapter");

    // Lifecycle
    describe_counter!("chatstream.connections.opened", "Live feeds opened by connect");

    // Outbound
    describe_counter!("chatstream.outbound.sent", "Sendables written through send");
    describe_histogram!(
        "chatstream.adapter.call.duration_ms",
        "One-shot adapter call duration in milliseconds"
    );
}

/// Timer for measuring operation duration
pub struct Timer {
    name: String,
    start: Instant,
}

impl Timer {
    /// Create a new timer
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            start: Instant::now(),
        }
    }

    /// Stop the timer and record the duration
    pub fn stop(self) {
        let duration = self.start.elapsed();
        histogram!(self.name).record(duration.as_secs_f64() * 1000.0);
    }
}
