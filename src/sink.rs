//! Publish sink boundary
//!
//! The collector hands each cycle's merged snapshot to a `MetricSink`
//! exactly once. Delivery beyond this boundary (storage, aggregation,
//! forwarding) is the host's concern.

use tracing::info;

use crate::collector::MetricSnapshot;

/// Receives one snapshot per collection cycle.
pub trait MetricSink: Send + Sync {
    /// Publish a completed snapshot.
    ///
    /// The snapshot is immutable at this point; implementations must not
    /// assume anything about which metrics are present, since failed domain
    /// queries leave their metrics out of the cycle.
    fn publish(&self, snapshot: &MetricSnapshot);
}

/// Sink that emits every metric through the structured log stream.
///
/// Useful as a default wiring and for manual inspection of a running
/// collector.
#[derive(Debug, Default)]
pub struct TracingSink;

impl MetricSink for TracingSink {
    fn publish(&self, snapshot: &MetricSnapshot) {
        for (path, value) in snapshot {
            info!(metric = %path, value = %value, "metric");
        }
    }
}
