use crate::error::{Error, Result};
use crate::types::{HostStats, IntervalMetrics, TargetId};
use parking_lot::Mutex;

/// Cumulative per-target probe counters.
///
/// Every read-modify-write of a target's counters happens under a single
/// lock acquisition so that a concurrent [`StatsStore::snapshot`] never
/// observes a partially applied interval.
#[derive(Debug, Default)]
pub struct StatsStore {
    hosts: Mutex<Vec<HostStats>>,
}

impl StatsStore {
    /// Create a zeroed store for `targets` targets.
    #[must_use]
    pub fn new(targets: usize) -> Self {
        Self {
            hosts: Mutex::new(vec![HostStats::default(); targets]),
        }
    }

    /// Fold one interval of metrics into the counters for `id`.
    pub fn record(&self, id: TargetId, metrics: IntervalMetrics) -> Result<()> {
        let mut hosts = self.hosts.lock();
        let host = hosts
            .get_mut(id.index())
            .ok_or(Error::UnknownTarget(id))?;
        host.received += metrics.received();
        host.sent += metrics.sent;
        Ok(())
    }

    /// A consistent copy of the counters for `id`.
    pub fn snapshot(&self, id: TargetId) -> Result<HostStats> {
        self.hosts
            .lock()
            .get(id.index())
            .copied()
            .ok_or(Error::UnknownTarget(id))
    }

    /// The lifetime loss percentage for `id`, `None` if there is no data yet.
    pub fn loss_percent(&self, id: TargetId) -> Result<Option<f32>> {
        self.snapshot(id).map(|stats| stats.loss_percent())
    }
}
