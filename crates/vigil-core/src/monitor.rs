use crate::config::MonitorConfig;
use crate::error::{Error, Result};
use crate::liveness::{Evaluation, LivenessTable};
use crate::registry::TargetRegistry;
use crate::report::Reporter;
use crate::stats::StatsStore;
use crate::summary::Summary;
use crate::types::{IntervalMetrics, TargetId};
use chrono::{DateTime, FixedOffset, Local};
use crossbeam::channel::{bounded, select, tick, Sender};
use itertools::Itertools;
use std::fmt::Debug;
use std::sync::Arc;
use std::thread;
use std::thread::JoinHandle;
use tracing::{debug, instrument, warn};

/// A source of per-interval probe metrics.
///
/// Implemented by the probing engine.
pub trait Prober: Send + Sync {
    /// Return the metrics gathered for each target since the previous call
    /// and reset the engine's counters.
    fn export_and_clear(&self) -> Vec<(TargetId, IntervalMetrics)>;

    /// Stop probing and release any resources held by the engine.
    fn stop(&self);
}

/// A clock returning the current time.
pub type Clock = fn() -> DateTime<FixedOffset>;

/// The current local time.
#[must_use]
pub fn local_now() -> DateTime<FixedOffset> {
    Local::now().fixed_offset()
}

/// The monitoring state for a run.
///
/// Holds the target registry, the stats store and the liveness records.
/// While running, the `Monitor` is owned by the worker thread; it is handed
/// back by [`MonitorHandle::shutdown`] once that thread has been joined.
pub struct Monitor {
    config: MonitorConfig,
    registry: TargetRegistry,
    stats: StatsStore,
    liveness: LivenessTable,
    clock: Clock,
}

impl Debug for Monitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Monitor")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("stats", &self.stats)
            .field("liveness", &self.liveness)
            .finish_non_exhaustive()
    }
}

impl Monitor {
    /// Create zeroed stats and liveness records for every registered target.
    #[must_use]
    pub fn new(registry: TargetRegistry, config: MonitorConfig) -> Self {
        let targets = registry.len();
        Self {
            stats: StatsStore::new(targets),
            liveness: LivenessTable::new(targets, config.tolerance),
            registry,
            config,
            clock: local_now,
        }
    }

    /// Use `clock` to timestamp events.
    #[must_use]
    pub fn with_clock(self, clock: Clock) -> Self {
        Self { clock, ..self }
    }

    #[must_use]
    pub const fn config(&self) -> &MonitorConfig {
        &self.config
    }

    #[must_use]
    pub const fn registry(&self) -> &TargetRegistry {
        &self.registry
    }

    #[must_use]
    pub const fn stats(&self) -> &StatsStore {
        &self.stats
    }

    #[must_use]
    pub const fn liveness(&self) -> &LivenessTable {
        &self.liveness
    }

    /// Process one interval snapshot.
    ///
    /// Samples are handled in registration order.  Each sample is folded into
    /// the stats store, evaluated by the liveness state machine and, if an
    /// event results, reported.  Returns the number of events reported.
    #[instrument(skip_all, level = "debug")]
    pub fn tick(
        &mut self,
        snapshot: Vec<(TargetId, IntervalMetrics)>,
        reporter: &mut Reporter,
    ) -> usize {
        let mut emitted = 0;
        for (id, metrics) in snapshot.into_iter().sorted_by_key(|(id, _)| *id) {
            match self.sample(id, metrics, reporter) {
                Ok(true) => emitted += 1,
                Ok(false) => {}
                Err(err) => warn!(%id, %err, "discarding sample"),
            }
        }
        emitted
    }

    fn sample(
        &mut self,
        id: TargetId,
        metrics: IntervalMetrics,
        reporter: &mut Reporter,
    ) -> Result<bool> {
        let name = self.registry.name_of(id).ok_or(Error::UnknownTarget(id))?;
        let evaluation = self.liveness.evaluate(id, metrics)?;
        self.stats.record(id, metrics)?;
        match evaluation {
            Evaluation::Emit(decision) => {
                let lifetime_loss = self.stats.loss_percent(id)?;
                let message = decision.describe(name, lifetime_loss);
                let now = (self.clock)();
                reporter.emit(name, decision.severity(), &message, &now);
                Ok(true)
            }
            Evaluation::Tolerated => {
                debug!(%id, lost = metrics.lost, "tolerated single loss");
                Ok(false)
            }
            Evaluation::Quiet => Ok(false),
        }
    }

    /// Build the end of run summary, if summaries are enabled.
    #[must_use]
    pub fn summary(
        &self,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    ) -> Option<Summary> {
        self.config.summary.then(|| {
            Summary::compute(
                &self.registry,
                &self.stats,
                self.config.ignore_no_loss,
                start,
                end,
            )
        })
    }

    /// Run the monitor on a new thread.
    ///
    /// Every report interval the worker pulls a snapshot from `prober` and
    /// processes it with [`Monitor::tick`].
    pub fn spawn(self, prober: Arc<dyn Prober>, mut reporter: Reporter) -> Result<MonitorHandle> {
        let (stop_tx, stop_rx) = bounded::<()>(1);
        let interval = self.config.report_interval;
        let worker_prober = Arc::clone(&prober);
        let handle = thread::Builder::new()
            .name(String::from("monitor"))
            .spawn(move || {
                let mut monitor = self;
                let ticker = tick(interval);
                loop {
                    select! {
                        recv(stop_rx) -> _ => break,
                        recv(ticker) -> _ => {
                            let snapshot = worker_prober.export_and_clear();
                            monitor.tick(snapshot, &mut reporter);
                        }
                    }
                }
                debug!("monitor worker stopped");
                (monitor, reporter)
            })?;
        Ok(MonitorHandle {
            stop_tx,
            handle,
            prober,
        })
    }
}

/// A handle to a running [`Monitor`].
pub struct MonitorHandle {
    stop_tx: Sender<()>,
    handle: JoinHandle<(Monitor, Reporter)>,
    prober: Arc<dyn Prober>,
}

impl MonitorHandle {
    /// Stop the worker, then the probing engine.
    ///
    /// A tick already in progress is allowed to complete.  The monitor and
    /// reporter are only returned once the worker thread has been joined and
    /// the prober stopped, so the stats can no longer change.
    pub fn shutdown(self) -> Result<(Monitor, Reporter)> {
        // a send error means the worker has already gone, join reports why
        let _ = self.stop_tx.send(());
        let stopped = self.handle.join().map_err(|_| Error::WorkerPanicked)?;
        self.prober.stop();
        Ok(stopped)
    }
}
