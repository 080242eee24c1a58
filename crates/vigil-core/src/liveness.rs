use crate::error::{Error, Result};
use crate::types::{IntervalMetrics, Severity, TargetId};
use tracing::instrument;

/// The displayed liveness of a single target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LivenessRecord {
    /// Was the target up as of the last displayed interval?
    pub is_alive: bool,
    /// Has any state been displayed for this target yet?
    pub displayed: bool,
}

impl LivenessRecord {
    /// The state of a target before the first sample is seen.
    ///
    /// Targets start optimistically `Up`, but undisplayed, so the first real
    /// sample always produces an event.
    pub const INITIAL: Self = Self {
        is_alive: true,
        displayed: false,
    };

    #[must_use]
    pub const fn state(&self) -> LivenessState {
        if self.is_alive {
            LivenessState::Up
        } else {
            LivenessState::Down
        }
    }
}

impl Default for LivenessRecord {
    fn default() -> Self {
        Self::INITIAL
    }
}

/// The liveness of a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LivenessState {
    Up,
    Down,
}

/// The kind of event to report for a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The target answered every probe.
    Up,
    /// The target is up but some probes went unanswered.
    IncompleteReply,
    /// The target answered no probes.
    Down,
}

impl Transition {
    #[must_use]
    pub const fn severity(self) -> Severity {
        match self {
            Self::Up => Severity::Ok,
            Self::IncompleteReply => Severity::Warn,
            Self::Down => Severity::Critical,
        }
    }
}

/// An event to be reported for one target and one interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub transition: Transition,
    /// Probes answered in the interval.
    pub received: u64,
    /// Probes sent in the interval.
    pub sent: u64,
}

impl Decision {
    #[must_use]
    pub const fn severity(&self) -> Severity {
        self.transition.severity()
    }

    /// Describe the event for target `name`.
    ///
    /// Incomplete replies also carry the lifetime loss percentage of the
    /// target.
    #[must_use]
    pub fn describe(&self, name: &str, lifetime_loss: Option<f32>) -> String {
        let (received, sent) = (self.received, self.sent);
        match self.transition {
            Transition::Up => format!("{name} is up [{received}/{sent}]"),
            Transition::Down => format!("{name} is down [{received}/{sent}]"),
            Transition::IncompleteReply => match lifetime_loss {
                Some(loss) => {
                    format!("{name} incomplete reply [{received}/{sent}/{loss:.2}%]")
                }
                None => format!("{name} incomplete reply [{received}/{sent}/-]"),
            },
        }
    }
}

/// The outcome of evaluating one sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Evaluation {
    /// An event must be reported.
    Emit(Decision),
    /// Nothing changed worth reporting.
    Quiet,
    /// The sample was absorbed by the tolerance policy.
    Tolerated,
}

/// Evaluate one interval sample against a target's record.
///
/// The record is updated to reflect the sample unless the sample is
/// tolerated, in which case the record is left untouched.
#[must_use]
pub fn evaluate(
    record: &mut LivenessRecord,
    metrics: IntervalMetrics,
    tolerance: bool,
) -> Evaluation {
    let received = metrics.received();
    let alive = received > 0;
    let lossy = received != metrics.sent;
    if tolerance && record.displayed && record.is_alive && alive && metrics.lost == 1 {
        return Evaluation::Tolerated;
    }
    let emit = !record.displayed || record.is_alive != alive || (alive && lossy);
    record.is_alive = alive;
    record.displayed = true;
    if !emit {
        return Evaluation::Quiet;
    }
    let transition = match (alive, metrics.lost) {
        (true, 0) => Transition::Up,
        (true, _) => Transition::IncompleteReply,
        (false, _) => Transition::Down,
    };
    Evaluation::Emit(Decision {
        transition,
        received,
        sent: metrics.sent,
    })
}

/// The liveness records for all targets.
#[derive(Debug, Clone)]
pub struct LivenessTable {
    records: Vec<LivenessRecord>,
    tolerance: bool,
}

impl LivenessTable {
    #[must_use]
    pub fn new(targets: usize, tolerance: bool) -> Self {
        Self {
            records: vec![LivenessRecord::INITIAL; targets],
            tolerance,
        }
    }

    /// Evaluate a sample for target `id`.
    #[instrument(skip(self), level = "trace")]
    pub fn evaluate(&mut self, id: TargetId, metrics: IntervalMetrics) -> Result<Evaluation> {
        let record = self
            .records
            .get_mut(id.index())
            .ok_or(Error::UnknownTarget(id))?;
        Ok(evaluate(record, metrics, self.tolerance))
    }

    #[must_use]
    pub fn record(&self, id: TargetId) -> Option<LivenessRecord> {
        self.records.get(id.index()).copied()
    }
}
