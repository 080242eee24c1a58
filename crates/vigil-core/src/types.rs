use std::fmt::{Display, Formatter};

/// `TargetId` newtype.
///
/// Identifiers are assigned in registration order and index directly into
/// the per-target tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Ord, PartialOrd, Hash)]
pub struct TargetId(pub u8);

impl TargetId {
    /// The table index for this target.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl Display for TargetId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The probe counts for a single target over a single report interval.
///
/// Produced by the probing engine and discarded once folded into the
/// cumulative [`HostStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IntervalMetrics {
    /// The number of probes sent in the interval.
    pub sent: u64,
    /// The number of probes which were not answered in the interval.
    pub lost: u64,
}

impl IntervalMetrics {
    #[must_use]
    pub const fn new(sent: u64, lost: u64) -> Self {
        Self { sent, lost }
    }

    /// The number of probes answered in the interval.
    ///
    /// An engine reporting more lost than sent probes is treated as having
    /// received nothing.
    #[must_use]
    pub const fn received(&self) -> u64 {
        self.sent.saturating_sub(self.lost)
    }
}

/// Cumulative probe counts for a single target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HostStats {
    pub received: u64,
    pub sent: u64,
}

impl HostStats {
    #[must_use]
    pub const fn new(received: u64, sent: u64) -> Self {
        Self { received, sent }
    }

    /// The lifetime loss percentage (0..=100).
    ///
    /// Returns `None` if nothing has been sent or nothing has been received.
    #[must_use]
    pub fn loss_percent(&self) -> Option<f32> {
        if self.received == 0 || self.sent == 0 {
            None
        } else {
            let ratio = self.received as f32 / self.sent as f32;
            Some((100.0 * (1.0 - ratio)).clamp(0.0, 100.0))
        }
    }
}

/// The severity of a reported line.
///
/// How a severity is rendered (color, prefix) is the concern of the console
/// sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Ord, PartialOrd, Hash)]
pub enum Severity {
    Ok,
    Warn,
    Critical,
}

impl Severity {
    /// Should an audible alert accompany a line of this severity?
    #[must_use]
    pub const fn is_alert(self) -> bool {
        matches!(self, Self::Warn | Self::Critical)
    }
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ok => write!(f, "ok"),
            Self::Warn => write!(f, "warn"),
            Self::Critical => write!(f, "critical"),
        }
    }
}
