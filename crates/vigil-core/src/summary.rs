use crate::constants::{SUMMARY_CRITICAL_LOSS_PCT, SUMMARY_WARN_LOSS_PCT};
use crate::registry::TargetRegistry;
use crate::report::Reporter;
use crate::stats::StatsStore;
use crate::types::{HostStats, Severity};
use chrono::{DateTime, FixedOffset};
use tracing::instrument;

/// The end of run loss report for a single target.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryLine {
    pub name: String,
    pub stats: HostStats,
    /// Lifetime loss percentage (0..=100).
    pub loss: f32,
    pub severity: Severity,
}

impl SummaryLine {
    #[must_use]
    pub fn describe(&self) -> String {
        format!(
            "{} loss {:.2}% [{}/{}]",
            self.name, self.loss, self.stats.received, self.stats.sent
        )
    }
}

/// The end of run loss report.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    /// The reported targets, in registration order.
    pub lines: Vec<SummaryLine>,
    /// Did any target lose any probe?
    pub any_loss: bool,
}

impl Summary {
    /// Build the summary from the final stats.
    ///
    /// Targets which never sent a probe are omitted, as are targets without
    /// loss when `ignore_no_loss` is set.  A target which sent probes but
    /// never received a reply has lost everything.
    #[instrument(skip(registry, stats), level = "debug")]
    #[must_use]
    pub fn compute(
        registry: &TargetRegistry,
        stats: &StatsStore,
        ignore_no_loss: bool,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    ) -> Self {
        let mut any_loss = false;
        let mut lines = vec![];
        for target in registry.targets() {
            let Ok(host) = stats.snapshot(target.id()) else {
                continue;
            };
            if host.sent == 0 {
                continue;
            }
            let loss = host.loss_percent().unwrap_or(100.0);
            let lossless = host.received >= host.sent;
            any_loss |= !lossless;
            if ignore_no_loss && lossless {
                continue;
            }
            lines.push(SummaryLine {
                name: target.name().to_string(),
                stats: host,
                loss,
                severity: classify(loss),
            });
        }
        Self {
            start,
            end,
            lines,
            any_loss,
        }
    }

    /// Write the summary to the console.
    pub fn render(&self, reporter: &mut Reporter) {
        let start = reporter.format_timestamp(&self.start);
        let end = reporter.format_timestamp(&self.end);
        reporter.line(Severity::Ok, &format!("summary from {start} to {end}"));
        for line in &self.lines {
            reporter.line(line.severity, &line.describe());
        }
        if !self.any_loss {
            reporter.line(Severity::Ok, "no packet loss observed on any target");
        }
    }
}

/// Classify a lifetime loss percentage.
#[must_use]
pub fn classify(loss: f32) -> Severity {
    if loss > SUMMARY_CRITICAL_LOSS_PCT {
        Severity::Critical
    } else if loss > SUMMARY_WARN_LOSS_PCT {
        Severity::Warn
    } else {
        Severity::Ok
    }
}
