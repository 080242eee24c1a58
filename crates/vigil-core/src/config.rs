use crate::error::{Error, Result};
use std::fmt::Write;
use std::time::Duration;

/// Default values for configuration.
pub mod defaults {
    use std::time::Duration;

    /// The default value for `report-interval`.
    pub const DEFAULT_REPORT_INTERVAL: Duration = Duration::from_secs(5);

    /// The default value for `tolerance`.
    pub const DEFAULT_TOLERANCE: bool = false;

    /// The default value for `summary`.
    pub const DEFAULT_SUMMARY: bool = true;

    /// The default value for `ignore-no-loss`.
    pub const DEFAULT_IGNORE_NO_LOSS: bool = true;

    /// The default value for `syslog`.
    pub const DEFAULT_LOG_SINK: bool = false;

    /// The default value for `date-format`.
    pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
}

/// The read-only configuration consumed by the monitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    /// How often the probing engine is sampled.
    pub report_interval: Duration,
    /// Ignore a single lost probe per interval for a target that is up.
    pub tolerance: bool,
    /// Print a loss summary on shutdown.
    pub summary: bool,
    /// Omit targets without any loss from the summary.
    pub ignore_no_loss: bool,
    /// The `chrono` format string used for timestamps.
    pub date_format: String,
    /// Forward events to the log sink.
    pub log_sink: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            report_interval: defaults::DEFAULT_REPORT_INTERVAL,
            tolerance: defaults::DEFAULT_TOLERANCE,
            summary: defaults::DEFAULT_SUMMARY,
            ignore_no_loss: defaults::DEFAULT_IGNORE_NO_LOSS,
            date_format: String::from(defaults::DEFAULT_DATE_FORMAT),
            log_sink: defaults::DEFAULT_LOG_SINK,
        }
    }
}

/// Check that `format` is a usable `chrono` format string.
///
/// `chrono` only reports a bad format specifier when the formatted value is
/// written, so the format is rendered once against a fixed timestamp.
pub fn validate_date_format(format: &str) -> Result<()> {
    let sample = chrono::DateTime::<chrono::Utc>::UNIX_EPOCH;
    let mut buf = String::new();
    write!(buf, "{}", sample.format(format))
        .map_err(|_| Error::BadDateFormat(format.to_string()))
}
