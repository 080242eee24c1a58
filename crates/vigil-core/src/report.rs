use crate::config::{validate_date_format, MonitorConfig};
use crate::constants::BELL;
use crate::error::Result;
use crate::types::Severity;
use chrono::{DateTime, TimeZone};
use std::fmt::Display;
use tracing::{debug, warn};

/// Where reported lines are written for the operator.
///
/// Rendering of the [`Severity`] (color, prefix) is the concern of the
/// implementation.
pub trait ConsoleSink: Send {
    fn write_line(&mut self, severity: Severity, line: &str);
}

/// A secondary destination for event messages, such as the system log.
pub trait LogSink: Send {
    /// Should messages be forwarded to this sink at all?
    fn is_enabled(&self) -> bool {
        true
    }

    fn emit(&mut self, message: &str) -> Result<()>;
}

/// A log sink which is switched off.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledLog;

impl LogSink for DisabledLog {
    fn is_enabled(&self) -> bool {
        false
    }

    fn emit(&mut self, _message: &str) -> Result<()> {
        Ok(())
    }
}

/// A log sink which accepts and discards every message.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLog;

impl LogSink for NullLog {
    fn emit(&mut self, _message: &str) -> Result<()> {
        Ok(())
    }
}

/// Routes timestamped event lines to the console and log sinks.
pub struct Reporter {
    console: Box<dyn ConsoleSink>,
    log: Box<dyn LogSink>,
    date_format: String,
    log_failed: bool,
}

impl Reporter {
    /// Create a reporter rendering timestamps with `date_format`.
    ///
    /// Fails with [`Error::BadDateFormat`](crate::Error::BadDateFormat) if
    /// `date_format` contains an unknown specifier.
    pub fn new(
        console: Box<dyn ConsoleSink>,
        log: Box<dyn LogSink>,
        date_format: impl Into<String>,
    ) -> Result<Self> {
        let date_format = date_format.into();
        validate_date_format(&date_format)?;
        Ok(Self {
            console,
            log,
            date_format,
            log_failed: false,
        })
    }

    /// Create a reporter from the monitor configuration.
    ///
    /// `log` is only used when `config.log_sink` is set.
    pub fn from_config(
        config: &MonitorConfig,
        console: Box<dyn ConsoleSink>,
        log: Box<dyn LogSink>,
    ) -> Result<Self> {
        let log = if config.log_sink {
            log
        } else {
            Box::new(DisabledLog)
        };
        Self::new(console, log, config.date_format.as_str())
    }

    /// Report an event for `target_name`.
    ///
    /// The console line is prefixed with `timestamp` rendered in the
    /// configured date format and, for alerting severities, ends with the
    /// bell character.  If the log sink is enabled the message is forwarded
    /// to it; the first forwarding failure is reported on the console and
    /// later failures are dropped silently.
    pub fn emit<Tz>(
        &mut self,
        target_name: &str,
        severity: Severity,
        message: &str,
        timestamp: &DateTime<Tz>,
    ) where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        debug!(target_name, %severity, message, "event");
        let stamp = self.format_timestamp(timestamp);
        let line = if severity.is_alert() {
            format!("{stamp} {message}{BELL}")
        } else {
            format!("{stamp} {message}")
        };
        self.console.write_line(severity, &line);
        if self.log.is_enabled() {
            if let Err(err) = self.log.emit(message) {
                if !self.log_failed {
                    self.log_failed = true;
                    warn!(%err, "log sink failed");
                    self.console
                        .write_line(Severity::Warn, &format!("log sink unavailable: {err}"));
                }
            }
        }
    }

    /// Write a line to the console without a timestamp or forwarding.
    pub fn line(&mut self, severity: Severity, line: &str) {
        self.console.write_line(severity, line);
    }

    /// Render `timestamp` in the configured date format.
    pub fn format_timestamp<Tz>(&self, timestamp: &DateTime<Tz>) -> String
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        timestamp.format(&self.date_format).to_string()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::error::Error;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// A console which records every line written to it.
    #[derive(Debug, Clone, Default)]
    pub struct RecordingConsole {
        pub lines: Arc<Mutex<Vec<(Severity, String)>>>,
    }

    impl RecordingConsole {
        pub fn lines(&self) -> Vec<(Severity, String)> {
            self.lines.lock().clone()
        }
    }

    impl ConsoleSink for RecordingConsole {
        fn write_line(&mut self, severity: Severity, line: &str) {
            self.lines.lock().push((severity, line.to_string()));
        }
    }

    /// A log sink which records every message, or fails every call.
    #[derive(Debug, Clone, Default)]
    pub struct RecordingLog {
        pub messages: Arc<Mutex<Vec<String>>>,
        pub fail: bool,
    }

    impl LogSink for RecordingLog {
        fn emit(&mut self, message: &str) -> Result<()> {
            if self.fail {
                Err(Error::LogSink(String::from("daemon unreachable")))
            } else {
                self.messages.lock().push(message.to_string());
                Ok(())
            }
        }
    }
}
