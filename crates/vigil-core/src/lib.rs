//! Vigil - host liveness tracking and reporting.
//!
//! This crate provides the state tracking engine used by the standalone
//! `vigil` monitor.  It consumes periodic per-target probe metrics from a
//! [`Prober`], decides when a target's liveness must be reported, keeps
//! lifetime loss counters and produces an end of run [`Summary`].
//!
//! # Example
//!
//! The following example registers two targets, processes a single interval
//! of metrics and prints the events to stdout:
//!
//! ```rust
//! # fn main() -> anyhow::Result<()> {
//! # use std::net::IpAddr;
//! # use std::str::FromStr;
//! use vigil_core::{
//!     ConsoleSink, DisabledLog, IntervalMetrics, Monitor, MonitorConfig, Reporter, Severity,
//!     TargetRegistry,
//! };
//!
//! struct Stdout;
//!
//! impl ConsoleSink for Stdout {
//!     fn write_line(&mut self, _severity: Severity, line: &str) {
//!         println!("{line}");
//!     }
//! }
//!
//! let mut registry = TargetRegistry::new();
//! let a = registry.register("a.example", IpAddr::from_str("192.0.2.1")?)?;
//! let b = registry.register("b.example", IpAddr::from_str("192.0.2.2")?)?;
//! let mut monitor = Monitor::new(registry, MonitorConfig::default());
//! let mut reporter = Reporter::new(Box::new(Stdout), Box::new(DisabledLog), "%H:%M:%S")?;
//! let snapshot = vec![
//!     (a, IntervalMetrics::new(5, 0)),
//!     (b, IntervalMetrics::new(5, 5)),
//! ];
//! assert_eq!(2, monitor.tick(snapshot, &mut reporter));
//! # Ok(())
//! # }
//! ```
//!
//! # See Also
//!
//! - [`Monitor::spawn`] - Run the monitor on a new thread.
//! - [`MonitorHandle::shutdown`] - Stop the monitor and the prober in order.
#![allow(clippy::struct_field_names, clippy::use_self)]
#![deny(unsafe_code)]

mod config;
mod constants;
mod error;
mod liveness;
mod monitor;
mod registry;
mod report;
mod stats;
mod summary;
mod types;

pub use config::{defaults, validate_date_format, MonitorConfig};
pub use constants::{MAX_TARGETS, SUMMARY_CRITICAL_LOSS_PCT, SUMMARY_WARN_LOSS_PCT};
pub use error::{Error, Result};
pub use liveness::{
    evaluate, Decision, Evaluation, LivenessRecord, LivenessState, LivenessTable, Transition,
};
pub use monitor::{local_now, Clock, Monitor, MonitorHandle, Prober};
pub use registry::{Target, TargetRegistry};
pub use report::{ConsoleSink, DisabledLog, LogSink, NullLog, Reporter};
pub use stats::StatsStore;
pub use summary::{classify, Summary, SummaryLine};
pub use types::{HostStats, IntervalMetrics, Severity, TargetId};
