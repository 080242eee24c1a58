/// The maximum number of targets which may be monitored at once.
///
/// Target identifiers are a `u8` and are used directly as an index into the
/// per-target stats and liveness tables, giving 256 distinct targets (0..=255).
pub const MAX_TARGETS: usize = 256;

/// The bell character appended to lines which report a bad transition.
pub const BELL: char = '\x07';

/// The summary loss percentage above which a target is reported as critical.
pub const SUMMARY_CRITICAL_LOSS_PCT: f32 = 5.0;

/// The summary loss percentage above which a target is reported as a warning.
pub const SUMMARY_WARN_LOSS_PCT: f32 = 0.1;
