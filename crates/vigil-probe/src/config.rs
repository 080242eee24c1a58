use std::time::Duration;

/// Default values for the probing engine.
pub mod defaults {
    use std::time::Duration;

    /// The default value for `ping-interval`.
    pub const DEFAULT_PING_INTERVAL: Duration = Duration::from_secs(1);

    /// The default value for `ping-timeout`.
    pub const DEFAULT_PING_TIMEOUT: Duration = Duration::from_secs(3);

    /// The default value for `payload-size`.
    pub const DEFAULT_PAYLOAD_SIZE: usize = 56;

    /// The delay between the first probe of consecutive targets.
    pub const DEFAULT_TARGET_STAGGER: Duration = Duration::from_millis(10);

    /// How long the receiver blocks before checking for shutdown.
    pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(100);
}

/// Probing engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeConfig {
    /// Time between echo requests to the same target.
    pub ping_interval: Duration,
    /// Time after which an unanswered echo request is lost.
    pub ping_timeout: Duration,
    /// Size of the echo payload in bytes.
    pub payload_size: usize,
    /// Delay between the first probe of consecutive targets.
    pub target_stagger: Duration,
    pub read_timeout: Duration,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            ping_interval: defaults::DEFAULT_PING_INTERVAL,
            ping_timeout: defaults::DEFAULT_PING_TIMEOUT,
            payload_size: defaults::DEFAULT_PAYLOAD_SIZE,
            target_stagger: defaults::DEFAULT_TARGET_STAGGER,
            read_timeout: defaults::DEFAULT_READ_TIMEOUT,
        }
    }
}
