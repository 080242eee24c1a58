use syslog::{Facility, Formatter3164, Logger, LoggerBackend};
use tracing::debug;
use vigil_core::{Error, LogSink};

/// Forwards event messages to the local system log daemon.
///
/// The connection is opened on first use and reopened after a failure.
#[derive(Default)]
pub struct SystemLog {
    logger: Option<Logger<LoggerBackend, Formatter3164>>,
}

impl SystemLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn connect() -> vigil_core::Result<Logger<LoggerBackend, Formatter3164>> {
        let formatter = Formatter3164 {
            facility: Facility::LOG_DAEMON,
            hostname: None,
            process: String::from("vigil"),
            pid: std::process::id(),
        };
        let logger = syslog::unix(formatter).map_err(|err| Error::LogSink(err.to_string()))?;
        debug!("connected to system log");
        Ok(logger)
    }
}

impl LogSink for SystemLog {
    fn emit(&mut self, message: &str) -> vigil_core::Result<()> {
        let mut logger = match self.logger.take() {
            Some(logger) => logger,
            None => Self::connect()?,
        };
        logger
            .info(message)
            .map_err(|err| Error::LogSink(err.to_string()))?;
        self.logger = Some(logger);
        Ok(())
    }
}
