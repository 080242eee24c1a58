use crossterm::style::Stylize;
use crossterm::tty::IsTty;
use std::io::{self, Write};
use tracing::debug;
use vigil_core::{ConsoleSink, Severity};

/// Writes event lines to stdout, colored by severity when stdout is a terminal.
#[derive(Debug, Clone, Copy)]
pub struct Console {
    color: bool,
}

impl Console {
    pub fn new() -> Self {
        Self {
            color: io::stdout().is_tty(),
        }
    }
}

impl ConsoleSink for Console {
    fn write_line(&mut self, severity: Severity, line: &str) {
        let mut stdout = io::stdout().lock();
        let written = if self.color {
            match severity {
                Severity::Ok => writeln!(stdout, "{}", line.green()),
                Severity::Warn => writeln!(stdout, "{}", line.yellow()),
                Severity::Critical => writeln!(stdout, "{}", line.red()),
            }
        } else {
            writeln!(stdout, "{line}")
        };
        if let Err(err) = written.and_then(|()| stdout.flush()) {
            debug!(%err, "console write failed");
        }
    }
}
