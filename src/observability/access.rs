//! Access log and operator console.
//!
//! # Responsibilities
//! - Write one `<timestamp> - <METHOD> <path>` line per completed request
//! - Write the fixed operator lines (banner, shutdown notices)
//!
//! # Design Decisions
//! - Every line is flushed before the lock is released, so an abrupt
//!   process exit never loses a line that was already logged
//! - The sink is injectable so tests can capture output

use chrono::{DateTime, SecondsFormat, Utc};
use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

/// Line-oriented, flush-per-line output shared across tasks.
#[derive(Clone)]
pub struct Console {
    out: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl Console {
    /// Console writing to the process's standard output.
    pub fn stdout() -> Self {
        Self::from_writer(io::stdout())
    }

    pub fn from_writer(writer: impl Write + Send + 'static) -> Self {
        Self {
            out: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    /// Write a single line and flush it.
    pub fn line(&self, line: &str) -> io::Result<()> {
        // Lines are written whole, so a poisoned lock is still usable.
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(out, "{line}")?;
        out.flush()
    }

    /// Like [`Console::line`], reporting failures to the diagnostic log.
    pub fn emit(&self, line: &str) {
        if let Err(e) = self.line(line) {
            tracing::error!(error = %e, "Failed to write console line");
        }
    }
}

impl std::fmt::Debug for Console {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Console").finish_non_exhaustive()
    }
}

/// Emits the per-request access line.
#[derive(Debug, Clone)]
pub struct RequestLogger {
    console: Console,
}

impl RequestLogger {
    pub fn new(console: Console) -> Self {
        Self { console }
    }

    /// Log a completed request, timestamped now.
    pub fn log(&self, method: &str, path: &str) {
        self.console.emit(&format_line(Utc::now(), method, path));
    }
}

/// Render an access line: ISO 8601 UTC with millisecond precision and a `Z` suffix.
pub fn format_line(at: DateTime<Utc>, method: &str, path: &str) -> String {
    format!(
        "{} - {} {}",
        at.to_rfc3339_opts(SecondsFormat::Millis, true),
        method,
        path
    )
}


#[cfg(test)]
mod tests {
    use super::testing::CapturedOutput;
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn line_format_uses_millisecond_utc() {
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()
            + chrono::Duration::milliseconds(67);
        assert_eq!(
            format_line(at, "GET", "/a/b/c"),
            "2024-01-02T03:04:05.067Z - GET /a/b/c"
        );
    }

    #[test]
    fn logger_writes_one_line_per_call() {
        let captured = CapturedOutput::default();
        let logger = RequestLogger::new(Console::from_writer(captured.clone()));

        logger.log("POST", "/");
        logger.log("DELETE", "/x");

        let lines = captured.lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("Z - POST /"));
        assert!(lines[1].ends_with("Z - DELETE /x"));
        // 2024-01-02T03:04:05.067Z
        assert_eq!(lines[0].find(" - "), Some(24));
    }

    #[test]
    fn console_is_shared_between_clones() {
        let captured = CapturedOutput::default();
        let console = Console::from_writer(captured.clone());
        let clone = console.clone();

        console.emit("first");
        clone.emit("second");

        assert_eq!(captured.lines(), vec!["first", "second"]);
    }
}
