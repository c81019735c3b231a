//! Buffered per-step reporting.
//!
//! Each provisioning or checking step contributes a `(label, status)` row.
//! Rows are buffered so the status column can be aligned, and the report is
//! flushed before any fatal exit so every completed step stays visible.

use std::fmt;
use std::io::{self, Write};

use crate::errors::Result;

/// Outcome of a single reported step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Success,
    Failure,
    Yes,
    No,
    Unknown,
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StepStatus::Success => "SUCCESS",
            StepStatus::Failure => "FAILURE",
            StepStatus::Yes => "YES",
            StepStatus::No => "NO",
            StepStatus::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

/// A buffered, column-aligned step report.
#[derive(Debug, Default)]
pub struct Report {
    rows: Vec<(String, String)>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step row.
    pub fn push(&mut self, label: impl Into<String>, status: StepStatus) {
        self.rows.push((label.into(), status.to_string()));
    }

    /// Append a row carrying an arbitrary value (e.g. a revocation time).
    pub fn push_value(&mut self, label: impl Into<String>, value: impl Into<String>) {
        self.rows.push((label.into(), value.into()));
    }

    /// Record the outcome of a step: SUCCESS on `Ok`, FAILURE on `Err`.
    /// The result is handed back so the caller can propagate the error
    /// after the report is flushed.
    pub fn record<T>(&mut self, label: &str, outcome: Result<T>) -> Result<T> {
        match outcome {
            Ok(value) => {
                self.push(label, StepStatus::Success);
                Ok(value)
            }
            Err(e) => {
                self.push(label, StepStatus::Failure);
                Err(e)
            }
        }
    }

    /// The buffered rows, for inspection in tests.
    pub fn rows(&self) -> &[(String, String)] {
        &self.rows
    }

    /// Write all rows with labels padded to the widest so the status
    /// column lines up.
    pub fn flush_to(&self, w: &mut dyn Write) -> io::Result<()> {
        let width = self.rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
        for (label, value) in &self.rows {
            writeln!(w, "{:<width$}\t{}", label, value, width = width)?;
        }
        w.flush()
    }

    /// Flush the report to stdout.
    pub fn flush(&self) {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        // Report output is best-effort; a closed stdout must not mask the
        // real error being propagated.
        let _ = self.flush_to(&mut handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Error;

    #[test]
    fn test_status_rendering() {
        assert_eq!(StepStatus::Success.to_string(), "SUCCESS");
        assert_eq!(StepStatus::Failure.to_string(), "FAILURE");
        assert_eq!(StepStatus::Yes.to_string(), "YES");
        assert_eq!(StepStatus::No.to_string(), "NO");
        assert_eq!(StepStatus::Unknown.to_string(), "UNKNOWN");
    }

    #[test]
    fn test_flush_aligns_status_column() {
        let mut report = Report::new();
        report.push("Short:", StepStatus::Yes);
        report.push("A much longer label:", StepStatus::No);

        let mut out = Vec::new();
        report.flush_to(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        // Both statuses start at the same column.
        assert_eq!(lines[0].find("YES"), lines[1].find("NO"));
    }

    #[test]
    fn test_record_marks_failure_and_propagates() {
        let mut report = Report::new();
        let outcome: Result<()> =
            report.record("Step:", Err(Error::Precondition { flag: "--mount" }));
        assert!(outcome.is_err());
        assert_eq!(report.rows(), &[("Step:".to_string(), "FAILURE".to_string())]);
    }

    #[test]
    fn test_record_marks_success() {
        let mut report = Report::new();
        let outcome = report.record("Step:", Ok(42));
        assert_eq!(outcome.unwrap(), 42);
        assert_eq!(report.rows(), &[("Step:".to_string(), "SUCCESS".to_string())]);
    }
}
