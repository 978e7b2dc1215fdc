//! Run summary handed to the reporting layer.

use std::path::PathBuf;

use serde::Serialize;

use crate::error::RecordError;

/// One failed record, flattened for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureReport {
    pub line: u64,
    pub template: Option<String>,
    pub output: Option<String>,
    pub kind: &'static str,
    pub message: String,
}

impl From<&RecordError> for FailureReport {
    fn from(err: &RecordError) -> Self {
        Self {
            line: err.line,
            template: err.template.clone(),
            output: err.output.clone(),
            kind: err.error.kind(),
            message: err.error.to_string(),
        }
    }
}

/// What a run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Distinct files written, in first-write order.
    pub written: Vec<PathBuf>,
    /// Files left untouched because they existed before the run.
    pub skipped: Vec<PathBuf>,
    /// Files created (truncated) this run.
    pub created: usize,
    /// Sections appended to files created earlier in the run.
    pub appended: usize,
    /// Renders sent to standard output.
    pub stdout_writes: usize,
    /// Records rendered and routed without error.
    pub rendered: usize,
    /// Generated files removed before the run (force-override only).
    pub pruned: usize,
    /// Records that failed.
    pub failures: Vec<FailureReport>,
}

impl RunSummary {
    /// True if no record failed.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    pub(crate) fn record_failure(&mut self, err: &RecordError) {
        self.failures.push(FailureReport::from(err));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_failure_report_from_record_error() {
        let err = RecordError {
            line: 7,
            template: Some("edge".into()),
            output: None,
            error: Error::NotFound {
                name: "edge".into(),
            },
        };
        let mut summary = RunSummary::default();
        assert!(summary.is_success());

        summary.record_failure(&err);
        assert!(!summary.is_success());
        assert_eq!(summary.failure_count(), 1);
        assert_eq!(summary.failures[0].line, 7);
        assert_eq!(summary.failures[0].kind, "not-found");
        assert!(summary.failures[0].message.contains("edge"));
    }
}
