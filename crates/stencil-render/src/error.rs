//! Error types for the generation pipeline.
//!
//! [`Error`] is the single error type returned by every public operation. It
//! hides the template engine's own error type behind a stable set of kinds, so
//! callers can tell a missing template from a bad netmask without looking at
//! MiniJinja internals.
//!
//! Errors fall into two groups:
//!
//! - Run-fatal: [`Error::Encoding`], [`Error::Format`], [`Error::Config`] and
//!   [`Error::Io`] raised while reading the data source. Nothing is rendered.
//! - Per-record: everything raised while resolving, rendering or writing one
//!   record. The generator wraps these in [`RecordError`] so the report can
//!   point at the offending input row.

use std::fmt;
use std::path::PathBuf;

/// Failure of a template function (`ip4`, `ip4mask`, ...).
///
/// Function errors travel through the template engine as the source of its
/// own error and are recovered unchanged as [`Error::Function`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FuncError {
    /// The address, mask or prefix argument is not syntactically valid.
    #[error("{function}: cannot parse '{input}': {reason}")]
    Parse {
        function: &'static str,
        input: String,
        reason: String,
    },

    /// The argument parses but its value is not acceptable.
    #[error("{function}: {reason}")]
    Argument {
        function: &'static str,
        reason: String,
    },
}

impl FuncError {
    pub(crate) fn parse(
        function: &'static str,
        input: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Parse {
            function,
            input: input.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn argument(function: &'static str, reason: impl Into<String>) -> Self {
        Self::Argument {
            function,
            reason: reason.into(),
        }
    }
}

/// Error type for all generation operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Input bytes are not valid UTF-8.
    #[error("{origin} is not encoded in UTF-8 or ASCII (invalid byte at offset {offset})")]
    Encoding { origin: String, offset: usize },

    /// A data row does not match the header.
    #[error("malformed data at line {line}: {message}")]
    Format { line: u64, message: String },

    /// Template source could not be located.
    #[error("template not found: {name}")]
    NotFound { name: String },

    /// Template source failed to parse.
    #[error("template syntax error in '{name}': {message}")]
    Syntax { name: String, message: String },

    /// A template function rejected its input.
    #[error(transparent)]
    Function(#[from] FuncError),

    /// Template referenced an absent key under the `error` missing-key policy.
    #[error("missing key: {0}")]
    MissingKey(String),

    /// A record lacks a column the run depends on.
    #[error("couldn't find '{column}' column in data provided")]
    MissingColumn { column: String },

    /// The output identifier cannot be turned into a path inside the output directory.
    #[error("invalid output target '{name}': {reason}")]
    InvalidTarget { name: String, reason: String },

    /// Any other rendering failure reported by the template engine.
    #[error("template error: {0}")]
    Template(String),

    /// Filesystem failure.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid run configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// A record failed and the run is configured to abort.
    #[error(transparent)]
    Record(Box<RecordError>),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// Short, stable name of the error kind, used in reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Encoding { .. } => "encoding",
            Error::Format { .. } => "format",
            Error::NotFound { .. } => "not-found",
            Error::Syntax { .. } => "syntax",
            Error::Function(FuncError::Parse { .. }) => "parse",
            Error::Function(FuncError::Argument { .. }) => "argument",
            Error::MissingKey(_) => "missing-key",
            Error::MissingColumn { .. } => "missing-column",
            Error::InvalidTarget { .. } => "invalid-target",
            Error::Template(_) => "template",
            Error::Io { .. } => "io",
            Error::Config(_) => "config",
            Error::Record(record) => record.error.kind(),
        }
    }
}

// Keeps engine details out of the public API. Function failures are found by
// walking the source chain, since the engine wraps them.
impl From<minijinja::Error> for Error {
    fn from(err: minijinja::Error) -> Self {
        use minijinja::ErrorKind;

        if let Some(func_err) = find_func_error(&err) {
            return Error::Function(func_err);
        }

        match err.kind() {
            ErrorKind::TemplateNotFound => Error::NotFound {
                name: err.name().unwrap_or_default().to_string(),
            },
            ErrorKind::SyntaxError | ErrorKind::BadEscape => Error::Syntax {
                name: err.name().unwrap_or("<string>").to_string(),
                message: err.to_string(),
            },
            ErrorKind::UndefinedError => Error::MissingKey(err.to_string()),
            _ => Error::Template(err.to_string()),
        }
    }
}

fn find_func_error(err: &minijinja::Error) -> Option<FuncError> {
    let mut current: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(e) = current {
        if let Some(func_err) = e.downcast_ref::<FuncError>() {
            return Some(func_err.clone());
        }
        current = e.source();
    }
    None
}

/// A per-record failure with enough context to find the input row.
#[derive(Debug)]
pub struct RecordError {
    /// 1-based line of the data row in the source file.
    pub line: u64,
    /// Template the record asked for, when known.
    pub template: Option<String>,
    /// Output identifier of the record, when known.
    pub output: Option<String>,
    /// The underlying failure.
    pub error: Error,
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "record at line {}", self.line)?;
        if let Some(template) = &self.template {
            write!(f, " (template '{}'", template)?;
            if let Some(output) = &self.output {
                write!(f, ", output '{}'", output)?;
            }
            write!(f, ")")?;
        }
        write!(f, ": {}", self.error)
    }
}

impl std::error::Error for RecordError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::NotFound {
            name: "router".to_string(),
        };
        assert!(err.to_string().contains("template not found"));
        assert!(err.to_string().contains("router"));
    }

    #[test]
    fn test_from_minijinja_template_not_found() {
        let mj_err = minijinja::Error::new(
            minijinja::ErrorKind::TemplateNotFound,
            "template 'foo' not found",
        );
        let err: Error = mj_err.into();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn test_from_minijinja_undefined_is_missing_key() {
        let mj_err = minijinja::Error::new(minijinja::ErrorKind::UndefinedError, "undefined value");
        let err: Error = mj_err.into();
        assert!(matches!(err, Error::MissingKey(_)));
        assert_eq!(err.kind(), "missing-key");
    }

    #[test]
    fn test_function_error_recovered_from_source() {
        let func_err = FuncError::argument("ip4", "negative offset");
        let mj_err = minijinja::Error::new(
            minijinja::ErrorKind::InvalidOperation,
            func_err.to_string(),
        )
        .with_source(func_err.clone());

        match Error::from(mj_err) {
            Error::Function(recovered) => assert_eq!(recovered, func_err),
            other => panic!("expected function error, got {other:?}"),
        }
    }

    #[test]
    fn test_record_error_display_names_row_and_template() {
        let err = RecordError {
            line: 4,
            template: Some("edge".into()),
            output: Some("r1".into()),
            error: Error::MissingKey("Loopback".into()),
        };
        let text = err.to_string();
        assert!(text.starts_with("record at line 4"));
        assert!(text.contains("template 'edge'"));
        assert!(text.contains("output 'r1'"));
        assert!(text.contains("Loopback"));
    }
}
