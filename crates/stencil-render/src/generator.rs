//! Driving records through the template cache and the output router.
//!
//! The [`Generator`] processes records strictly in input order, one at a
//! time. Each record names its template and its output through two
//! configured columns.
//!
//! ```rust
//! use stencil_render::{
//!     GenerateOptions, Generator, GlobalVars, MissingKeyPolicy, OutputRouter, Record,
//!     TargetLayout, TemplateCache, TemplateRegistry,
//! };
//!
//! let dir = tempfile::tempdir().unwrap();
//! let mut registry = TemplateRegistry::new();
//! registry.add_inline("edge", "hostname {{ host }}\n");
//!
//! let mut cache = TemplateCache::new(registry, MissingKeyPolicy::default());
//! let mut router = OutputRouter::start(TargetLayout::per_record(dir.path()), false).unwrap();
//! let options = GenerateOptions::new("template", "output");
//!
//! let records = vec![Record::new(2)
//!     .with("template", "edge")
//!     .with("output", "r1")
//!     .with("host", "r1")];
//! let summary = Generator::new(options, &mut cache, &mut router)
//!     .run(&records, &GlobalVars::new())
//!     .unwrap();
//!
//! assert!(summary.is_success());
//! assert_eq!(summary.written, vec![dir.path().join("r1.txt")]);
//! ```

use std::fmt;
use std::io::Write;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::data::{GlobalVars, Record};
use crate::error::{Error, RecordError};
use crate::router::{OutputRouter, RouteOutcome};
use crate::summary::RunSummary;
use crate::template::{render, TemplateCache};

/// What a per-record failure does to the rest of the run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Record the failure and go on with the next record.
    #[default]
    Continue,
    /// Stop at the first failing record.
    Abort,
}

impl FailurePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailurePolicy::Continue => "continue",
            FailurePolicy::Abort => "abort",
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FailurePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "continue" | "skip" => Ok(FailurePolicy::Continue),
            "abort" | "stop" => Ok(FailurePolicy::Abort),
            other => Err(Error::Config(format!(
                "unknown on_error policy '{}' (expected continue or abort)",
                other
            ))),
        }
    }
}

/// Run options the generator needs beyond the cache and the router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateOptions {
    /// Column holding the template name.
    pub template_column: String,
    /// Column holding the output identifier.
    pub output_column: String,
    pub failure_policy: FailurePolicy,
}

impl GenerateOptions {
    pub fn new(template_column: impl Into<String>, output_column: impl Into<String>) -> Self {
        Self {
            template_column: template_column.into(),
            output_column: output_column.into(),
            failure_policy: FailurePolicy::default(),
        }
    }

    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }
}

/// Renders and routes records for one run.
pub struct Generator<'a, W: Write> {
    options: GenerateOptions,
    cache: &'a mut TemplateCache,
    router: &'a mut OutputRouter<W>,
}

impl<'a, W: Write> Generator<'a, W> {
    pub fn new(
        options: GenerateOptions,
        cache: &'a mut TemplateCache,
        router: &'a mut OutputRouter<W>,
    ) -> Self {
        Self {
            options,
            cache,
            router,
        }
    }

    /// Processes `records` in order and returns the run summary.
    ///
    /// # Errors
    ///
    /// Under [`FailurePolicy::Abort`], the first failing record is returned
    /// as [`Error::Record`]. Under [`FailurePolicy::Continue`] this only
    /// fails if the summary cannot be produced, which does not happen today;
    /// per-record failures end up in [`RunSummary::failures`].
    pub fn run(&mut self, records: &[Record], globals: &GlobalVars) -> Result<RunSummary, Error> {
        log::debug!(
            "generating {} records (template column '{}', output column '{}', on error: {})",
            records.len(),
            self.options.template_column,
            self.options.output_column,
            self.options.failure_policy
        );

        for record in records {
            if let Err(err) = self.process(record, globals) {
                log::error!("{}", err);
                match self.options.failure_policy {
                    FailurePolicy::Abort => return Err(Error::Record(Box::new(err))),
                    FailurePolicy::Continue => self.router.summary_mut().record_failure(&err),
                }
            }
        }

        Ok(self.router.summary().clone())
    }

    fn process(
        &mut self,
        record: &Record,
        globals: &GlobalVars,
    ) -> Result<RouteOutcome, RecordError> {
        let fail = |template: Option<&str>, output: Option<&str>, error: Error| RecordError {
            line: record.line(),
            template: template.map(str::to_string),
            output: output.map(str::to_string),
            error,
        };

        let template_name = record
            .get(&self.options.template_column)
            .ok_or_else(|| {
                fail(
                    None,
                    None,
                    Error::MissingColumn {
                        column: self.options.template_column.clone(),
                    },
                )
            })?;
        let output_name = record
            .get(&self.options.output_column)
            .ok_or_else(|| {
                fail(
                    Some(template_name),
                    None,
                    Error::MissingColumn {
                        column: self.options.output_column.clone(),
                    },
                )
            })?;

        let text = self
            .cache
            .resolve(template_name)
            .and_then(|template| render(&template, record, globals))
            .map_err(|e| fail(Some(template_name), Some(output_name), e))?;

        let outcome = self
            .router
            .route(output_name, &text)
            .map_err(|e| fail(Some(template_name), Some(output_name), e))?;

        self.router.summary_mut().rendered += 1;
        Ok(outcome)
    }
}
