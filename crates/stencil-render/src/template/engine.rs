//! Rendering a record through a compiled template.
//!
//! The render context is the record's columns layered over the global
//! variables: when a column and a global share a name, the column wins.
//!
//! What happens when a template references an absent key is decided by
//! [`MissingKeyPolicy`], fixed when the environment is built.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use minijinja::{AutoEscape, Environment, UndefinedBehavior};
use serde::{Deserialize, Serialize};

use super::cache::CompiledTemplate;
use super::functions::FunctionTable;
use crate::data::{GlobalVars, Record};
use crate::error::Error;

/// Text substituted for an absent key under [`MissingKeyPolicy::Invalid`].
pub const NO_VALUE: &str = "<no value>";

/// Behavior when a template references a key that is neither a column nor a global.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingKeyPolicy {
    /// Print [`NO_VALUE`] and continue.
    #[default]
    Invalid,
    /// Print nothing and continue.
    Zero,
    /// Abort the render with [`Error::MissingKey`].
    Error,
}

impl MissingKeyPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MissingKeyPolicy::Invalid => "invalid",
            MissingKeyPolicy::Zero => "zero",
            MissingKeyPolicy::Error => "error",
        }
    }
}

impl fmt::Display for MissingKeyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MissingKeyPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "invalid" | "default" | "" => Ok(MissingKeyPolicy::Invalid),
            "zero" => Ok(MissingKeyPolicy::Zero),
            "error" => Ok(MissingKeyPolicy::Error),
            other => Err(Error::Config(format!(
                "unknown missing_key policy '{}' (expected invalid, zero or error)",
                other
            ))),
        }
    }
}

/// Builds the template environment used for every render in a run.
///
/// Templates are never auto-escaped and keep their trailing newline, so
/// sections appended to one output file line up exactly as written.
pub fn build_environment(
    policy: MissingKeyPolicy,
    functions: &FunctionTable,
) -> Environment<'static> {
    let mut env = Environment::new();
    env.set_auto_escape_callback(|_| AutoEscape::None);
    env.set_keep_trailing_newline(true);

    match policy {
        MissingKeyPolicy::Invalid => {
            env.set_undefined_behavior(UndefinedBehavior::Lenient);
            env.set_formatter(|out, state, value| {
                if value.is_undefined() {
                    out.write_str(NO_VALUE)?;
                    Ok(())
                } else {
                    minijinja::escape_formatter(out, state, value)
                }
            });
        }
        MissingKeyPolicy::Zero => env.set_undefined_behavior(UndefinedBehavior::Lenient),
        MissingKeyPolicy::Error => env.set_undefined_behavior(UndefinedBehavior::Strict),
    }

    functions.install(&mut env);
    env
}

/// Merges a record with the global variables. Columns take precedence.
pub fn merge_context<'a>(
    record: &'a Record,
    globals: &'a GlobalVars,
) -> BTreeMap<&'a str, &'a str> {
    let mut context: BTreeMap<&str, &str> = globals
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();

    for (column, value) in record.fields() {
        if context.insert(column.as_str(), value.as_str()).is_some() {
            log::debug!(
                "line {}: column '{}' shadows the global variable of the same name",
                record.line(),
                column
            );
        }
    }
    context
}

/// Renders a compiled template against a record and the global variables.
///
/// # Errors
///
/// - [`Error::MissingKey`] for an absent key under [`MissingKeyPolicy::Error`]
/// - [`Error::Function`] when a template function rejects its input
/// - [`Error::Template`] for any other runtime failure
pub fn render(
    template: &CompiledTemplate<'_>,
    record: &Record,
    globals: &GlobalVars,
) -> Result<String, Error> {
    let context = merge_context(record, globals);
    Ok(template.inner().render(&context)?)
}
