//! Template bindings for the [`netaddr`](crate::netaddr) helpers.
//!
//! The [`FunctionTable`] is built once and never changes afterwards. Each
//! entry is installed into a MiniJinja environment twice: as a global
//! function and as a filter whose input is the first argument.
//!
//! ```jinja
//! ip address {{ ip4(lan, 1) }} {{ ip4mask(lan) }}
//! ip route 0.0.0.0 0.0.0.0 {{ lan | ip4(254) }}
//! vlan {{ split(port, ".", 1) }}
//! ```
//!
//! Offsets and indices may be integers or numeric strings, since every CSV
//! value is a string. An absent key passed as an argument renders as an
//! empty string, except under strict undefined handling where it is a
//! missing-key error like any other reference to it.

use minijinja::{Environment, ErrorKind, State, UndefinedBehavior, Value};

use crate::error::FuncError;
use crate::netaddr;

/// Typed implementation behind a template function name.
#[derive(Debug, Clone, Copy)]
pub enum TemplateFunction {
    /// `(s, sep, index) -> part`, never fails.
    Split(fn(&str, &str, usize) -> String),
    /// `(addr, offset) -> addr`.
    Offset(fn(&str, i64) -> Result<String, FuncError>),
    /// `(input) -> output`.
    Unary(fn(&str) -> Result<String, FuncError>),
}

/// Immutable table of the functions available to templates.
#[derive(Debug, Clone)]
pub struct FunctionTable {
    entries: Vec<(&'static str, TemplateFunction)>,
}

impl Default for FunctionTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl FunctionTable {
    /// The standard library: `split` and the five IPv4 helpers.
    pub fn standard() -> Self {
        Self {
            entries: vec![
                ("split", TemplateFunction::Split(netaddr::split)),
                ("ip4", TemplateFunction::Offset(netaddr::ip4)),
                ("ip4mask", TemplateFunction::Unary(netaddr::ip4mask)),
                ("ip4cidr", TemplateFunction::Unary(netaddr::ip4cidr)),
                (
                    "ip4mask_to_cidr",
                    TemplateFunction::Unary(netaddr::ip4mask_to_cidr),
                ),
                (
                    "ip4cidr_to_mask",
                    TemplateFunction::Unary(netaddr::ip4cidr_to_mask),
                ),
            ],
        }
    }

    #[cfg(test)]
    fn get(&self, name: &str) -> Option<TemplateFunction> {
        self.entries
            .iter()
            .find(|(entry, _)| *entry == name)
            .map(|(_, func)| *func)
    }

    #[cfg(test)]
    fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(name, _)| *name)
    }

    /// Registers every entry as a function and as a filter.
    pub fn install(&self, env: &mut Environment<'static>) {
        for &(name, func) in &self.entries {
            match func {
                TemplateFunction::Split(f) => {
                    let call = move |state: &State,
                                     s: Value,
                                     sep: Value,
                                     index: Value|
                          -> Result<String, minijinja::Error> {
                        ensure_defined(state, name, &[&s, &sep, &index])?;
                        Ok(match to_index(&index) {
                            Some(index) => f(&to_text(&s), &to_text(&sep), index),
                            None => String::new(),
                        })
                    };
                    env.add_function(name, call);
                    env.add_filter(name, call);
                }
                TemplateFunction::Offset(f) => {
                    let call = move |state: &State,
                                     addr: Value,
                                     offset: Value|
                          -> Result<String, minijinja::Error> {
                        ensure_defined(state, name, &[&addr, &offset])?;
                        let offset = to_offset(name, &offset).map_err(into_engine_error)?;
                        f(&to_text(&addr), offset).map_err(into_engine_error)
                    };
                    env.add_function(name, call);
                    env.add_filter(name, call);
                }
                TemplateFunction::Unary(f) => {
                    let call = move |state: &State,
                                     input: Value|
                          -> Result<String, minijinja::Error> {
                        ensure_defined(state, name, &[&input])?;
                        f(&to_text(&input)).map_err(into_engine_error)
                    };
                    env.add_function(name, call);
                    env.add_filter(name, call);
                }
            }
        }
    }
}

/// Rejects absent arguments when the environment treats undefined values strictly.
fn ensure_defined(
    state: &State,
    function: &'static str,
    args: &[&Value],
) -> Result<(), minijinja::Error> {
    if state.undefined_behavior() == UndefinedBehavior::Strict
        && args.iter().any(|value| value.is_undefined())
    {
        return Err(minijinja::Error::new(
            ErrorKind::UndefinedError,
            format!("{}: argument refers to an undefined value", function),
        ));
    }
    Ok(())
}

/// Wraps a function failure so it can be recovered as [`crate::Error::Function`].
fn into_engine_error(err: FuncError) -> minijinja::Error {
    minijinja::Error::new(ErrorKind::InvalidOperation, err.to_string()).with_source(err)
}

fn to_text(value: &Value) -> String {
    match value.as_str() {
        Some(s) => s.to_string(),
        None if value.is_undefined() || value.is_none() => String::new(),
        None => value.to_string(),
    }
}

fn to_integer(value: &Value) -> Option<i64> {
    if let Some(s) = value.as_str() {
        return s.trim().parse().ok();
    }
    i64::try_from(value.clone()).ok()
}

fn to_offset(function: &'static str, value: &Value) -> Result<i64, FuncError> {
    to_integer(value).ok_or_else(|| {
        FuncError::argument(function, format!("offset '{}' is not an integer", value))
    })
}

/// Negative or non-numeric indices are simply out of range.
fn to_index(value: &Value) -> Option<usize> {
    to_integer(value).and_then(|i| usize::try_from(i).ok())
}
