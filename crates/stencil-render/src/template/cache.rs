//! Compile-once template cache.
//!
//! [`TemplateCache`] owns the template environment for one run. The first
//! [`resolve`](TemplateCache::resolve) of a name reads its source through the
//! [`TemplateRegistry`] and compiles it; every later call with the same name
//! returns the compiled template without touching the registry again.
//!
//! The cache is an explicit value owned by the caller and dropped at the end
//! of the run. There is no process-wide template state.

use std::collections::{HashMap, HashSet};

use minijinja::Environment;

use super::engine::{self, build_environment, MissingKeyPolicy};
use super::functions::FunctionTable;
use super::registry::{template_file_name, TemplateRegistry};
use crate::data::{GlobalVars, Record};
use crate::error::Error;

/// A template compiled by the cache, borrowed for one render.
pub struct CompiledTemplate<'a> {
    name: &'a str,
    template: minijinja::Template<'a, 'a>,
}

impl<'a> CompiledTemplate<'a> {
    /// Cache key of the template (its file name, extension included).
    pub fn name(&self) -> &str {
        self.name
    }

    pub(crate) fn inner(&self) -> &minijinja::Template<'a, 'a> {
        &self.template
    }
}

/// Run-scoped cache of compiled templates.
pub struct TemplateCache {
    env: Environment<'static>,
    registry: TemplateRegistry,
    compiled: HashSet<String>,
    /// Names whose source failed to compile, with the compiler message.
    broken: HashMap<String, String>,
    policy: MissingKeyPolicy,
}

impl TemplateCache {
    /// Creates a cache with the standard function table.
    pub fn new(registry: TemplateRegistry, policy: MissingKeyPolicy) -> Self {
        Self::with_functions(registry, policy, &FunctionTable::standard())
    }

    /// Creates a cache with an explicit function table.
    pub fn with_functions(
        registry: TemplateRegistry,
        policy: MissingKeyPolicy,
        functions: &FunctionTable,
    ) -> Self {
        Self {
            env: build_environment(policy, functions),
            registry,
            compiled: HashSet::new(),
            broken: HashMap::new(),
            policy,
        }
    }

    /// Returns the compiled template for `name`, compiling it on first use.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if no source matches the name
    /// - [`Error::Encoding`] if the source file is not UTF-8
    /// - [`Error::Syntax`] if the source fails to compile (remembered, so the
    ///   source is not parsed again)
    pub fn resolve(&mut self, name: &str) -> Result<CompiledTemplate<'_>, Error> {
        let key = template_file_name(name);

        if let Some(message) = self.broken.get(&key) {
            return Err(Error::Syntax {
                name: key,
                message: message.clone(),
            });
        }

        if self.compiled.contains(&key) {
            log::trace!("template cache hit: {}", key);
        } else {
            let source = self.registry.get_content(name)?;
            if let Err(err) = self.env.add_template_owned(key.clone(), source) {
                return Err(match Error::from(err) {
                    Error::Syntax { message, .. } => {
                        self.broken.insert(key.clone(), message.clone());
                        Error::Syntax { name: key, message }
                    }
                    other => other,
                });
            }
            log::debug!("compiled template {}", key);
            self.compiled.insert(key.clone());
        }

        let name = self
            .compiled
            .get(&key)
            .ok_or_else(|| Error::NotFound { name: key.clone() })?;
        let template = self.env.get_template(name)?;
        Ok(CompiledTemplate {
            name: name.as_str(),
            template,
        })
    }

    /// Renders an ad-hoc template source with the run's environment.
    ///
    /// The source is compiled on every call and never cached.
    pub fn render_str(
        &self,
        source: &str,
        record: &Record,
        globals: &GlobalVars,
    ) -> Result<String, Error> {
        let context = engine::merge_context(record, globals);
        Ok(self.env.render_str(source, &context)?)
    }

    /// Number of distinct templates compiled so far.
    pub fn compiled_count(&self) -> usize {
        self.compiled.len()
    }

    #[cfg(test)]
    fn is_cached(&self, name: &str) -> bool {
        self.compiled.contains(&template_file_name(name))
    }

    pub fn missing_key_policy(&self) -> MissingKeyPolicy {
        self.policy
    }
}
