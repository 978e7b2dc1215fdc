//! `workspace.toml` loading.
//!
//! Every key except the two column names has a default, so the smallest
//! valid file is:
//!
//! ```toml
//! template_column_name = "router"
//! output_column_name = "hostname"
//! ```
//!
//! Command-line flags are applied on top with [`WorkspaceConfig::apply`].

use std::fs;
use std::path::{Component, Path, PathBuf};

use serde::Deserialize;
use stencil_render::{
    delimiter_byte, FailurePolicy, GlobalVars, MissingKeyPolicy, DEFAULT_OUTPUT_EXTENSION,
};

/// Default configuration file name inside a workspace.
pub const CONFIG_FILE_NAME: &str = "workspace.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Contents of `workspace.toml`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WorkspaceConfig {
    /// Data file name inside the workspace `data/` directory.
    #[serde(default = "default_csv_data")]
    pub csv_data: String,

    #[serde(default = "default_csv_delimiter")]
    pub csv_delimiter: String,

    pub template_column_name: String,

    pub output_column_name: String,

    #[serde(default)]
    pub missing_key: MissingKeyPolicy,

    #[serde(default)]
    pub override_output: bool,

    #[serde(default)]
    pub on_error: FailurePolicy,

    #[serde(default = "default_output_extension")]
    pub output_extension: String,

    /// Write every record into this one file inside `output/`.
    #[serde(default)]
    pub single_file: Option<String>,

    /// Variables available to every template.
    #[serde(default)]
    pub vars: toml::Table,
}

fn default_csv_data() -> String {
    "data.csv".to_string()
}

fn default_csv_delimiter() -> String {
    ",".to_string()
}

fn default_output_extension() -> String {
    DEFAULT_OUTPUT_EXTENSION.to_string()
}

/// Command-line values that take precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub force: bool,
    pub missing_key: Option<MissingKeyPolicy>,
    pub on_error: Option<FailurePolicy>,
}

impl WorkspaceConfig {
    /// Reads and validates a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: WorkspaceConfig = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        log::debug!("loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Checks the values serde cannot check on its own.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.template_column_name.trim().is_empty() {
            return Err(ConfigError::Invalid("template_column_name is empty".into()));
        }
        if self.output_column_name.trim().is_empty() {
            return Err(ConfigError::Invalid("output_column_name is empty".into()));
        }
        self.delimiter()?;
        if !is_plain_relative(&self.csv_data) {
            return Err(ConfigError::Invalid(format!(
                "csv_data '{}' must be a file name inside the data directory",
                self.csv_data
            )));
        }
        if let Some(single) = &self.single_file {
            if single.trim().is_empty() || !is_plain_relative(single) {
                return Err(ConfigError::Invalid(format!(
                    "single_file '{}' must be a file name inside the output directory",
                    single
                )));
            }
        }
        self.globals()?;
        Ok(())
    }

    /// The field delimiter as a single character.
    pub fn delimiter(&self) -> Result<char, ConfigError> {
        let mut chars = self.csv_delimiter.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => {
                delimiter_byte(c).map_err(|e| ConfigError::Invalid(e.to_string()))?;
                Ok(c)
            }
            _ => Err(ConfigError::Invalid(format!(
                "csv_delimiter must be a single character, got '{}'",
                self.csv_delimiter
            ))),
        }
    }

    /// The `[vars]` table as string variables.
    ///
    /// Strings, numbers, booleans and dates are converted to text; arrays
    /// and nested tables are rejected.
    pub fn globals(&self) -> Result<GlobalVars, ConfigError> {
        self.vars
            .iter()
            .map(|(name, value)| {
                let text = match value {
                    toml::Value::String(s) => s.clone(),
                    toml::Value::Integer(i) => i.to_string(),
                    toml::Value::Float(f) => f.to_string(),
                    toml::Value::Boolean(b) => b.to_string(),
                    toml::Value::Datetime(d) => d.to_string(),
                    toml::Value::Array(_) | toml::Value::Table(_) => {
                        return Err(ConfigError::Invalid(format!(
                            "vars.{} must be a string, number or boolean",
                            name
                        )))
                    }
                };
                Ok((name.clone(), text))
            })
            .collect()
    }

    pub fn apply(&mut self, overrides: &Overrides) {
        if overrides.force {
            self.override_output = true;
        }
        if let Some(policy) = overrides.missing_key {
            self.missing_key = policy;
        }
        if let Some(policy) = overrides.on_error {
            self.on_error = policy;
        }
    }
}

fn is_plain_relative(name: &str) -> bool {
    Path::new(name)
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}
