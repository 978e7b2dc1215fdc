//! The `generate` command: configuration, data and templates in, files out.

use std::path::Path;

use anyhow::{Context, Result};
use stencil_render::{
    load_records_from_path, GenerateOptions, Generator, OutputRouter, RunSummary, TargetLayout,
    TemplateCache, TemplateRegistry,
};

use crate::config::{Overrides, WorkspaceConfig};
use crate::workspace::Workspace;

/// Runs one generation over a workspace.
///
/// Configuration, data and template-directory problems fail before any
/// record is processed. Per-record failures are in the returned summary
/// unless the configuration says to abort on the first one.
pub fn generate(
    workspace: &Workspace,
    config_file: &Path,
    overrides: &Overrides,
) -> Result<RunSummary> {
    let config_path = workspace.config_path(config_file);
    let mut config = WorkspaceConfig::load(&config_path)?;
    config.apply(overrides);
    let globals = config.globals()?;
    let delimiter = config.delimiter()?;

    let data_path = workspace.data_dir().join(&config.csv_data);
    let records = load_records_from_path(&data_path, delimiter)
        .with_context(|| format!("failed to load data from {}", data_path.display()))?;
    log::info!("loaded {} records from {}", records.len(), data_path.display());

    let registry = TemplateRegistry::from_dir(workspace.templates_dir())
        .with_context(|| format!("no templates directory in {}", workspace.root().display()))?;
    let mut cache = TemplateCache::new(registry, config.missing_key);

    let layout = match &config.single_file {
        Some(name) => TargetLayout::SingleFile(workspace.output_dir().join(name)),
        None => TargetLayout::PerRecord {
            dir: workspace.output_dir(),
            extension: config.output_extension.clone(),
        },
    };
    let mut router = OutputRouter::start(layout, config.override_output)
        .context("failed to clear previous output")?;

    let options = GenerateOptions::new(&config.template_column_name, &config.output_column_name)
        .failure_policy(config.on_error);
    let summary = Generator::new(options, &mut cache, &mut router).run(&records, &globals)?;

    log::debug!("compiled {} distinct templates", cache.compiled_count());
    Ok(summary)
}
