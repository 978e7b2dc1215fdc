//! # Stencil
//!
//! The `stencil` command: workspace scaffolding, `workspace.toml` loading
//! and reporting around the [`stencil_render`] engine.
//!
//! ```text
//! stencil init lab
//! stencil generate lab --force
//! ```

pub mod cli;
pub mod config;
pub mod generate;
pub mod report;
pub mod workspace;

use std::io::Write;
use std::process::ExitCode;

use anyhow::{Context, Result};

use crate::cli::{Cli, Command};
use crate::workspace::Workspace;

/// Runs a parsed command line.
///
/// Returns a failure exit code when any record failed, and an error for
/// anything that stopped the run.
pub fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Command::Init(args) => {
            let workspace = Workspace::create(&args.root, &args.name)?;
            println!(
                "workspace \"{}\" created in \"{}\"",
                args.name,
                workspace.root().display()
            );
            Ok(ExitCode::SUCCESS)
        }
        Command::Generate(args) => {
            let workspace = Workspace::new(&args.workspace);
            let summary = generate::generate(&workspace, &args.config, &args.overrides())?;

            let report = report::render(&summary, args.format)?;
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(report.as_bytes())
                .and_then(|_| stdout.flush())
                .context("failed to write report")?;

            if summary.is_success() {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
    }
}
