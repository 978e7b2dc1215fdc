//! Command-line interface.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use stencil_render::{FailurePolicy, MissingKeyPolicy};

use crate::config::{Overrides, CONFIG_FILE_NAME};

/// Generate text files from CSV rows and templates.
///
/// Each data row names a template and an output file. Rows sharing an
/// output file are appended to it in order; files left by an earlier run
/// are kept unless --force is given.
#[derive(Debug, Parser)]
#[command(name = "stencil", version)]
pub struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create a new workspace directory
    Init(InitArgs),

    /// Generate output files for a workspace
    Generate(GenerateArgs),
}

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Name of the workspace directory to create
    pub name: String,

    /// Directory to create the workspace in
    #[arg(long, default_value = ".")]
    pub root: PathBuf,
}

#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Workspace directory
    pub workspace: PathBuf,

    /// Configuration file, relative to the workspace
    #[arg(short, long, default_value = CONFIG_FILE_NAME)]
    pub config: PathBuf,

    /// Remove previously generated files and overwrite existing ones
    #[arg(short, long)]
    pub force: bool,

    /// What an absent key renders as
    #[arg(long, value_enum)]
    pub missing_key: Option<MissingKeyArg>,

    /// What a failing record does to the rest of the run
    #[arg(long, value_enum)]
    pub on_error: Option<OnErrorArg>,

    /// Report format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

impl GenerateArgs {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            force: self.force,
            missing_key: self.missing_key.map(Into::into),
            on_error: self.on_error.map(Into::into),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MissingKeyArg {
    /// Print '<no value>'
    Invalid,
    /// Print nothing
    Zero,
    /// Fail the record
    Error,
}

impl From<MissingKeyArg> for MissingKeyPolicy {
    fn from(arg: MissingKeyArg) -> Self {
        match arg {
            MissingKeyArg::Invalid => MissingKeyPolicy::Invalid,
            MissingKeyArg::Zero => MissingKeyPolicy::Zero,
            MissingKeyArg::Error => MissingKeyPolicy::Error,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OnErrorArg {
    /// Report the record and go on
    Continue,
    /// Stop at the first failing record
    Abort,
}

impl From<OnErrorArg> for FailurePolicy {
    fn from(arg: OnErrorArg) -> Self {
        match arg {
            OnErrorArg::Continue => FailurePolicy::Continue,
            OnErrorArg::Abort => FailurePolicy::Abort,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl Cli {
    /// Log level selected by `-v`/`-q`.
    pub fn log_level(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::Error;
        }
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    /// Initializes `env_logger` at the selected level. `RUST_LOG` still wins.
    pub fn init_logging(&self) {
        let result = env_logger::Builder::new()
            .filter_level(self.log_level())
            .parse_default_env()
            .format_timestamp(None)
            .format_target(false)
            .try_init();
        if let Err(e) = result {
            eprintln!("Failed to initialize logging: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_generate_args() {
        let cli = Cli::try_parse_from([
            "stencil",
            "-vv",
            "generate",
            "lab",
            "--force",
            "--missing-key",
            "error",
            "--on-error",
            "abort",
            "--format",
            "json",
        ])
        .unwrap();

        assert_eq!(cli.log_level(), LevelFilter::Debug);
        let Command::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        assert_eq!(args.workspace, PathBuf::from("lab"));
        assert_eq!(args.config, PathBuf::from("workspace.toml"));
        assert_eq!(args.format, OutputFormat::Json);

        let overrides = args.overrides();
        assert!(overrides.force);
        assert_eq!(overrides.missing_key, Some(MissingKeyPolicy::Error));
        assert_eq!(overrides.on_error, Some(FailurePolicy::Abort));
    }

    #[test]
    fn test_init_args_and_quiet() {
        let cli =
            Cli::try_parse_from(["stencil", "init", "lab", "--root", "/tmp/ws", "-q"]).unwrap();
        assert_eq!(cli.log_level(), LevelFilter::Error);
        let Command::Init(args) = cli.command else {
            panic!("expected init");
        };
        assert_eq!(args.name, "lab");
        assert_eq!(args.root, PathBuf::from("/tmp/ws"));
    }

    #[test]
    fn test_rejects_unknown_policy() {
        let parsed = Cli::try_parse_from(["stencil", "generate", "lab", "--missing-key", "maybe"]);
        assert!(parsed.is_err());
    }
}
