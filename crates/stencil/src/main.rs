use std::process::ExitCode;

use clap::Parser;
use stencil::cli::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();
    cli.init_logging();

    match stencil::run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
