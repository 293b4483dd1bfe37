//! consult-rs command-line entry point.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use consult_rs::cli::{Cli, execute};

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match execute(&cli) {
        Ok(output) => {
            emit(&output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            report(&anyhow::Error::new(e));
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so command output on stdout stays parseable.
fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("consult_rs=debug")
        } else {
            EnvFilter::new("consult_rs=info")
        }
    });

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

#[allow(clippy::print_stdout)]
fn emit(output: &str) {
    print!("{output}");
}

#[allow(clippy::print_stderr)]
fn report(error: &anyhow::Error) {
    eprintln!("Error: {error:#}");
}
