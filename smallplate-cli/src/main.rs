//! CLI entry point for smallplate.
//!
//! Parses command-line arguments with clap, renders the template over the CSV
//! rows and maps failures to a non-zero exit code. Logging is initialised
//! first so every later stage can emit structured diagnostics via `tracing`.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use smallplate_cli::{
    cli::{Cli, CliError, run_cli},
    logging::{self, LoggingError},
};
use tracing::{debug, error, field};

fn try_main() -> Result<()> {
    let cli = Cli::parse();
    let summary = run_cli(cli).context("failed to render template")?;
    debug!(
        template = summary.template.as_str(),
        rows = summary.rows,
        "finished"
    );
    Ok(())
}

fn main() -> ExitCode {
    if let Err(err) = logging::init_logging() {
        report_logging_init_error(&err);
        return ExitCode::FAILURE;
    }

    if let Err(err) = try_main() {
        let code_field = err
            .downcast_ref::<CliError>()
            .and_then(CliError::code)
            .map(field::display);
        error!(
            error = %format_args!("{err:#}"),
            code = code_field,
            "command execution failed"
        );
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

#[expect(
    clippy::print_stderr,
    reason = "Emit one-off diagnostic before tracing is initialized"
)]
fn report_logging_init_error(err: &LoggingError) {
    eprintln!("failed to initialize logging: {err}");
}
