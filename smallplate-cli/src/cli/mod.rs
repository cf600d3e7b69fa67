//! Command-line interface orchestration for smallplate.
//!
//! The `render` command reads a template and a CSV file, renders the template
//! over the CSV rows, and writes the result to stdout or a file, optionally
//! wrapped in an HTML preview page.

mod commands;
mod preview;

pub use commands::{
    Cli, CliError, Command, CsvArgs, EscapeArg, OutputTarget, RenderCommand, RenderSummary,
    run_cli,
};
pub use preview::wrap_preview;

#[cfg(test)]
mod test_helpers;
#[cfg(test)]
mod tests;
