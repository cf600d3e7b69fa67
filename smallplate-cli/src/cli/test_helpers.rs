//! Small helpers shared across CLI tests.

use std::path::{Path, PathBuf};

use super::commands::run_render;
use super::{Cli, CliError, CsvArgs, EscapeArg, RenderCommand, run_cli};

pub(super) fn render_command(template: &Path, csv: &Path, output: Option<PathBuf>) -> RenderCommand {
    RenderCommand {
        template: template.to_path_buf(),
        csv: csv.to_path_buf(),
        output,
        wrap_output: false,
        escape: EscapeArg::Html,
        csv_options: CsvArgs::default(),
    }
}

pub(super) fn run_cli_expecting_error(cli: Cli, panic_msg: &str) -> CliError {
    match run_cli(cli) {
        Ok(_) => panic!("{panic_msg}"),
        Err(err) => err,
    }
}

pub(super) fn run_render_expecting_error(command: RenderCommand, panic_msg: &str) -> CliError {
    match run_render(command) {
        Ok(_) => panic!("{panic_msg}"),
        Err(err) => err,
    }
}
