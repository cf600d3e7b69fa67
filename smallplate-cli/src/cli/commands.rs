//! Command implementations and argument parsing for the smallplate CLI.

use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use smallplate_core::{
    CompiledTemplate, EscapeMode, LoadError, LoaderOptions, QuotePolicy, RaggedPolicy,
    RenderError, RenderOptions, Renderer, Row, load,
};
use thiserror::Error;
use tracing::{Span, field, info, instrument};

use super::preview::wrap_preview;

/// Top-level CLI options parsed by [`clap`].
#[derive(Debug, Parser, Clone)]
#[command(
    name = "smallplate",
    about = "Render a template against the rows of a CSV file."
)]
pub struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported CLI commands.
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Render a template once over every row of a CSV file.
    Render(RenderCommand),
}

/// Options accepted by the `render` command.
#[derive(Debug, Args, Clone)]
pub struct RenderCommand {
    /// Template file to render.
    #[arg(long = "plate", value_name = "TEMPLATE")]
    pub template: PathBuf,

    /// CSV file whose first record names the columns.
    #[arg(long = "csv", value_name = "CSV")]
    pub csv: PathBuf,

    /// Output file; standard output when omitted or `-`.
    #[arg(long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Wrap the output in an HTML page with a copy box and a live preview.
    #[arg(long = "wrap-output")]
    pub wrap_output: bool,

    /// Escaping applied to interpolated values.
    #[arg(long, value_enum, default_value_t = EscapeArg::Html)]
    pub escape: EscapeArg,

    /// CSV lexical options.
    #[command(flatten)]
    pub csv_options: CsvArgs,
}

/// CSV lexical options.
#[derive(Debug, Args, Clone)]
pub struct CsvArgs {
    /// Field delimiter (a single ASCII character).
    #[arg(long, default_value = ",", value_parser = parse_ascii_byte)]
    pub delimiter: u8,

    /// Lines starting with this character are skipped.
    #[arg(
        long,
        default_value = "#",
        value_parser = parse_ascii_byte,
        conflicts_with = "no_comment"
    )]
    pub comment: u8,

    /// Treat every line as data, including lines starting with `#`.
    #[arg(long = "no-comment")]
    pub no_comment: bool,

    /// Reject records whose field count differs from the header instead of
    /// padding or truncating them.
    #[arg(long = "strict-fields")]
    pub strict_fields: bool,

    /// Accept stray quotes inside fields.
    #[arg(long = "lazy-quotes")]
    pub lazy_quotes: bool,
}

impl Default for CsvArgs {
    fn default() -> Self {
        Self {
            delimiter: b',',
            comment: b'#',
            no_comment: false,
            strict_fields: false,
            lazy_quotes: false,
        }
    }
}

impl CsvArgs {
    /// Maps the flags onto [`LoaderOptions`].
    #[must_use]
    pub fn loader_options(&self) -> LoaderOptions {
        LoaderOptions::new()
            .with_delimiter(self.delimiter)
            .with_comment((!self.no_comment).then_some(self.comment))
            .with_ragged(if self.strict_fields {
                RaggedPolicy::Strict
            } else {
                RaggedPolicy::Lenient
            })
            .with_quotes(if self.lazy_quotes {
                QuotePolicy::Lazy
            } else {
                QuotePolicy::Strict
            })
    }
}

/// Escaping modes selectable on the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum EscapeArg {
    /// Escape HTML markup characters unless passed through `unescape`.
    #[default]
    Html,
    /// Emit values verbatim.
    None,
}

impl From<EscapeArg> for EscapeMode {
    fn from(value: EscapeArg) -> Self {
        match value {
            EscapeArg::Html => Self::Html,
            EscapeArg::None => Self::None,
        }
    }
}

/// Where rendered output is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    /// Standard output.
    Stdout,
    /// A file created (or truncated) before rendering starts.
    File(PathBuf),
}

impl OutputTarget {
    /// Interprets the `--output` flag; `-` and an absent flag mean stdout.
    #[must_use]
    pub fn from_arg(path: Option<PathBuf>) -> Self {
        match path {
            Some(path) if path.as_os_str() != "-" => Self::File(path),
            _ => Self::Stdout,
        }
    }
}

impl fmt::Display for OutputTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdout => f.write_str("<stdout>"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Errors surfaced while executing CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// A template, CSV or output file could not be opened, created or read.
    #[error("failed to access `{path}`: {source}")]
    Io {
        /// Path that triggered the failure.
        path: PathBuf,
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
    /// The CSV file could not be loaded.
    #[error("failed to load `{path}`: {source}")]
    Load {
        /// CSV file being loaded.
        path: PathBuf,
        /// Loader failure.
        #[source]
        source: LoadError,
    },
    /// The template failed to compile or render.
    #[error(transparent)]
    Render(#[from] RenderError),
    /// Writing or flushing the output failed.
    #[error("failed to write output to {target}: {source}")]
    Write {
        /// Destination being written.
        target: OutputTarget,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
}

impl CliError {
    /// Stable code of the library error behind this failure, if any.
    #[must_use]
    pub const fn code(&self) -> Option<&'static str> {
        match self {
            Self::Load { source, .. } => Some(source.code().as_str()),
            Self::Render(source) => Some(source.code().as_str()),
            Self::Io { .. } | Self::Write { .. } => None,
        }
    }
}

/// Summarises a completed render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderSummary {
    /// Template name, derived from its file name.
    pub template: String,
    /// Number of CSV data rows rendered.
    pub rows: usize,
    /// Destination of the output.
    pub target: OutputTarget,
    /// Whether the output was wrapped in the preview page.
    pub wrapped: bool,
}

/// Executes the CLI command represented by `cli`.
///
/// # Errors
/// Returns [`CliError`] when reading, loading, rendering or writing fails.
///
/// # Examples
/// ```
/// # use std::error::Error;
/// # use smallplate_cli::cli::{Cli, Command, CsvArgs, EscapeArg, RenderCommand, run_cli};
/// # use tempfile::TempDir;
/// #
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let dir = TempDir::new()?;
/// let template = dir.path().join("letter.txt");
/// let csv = dir.path().join("agents.csv");
/// let output = dir.path().join("out.txt");
/// std::fs::write(&template, "{% for row in rows %}{{ row.last }}, {{ row.first }} {{ row.last }}{% endfor %}")?;
/// std::fs::write(&csv, "first,last\nJames,Bond\n")?;
/// let cli = Cli {
///     command: Command::Render(RenderCommand {
///         template,
///         csv,
///         output: Some(output.clone()),
///         wrap_output: false,
///         escape: EscapeArg::Html,
///         csv_options: CsvArgs::default(),
///     }),
/// };
/// let summary = run_cli(cli)?;
/// assert_eq!(summary.rows, 1);
/// assert_eq!(std::fs::read_to_string(output)?, "Bond, James Bond");
/// # Ok(())
/// # }
/// ```
#[instrument(
    name = "cli.run",
    err,
    skip(cli),
    fields(command = field::Empty),
)]
pub fn run_cli(cli: Cli) -> Result<RenderSummary, CliError> {
    match cli.command {
        Command::Render(render) => {
            Span::current().record("command", field::display("render"));
            run_render(render)
        }
    }
}

#[instrument(
    name = "cli.render",
    err,
    skip(command),
    fields(
        template = field::Empty,
        csv = field::Empty,
        output = field::Empty,
        wrapped = command.wrap_output,
    ),
)]
pub(super) fn run_render(command: RenderCommand) -> Result<RenderSummary, CliError> {
    let RenderCommand {
        template: template_path,
        csv,
        output,
        wrap_output,
        escape,
        csv_options,
    } = command;
    let target = OutputTarget::from_arg(output);
    let span = Span::current();
    span.record("template", field::display(template_path.display()));
    span.record("csv", field::display(csv.display()));
    span.record("output", field::display(&target));

    let name = template_name(&template_path);
    let source = read_template(&template_path)?;
    let renderer = Renderer::new(RenderOptions {
        escape: escape.into(),
        ..RenderOptions::standard()
    });
    let rows = {
        let compiled = renderer.compile(&name, &source)?;
        let rows = load_rows(&csv, &csv_options.loader_options())?;
        write_output(&compiled, &rows, &target, wrap_output)?;
        rows.len()
    };

    info!(
        template = name.as_str(),
        rows,
        output = %target,
        wrapped = wrap_output,
        "render completed"
    );
    Ok(RenderSummary {
        template: name,
        rows,
        target,
        wrapped: wrap_output,
    })
}

/// Opens the target only once the template and rows are ready, so load
/// failures leave no output behind.
fn write_output(
    compiled: &CompiledTemplate<'_>,
    rows: &[Row],
    target: &OutputTarget,
    wrap: bool,
) -> Result<(), CliError> {
    if wrap {
        let body = compiled.render_to_string(rows)?;
        let mut writer = open_output(target)?;
        wrap_preview(&body, &mut writer).map_err(|source| CliError::Write {
            target: target.clone(),
            source,
        })?;
        return finish_output(writer, target);
    }

    let mut writer = open_output(target)?;
    compiled.render_to(rows, &mut writer)?;
    finish_output(writer, target)
}

#[instrument(name = "cli.read_template", err, fields(path = field::Empty))]
pub(super) fn read_template(path: &Path) -> Result<String, CliError> {
    Span::current().record("path", field::display(path.display()));
    fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[instrument(
    name = "cli.load_rows",
    err,
    skip(options),
    fields(path = field::Empty, rows = field::Empty),
)]
pub(super) fn load_rows(path: &Path, options: &LoaderOptions) -> Result<Vec<Row>, CliError> {
    let span = Span::current();
    span.record("path", field::display(path.display()));
    let file = File::open(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let rows = load(BufReader::new(file), options).map_err(|source| CliError::Load {
        path: path.to_path_buf(),
        source,
    })?;
    span.record("rows", rows.len());
    Ok(rows)
}

#[instrument(name = "cli.open_output", err, skip(target), fields(output = %target))]
pub(super) fn open_output(target: &OutputTarget) -> Result<Box<dyn Write>, CliError> {
    match target {
        OutputTarget::Stdout => Ok(Box::new(BufWriter::new(io::stdout().lock()))),
        OutputTarget::File(path) => {
            let file = File::create(path).map_err(|source| CliError::Io {
                path: path.clone(),
                source,
            })?;
            Ok(Box::new(BufWriter::new(file)))
        }
    }
}

fn finish_output(mut writer: Box<dyn Write>, target: &OutputTarget) -> Result<(), CliError> {
    writer.flush().map_err(|source| CliError::Write {
        target: target.clone(),
        source,
    })
}

/// Derives the template name from the file name of `path`.
pub(super) fn template_name(path: &Path) -> String {
    path.file_name()
        .and_then(|value| value.to_str())
        .map_or_else(|| "template".to_owned(), ToOwned::to_owned)
}

/// Parses a delimiter or comment marker; quotes and line breaks are refused.
pub(super) fn parse_ascii_byte(raw: &str) -> Result<u8, String> {
    let mut chars = raw.chars();
    match (chars.next(), chars.next()) {
        (Some('"' | '\r' | '\n'), None) => {
            Err(format!("{raw:?} is reserved by the CSV syntax"))
        }
        (Some(ch), None) if ch.is_ascii() => u8::try_from(ch).map_err(|err| err.to_string()),
        _ => Err(format!("expected a single ASCII character, got `{raw}`")),
    }
}
