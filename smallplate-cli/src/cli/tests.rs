//! Unit tests for the render command and its argument parsing.

use super::commands::{parse_ascii_byte, run_render, template_name};
use super::test_helpers::{render_command, run_cli_expecting_error, run_render_expecting_error};
use super::{Cli, CliError, Command, EscapeArg, OutputTarget, run_cli};

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use rstest::rstest;
use smallplate_core::{LoadError, OptionsFault, QuotePolicy, RaggedPolicy, RenderError};
use smallplate_test_support::fs::{temp_dir, write_file};
use smallplate_test_support::tracing::RecordingLayer;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;

type TestResult = Result<(), Box<dyn std::error::Error>>;

const LETTER: &str =
    "{% for row in rows %}{{ row.last }}, {{ row.first }} {{ row.last }}\n{% endfor %}";
const AGENTS: &str = "first,last\nJames,Bond\nMiss,Moneypenny\n";

#[rstest]
#[case::file_name("/plates/letter.txt", "letter.txt")]
#[case::relative("letter.html", "letter.html")]
#[case::missing_file_name("", "template")]
fn template_name_uses_the_file_name(#[case] raw: &str, #[case] expected: &str) {
    assert_eq!(template_name(Path::new(raw)), expected);
}

#[rstest]
#[case::absent(None, OutputTarget::Stdout)]
#[case::dash(Some("-"), OutputTarget::Stdout)]
#[case::file(Some("out.html"), OutputTarget::File(PathBuf::from("out.html")))]
fn output_target_interprets_the_flag(#[case] raw: Option<&str>, #[case] expected: OutputTarget) {
    assert_eq!(OutputTarget::from_arg(raw.map(PathBuf::from)), expected);
}

#[test]
fn stdout_target_displays_a_placeholder() {
    assert_eq!(OutputTarget::Stdout.to_string(), "<stdout>");
}

#[rstest]
#[case(",", Ok(b','))]
#[case(";", Ok(b';'))]
#[case("\t", Ok(b'\t'))]
#[case("", Err(()))]
#[case(",,", Err(()))]
#[case("é", Err(()))]
#[case::quote("\"", Err(()))]
#[case::newline("\n", Err(()))]
#[case::carriage_return("\r", Err(()))]
fn parse_ascii_byte_accepts_single_ascii_characters(
    #[case] raw: &str,
    #[case] expected: Result<u8, ()>,
) {
    assert_eq!(parse_ascii_byte(raw).map_err(|_| ()), expected);
}

#[test]
fn render_writes_one_block_per_row_to_file() -> TestResult {
    let dir = temp_dir();
    let template = write_file(&dir, "letter.txt", LETTER)?;
    let csv = write_file(&dir, "agents.csv", AGENTS)?;
    let output = dir.path().join("out.txt");

    let summary = run_render(render_command(&template, &csv, Some(output.clone())))?;

    assert_eq!(summary.template, "letter.txt");
    assert_eq!(summary.rows, 2);
    assert_eq!(summary.target, OutputTarget::File(output.clone()));
    assert!(!summary.wrapped);
    assert_eq!(
        fs::read_to_string(output)?,
        "Bond, James Bond\nMoneypenny, Miss Moneypenny\n"
    );
    Ok(())
}

#[rstest]
#[case::absent(None)]
#[case::dash(Some(PathBuf::from("-")))]
fn render_defaults_to_stdout(#[case] output: Option<PathBuf>) -> TestResult {
    let dir = temp_dir();
    let template = write_file(&dir, "letter.txt", LETTER)?;
    let csv = write_file(&dir, "agents.csv", AGENTS)?;

    let summary = run_render(render_command(&template, &csv, output))?;

    assert_eq!(summary.target, OutputTarget::Stdout);
    assert_eq!(summary.rows, 2);
    Ok(())
}

#[test]
fn header_only_csv_renders_an_empty_loop() -> TestResult {
    let dir = temp_dir();
    let template = write_file(&dir, "count.txt", "{{ rows | length }} rows")?;
    let csv = write_file(&dir, "empty.csv", "first,last\n")?;
    let output = dir.path().join("out.txt");

    let summary = run_render(render_command(&template, &csv, Some(output.clone())))?;

    assert_eq!(summary.rows, 0);
    assert_eq!(fs::read_to_string(output)?, "0 rows");
    Ok(())
}

#[test]
fn grouped_template_renders_runs() -> TestResult {
    let dir = temp_dir();
    let template = write_file(
        &dir,
        "depts.txt",
        "{% for g in groupby('dept', rows) %}{{ g.key }}:{% for row in g.items %} {{ row.name }}{% endfor %};{% endfor %}",
    )?;
    let csv = write_file(&dir, "staff.csv", "name,dept\nAlice,Eng\nBob,Eng\nCarl,Sales\n")?;
    let output = dir.path().join("out.txt");

    run_render(render_command(&template, &csv, Some(output.clone())))?;

    assert_eq!(fs::read_to_string(output)?, "Eng: Alice Bob;Sales: Carl;");
    Ok(())
}

#[rstest]
#[case::html(EscapeArg::Html, "AT&amp;T&#39;s")]
#[case::none(EscapeArg::None, "AT&T's")]
fn escape_mode_controls_interpolation(
    #[case] escape: EscapeArg,
    #[case] expected: &str,
) -> TestResult {
    let dir = temp_dir();
    let template = write_file(&dir, "company.html", "{% for row in rows %}{{ row.company }}{% endfor %}")?;
    let csv = write_file(&dir, "companies.csv", "company\nAT&T's\n")?;
    let output = dir.path().join("out.html");
    let mut command = render_command(&template, &csv, Some(output.clone()));
    command.escape = escape;

    run_render(command)?;

    assert_eq!(fs::read_to_string(output)?, expected);
    Ok(())
}

#[test]
fn wrap_output_embeds_the_render_in_a_preview_page() -> TestResult {
    let dir = temp_dir();
    let template = write_file(&dir, "bold.html", "{% for row in rows %}<b>{{ row.name }}</b>{% endfor %}")?;
    let csv = write_file(&dir, "names.csv", "name\nAlice\n")?;
    let output = dir.path().join("preview.html");
    let mut command = render_command(&template, &csv, Some(output.clone()));
    command.wrap_output = true;

    let summary = run_render(command)?;

    assert!(summary.wrapped);
    let page = fs::read_to_string(output)?;
    assert!(page.contains("<title>Small Plate Preview</title>"));
    assert!(page.contains("&lt;b&gt;Alice&lt;/b&gt;"));
    assert!(page.contains("src=\"data:text/html;base64,"));
    Ok(())
}

#[test]
fn no_comment_keeps_hash_lines_as_data() -> TestResult {
    let dir = temp_dir();
    let template = write_file(&dir, "tags.txt", "{% for row in rows %}{{ row.tag }};{% endfor %}")?;
    let csv = write_file(&dir, "tags.csv", "tag\n#rust\nplain\n")?;
    let output = dir.path().join("out.txt");
    let mut command = render_command(&template, &csv, Some(output.clone()));
    command.csv_options.no_comment = true;

    let summary = run_render(command)?;

    assert_eq!(summary.rows, 2);
    assert_eq!(fs::read_to_string(output)?, "#rust;plain;");
    Ok(())
}

#[test]
fn custom_comment_marker_skips_its_lines() -> TestResult {
    let dir = temp_dir();
    let template = write_file(&dir, "tags.txt", "{% for row in rows %}{{ row.tag }};{% endfor %}")?;
    let csv = write_file(&dir, "tags.csv", "; exported\ntag\n#rust\n; skipped\nplain\n")?;
    let output = dir.path().join("out.txt");
    let cli = Cli::try_parse_from([
        "smallplate",
        "render",
        "--plate",
        template.to_str().ok_or("template path is not UTF-8")?,
        "--csv",
        csv.to_str().ok_or("csv path is not UTF-8")?,
        "--output",
        output.to_str().ok_or("output path is not UTF-8")?,
        "--comment",
        ";",
    ])?;
    let Command::Render(command) = cli.command;

    let summary = run_render(command)?;

    assert_eq!(summary.rows, 2);
    assert_eq!(fs::read_to_string(output)?, "#rust;plain;");
    Ok(())
}

#[test]
fn delimiter_matching_comment_marker_is_rejected() -> TestResult {
    let dir = temp_dir();
    let template = write_file(&dir, "letter.txt", LETTER)?;
    let csv = write_file(&dir, "agents.csv", "first#last\nJames#Bond\n")?;
    let output = dir.path().join("out.txt");
    let mut command = render_command(&template, &csv, Some(output.clone()));
    command.csv_options.delimiter = b'#';

    let err = run_render_expecting_error(command, "clashing delimiter must fail");

    assert!(matches!(
        err,
        CliError::Load {
            source: LoadError::InvalidOptions {
                fault: OptionsFault::CommentIsDelimiter(b'#')
            },
            ..
        }
    ));
    assert_eq!(err.code(), Some("LOAD_INVALID_OPTIONS"));
    assert!(!output.exists());
    Ok(())
}

#[test]
fn custom_delimiter_splits_fields() -> TestResult {
    let dir = temp_dir();
    let template = write_file(&dir, "pairs.txt", "{% for row in rows %}{{ row.a }}+{{ row.b }}{% endfor %}")?;
    let csv = write_file(&dir, "pairs.csv", "a;b\n1;2\n")?;
    let output = dir.path().join("out.txt");
    let mut command = render_command(&template, &csv, Some(output.clone()));
    command.csv_options.delimiter = b';';

    run_render(command)?;

    assert_eq!(fs::read_to_string(output)?, "1+2");
    Ok(())
}

#[test]
fn strict_fields_rejects_ragged_records() -> TestResult {
    let dir = temp_dir();
    let template = write_file(&dir, "letter.txt", LETTER)?;
    let csv = write_file(&dir, "ragged.csv", "first,last\nJames\n")?;
    let mut command = render_command(&template, &csv, None);
    command.csv_options.strict_fields = true;

    let err = run_render_expecting_error(command, "ragged record must fail");

    match err {
        CliError::Load {
            path,
            source: LoadError::FieldCount { expected, found, .. },
        } => {
            assert_eq!(path, csv);
            assert_eq!((expected, found), (2, 1));
        }
        other => panic!("expected field count error, got {other:?}"),
    }
    Ok(())
}

#[test]
fn malformed_csv_fails_without_creating_output() -> TestResult {
    let dir = temp_dir();
    let template = write_file(&dir, "letter.txt", LETTER)?;
    let csv = write_file(&dir, "broken.csv", "first,last\n\"James,Bond\n")?;
    let output = dir.path().join("out.txt");

    let err = run_render_expecting_error(
        render_command(&template, &csv, Some(output.clone())),
        "unterminated quote must fail",
    );

    assert!(matches!(
        err,
        CliError::Load {
            source: LoadError::Malformed { .. },
            ..
        }
    ));
    assert_eq!(err.code(), Some("LOAD_MALFORMED"));
    assert!(!output.exists());
    Ok(())
}

#[test]
fn template_syntax_error_is_reported_before_loading() -> TestResult {
    let dir = temp_dir();
    let template = write_file(&dir, "broken.txt", "{% for row in rows %}")?;
    let csv = dir.path().join("missing.csv");

    let err = run_render_expecting_error(
        render_command(&template, &csv, None),
        "unclosed block must fail",
    );

    match &err {
        CliError::Render(RenderError::Syntax { template, .. }) => {
            assert_eq!(template, "broken.txt");
        }
        other => panic!("expected syntax error, got {other:?}"),
    }
    assert_eq!(err.code(), Some("RENDER_SYNTAX"));
    Ok(())
}

#[rstest]
#[case::missing_template("absent.txt", "agents.csv")]
#[case::missing_csv("letter.txt", "absent.csv")]
fn missing_inputs_surface_io_errors(#[case] template: &str, #[case] csv: &str) -> TestResult {
    let dir = temp_dir();
    write_file(&dir, "letter.txt", LETTER)?;
    write_file(&dir, "agents.csv", AGENTS)?;
    let template = dir.path().join(template);
    let csv = dir.path().join(csv);
    let cli = Cli {
        command: Command::Render(render_command(&template, &csv, None)),
    };

    let err = run_cli_expecting_error(cli, "missing input must fail");

    match &err {
        CliError::Io { path, .. } => assert!(path.ends_with("absent.txt") || path.ends_with("absent.csv")),
        other => panic!("expected io error, got {other:?}"),
    }
    assert_eq!(err.code(), None);
    Ok(())
}

#[test]
fn unwritable_output_surfaces_io_error() -> TestResult {
    let dir = temp_dir();
    let template = write_file(&dir, "letter.txt", LETTER)?;
    let csv = write_file(&dir, "agents.csv", AGENTS)?;
    let output = dir.path().join("no-such-dir").join("out.txt");

    let err = run_render_expecting_error(
        render_command(&template, &csv, Some(output.clone())),
        "output in a missing directory must fail",
    );

    assert!(matches!(err, CliError::Io { ref path, .. } if *path == output));
    Ok(())
}

#[test]
fn parses_render_command_with_defaults() -> TestResult {
    let cli = Cli::try_parse_from([
        "smallplate",
        "render",
        "--plate",
        "letter.txt",
        "--csv",
        "agents.csv",
    ])?;
    let Command::Render(command) = cli.command;

    assert_eq!(command.template, PathBuf::from("letter.txt"));
    assert_eq!(command.csv, PathBuf::from("agents.csv"));
    assert_eq!(command.output, None);
    assert!(!command.wrap_output);
    assert_eq!(command.escape, EscapeArg::Html);
    let options = command.csv_options.loader_options();
    assert_eq!(options.delimiter(), b',');
    assert_eq!(options.comment(), Some(b'#'));
    assert_eq!(options.ragged(), RaggedPolicy::Lenient);
    assert_eq!(options.quotes(), QuotePolicy::Strict);
    Ok(())
}

#[test]
fn parses_every_render_flag() -> TestResult {
    let cli = Cli::try_parse_from([
        "smallplate",
        "render",
        "--plate",
        "letter.txt",
        "--csv",
        "agents.csv",
        "--output",
        "out.html",
        "--wrap-output",
        "--escape",
        "none",
        "--delimiter",
        ";",
        "--no-comment",
        "--strict-fields",
        "--lazy-quotes",
    ])?;
    let Command::Render(command) = cli.command;

    assert_eq!(command.output, Some(PathBuf::from("out.html")));
    assert!(command.wrap_output);
    assert_eq!(command.escape, EscapeArg::None);
    let options = command.csv_options.loader_options();
    assert_eq!(options.delimiter(), b';');
    assert_eq!(options.comment(), None);
    assert_eq!(options.ragged(), RaggedPolicy::Strict);
    assert_eq!(options.quotes(), QuotePolicy::Lazy);
    Ok(())
}

#[rstest]
#[case::comment_conflict(&["--comment", ";", "--no-comment"])]
#[case::long_delimiter(&["--delimiter", "::"])]
#[case::unknown_escape(&["--escape", "xml"])]
#[case::quote_delimiter(&["--delimiter", "\""])]
#[case::newline_comment(&["--comment", "\n"])]
fn rejects_invalid_flags(#[case] extra: &[&str]) {
    let mut args = vec![
        "smallplate",
        "render",
        "--plate",
        "letter.txt",
        "--csv",
        "agents.csv",
    ];
    args.extend_from_slice(extra);
    assert!(Cli::try_parse_from(args).is_err());
}

#[test]
fn requires_template_and_csv() {
    assert!(Cli::try_parse_from(["smallplate", "render", "--csv", "agents.csv"]).is_err());
    assert!(Cli::try_parse_from(["smallplate", "render", "--plate", "letter.txt"]).is_err());
}

#[test]
fn run_render_emits_tracing_fields() -> TestResult {
    let dir = temp_dir();
    let template = write_file(&dir, "letter.txt", LETTER)?;
    let csv = write_file(&dir, "agents.csv", AGENTS)?;
    let output = dir.path().join("out.txt");
    let layer = RecordingLayer::default();
    let subscriber = tracing_subscriber::registry().with(layer.clone());
    let cli = Cli {
        command: Command::Render(render_command(&template, &csv, Some(output.clone()))),
    };

    let summary = tracing::subscriber::with_default(subscriber, || run_cli(cli))?;
    assert_eq!(summary.rows, 2);

    let run = layer.span("cli.run").expect("cli.run span must exist");
    assert_eq!(run.field("command"), Some("render"));

    let render = layer.span("cli.render").expect("cli.render span must exist");
    let template_display = template.display().to_string();
    let csv_display = csv.display().to_string();
    let output_display = output.display().to_string();
    assert_eq!(render.field("template"), Some(template_display.as_str()));
    assert_eq!(render.field("csv"), Some(csv_display.as_str()));
    assert_eq!(render.field("output"), Some(output_display.as_str()));
    assert_eq!(render.field("wrapped"), Some("false"));

    let load = layer.span("cli.load_rows").expect("cli.load_rows span must exist");
    assert_eq!(load.field("rows"), Some("2"));

    let completed = layer
        .events_at(Level::INFO)
        .into_iter()
        .find(|event| event.message() == Some("render completed"))
        .expect("completion event must be emitted");
    assert_eq!(completed.field("template"), Some("letter.txt"));
    assert_eq!(completed.field("rows"), Some("2"));
    Ok(())
}

#[test]
fn failed_load_is_logged_as_span_error() -> TestResult {
    let dir = temp_dir();
    let template = write_file(&dir, "letter.txt", LETTER)?;
    let csv = write_file(&dir, "ragged.csv", "first,last\nJames\n")?;
    let layer = RecordingLayer::default();
    let subscriber = tracing_subscriber::registry().with(layer.clone());
    let mut command = render_command(&template, &csv, None);
    command.csv_options.strict_fields = true;

    let result = tracing::subscriber::with_default(subscriber, || run_render(command));
    assert!(result.is_err());

    let errors = layer.events_at(Level::ERROR);
    assert!(!errors.is_empty(), "instrumented spans must log the error");
    let load = layer.span("cli.load_rows").expect("cli.load_rows span must exist");
    assert_eq!(load.field("rows"), None);
    Ok(())
}
