//! Purpose: `benchsort` CLI entry point.
//! Role: Binary crate root; parses args, runs `gen`/`run`, emits JSON reports on stdout.
//! Invariants: Errors are reported once on stderr (JSON when not a tty).
//! Invariants: Process exit code is derived from `to_exit_code`.
//! Invariants: Configuration is built once here and passed down explicitly.
#![allow(clippy::result_large_err)]
use std::ffi::OsString;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::time::Instant;

use clap::{Args, Parser, Subcommand, ValueHint, error::ErrorKind as ClapErrorKind};
use serde_json::{Map, Value, json};
use std::error::Error as StdError;
use tracing_subscriber::EnvFilter;

mod command_dispatch;

use benchsort::core::config::{
    DEFAULT_KEY_SIZE, DEFAULT_SCALE, DEFAULT_VAL_SIZE, GenConfig, RunConfig, default_data_dir,
};
use benchsort::core::error::{Error, ErrorKind, to_exit_code};
use benchsort::core::store::DataStore;

const DEFAULT_BUF_SIZE: usize = 500_000;
const DEFAULT_INPUT_RATIO: usize = 100;
const DEFAULT_OUTPUT_RATIO: usize = 100;

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

fn main() {
    init_tracing();
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err(err) => {
            emit_error(&err);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<RunOutcome, Error> {
    let cli = match Cli::try_parse_from(normalize_args(std::env::args_os())) {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    Error::new(ErrorKind::Io)
                        .with_message("failed to write help")
                        .with_source(io_err)
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(RunOutcome::with_code(exit_code));
            }
            _ => {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message(clap_error_summary(&err))
                    .with_hint("Try `benchsort --help`."));
            }
        },
    };

    command_dispatch::dispatch_command(cli.command)
        .map_err(add_corrupt_hint)
        .map_err(add_io_hint)
        .map_err(add_internal_hint)
}

/// Maps the single-dash camelCase flags of the original tool (`-keySize 8`,
/// `-scale=100`) onto their clap long forms.
fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .map(|arg| {
            let Some(value) = arg.to_str() else {
                return arg;
            };
            let (flag, rest) = match value.split_once('=') {
                Some((flag, rest)) => (flag, Some(rest)),
                None => (value, None),
            };
            let replacement = match flag {
                "-dir" => "--dir",
                "-keySize" => "--key-size",
                "-valSize" => "--val-size",
                "-scale" => "--scale",
                "-seed" => "--seed",
                "-bufSize" => "--buf-size",
                "-inputRatio" => "--input-ratio",
                "-outputRatio" => "--output-ratio",
                _ => return arg,
            };
            match rest {
                Some(rest) => OsString::from(format!("{replacement}={rest}")),
                None => OsString::from(replacement),
            }
        })
        .collect()
}

#[derive(Parser)]
#[command(
    name = "benchsort",
    version,
    about = "Generate and load synthetic row data for external sort benchmarks",
    long_about = None,
    after_help = r#"EXAMPLES
  $ benchsort gen --dir /tmp/sort --key-size 8 --val-size 8 --scale 100000
  $ benchsort run --dir /tmp/sort

NOTES
  - Data is written to <dir>/data.out and is never overwritten
  - Set RUST_LOG=info for progress logs on stderr"#,
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(
        about = "Generate rows and write them to data.out",
        after_help = r#"EXAMPLES
  $ benchsort gen --scale 1000
  $ benchsort gen --dir /tmp/sort --key-size 2 --val-size 1 --scale 3 --seed 7"#
    )]
    Gen(GenArgs),
    #[command(
        about = "Load data.out and report load timing",
        long_about = r#"Load data.out and report load timing.

The buffer size and ratio flags are validated and echoed in the report; no sort phase
runs yet."#
    )]
    Run(RunArgs),
}

#[derive(Args)]
struct GenArgs {
    #[arg(
        long,
        help = "Where to store the generated rows (default: current directory)",
        value_hint = ValueHint::DirPath
    )]
    dir: Option<PathBuf>,
    #[arg(long, default_value_t = DEFAULT_KEY_SIZE, help = "Number of key fields per row")]
    key_size: usize,
    #[arg(long, default_value_t = DEFAULT_VAL_SIZE, help = "Number of value fields per row")]
    val_size: usize,
    #[arg(long, default_value_t = DEFAULT_SCALE, help = "How many rows to generate")]
    scale: usize,
    #[arg(long, help = "Random seed (default: derived from the clock)")]
    seed: Option<u64>,
}

#[derive(Args)]
struct RunArgs {
    #[arg(
        long,
        help = "Directory holding data.out (default: current directory)",
        value_hint = ValueHint::DirPath
    )]
    dir: Option<PathBuf>,
    #[arg(long, default_value_t = DEFAULT_BUF_SIZE, help = "Rows buffered in memory")]
    buf_size: usize,
    #[arg(long, default_value_t = DEFAULT_INPUT_RATIO, help = "Input buffer ratio")]
    input_ratio: usize,
    #[arg(long, default_value_t = DEFAULT_OUTPUT_RATIO, help = "Output buffer ratio")]
    output_ratio: usize,
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

fn resolve_dir(dir: Option<PathBuf>) -> Result<PathBuf, Error> {
    match dir {
        Some(dir) => Ok(dir),
        None => default_data_dir(),
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

fn emit_json(value: Value) {
    let pretty = io::stdout().is_terminal();
    let json = if pretty {
        serde_json::to_string_pretty(&value)
    } else {
        serde_json::to_string(&value)
    }
    .unwrap_or_else(|_| "{\"error\":\"json encode failed\"}".to_string());
    println!("{json}");
}

fn add_io_hint(err: Error) -> Error {
    if err.hint().is_some() {
        return err;
    }
    match err.kind() {
        ErrorKind::DirectoryNotFound => {
            err.with_hint("Create the directory first or point --dir at an existing one.")
        }
        ErrorKind::FileNotFound => {
            err.with_hint("Generate data first: benchsort gen --dir <same dir>.")
        }
        ErrorKind::FileAlreadyExists => {
            err.with_hint("Data files are write-once. Remove data.out or use another --dir.")
        }
        ErrorKind::Io => err.with_hint("I/O error. Check the path, filesystem, and disk space."),
        _ => err,
    }
}

fn add_corrupt_hint(err: Error) -> Error {
    if err.hint().is_some() {
        return err;
    }
    match err.kind() {
        ErrorKind::CorruptHeader | ErrorKind::CorruptRecord | ErrorKind::Decoding => {
            err.with_hint("Data file appears corrupt or truncated. Regenerate it with benchsort gen.")
        }
        _ => err,
    }
}

fn add_internal_hint(err: Error) -> Error {
    if err.kind() != ErrorKind::Internal || err.hint().is_some() {
        return err;
    }
    err.with_hint("Unexpected internal failure. Retry with RUST_LOG=debug and RUST_BACKTRACE=1.")
}

#[derive(Copy, Clone, Debug)]
enum AnsiColor {
    Red,
    Yellow,
}

fn colorize_label(label: &str, enabled: bool, color: AnsiColor) -> String {
    if !enabled {
        return label.to_string();
    }
    let code = match color {
        AnsiColor::Red => "31",
        AnsiColor::Yellow => "33",
    };
    format!("\x1b[{code}m{label}\x1b[0m")
}

/// Colored text on a terminal, one JSON line otherwise.
fn emit_error(err: &Error) {
    if io::stderr().is_terminal() {
        eprintln!("{}", error_text(err, std::env::var_os("NO_COLOR").is_none()));
        return;
    }

    let value = error_json(err);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_message(err: &Error) -> String {
    if let Some(message) = err.message() {
        return message.to_string();
    }
    match err.kind() {
        ErrorKind::Internal => "internal error".to_string(),
        ErrorKind::Usage => "usage error".to_string(),
        ErrorKind::DirectoryNotFound => "directory not found".to_string(),
        ErrorKind::FileNotFound => "file not found".to_string(),
        ErrorKind::FileAlreadyExists => "file already exists".to_string(),
        ErrorKind::CorruptHeader => "corrupt header".to_string(),
        ErrorKind::CorruptRecord => "corrupt record".to_string(),
        ErrorKind::Encoding => "encoding error".to_string(),
        ErrorKind::Decoding => "decoding error".to_string(),
        ErrorKind::Io => "i/o error".to_string(),
    }
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut cur = err.source();
    while let Some(source) = cur {
        causes.push(source.to_string());
        cur = source.source();
    }
    causes
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    if let Some(path) = err.path() {
        inner.insert("path".to_string(), json!(path.display().to_string()));
    }
    if let Some(record) = err.record() {
        inner.insert("record".to_string(), json!(record));
    }
    if let Some(offset) = err.offset() {
        inner.insert("offset".to_string(), json!(offset));
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn error_text(err: &Error, use_color: bool) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "{} {}",
        colorize_label("error:", use_color, AnsiColor::Red),
        error_message(err)
    ));

    if let Some(hint) = err.hint() {
        lines.push(format!(
            "{} {hint}",
            colorize_label("hint:", use_color, AnsiColor::Yellow)
        ));
    }
    if let Some(path) = err.path() {
        lines.push(format!(
            "{} {}",
            colorize_label("path:", use_color, AnsiColor::Yellow),
            path.display()
        ));
    }
    if let Some(record) = err.record() {
        lines.push(format!(
            "{} {record}",
            colorize_label("record:", use_color, AnsiColor::Yellow)
        ));
    }
    if let Some(offset) = err.offset() {
        lines.push(format!(
            "{} {offset}",
            colorize_label("offset:", use_color, AnsiColor::Yellow)
        ));
    }

    let causes = error_causes(err);
    if let Some(cause) = causes.first() {
        lines.push(format!(
            "{} {cause}",
            colorize_label("caused by:", use_color, AnsiColor::Yellow)
        ));
    }

    lines.join("\n")
}

fn clap_error_summary(err: &clap::Error) -> String {
    for line in err.to_string().lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix("error:") {
            return rest.trim().to_string();
        }
        return trimmed.to_string();
    }
    "invalid arguments".to_string()
}
