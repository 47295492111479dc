// Cellgrid CLI - headless grid editing driven by intent scripts

mod exit_codes;

use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use cellgrid_cli::shell::{self, Shell};
use cellgrid_config::{CapacitySetting, DelimiterSetting, Settings};
use cellgrid_core::Range;
use cellgrid_engine::GridError;
use cellgrid_protocol::{Intent, Outcome};

use exit_codes::{grid_exit_code, EXIT_ERROR, EXIT_IO, EXIT_PARSE, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "cgrid")]
#[command(about = "Sparse grid editing core (CLI mode, headless)")]
#[command(version)]
struct Cli {
    /// Settings file (default: <config dir>/cellgrid/settings.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug detail to stderr (RUST_LOG takes precedence)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a script of shell intents against a grid, printing one JSON outcome per intent
    #[command(after_help = "\
Examples:
  cgrid apply ops.jsonl --input data.csv --output edited.csv
  cat ops.jsonl | cgrid apply - --rows 100 --cols 26
  cgrid apply ops.jsonl --policy grow --quiet

Each line of the script is one intent:
  {\"intent\":\"select\",\"top\":0,\"left\":0,\"bottom\":1,\"right\":1}
  {\"intent\":\"copy\"}
  {\"intent\":\"paste\",\"row\":2,\"col\":2}
  {\"intent\":\"delete\"}
  {\"intent\":\"undo\"}
  {\"intent\":\"stats\"}
  {\"intent\":\"export\",\"path\":\"out.csv\"}")]
    Apply {
        /// Intent script (JSONL or JSON array), or - for stdin
        ops: String,

        /// Import this file before running the script
        #[arg(long, short = 'i')]
        input: Option<PathBuf>,

        /// Export the grid here after the script
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Out-of-range writes: reject (strict) or enlarge the grid (grow)
        #[arg(long)]
        policy: Option<PolicyArg>,

        /// Declared rows of the starting grid
        #[arg(long)]
        rows: Option<usize>,

        /// Declared columns of the starting grid
        #[arg(long)]
        cols: Option<usize>,

        /// Delimiter for import/export
        #[arg(long)]
        delimiter: Option<DelimiterArg>,

        /// Only print outcomes of failed intents
        #[arg(long, short = 'q')]
        quiet: bool,
    },

    /// Re-encode a delimited text file
    #[command(after_help = "\
Examples:
  cgrid convert data.csv -o data.tsv
  cgrid convert export.txt --from semicolon --to comma
  cgrid convert data.csv | head -5")]
    Convert {
        /// Input file
        input: PathBuf,

        /// Output file (omit for stdout)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Input delimiter
        #[arg(long)]
        from: Option<DelimiterArg>,

        /// Output delimiter
        #[arg(long)]
        to: Option<DelimiterArg>,
    },

    /// Print a file's extent and populated cells
    Show {
        /// Input file
        input: PathBuf,

        /// Input delimiter
        #[arg(long)]
        delimiter: Option<DelimiterArg>,

        /// Only cells inside this range, in row/column labels (e.g. R1C1:R10C3)
        #[arg(long, value_parser = parse_range)]
        range: Option<Range>,

        /// Output as JSON (a snapshot outcome)
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyArg {
    Strict,
    Grow,
}

impl From<PolicyArg> for CapacitySetting {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Strict => CapacitySetting::Strict,
            PolicyArg::Grow => CapacitySetting::Grow,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum DelimiterArg {
    Auto,
    Comma,
    Tab,
    Semicolon,
    Pipe,
}

impl From<DelimiterArg> for DelimiterSetting {
    fn from(arg: DelimiterArg) -> Self {
        match arg {
            DelimiterArg::Auto => DelimiterSetting::Auto,
            DelimiterArg::Comma => DelimiterSetting::Comma,
            DelimiterArg::Tab => DelimiterSetting::Tab,
            DelimiterArg::Semicolon => DelimiterSetting::Semicolon,
            DelimiterArg::Pipe => DelimiterSetting::Pipe,
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_IO, message: msg.into(), hint: None }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Error for an intent that came back failed.
    fn from_outcome(outcome: &Outcome) -> Self {
        let (code, message) = match &outcome.error {
            Some(err) => {
                let code = match err.kind.as_str() {
                    "io_failure" => EXIT_IO,
                    "malformed_input" => EXIT_PARSE,
                    _ => EXIT_ERROR,
                };
                (code, err.message.clone())
            }
            None => (EXIT_ERROR, format!("{} failed", outcome.intent)),
        };
        Self { code, message, hint: None }
    }
}

impl From<GridError> for CliError {
    fn from(err: GridError) -> Self {
        Self { code: grid_exit_code(&err), message: err.to_string(), hint: None }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = load_settings(cli.config.as_ref()).and_then(|settings| match cli.command {
        Commands::Apply { ops, input, output, policy, rows, cols, delimiter, quiet } => {
            let mut settings = settings;
            if let Some(policy) = policy {
                settings.capacity_policy = policy.into();
            }
            if let Some(rows) = rows {
                settings.rows = rows;
            }
            if let Some(cols) = cols {
                settings.cols = cols;
            }
            if let Some(delimiter) = delimiter {
                settings.delimiter = delimiter.into();
            }
            cmd_apply(&settings, ops, input, output, quiet)
        }
        Commands::Convert { input, output, from, to } => cmd_convert(&settings, input, output, from, to),
        Commands::Show { input, delimiter, range, json } => cmd_show(settings, input, delimiter, range, json),
    });

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

/// stderr logging. Library crates log through `log`; the subscriber bridges those
/// records in.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(true)
        .init();
}

fn load_settings(path: Option<&PathBuf>) -> Result<Settings, CliError> {
    match path {
        Some(path) => Settings::load_from(path)
            .map_err(|e| CliError::args(e).with_hint("settings files are JSON; lines starting with // are comments")),
        None => Ok(Settings::load()),
    }
}

fn cmd_apply(
    settings: &Settings,
    ops_arg: String,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    quiet: bool,
) -> Result<(), CliError> {
    // Read the whole script before touching the grid
    let ops_json = if ops_arg == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)
            .map_err(|e| CliError::io(format!("failed to read stdin: {}", e)))?;
        buf
    } else {
        std::fs::read_to_string(&ops_arg)
            .map_err(|e| CliError::io(format!("failed to read {}: {}", ops_arg, e)))?
    };
    let intents = parse_intents(&ops_json)?;

    let mut shell = Shell::from_settings(settings);
    if let Some(path) = input {
        let outcome = shell.dispatch(&Intent::Import { path });
        if !outcome.ok {
            return Err(CliError::from_outcome(&outcome));
        }
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut failed = 0usize;
    for intent in &intents {
        let outcome = shell.dispatch(intent);
        if !outcome.ok {
            failed += 1;
        }
        if !quiet || !outcome.ok {
            write_outcome(&mut out, &outcome)?;
        }
    }

    if let Some(path) = output {
        let outcome = shell.dispatch(&Intent::Export { path });
        if !outcome.ok {
            return Err(CliError::from_outcome(&outcome));
        }
    }

    tracing::info!(intents = intents.len(), failed, "intent script finished");

    if failed > 0 {
        return Err(CliError {
            code: EXIT_ERROR,
            message: format!("{} of {} intent(s) failed", failed, intents.len()),
            hint: None,
        });
    }
    Ok(())
}

/// Parse an intent script: either a JSON array or one intent per line.
fn parse_intents(script: &str) -> Result<Vec<Intent>, CliError> {
    if script.trim_start().starts_with('[') {
        return serde_json::from_str(script)
            .map_err(|e| CliError::args(format!("failed to parse intents: {}", e)));
    }

    script
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line)
                .map_err(|e| CliError::args(format!("line {}: {}", i + 1, e))
                    .with_hint("each line must be a JSON object with an \"intent\" field"))
        })
        .collect()
}

fn cmd_convert(
    settings: &Settings,
    input: PathBuf,
    output: Option<PathBuf>,
    from: Option<DelimiterArg>,
    to: Option<DelimiterArg>,
) -> Result<(), CliError> {
    let mut read_opts = shell::csv_options(settings);
    if let Some(from) = from {
        read_opts.delimiter = shell::delimiter(from.into());
    }
    let mut write_opts = read_opts;
    write_opts.delimiter = to.map_or(cellgrid_io::Delimiter::Auto, |d| shell::delimiter(d.into()));

    let grid = cellgrid_io::import(&input, &read_opts)?;

    match output {
        Some(path) => cellgrid_io::export(&grid, &path, &write_opts)?,
        None => {
            let delimiter = write_opts.delimiter.byte().unwrap_or(b',');
            let text = cellgrid_io::encode(&grid, delimiter)?;
            io::stdout()
                .write_all(text.as_bytes())
                .map_err(|e| CliError::io(format!("failed to write stdout: {}", e)))?;
        }
    }
    Ok(())
}

fn cmd_show(
    mut settings: Settings,
    input: PathBuf,
    delimiter: Option<DelimiterArg>,
    range: Option<Range>,
    json: bool,
) -> Result<(), CliError> {
    if let Some(delimiter) = delimiter {
        settings.delimiter = delimiter.into();
    }
    let mut shell = Shell::from_settings(&settings);
    let mut outcome = shell.dispatch(&Intent::Import { path: input });
    if !outcome.ok {
        return Err(CliError::from_outcome(&outcome));
    }

    outcome.intent = Intent::Snapshot.name().to_string();
    outcome.message = None;
    if let Some(range) = range {
        outcome.updates.retain(|cell| range.contains(cell.row, cell.col));
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if json {
        return write_outcome(&mut out, &outcome);
    }

    let (rows, cols) = outcome.extent;
    let write_err = |e: io::Error| CliError::io(format!("failed to write stdout: {}", e));
    writeln!(out, "{} x {}, {} populated", rows, cols, outcome.updates.len()).map_err(write_err)?;
    for cell in &outcome.updates {
        writeln!(out, "{}\t{}", cell_label(cell.row, cell.col), cell.value.escape_debug()).map_err(write_err)?;
    }
    Ok(())
}

/// Header-style label for a cell: rows and columns are 1-based.
fn cell_label(row: usize, col: usize) -> String {
    format!("R{}C{}", row + 1, col + 1)
}

/// Parse "R1C1:R3C4" (or a single "R2C5") into a 0-based range.
fn parse_range(s: &str) -> Result<Range, String> {
    fn parse_cell(cell: &str) -> Result<(usize, usize), String> {
        let bad = || format!("invalid cell '{}': expected R<row>C<col>, e.g. R1C1", cell);
        let rest = cell.trim().strip_prefix(&['R', 'r'][..]).ok_or_else(bad)?;
        let (row, col) = rest.split_once(&['C', 'c'][..]).ok_or_else(bad)?;
        let row: usize = row.parse().map_err(|_| bad())?;
        let col: usize = col.parse().map_err(|_| bad())?;
        if row == 0 || col == 0 {
            return Err(format!("invalid cell '{}': rows and columns start at 1", cell));
        }
        Ok((row - 1, col - 1))
    }

    match s.split_once(':') {
        Some((start, end)) => {
            let (r1, c1) = parse_cell(start)?;
            let (r2, c2) = parse_cell(end)?;
            Ok(Range::new(r1, c1, r2, c2))
        }
        None => {
            let (row, col) = parse_cell(s)?;
            Ok(Range::single(row, col))
        }
    }
}

fn write_outcome(out: &mut impl Write, outcome: &Outcome) -> Result<(), CliError> {
    let line = serde_json::to_string(outcome)
        .map_err(|e| CliError { code: EXIT_ERROR, message: e.to_string(), hint: None })?;
    writeln!(out, "{}", line).map_err(|e| CliError::io(format!("failed to write stdout: {}", e)))
}
