use anyhow::{Context, Result};
use badbox_log::{Confirm, FsOracle, LogParser, Severity, SortBy};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;

mod host;
mod report;

#[derive(Parser)]
#[command(name = "badbox")]
#[command(about = "Errors, warnings and bad boxes from TeX transcripts", long_about = None)]
struct Cli {
    /// More logging on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a TeX transcript and report its diagnostics
    Parse(ParseArgs),
    /// Print the effective configuration as JSON
    Config {
        /// Config file to load instead of the per-user one
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
}

#[derive(clap::Args)]
struct ParseArgs {
    /// Path to the .log file (or captured latexmk output)
    #[arg(value_name = "FILE")]
    path: PathBuf,

    /// Root .tex file; defaults to the transcript name with a .tex extension
    #[arg(long, value_name = "TEX")]
    root: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    #[arg(long, value_enum)]
    min_severity: Option<SeverityArg>,

    #[arg(long, value_enum)]
    sort: Option<SortArg>,

    /// Bytes per line after which the engine wraps its output
    #[arg(long)]
    wrap_width: Option<usize>,

    /// Config file to load instead of the per-user one
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Remove stale auxiliary files without asking
    #[arg(long, conflicts_with = "no_prompt")]
    yes: bool,

    /// Never ask about stale auxiliary files
    #[arg(long)]
    no_prompt: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum SeverityArg {
    Error,
    Warning,
    Badbox,
}

impl From<SeverityArg> for Severity {
    fn from(arg: SeverityArg) -> Self {
        match arg {
            SeverityArg::Error => Severity::Error,
            SeverityArg::Warning => Severity::Warning,
            SeverityArg::Badbox => Severity::BoxOverflow,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SortArg {
    Severity,
    Occurrence,
}

impl From<SortArg> for SortBy {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Severity => SortBy::Severity,
            SortArg::Occurrence => SortBy::Occurrence,
        }
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match cli.command {
        Commands::Parse(args) => parse(args),
        Commands::Config { config } => {
            let config = host::load_config(config.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn parse(args: ParseArgs) -> Result<ExitCode> {
    let mut config = host::load_config(args.config.as_deref())?;
    if let Some(min) = args.min_severity {
        config.min_severity = min.into();
    }
    if let Some(sort) = args.sort {
        config.sort_by = sort.into();
    }
    if let Some(width) = args.wrap_width {
        config.wrap_width = width;
    }
    config.validate()?;

    let bytes = fs::read(&args.path)
        .with_context(|| format!("Failed to read {}", args.path.display()))?;
    // Engines emit raw 8-bit bytes for non-ASCII input, so a log need not be valid UTF-8.
    let content = String::from_utf8_lossy(&bytes);

    let root = args.root.unwrap_or_else(|| host::default_root(&args.path));
    log::debug!("Root file {}", root.display());
    let parser = LogParser::new(config).with_root(&root);

    let prompt = host::StdinConfirm;
    let always = |_: &str| true;
    let confirm: Option<&dyn Confirm> = if args.yes {
        Some(&always)
    } else if args.no_prompt || !io::stdin().is_terminal() {
        None
    } else {
        Some(&prompt)
    };

    let outcome = parser.parse_with_advisory(&content, &FsOracle, confirm);
    if let Some(advisory) = &outcome.stale_aux {
        if outcome.cleanup_confirmed {
            host::remove_aux(&root)?;
        } else {
            log::warn!("{}", advisory.message);
        }
    }

    match args.format {
        Format::Json => {
            let report = report::JsonReport::new(&outcome.diagnostics, outcome.stale_aux.as_ref());
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Format::Text => report::write_text(&mut io::stdout().lock(), &outcome.diagnostics)?,
    }

    let has_errors = outcome
        .diagnostics
        .iter()
        .any(|d| d.severity == Severity::Error);
    Ok(if has_errors {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
