mod config;

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use hostfacts_core::{CommandOutput, HostContext, ParsedRecord};
use hostfacts_parsers::output::{OutputFormat, format_records, format_report, format_reports};
use hostfacts_parsers::{ParseReport, ParserKind, ParserRegistry, parse_with_report};
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::config::{Capture, SourceCatalog};

const PACKAGE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Parser)]
#[command(name = "hostfacts")]
#[command(about = "Parse captured command output into typed host facts")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Parse one captured command output.
    Parse(ParseArgs),
    /// Parse capture files in parallel.
    ParseBatch(ParseBatchArgs),
    /// Validate a YAML catalog of command sources against the parsers.
    Validate(ValidateArgs),
    /// List registered parsers and the commands they read.
    Parsers(ParsersArgs),
}

#[derive(Debug, Args)]
struct ParseArgs {
    /// Command path as it was invoked (e.g. /bin/ps).
    #[arg(long)]
    command: String,
    /// Argument passed to the command; repeat in invocation order.
    #[arg(long = "arg", allow_hyphen_values = true)]
    args: Vec<String>,
    /// File holding the captured stdout, or `-` for stdin.
    #[arg(long)]
    stdout: PathBuf,
    /// File holding the captured stderr.
    #[arg(long)]
    stderr: Option<PathBuf>,
    /// Exit status of the command.
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    exit_status: i32,
    /// Wall-clock duration of the command in seconds.
    #[arg(long, default_value_t = 0.0)]
    duration: f64,
    /// Parser to use instead of matching the command basename.
    #[arg(long)]
    parser: Option<ParserKind>,
    /// Hostname the output was collected on.
    #[arg(long)]
    host: Option<String>,
    /// Output both records and the parse report.
    #[arg(long)]
    with_report: bool,
    /// Output format.
    #[arg(long, default_value = "json")]
    format: OutputFormat,
}

#[derive(Debug, Args)]
struct ParseBatchArgs {
    /// Capture files (JSON, or YAML with a .yaml/.yml extension).
    #[arg(required = true)]
    captures: Vec<PathBuf>,
    /// Number of parallel parse jobs (default: number of CPUs).
    #[arg(long)]
    jobs: Option<usize>,
    /// Output format.
    #[arg(long, default_value = "json")]
    format: OutputFormat,
}

#[derive(Debug, Args)]
struct ValidateArgs {
    /// YAML source catalog.
    #[arg(long)]
    sources: PathBuf,
}

#[derive(Debug, Args)]
struct ParsersArgs {
    /// Output format.
    #[arg(long, default_value = "table")]
    format: OutputFormat,
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Parse(args) => run_parse(args),
        Command::ParseBatch(args) => run_parse_batch(args),
        Command::Validate(args) => run_validate(args),
        Command::Parsers(args) => run_parsers(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn read_input(path: &Path) -> Result<String, String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .map_err(|err| format!("Failed to read stdin: {err}"))?;
        return Ok(text);
    }
    fs::read_to_string(path).map_err(|err| format!("Failed to read '{}': {err}", path.display()))
}

fn resolve_kind(
    registry: &ParserRegistry,
    explicit: Option<ParserKind>,
    command: &str,
) -> Result<ParserKind, String> {
    match explicit {
        Some(kind) => Ok(kind),
        None => registry
            .for_command(command)
            .map(|parser| parser.kind())
            .ok_or_else(|| format!("No parser handles command '{command}'; pass --parser")),
    }
}

fn run_parse(args: ParseArgs) -> Result<(), String> {
    let stdout = read_input(&args.stdout)?;
    let stderr = match &args.stderr {
        Some(path) => read_input(path)?,
        None => String::new(),
    };

    let output = CommandOutput::new(&args.command, args.args, &stdout)
        .with_stderr(&stderr)
        .with_exit_status(args.exit_status)
        .with_duration(args.duration);
    let context = HostContext {
        hostname: args.host,
        os: None,
    };

    let registry = ParserRegistry::with_defaults();
    let kind = resolve_kind(&registry, args.parser, &output.command)?;
    let run = parse_with_report(&registry, kind, &output, &context);

    if args.with_report {
        #[derive(Serialize)]
        struct ParseOutput<'a> {
            records: &'a [ParsedRecord],
            report: &'a ParseReport,
        }

        let combined = ParseOutput {
            records: &run.records,
            report: &run.report,
        };
        match args.format {
            OutputFormat::Json => {
                let json = serde_json::to_string_pretty(&combined)
                    .map_err(|e| format!("Failed to serialize output: {e}"))?;
                println!("{json}");
            }
            OutputFormat::Yaml => {
                let yaml = serde_yaml::to_string(&combined)
                    .map_err(|e| format!("Failed to serialize output: {e}"))?;
                print!("{yaml}");
            }
            OutputFormat::Table => {
                print!("{}", format_records(&run.records, args.format)?);
                print!("{}", format_report(&run.report, args.format)?);
            }
        }
    } else {
        let rendered = format_records(&run.records, args.format)?;
        match args.format {
            OutputFormat::Json => println!("{rendered}"),
            _ => print!("{rendered}"),
        }
    }
    Ok(())
}

/// Records and report for one capture file in a batch.
#[derive(Debug, Serialize)]
struct BatchEntry {
    capture: String,
    records: Vec<ParsedRecord>,
    report: ParseReport,
}

#[derive(Debug, Serialize)]
struct BatchOutput {
    tool_version: String,
    generated_at: String,
    entries: Vec<BatchEntry>,
    failures: Vec<String>,
}

fn run_parse_batch(args: ParseBatchArgs) -> Result<(), String> {
    use rayon::prelude::*;

    let jobs = args.jobs.unwrap_or_else(rayon::current_num_threads).max(1);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .build()
        .map_err(|e| format!("Failed to create thread pool: {e}"))?;
    debug!(jobs, captures = args.captures.len(), "starting batch parse");

    let registry = ParserRegistry::with_defaults();
    let results: Vec<Result<BatchEntry, String>> = pool.install(|| {
        args.captures
            .par_iter()
            .map(|path| parse_capture(&registry, path))
            .collect()
    });

    let mut entries = Vec::new();
    let mut failures = Vec::new();
    for result in results {
        match result {
            Ok(entry) => entries.push(entry),
            Err(err) => failures.push(err),
        }
    }
    info!(parsed = entries.len(), failed = failures.len(), "batch parse finished");

    let batch = BatchOutput {
        tool_version: PACKAGE_VERSION.to_string(),
        generated_at: chrono::Utc::now().to_rfc3339(),
        entries,
        failures,
    };

    match args.format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&batch)
                .map_err(|e| format!("Failed to serialize output: {e}"))?;
            println!("{json}");
        }
        OutputFormat::Yaml => {
            let yaml = serde_yaml::to_string(&batch)
                .map_err(|e| format!("Failed to serialize output: {e}"))?;
            print!("{yaml}");
        }
        OutputFormat::Table => {
            let reports: Vec<ParseReport> =
                batch.entries.iter().map(|entry| entry.report.clone()).collect();
            print!("{}", format_reports(&reports, args.format)?);
        }
    }

    if !batch.failures.is_empty() {
        eprintln!(
            "{} capture(s) could not be parsed: {}",
            batch.failures.len(),
            batch.failures.join("; ")
        );
    }
    Ok(())
}

fn parse_capture(registry: &ParserRegistry, path: &Path) -> Result<BatchEntry, String> {
    let capture =
        Capture::load(path).map_err(|e| format!("Failed to load '{}': {e}", path.display()))?;
    let kind = resolve_kind(registry, capture.parser, &capture.output.command)
        .map_err(|e| format!("'{}': {e}", path.display()))?;
    let run = parse_with_report(registry, kind, &capture.output, &capture.host);

    Ok(BatchEntry {
        capture: path.display().to_string(),
        records: run.records,
        report: run.report,
    })
}

fn run_validate(args: ValidateArgs) -> Result<(), String> {
    let catalog = SourceCatalog::load(&args.sources).map_err(|e| {
        format!(
            "Failed to load source catalog '{}': {e}",
            args.sources.display()
        )
    })?;

    let registry = ParserRegistry::with_defaults();
    let errors = registry.catalog_errors(&catalog.sources);
    if errors.is_empty() {
        println!("Validated {} source(s).", catalog.sources.len());
        return Ok(());
    }

    for err in &errors {
        eprintln!("  [{}] {err}", err.rule());
    }
    Err(format!(
        "{} problem(s) in {} source(s)",
        errors.len(),
        catalog.sources.len()
    ))
}

fn run_parsers(args: ParsersArgs) -> Result<(), String> {
    #[derive(Serialize)]
    struct ParserInfo {
        kind: ParserKind,
        platform: &'static str,
        tools: &'static [&'static str],
    }

    let registry = ParserRegistry::with_defaults();
    let infos: Vec<ParserInfo> = registry
        .kinds()
        .into_iter()
        .filter_map(|kind| registry.get(kind))
        .map(|parser| ParserInfo {
            kind: parser.kind(),
            platform: parser.platform(),
            tools: parser.tools(),
        })
        .collect();

    match args.format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&infos)
                .map_err(|e| format!("Failed to serialize output: {e}"))?;
            println!("{json}");
        }
        OutputFormat::Yaml => {
            let yaml = serde_yaml::to_string(&infos)
                .map_err(|e| format!("Failed to serialize output: {e}"))?;
            print!("{yaml}");
        }
        OutputFormat::Table => {
            for info in &infos {
                println!(
                    "{:<10} {:<6} {}",
                    info.kind,
                    info.platform,
                    info.tools.join(", ")
                );
            }
        }
    }
    Ok(())
}
