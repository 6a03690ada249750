//! Command-line interface for the batch ES-module converter

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use esmod_core::Severity;
use esmod_engine::{Converter, ConverterConfig, RunReport};
use log::info;

#[derive(Parser)]
#[command(name = "esmod")]
#[command(about = "Batch converter from namespace-attached legacy sources to ES modules")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable quiet mode (suppress non-error output)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Set log level
    #[arg(long, global = true, value_enum)]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(ValueEnum, Clone, Debug)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert every configured input into ES modules
    Convert {
        /// Path to the run configuration (TOML)
        #[arg(short, long)]
        config: PathBuf,
        /// Extra edge-case table to merge in (JSON)
        #[arg(long)]
        edge_cases: Option<PathBuf>,
        /// Override the configured output root
        #[arg(long)]
        output: Option<PathBuf>,
        /// Additional input paths on top of the configured ones
        #[arg(long)]
        input: Vec<PathBuf>,
    },
    /// Classify the configured inputs without writing anything
    Inspect {
        /// Path to the run configuration (TOML)
        #[arg(short, long)]
        config: PathBuf,
        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: InspectFormat,
    },
    /// Print an import block naming every indexed symbol, relative to FILE
    Imports {
        /// Path to the run configuration (TOML)
        #[arg(short, long)]
        config: PathBuf,
        /// The file the import paths are computed for
        file: PathBuf,
    },
}

#[derive(ValueEnum, Clone, Debug)]
enum InspectFormat {
    Text,
    Json,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(&cli);

    match cli.command {
        Commands::Convert {
            config,
            edge_cases,
            output,
            input,
        } => handle_convert(&config, edge_cases.as_deref(), output, input),
        Commands::Inspect { config, format } => handle_inspect(&config, format),
        Commands::Imports { config, file } => handle_imports(&config, &file),
    }
}

fn init_logging(cli: &Cli) {
    let log_level = if cli.quiet {
        log::LevelFilter::Error
    } else if cli.verbose {
        log::LevelFilter::Debug
    } else {
        match &cli.log_level {
            Some(LogLevel::Error) => log::LevelFilter::Error,
            Some(LogLevel::Warn) => log::LevelFilter::Warn,
            Some(LogLevel::Info) => log::LevelFilter::Info,
            Some(LogLevel::Debug) => log::LevelFilter::Debug,
            Some(LogLevel::Trace) => log::LevelFilter::Trace,
            None => log::LevelFilter::Info,
        }
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .format_timestamp_secs()
        .init();
}

fn load_config(
    path: &Path,
    edge_cases: Option<&Path>,
    output: Option<PathBuf>,
    inputs: Vec<PathBuf>,
) -> anyhow::Result<ConverterConfig> {
    let mut config = ConverterConfig::from_file(path)?;
    if let Some(edge_cases) = edge_cases {
        config.load_edge_cases(edge_cases)?;
    }
    if let Some(output) = output {
        config.output = output;
    }
    config.inputs.extend(inputs);
    Ok(config)
}

fn handle_convert(
    config_path: &Path,
    edge_cases: Option<&Path>,
    output: Option<PathBuf>,
    inputs: Vec<PathBuf>,
) -> anyhow::Result<()> {
    let config = load_config(config_path, edge_cases, output, inputs)?;
    info!("Converting {} input path(s)", config.inputs.len());

    let mut converter = Converter::new(config)?;
    let report = converter.run()?;
    print_report(&report);

    if report.has_errors() {
        std::process::exit(1);
    }
    Ok(())
}

fn print_report(report: &RunReport) {
    for diagnostic in &report.diagnostics {
        if diagnostic.severity >= Severity::Warning {
            eprintln!("{}", diagnostic);
        }
    }

    println!(
        "✅ Converted {} file(s), updated {}, copied {}, skipped {}",
        report.converted, report.updated, report.copied, report.skipped
    );
    let warnings = report
        .diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Warning)
        .count();
    let errors = report
        .diagnostics
        .iter()
        .filter(|d| d.severity >= Severity::Error)
        .count();
    if warnings > 0 {
        println!("⚠️  {} warning(s) need manual follow-up", warnings);
    }
    if errors > 0 {
        println!("❌ {} error(s)", errors);
    }
}

fn handle_inspect(config_path: &Path, format: InspectFormat) -> anyhow::Result<()> {
    let config = load_config(config_path, None, None, Vec::new())?;
    let mut converter = Converter::new(config)?;
    let entries = converter.inspect()?;

    match format {
        InspectFormat::Text => {
            for entry in &entries {
                println!(
                    "{}\t{}\t{}",
                    entry.path.display(),
                    entry.style,
                    entry.exports.join(", ")
                );
            }
            println!("📄 {} file(s) classified", entries.len());
        }
        InspectFormat::Json => {
            let rows: Vec<serde_json::Value> = entries
                .iter()
                .map(|entry| {
                    serde_json::json!({
                        "path": entry.path.display().to_string(),
                        "style": entry.style.to_string(),
                        "exports": entry.exports,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
    }
    Ok(())
}

fn handle_imports(config_path: &Path, file: &Path) -> anyhow::Result<()> {
    let config = load_config(config_path, None, None, Vec::new())?;
    let mut converter = Converter::new(config)?;
    print!("{}", converter.format_all_imports(file)?);
    Ok(())
}
