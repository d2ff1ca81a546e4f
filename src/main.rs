//! Trackcov CLI
//!
//! Runs the coverage analysis over one traversal session and writes the
//! report as JSON.
//!
//! # Usage
//!
//! ```bash
//! trackcov analyze \
//!   --catalog tracking_points.toml \
//!   --captures mitm_capture_20260806.jsonl \
//!   --actions ui_actions_20260806.jsonl \
//!   --config session.toml \
//!   --output report.json
//!
//! trackcov check-catalog --catalog tracking_points.toml
//! ```
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 2: Catalog, config, or input-ordering validation error
//! - 3: Runtime error (I/O, serialization)

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use trackcov::config::SessionConfig;
use trackcov::engine::clock::format_millis;
use trackcov::engine::{action, capture, Catalog};

/// Tracking-point coverage verification for Android traversal sessions
#[derive(Parser, Debug)]
#[command(name = "trackcov")]
#[command(about = "Verify which expected tracking events fired during a UI traversal session")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyze a session: match captures against the catalog, correlate to
    /// UI actions, and report coverage
    Analyze {
        /// Tracking-point catalog (TOML)
        #[arg(long)]
        catalog: PathBuf,

        /// Capture log (JSONL, one HTTP transaction per line)
        #[arg(long)]
        captures: PathBuf,

        /// UI action log (JSONL, one gesture per line)
        #[arg(long)]
        actions: PathBuf,

        /// Session config (TOML); defaults apply if omitted
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the configured correlation tolerance (ms)
        #[arg(long)]
        tolerance_ms: Option<i64>,

        /// Report output path (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate a catalog and list its definitions
    CheckCatalog {
        /// Tracking-point catalog (TOML)
        #[arg(long)]
        catalog: PathBuf,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(3)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Commands::Analyze {
            catalog,
            captures,
            actions,
            config,
            tolerance_ms,
            output,
        } => analyze(catalog, captures, actions, config, tolerance_ms, output),
        Commands::CheckCatalog { catalog } => check_catalog(catalog),
    }
}

fn analyze(
    catalog_path: PathBuf,
    captures_path: PathBuf,
    actions_path: PathBuf,
    config_path: Option<PathBuf>,
    tolerance_override: Option<i64>,
    output: Option<PathBuf>,
) -> Result<ExitCode> {
    let config = match &config_path {
        Some(path) => match SessionConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("config error: {}", e);
                return Ok(ExitCode::from(2));
            }
        },
        None => SessionConfig::default(),
    };
    let classifier = match config.classifier() {
        Ok(classifier) => classifier,
        Err(e) => {
            eprintln!("config error: {}", e);
            return Ok(ExitCode::from(2));
        }
    };
    let tolerance_ms = tolerance_override.unwrap_or(config.tolerance_ms);

    let catalog = match Catalog::load(&catalog_path) {
        Ok(catalog) => catalog,
        Err(e) => {
            eprintln!("catalog error: {}", e);
            return Ok(ExitCode::from(2));
        }
    };

    let captures = capture::load_capture_log(&captures_path, &config.asset_extensions)
        .with_context(|| format!("reading capture log {}", captures_path.display()))?;
    let actions = action::load_action_log(&actions_path)
        .with_context(|| format!("reading ui action log {}", actions_path.display()))?;

    let report = match trackcov::analyze_session(&captures, &actions, &catalog, &classifier, tolerance_ms)
    {
        Ok(report) => report,
        Err(e) => {
            eprintln!("input error: {}", e);
            return Ok(ExitCode::from(2));
        }
    };

    let json = serde_json::to_string_pretty(&report).context("serializing report")?;
    match &output {
        Some(path) => {
            std::fs::write(path, &json)
                .with_context(|| format!("writing report to {}", path.display()))?;
            println!("report written to {}", path.display());
        }
        None => println!("{}", json),
    }

    print_summary(&report);
    Ok(ExitCode::SUCCESS)
}

fn print_summary(report: &trackcov::SessionReport) {
    let coverage = &report.coverage;
    eprintln!();
    eprintln!(
        "coverage: {}/{} tracking points fired ({:.0}%)",
        coverage.fired_definitions,
        coverage.total_definitions,
        coverage.fired_ratio() * 100.0
    );
    for (id, cov) in &coverage.per_definition {
        if cov.fired {
            let first = cov
                .first_fired_at
                .map(format_millis)
                .unwrap_or_default();
            eprintln!("  [fired]   {} ({} occurrences, first at {})", id, cov.occurrence_count(), first);
        } else {
            eprintln!("  [missing] {}", id);
        }
    }
    eprintln!(
        "quality score: {}/100 (uncorrelated events: {})",
        report.stats.quality.total, report.stats.uncorrelated_events
    );
}

fn check_catalog(catalog_path: PathBuf) -> Result<ExitCode> {
    match Catalog::load(&catalog_path) {
        Ok(catalog) => {
            let mut out = std::io::stdout().lock();
            writeln!(out, "catalog OK: {} definitions", catalog.len())?;
            for def in catalog.definitions() {
                let required = if def.required_params.is_empty() {
                    String::new()
                } else {
                    format!(" requires [{}]", def.required_params.join(", "))
                };
                writeln!(out, "  {}{} - {}", def.id, required, def.description)?;
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            eprintln!("catalog error: {}", e);
            Ok(ExitCode::from(2))
        }
    }
}
