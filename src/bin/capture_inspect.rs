//! Capture Log Inspector
//!
//! Quick evidence that a capture log is usable before running a full
//! analysis: record counts, time span, traffic classes, the busiest hosts,
//! and the embedded analytics events found in request bodies.
//!
//! Usage:
//!   cargo run --bin capture_inspect -- --log mitm_capture_20260806.jsonl
//!   cargo run --bin capture_inspect -- --log capture.jsonl --config session.toml --top 20

use anyhow::{Context, Result};
use clap::Parser;
use std::collections::BTreeMap;
use std::path::PathBuf;
use trackcov::config::SessionConfig;
use trackcov::engine::clock::format_millis;
use trackcov::engine::extract::extract_events;
use trackcov::engine::{capture, normalize};

/// Inspect a capture log without running the full analysis
#[derive(Parser, Debug)]
#[command(name = "capture_inspect")]
#[command(about = "Summarize a traversal session's capture log")]
struct Cli {
    /// Capture log (JSONL)
    #[arg(long)]
    log: PathBuf,

    /// Session config (TOML) for domain patterns and asset filters
    #[arg(long)]
    config: Option<PathBuf>,

    /// How many hosts to list
    #[arg(long, default_value = "10")]
    top: usize,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => SessionConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SessionConfig::default(),
    };
    let classifier = config.classifier().context("compiling domain patterns")?;

    let captures = capture::load_capture_log(&cli.log, &config.asset_extensions)
        .with_context(|| format!("reading capture log {}", cli.log.display()))?;

    println!("capture log: {}", cli.log.display());
    println!("records: {}", captures.len());
    if captures.is_empty() {
        return Ok(());
    }

    let degraded = captures.iter().filter(|c| c.is_degraded()).count();
    if degraded > 0 {
        println!("degraded records: {}", degraded);
    }
    println!(
        "time span: {} .. {}",
        format_millis(captures.first().map(|c| c.timestamp).unwrap_or_default()),
        format_millis(captures.last().map(|c| c.timestamp).unwrap_or_default()),
    );

    let mut hosts: BTreeMap<String, u64> = BTreeMap::new();
    let mut classes: BTreeMap<String, u64> = BTreeMap::new();
    let mut events: BTreeMap<String, u64> = BTreeMap::new();
    for raw in &captures {
        if raw.is_degraded() {
            continue;
        }
        let candidate = normalize::normalize(raw);
        *hosts.entry(candidate.host.clone()).or_default() += 1;
        let class = classifier.classify(&candidate.host);
        *classes.entry(class.to_string()).or_default() += 1;
        if let Some(body) = &raw.body {
            for event in extract_events(body) {
                *events.entry(event.name).or_default() += 1;
            }
        }
    }

    println!();
    println!("traffic classes:");
    for (class, count) in &classes {
        println!("  {:<10} {}", class, count);
    }

    let mut by_count: Vec<(&String, &u64)> = hosts.iter().collect();
    by_count.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    println!();
    println!("top hosts:");
    for (host, count) in by_count.into_iter().take(cli.top) {
        println!("  {:<50} {}", host, count);
    }

    if !events.is_empty() {
        println!();
        println!("embedded events ({} types):", events.len());
        let mut by_count: Vec<(&String, &u64)> = events.iter().collect();
        by_count.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        for (name, count) in by_count {
            println!("  {:<30} {}", name, count);
        }
    }

    Ok(())
}
