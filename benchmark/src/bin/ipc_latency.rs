// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! CLI tool to run the IPC latency sweep and print the median tables.

use std::io;
use std::path::PathBuf;

use chrono::Utc;
use clap::Parser;
use ipclat_benchmark::{SweepHarness, SweepReport, TextReporter};
use ipclat_core::{ConfigLoader, Invoker};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ipc_latency")]
#[command(author, version)]
#[command(about = "Measure median POSIX pipe and Mach port round-trip latency across message sizes")]
struct Args {
    /// YAML file overriding the reference sweep
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory containing the measurement executables
    /// (defaults to the directory of this binary)
    #[arg(short, long)]
    binary_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Logs go to stderr; stdout carries only progress and the report
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)),
        )
        .with_writer(io::stderr)
        .init();

    let mut config = match &args.config {
        Some(path) => ConfigLoader::load_file(path)?,
        None => ConfigLoader::reference()?,
    };
    if let Some(dir) = args.binary_dir {
        config = config.with_binary_dir(dir);
    }
    let binary_dir = config.resolve_binary_dir()?;

    tracing::info!(
        binary_dir = %binary_dir.display(),
        trials = config.trials.get(),
        message_sizes = config.message_sizes.len(),
        max_attempts = config.retry_policy.max_attempts(),
        "Starting IPC latency sweep"
    );

    let mut invoker = Invoker::system(binary_dir, config.retry_policy);
    let mut harness = SweepHarness::from_config(&config);
    let mut reporter = TextReporter::new(io::stdout().lock());

    let started_at = Utc::now();
    let table = harness.run(&mut invoker, |c| reporter.progress(c))?;
    let report = SweepReport::new(
        table,
        config.trials,
        invoker.attempts_made(),
        started_at,
        Utc::now(),
    );

    reporter.render(&report)?;
    harness.complete()?;

    tracing::info!(
        configurations = report.table.len(),
        attempts = report.attempts,
        duration_ms = report.duration_ms(),
        "Sweep complete"
    );

    Ok(())
}
