//! pluginmaster - build the plugin index from per-plugin manifests.
//!
//! Run from the repository root holding `plugins/` and `pluginmaster.json`.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::warn;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use pluginmaster::{BuildReport, Config, GitHubReleases, IndexBuilder};

/// Build the consolidated plugin index
#[derive(Parser)]
#[command(name = "pluginmaster")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Config file (defaults to ./pluginmaster.toml, then the user config directory)
    #[arg(short, long, env = "PLUGINMASTER_CONFIG")]
    config: Option<PathBuf>,

    /// Build the index and print it instead of overwriting the index file
    #[arg(long)]
    dry_run: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(io::stderr))
        .with(filter)
        .init();

    let config = Config::resolve(cli.config.as_deref())?;
    let builder = IndexBuilder::from_config(&config).context("Failed to set up release lookups")?;

    if cli.dry_run {
        cmd_dry_run(&builder)
    } else {
        cmd_run(&builder)
    }
}

/// Build and write the index.
fn cmd_run(builder: &IndexBuilder<GitHubReleases>) -> Result<()> {
    let report = builder
        .run()
        .with_context(|| format!("Failed to update {}", builder.index_path().display()))?;

    report_failures(&report);
    Ok(())
}

/// Build the index and print it to stdout.
fn cmd_dry_run(builder: &IndexBuilder<GitHubReleases>) -> Result<()> {
    let report =
        builder.build(chrono::Utc::now().timestamp()).context("Failed to build the index")?;

    let rendered = report.index.to_pretty_json()?;
    let mut stdout = io::stdout().lock();
    stdout.write_all(&rendered)?;
    writeln!(stdout)?;

    report_failures(&report);
    Ok(())
}

fn report_failures(report: &BuildReport) {
    if !report.failed_lookups.is_empty() {
        warn!(
            "Download count lookup failed for {} plugin(s), recorded as 0: {}",
            report.failed_lookups.len(),
            report.failed_lookups.join(", ")
        );
    }
}
