//! CLI command implementations

pub mod deploy;
pub mod plan;
pub mod remove;

#[cfg(test)]
mod commands_test;

pub use deploy::deploy;
pub use plan::plan;
pub use remove::remove;

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use stratus_core::{
    AwsCliProvider, DependencyGraph, Orchestrator, RunReport, Settings, StackConfigParser,
    StackProvider,
};

/// Parse the stack configuration and build its dependency graph.
pub fn load_graph(config: &Path) -> Result<DependencyGraph> {
    let stacks = StackConfigParser::parse_file(config)
        .with_context(|| format!("Failed to parse {}", config.display()))?;
    DependencyGraph::new(stacks).context("Invalid stack dependencies")
}

/// Orchestrator backed by the `aws` CLI.
pub fn orchestrator(settings: &Settings) -> Orchestrator {
    let provider: Arc<dyn StackProvider> = Arc::new(AwsCliProvider::from_settings(settings));
    Orchestrator::from_settings(provider, settings)
}

/// One status line per stack, in settle order.
pub fn print_report(report: &RunReport) {
    for outcome in &report.outcomes {
        let elapsed = format_duration(outcome.elapsed);
        match &outcome.result {
            Ok(state) => println!(
                "  {} {} {} {}",
                "✓".green().bold(),
                outcome.name.bold(),
                state.to_string().green(),
                elapsed.dimmed()
            ),
            Err(e) => println!(
                "  {} {} {} {}",
                "✗".red().bold(),
                outcome.name.bold(),
                e.to_string().red(),
                elapsed.dimmed()
            ),
        }
    }
    println!();
}

/// Print the summary line and turn a failed run into an error.
pub fn finish(report: RunReport, verb: &str) -> Result<()> {
    let total = report.outcomes.len();
    let failed = report.failures().count();

    if failed == 0 {
        println!("{} {} stack(s) {}", "✓".green().bold(), total, verb);
    } else {
        println!("{} {} of {} stack(s) failed", "✗".red().bold(), failed, total);
    }

    report.into_result().context("Run did not complete")?;
    Ok(())
}

/// Format duration as human-readable string
pub(crate) fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();

    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m{}s", secs / 60, secs % 60)
    } else {
        format!("{}h{}m", secs / 3600, (secs % 3600) / 60)
    }
}
