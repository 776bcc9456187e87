//! `stratus remove`

use super::{finish, load_graph, orchestrator, print_report};
use anyhow::{Context, Result};
use colored::Colorize;
use std::io::{self, Write};
use std::path::Path;
use stratus_core::Settings;

/// Delete every stack in the configuration file.
pub async fn remove(config: &Path, settings: &Settings, force: bool) -> Result<()> {
    let graph = load_graph(config)?;

    // Confirm before deleting (unless force)
    if !force {
        print!(
            "{} Are you sure you want to delete {} stack(s) from '{}'? [y/N]: ",
            "⚠".yellow().bold(),
            graph.len(),
            config.display().to_string().bold()
        );
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;

        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Aborted.");
            return Ok(());
        }
    }

    println!("{} Deleting {} stack(s)", "→".cyan().bold(), graph.len());
    println!();

    let report = orchestrator(settings)
        .teardown(&graph)
        .await
        .context("Failed to prepare removal")?;

    print_report(&report);
    finish(report, "deleted")
}
