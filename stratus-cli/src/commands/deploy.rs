//! `stratus deploy`

use super::{finish, load_graph, orchestrator, print_report};
use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;
use stratus_core::keys::KeyPairOutcome;
use stratus_core::Settings;

/// Create every stack in the configuration file.
pub async fn deploy(config: &Path, settings: &Settings) -> Result<()> {
    let graph = load_graph(config)?;

    let names: Vec<&str> = graph.stacks().iter().map(|s| s.name.as_str()).collect();
    println!(
        "{} Deploying {} stack(s): {}",
        "→".cyan().bold(),
        graph.len(),
        names.join(", ").dimmed()
    );
    println!();

    for stack in graph.stacks() {
        let after = if stack.depends_on.is_empty() {
            String::new()
        } else {
            format!("(after {})", stack.depends_on.join(", "))
        };
        println!(
            "  {} {} {} {}",
            "•".dimmed(),
            stack.name.bold(),
            stack.template_path.display().to_string().dimmed(),
            after.dimmed()
        );
    }
    println!();

    let report = orchestrator(settings)
        .deploy(&graph)
        .await
        .context("Failed to prepare deployment")?;

    for (key, outcome) in &report.key_pairs {
        match outcome {
            KeyPairOutcome::Created(path) => println!(
                "  {} Key pair {} written to {}",
                "✓".green().bold(),
                key.bold(),
                path.display()
            ),
            KeyPairOutcome::Existing => {
                println!("  {} Key pair {} exists", "•".dimmed(), key.bold())
            }
        }
    }
    if !report.key_pairs.is_empty() {
        println!();
    }

    print_report(&report);
    finish(report, "deployed")
}
