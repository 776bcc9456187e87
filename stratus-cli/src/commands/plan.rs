//! `stratus plan`: show the order a run would follow.

use super::load_graph;
use anyhow::Result;
use colored::Colorize;
use std::path::Path;
use stratus_core::DependencyGraph;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled, Debug, PartialEq, Eq)]
pub(crate) struct CreateRow {
    #[tabled(rename = "WAVE")]
    pub wave: usize,
    #[tabled(rename = "STACK")]
    pub stack: String,
    #[tabled(rename = "DEPENDS ON")]
    pub depends_on: String,
}

#[derive(Tabled, Debug, PartialEq, Eq)]
pub(crate) struct DeleteRow {
    #[tabled(rename = "WAVE")]
    pub wave: usize,
    #[tabled(rename = "STACK")]
    pub stack: String,
    #[tabled(rename = "DEPENDENTS")]
    pub dependents: String,
}

/// Print creation and deletion waves for the configuration file.
pub fn plan(config: &Path) -> Result<()> {
    let graph = load_graph(config)?;

    println!("{} Create order", "→".cyan().bold());
    let mut table = Table::new(create_rows(&graph));
    table.with(Style::rounded());
    println!("{}", table);
    println!();

    println!("{} Delete order", "→".cyan().bold());
    let mut table = Table::new(delete_rows(&graph));
    table.with(Style::rounded());
    println!("{}", table);

    Ok(())
}

fn join_or_dash(names: &[String]) -> String {
    if names.is_empty() {
        "-".to_string()
    } else {
        names.join(", ")
    }
}

pub(crate) fn create_rows(graph: &DependencyGraph) -> Vec<CreateRow> {
    graph
        .creation_waves()
        .into_iter()
        .enumerate()
        .flat_map(|(i, wave)| wave.into_iter().map(move |name| (i + 1, name)))
        .map(|(wave, name)| {
            let depends_on =
                graph.get(&name).map(|s| join_or_dash(&s.depends_on)).unwrap_or_default();
            CreateRow { wave, stack: name, depends_on }
        })
        .collect()
}

pub(crate) fn delete_rows(graph: &DependencyGraph) -> Vec<DeleteRow> {
    graph
        .deletion_waves()
        .into_iter()
        .enumerate()
        .flat_map(|(i, wave)| wave.into_iter().map(move |name| (i + 1, name)))
        .map(|(wave, name)| {
            let dependents = join_or_dash(graph.dependents_of(&name));
            DeleteRow { wave, stack: name, dependents }
        })
        .collect()
}
