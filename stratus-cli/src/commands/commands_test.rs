//! Tests for CLI command helpers.

use super::format_duration;
use super::plan::{create_rows, delete_rows, CreateRow, DeleteRow};
use std::time::Duration;
use stratus_core::{DependencyGraph, StackDescriptor};

fn graph() -> DependencyGraph {
    DependencyGraph::new(vec![
        StackDescriptor::new("net", "net.yml"),
        StackDescriptor::new("iam", "iam.yml").with_depends_on(["net"]),
        StackDescriptor::new("ec2", "ec2.yml").with_depends_on(["net", "iam"]),
    ])
    .unwrap()
}

#[test]
fn test_format_duration() {
    assert_eq!(format_duration(Duration::from_secs(30)), "30s");
    assert_eq!(format_duration(Duration::from_secs(90)), "1m30s");
    assert_eq!(format_duration(Duration::from_secs(3720)), "1h2m");
}

#[test]
fn test_create_rows_follow_waves() {
    let rows = create_rows(&graph());
    assert_eq!(
        rows,
        vec![
            CreateRow { wave: 1, stack: "net".to_string(), depends_on: "-".to_string() },
            CreateRow { wave: 2, stack: "iam".to_string(), depends_on: "net".to_string() },
            CreateRow { wave: 3, stack: "ec2".to_string(), depends_on: "net, iam".to_string() },
        ]
    );
}

#[test]
fn test_delete_rows_reverse_creation() {
    let rows = delete_rows(&graph());
    assert_eq!(
        rows[0],
        DeleteRow { wave: 1, stack: "ec2".to_string(), dependents: "-".to_string() }
    );
    assert_eq!(rows[2].stack, "net");
    assert_eq!(rows[2].wave, 3);
}
