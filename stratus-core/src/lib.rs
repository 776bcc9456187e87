//! Stratus Core Library
//!
//! Dependency-gated lifecycle orchestration for remote infrastructure stacks.
//! Stacks are created only after the stacks they depend on exist, and deleted
//! only after the stacks that depend on them are gone. One task per stack
//! polls the provider; tasks coordinate through a shared dependency tracker.

pub mod config;
pub mod error;
pub mod graph;
pub mod keys;
pub mod lifecycle;
pub mod observability;
pub mod orchestrator;
pub mod provider;
pub mod settings;
pub mod tracker;
pub mod types;

// Re-export commonly used items
pub use config::StackConfigParser;
pub use error::{Result, StratusError};
pub use graph::DependencyGraph;
pub use lifecycle::{PollConfig, TerminalState};
pub use observability::init as init_observability;
pub use orchestrator::{Orchestrator, RunMode, RunReport, StackOutcome};
pub use provider::{AwsCliProvider, StackProvider};
pub use settings::Settings;
pub use tracker::DependencyTracker;
pub use types::{StackDescriptor, StackInfo, StackStatus};
