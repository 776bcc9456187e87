//! Per-stack lifecycle tasks.
//!
//! A lifecycle task drives one stack to a terminal state by polling the
//! provider, gated by the shared [`DependencyTracker`](crate::DependencyTracker).
//! Create and delete are separate state machines with the same shape:
//! wait while blocked, issue the remote call once, poll until settled.

use serde::Serialize;
use std::time::Duration;

pub mod create;
pub mod delete;

pub use create::{CreateState, CreateTask};
pub use delete::{DeleteState, DeleteTask};

/// Sleep intervals used by lifecycle tasks.
///
/// Blocked waits and in-progress waits are configured separately so either
/// branch can be tuned without touching the state machines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Between dependency checks while blocked.
    pub blocked_interval: Duration,
    /// Between polls while a remote operation is in progress.
    pub in_progress_interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            blocked_interval: Duration::from_secs(5),
            in_progress_interval: Duration::from_secs(5),
        }
    }
}

impl PollConfig {
    /// Same interval for both branches.
    pub fn fixed(interval: Duration) -> Self {
        Self { blocked_interval: interval, in_progress_interval: interval }
    }
}

/// Successful end state of a lifecycle task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TerminalState {
    /// Stack reached CREATE_COMPLETE.
    Complete,
    /// Stack no longer exists.
    Gone,
}

impl std::fmt::Display for TerminalState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TerminalState::Complete => write!(f, "complete"),
            TerminalState::Gone => write!(f, "deleted"),
        }
    }
}
