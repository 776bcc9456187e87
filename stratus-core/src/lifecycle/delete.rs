//! Delete flow.

use super::{PollConfig, TerminalState};
use crate::error::{Result, StratusError};
use crate::observability::metrics;
use crate::provider::StackProvider;
use crate::tracker::DependencyTracker;
use crate::types::StackStatus;
use std::time::Instant;
use tracing::{debug, error, info};

/// States of the delete flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteState {
    /// Waiting for dependents to be deleted.
    Blocked,
    /// Deletable, delete not yet issued.
    Present,
    /// Delete issued (or found already running), polling until gone.
    InProgress,
    /// Stack no longer exists.
    Gone,
}

/// Inputs for deleting one stack.
#[derive(Debug, Clone)]
pub struct DeleteTask {
    pub name: String,
    /// Stacks this one depends on; each is released once this one is gone.
    pub depends_on: Vec<String>,
    /// Stacks that depend on this one and must be deleted first.
    pub dependents: Vec<String>,
}

impl DeleteTask {
    pub fn initial_state(&self) -> DeleteState {
        if self.dependents.is_empty() {
            DeleteState::Present
        } else {
            DeleteState::Blocked
        }
    }

    /// Drive the stack until it no longer exists, then release its dependencies.
    pub async fn run(
        &self,
        provider: &dyn StackProvider,
        tracker: &DependencyTracker,
        poll: PollConfig,
    ) -> Result<TerminalState> {
        let started = Instant::now();
        let mut state = self.initial_state();

        loop {
            state = match state {
                DeleteState::Blocked => self.check_dependents(tracker, poll).await?,
                DeleteState::Present | DeleteState::InProgress => {
                    self.poll_remote(state, provider, poll).await?
                }
                DeleteState::Gone => {
                    for dep in &self.depends_on {
                        let remaining = tracker.release(dep).await;
                        debug!(dependency = %dep, remaining, "Released dependency");
                    }
                    metrics::record_stack_settled("delete", started.elapsed());
                    info!(stack = %self.name, "Finished deleting {}", self.name);
                    return Ok(TerminalState::Gone);
                }
            };
        }
    }

    async fn check_dependents(
        &self,
        tracker: &DependencyTracker,
        poll: PollConfig,
    ) -> Result<DeleteState> {
        if let Some(failed) = tracker.first_failed(&self.dependents).await {
            return Err(StratusError::DependencyFailed {
                stack: self.name.clone(),
                dependency: failed.to_string(),
            });
        }

        if tracker.is_deletable(&self.name).await {
            debug!(stack = %self.name, "All dependents deleted");
            return Ok(DeleteState::Present);
        }

        let outstanding = tracker.outstanding(&self.name).await;
        debug!("Stack {} waits for {} dependent(s) to be deleted", self.name, outstanding);
        tokio::time::sleep(poll.blocked_interval).await;
        Ok(DeleteState::Blocked)
    }

    async fn poll_remote(
        &self,
        state: DeleteState,
        provider: &dyn StackProvider,
        poll: PollConfig,
    ) -> Result<DeleteState> {
        let status = provider
            .describe(&self.name)
            .await?
            .filter(|info| !info.is_gone())
            .map(|info| info.status);

        match (state, status) {
            (_, None) => Ok(DeleteState::Gone),
            (_, Some(StackStatus::DeleteInProgress)) => {
                tokio::time::sleep(poll.in_progress_interval).await;
                Ok(DeleteState::InProgress)
            }
            (DeleteState::InProgress, Some(StackStatus::DeleteFailed)) => {
                error!(stack = %self.name, "Stack deletion failed");
                metrics::record_stack_failure("delete", StackStatus::DeleteFailed.as_str());
                Err(StratusError::UnexpectedStatus {
                    stack: self.name.clone(),
                    status: StackStatus::DeleteFailed.to_string(),
                })
            }
            (DeleteState::InProgress, Some(status)) => {
                debug!("Delete of {} accepted, stack still reports {}", self.name, status);
                tokio::time::sleep(poll.in_progress_interval).await;
                Ok(DeleteState::InProgress)
            }
            (_, Some(status)) => {
                info!(stack = %self.name, status = %status, "Deleting {}", self.name);
                provider.delete(&self.name).await?;
                metrics::record_stack_request("delete");
                Ok(DeleteState::InProgress)
            }
        }
    }
}
