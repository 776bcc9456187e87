//! Create flow.

use super::{PollConfig, TerminalState};
use crate::error::{Result, StratusError};
use crate::observability::metrics;
use crate::provider::StackProvider;
use crate::tracker::DependencyTracker;
use crate::types::{CreateStackRequest, Parameter, StackStatus};
use std::time::Instant;
use tracing::{debug, error, info};

/// States of the create flow. `Fatal` is the `Err` return of [`CreateTask::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateState {
    /// Waiting for dependencies to be created.
    Blocked,
    /// Dependencies satisfied, create not yet issued.
    Absent,
    /// Create issued (or found already running), polling for completion.
    InProgress,
    /// CREATE_COMPLETE observed.
    Complete,
}

/// Inputs for creating one stack.
///
/// The template has already been read from disk and validated by the provider.
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub name: String,
    pub template_body: String,
    pub parameters: Option<Vec<Parameter>>,
    pub capabilities: Vec<String>,
    pub depends_on: Vec<String>,
}

impl CreateTask {
    /// A stack without dependencies never consults the tracker before creating.
    pub fn initial_state(&self) -> CreateState {
        if self.depends_on.is_empty() {
            CreateState::Absent
        } else {
            CreateState::Blocked
        }
    }

    /// Drive the stack to CREATE_COMPLETE.
    ///
    /// On success the stack is recorded as created in `tracker`. Any status
    /// outside the create path ends the task with
    /// [`StratusError::UnexpectedStatus`]; it is not retried.
    pub async fn run(
        &self,
        provider: &dyn StackProvider,
        tracker: &DependencyTracker,
        poll: PollConfig,
    ) -> Result<TerminalState> {
        let started = Instant::now();
        let mut state = self.initial_state();
        let mut create_issued = false;

        loop {
            state = match state {
                CreateState::Blocked => self.check_dependencies(tracker, poll).await?,
                CreateState::Absent | CreateState::InProgress => {
                    self.poll_remote(&mut create_issued, provider, poll).await?
                }
                CreateState::Complete => {
                    tracker.mark_created(&self.name).await;
                    metrics::record_stack_settled("create", started.elapsed());
                    info!(stack = %self.name, "Stack {} created", self.name);
                    return Ok(TerminalState::Complete);
                }
            };
        }
    }

    async fn check_dependencies(
        &self,
        tracker: &DependencyTracker,
        poll: PollConfig,
    ) -> Result<CreateState> {
        if let Some(failed) = tracker.first_failed(&self.depends_on).await {
            return Err(StratusError::DependencyFailed {
                stack: self.name.clone(),
                dependency: failed.to_string(),
            });
        }

        match tracker.first_unsatisfied(&self.depends_on).await {
            Some(dep) => {
                debug!(
                    "Stack {} cannot be created since stack {} does not exist",
                    self.name, dep
                );
                tokio::time::sleep(poll.blocked_interval).await;
                Ok(CreateState::Blocked)
            }
            None => {
                debug!(stack = %self.name, "All dependencies created");
                Ok(CreateState::Absent)
            }
        }
    }

    /// One poll of the remote stack.
    ///
    /// Absence means "create it" until our own create has been issued, and
    /// "not visible yet" afterwards. A stack seen in CREATE_IN_PROGRESS that
    /// another party started does not count as issued.
    async fn poll_remote(
        &self,
        create_issued: &mut bool,
        provider: &dyn StackProvider,
        poll: PollConfig,
    ) -> Result<CreateState> {
        let status = provider
            .describe(&self.name)
            .await?
            .filter(|info| !info.is_gone())
            .map(|info| info.status);

        match (*create_issued, status) {
            (false, None) => {
                info!(stack = %self.name, "Creating stack {}", self.name);
                provider.create(&self.request()).await?;
                *create_issued = true;
                metrics::record_stack_request("create");
                debug!("Waiting for provider to finalize creation of {}", self.name);
                Ok(CreateState::InProgress)
            }
            (_, None) => {
                // Create accepted but the stack is not visible yet.
                tokio::time::sleep(poll.in_progress_interval).await;
                Ok(CreateState::InProgress)
            }
            (false, Some(StackStatus::DeleteInProgress)) => {
                debug!("Previous incarnation of {} is still being deleted", self.name);
                tokio::time::sleep(poll.in_progress_interval).await;
                Ok(CreateState::Absent)
            }
            (_, Some(StackStatus::CreateInProgress)) => {
                tokio::time::sleep(poll.in_progress_interval).await;
                Ok(CreateState::InProgress)
            }
            (_, Some(StackStatus::CreateComplete)) => Ok(CreateState::Complete),
            (_, Some(other)) => {
                error!(stack = %self.name, status = %other, "Unexpected stack status");
                metrics::record_stack_failure("create", other.as_str());
                Err(StratusError::UnexpectedStatus {
                    stack: self.name.clone(),
                    status: other.to_string(),
                })
            }
        }
    }

    fn request(&self) -> CreateStackRequest {
        CreateStackRequest {
            name: self.name.clone(),
            template_body: self.template_body.clone(),
            parameters: self.parameters.clone(),
            capabilities: self.capabilities.clone(),
        }
    }
}
