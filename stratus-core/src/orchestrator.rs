//! Stack orchestration.
//!
//! The orchestrator turns a validated [`DependencyGraph`] into one lifecycle
//! task per stack, seeds the shared [`DependencyTracker`] for the run, spawns
//! every task at once and waits for all of them to settle. Ordering comes only
//! from the tracker; there is no central scheduler.

use crate::error::{Result, StratusError};
use crate::graph::DependencyGraph;
use crate::keys::{self, KeyPairOutcome};
use crate::lifecycle::{CreateTask, DeleteTask, PollConfig, TerminalState};
use crate::provider::StackProvider;
use crate::settings::Settings;
use crate::tracker::DependencyTracker;
use crate::types::{Parameter, StackDescriptor};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{error, info, info_span, warn, Instrument, Span};

/// Direction of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Deploy,
    Teardown,
}

/// How one stack's task ended.
#[derive(Debug)]
pub struct StackOutcome {
    pub name: String,
    /// Time from launch until the task settled.
    pub elapsed: Duration,
    pub result: Result<TerminalState>,
}

/// Result of an orchestration run, outcomes in settle order.
#[derive(Debug)]
pub struct RunReport {
    pub mode: RunMode,
    pub outcomes: Vec<StackOutcome>,
    /// Key pairs provisioned before a deploy.
    pub key_pairs: Vec<(String, KeyPairOutcome)>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = &StackOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err())
    }

    pub fn outcome(&self, name: &str) -> Option<&StackOutcome> {
        self.outcomes.iter().find(|o| o.name == name)
    }

    /// Turn the report into the first fatal error, if any stack failed.
    pub fn into_result(mut self) -> Result<Self> {
        if let Some(pos) = self.outcomes.iter().position(|o| o.result.is_err()) {
            if let Err(e) = self.outcomes.remove(pos).result {
                return Err(e);
            }
        }
        Ok(self)
    }
}

type TaskHandle = JoinHandle<(Duration, Result<TerminalState>)>;

/// Orchestrator for dependency-gated stack creation and deletion.
pub struct Orchestrator {
    provider: Arc<dyn StackProvider>,
    poll: PollConfig,
    key_dir: PathBuf,
    /// Parent span of every task; the logging handle of the run.
    span: Span,
}

impl Orchestrator {
    /// Create a new orchestrator.
    ///
    /// # Arguments
    /// * `provider` - Remote stack provider shared by all tasks
    /// * `poll` - Sleep intervals for blocked and in-progress waits
    pub fn new(provider: Arc<dyn StackProvider>, poll: PollConfig) -> Self {
        let span = info_span!("orchestrator", provider = %provider.name());
        Self { provider, poll, key_dir: PathBuf::from("ssh_keys"), span }
    }

    pub fn from_settings(provider: Arc<dyn StackProvider>, settings: &Settings) -> Self {
        Self::new(provider, settings.poll_config()).with_key_dir(&settings.key_dir)
    }

    /// Directory that receives private keys of provisioned key pairs.
    pub fn with_key_dir(mut self, key_dir: impl Into<PathBuf>) -> Self {
        self.key_dir = key_dir.into();
        self
    }

    /// Use `span` as the parent of every task's span.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Create every stack in `graph`, each after its dependencies.
    ///
    /// Templates are read and validated, parameter files parsed and key pairs
    /// provisioned before any task starts; a failure there aborts the run with
    /// a configuration error. Task failures are reported per stack in the
    /// returned report.
    pub async fn deploy(&self, graph: &DependencyGraph) -> Result<RunReport> {
        self.run_deploy(graph).instrument(self.span.clone()).await
    }

    /// Delete every stack in `graph`, each after the stacks that depend on it.
    pub async fn teardown(&self, graph: &DependencyGraph) -> Result<RunReport> {
        self.run_teardown(graph).instrument(self.span.clone()).await
    }

    async fn run_deploy(&self, graph: &DependencyGraph) -> Result<RunReport> {
        info!(stacks = graph.len(), "Deploying stacks");

        let key_pairs =
            keys::provision_key_pairs(self.provider.as_ref(), graph.stacks(), &self.key_dir)
                .await?;

        let mut tasks = Vec::with_capacity(graph.len());
        for stack in graph.stacks() {
            tasks.push(self.prepare_create(stack).await?);
        }

        let tracker = DependencyTracker::for_create();
        let handles: Vec<_> = tasks
            .into_iter()
            .map(|task| {
                let provider = Arc::clone(&self.provider);
                let task_tracker = tracker.clone();
                let poll = self.poll;
                let name = task.name.clone();
                self.spawn_task(name, &tracker, async move {
                    task.run(provider.as_ref(), &task_tracker, poll).await
                })
            })
            .collect();

        let outcomes = Self::join(handles).await;
        Ok(RunReport { mode: RunMode::Deploy, outcomes, key_pairs })
    }

    async fn run_teardown(&self, graph: &DependencyGraph) -> Result<RunReport> {
        info!(stacks = graph.len(), "Deleting stacks");

        let tracker = DependencyTracker::for_delete(graph.dependent_counts());
        let handles: Vec<_> = graph
            .stacks()
            .iter()
            .map(|stack| {
                let task = DeleteTask {
                    name: stack.name.clone(),
                    depends_on: stack.depends_on.clone(),
                    dependents: graph.dependents_of(&stack.name).to_vec(),
                };
                let provider = Arc::clone(&self.provider);
                let task_tracker = tracker.clone();
                let poll = self.poll;
                self.spawn_task(stack.name.clone(), &tracker, async move {
                    task.run(provider.as_ref(), &task_tracker, poll).await
                })
            })
            .collect();

        let outcomes = Self::join(handles).await;
        Ok(RunReport { mode: RunMode::Teardown, outcomes, key_pairs: Vec::new() })
    }

    /// Read, validate and package everything a create task needs.
    async fn prepare_create(&self, stack: &StackDescriptor) -> Result<CreateTask> {
        let template_body = tokio::fs::read_to_string(&stack.template_path).await.map_err(|e| {
            StratusError::FileReadError { path: stack.template_path.clone(), source: e }
        })?;

        self.provider.validate_template(&template_body).await.map_err(|e| {
            let reason = match e {
                StratusError::ProviderCall { reason, .. } => reason,
                other => other.to_string(),
            };
            StratusError::TemplateInvalid {
                stack: stack.name.clone(),
                path: stack.template_path.clone(),
                reason,
            }
        })?;

        let parameters = match &stack.params_path {
            Some(path) => Some(read_parameters(path).await?),
            None => None,
        };

        Ok(CreateTask {
            name: stack.name.clone(),
            template_body,
            parameters,
            capabilities: stack.capabilities.clone(),
            depends_on: stack.depends_on.clone(),
        })
    }

    /// Spawn one lifecycle task under its own span.
    ///
    /// The task body runs in a nested task so a panic surfaces as a
    /// `JoinError`. Failures and panics are both recorded in `tracker`, so
    /// stacks waiting on this one stop waiting.
    fn spawn_task<F>(
        &self,
        name: String,
        tracker: &DependencyTracker,
        task: F,
    ) -> (String, TaskHandle)
    where
        F: Future<Output = Result<TerminalState>> + Send + 'static,
    {
        let span = info_span!(parent: &self.span, "stack", name = %name);
        let tracker = tracker.clone();
        let task_name = name.clone();

        let handle = tokio::spawn(
            async move {
                let started = Instant::now();
                let body = tokio::spawn(task.in_current_span());
                let result = match body.await {
                    Ok(result) => result,
                    Err(e) => Err(StratusError::Internal(format!(
                        "Lifecycle task for stack {} panicked: {}",
                        task_name, e
                    ))),
                };
                if let Err(e) = &result {
                    tracker.mark_failed(&task_name).await;
                    error!(error = %e, "Stack {} failed", task_name);
                }
                (started.elapsed(), result)
            }
            .instrument(span),
        );

        (name, handle)
    }

    /// Wait for every task, then order outcomes by the time each settled.
    async fn join(handles: Vec<(String, TaskHandle)>) -> Vec<StackOutcome> {
        let mut outcomes = Vec::with_capacity(handles.len());

        for (name, handle) in handles {
            let (elapsed, result) = match handle.await {
                Ok(settled) => settled,
                Err(e) => {
                    warn!(stack = %name, error = %e, "Lifecycle task aborted");
                    (
                        Duration::ZERO,
                        Err(StratusError::Internal(format!(
                            "Lifecycle task for stack {} aborted: {}",
                            name, e
                        ))),
                    )
                }
            };
            outcomes.push(StackOutcome { name, elapsed, result });
        }

        outcomes.sort_by_key(|o| o.elapsed);
        outcomes
    }
}

/// Read a CloudFormation-style JSON parameters file.
pub async fn read_parameters(path: &Path) -> Result<Vec<Parameter>> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| StratusError::FileReadError { path: path.to_path_buf(), source: e })?;

    serde_json::from_str(&content).map_err(|e| StratusError::InvalidParameters {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(name: &str, secs: u64, result: Result<TerminalState>) -> StackOutcome {
        StackOutcome { name: name.to_string(), elapsed: Duration::from_secs(secs), result }
    }

    #[test]
    fn test_into_result_returns_first_failure() {
        let report = RunReport {
            mode: RunMode::Deploy,
            outcomes: vec![
                outcome("net", 1, Ok(TerminalState::Complete)),
                outcome(
                    "iam",
                    2,
                    Err(StratusError::UnexpectedStatus {
                        stack: "iam".to_string(),
                        status: "ROLLBACK_COMPLETE".to_string(),
                    }),
                ),
                outcome(
                    "app",
                    3,
                    Err(StratusError::DependencyFailed {
                        stack: "app".to_string(),
                        dependency: "iam".to_string(),
                    }),
                ),
            ],
            key_pairs: vec![],
        };

        assert!(!report.is_success());
        assert_eq!(report.failures().count(), 2);
        let err = report.into_result().unwrap_err();
        assert!(matches!(err, StratusError::UnexpectedStatus { ref stack, .. } if stack == "iam"));
    }

    #[test]
    fn test_into_result_success() {
        let report = RunReport {
            mode: RunMode::Teardown,
            outcomes: vec![outcome("net", 1, Ok(TerminalState::Gone))],
            key_pairs: vec![],
        };
        let report = report.into_result().unwrap();
        assert_eq!(report.outcome("net").unwrap().result.as_ref().unwrap(), &TerminalState::Gone);
    }

    #[tokio::test]
    async fn test_read_parameters() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.json");
        tokio::fs::write(
            &path,
            r#"[{"ParameterKey": "EnvironmentName", "ParameterValue": "udagram"}]"#,
        )
        .await
        .unwrap();

        let params = read_parameters(&path).await.unwrap();
        assert_eq!(params.len(), 1);
        assert_eq!(params[0].parameter_value, "udagram");
    }

    #[tokio::test]
    async fn test_read_parameters_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.json");
        tokio::fs::write(&path, r#"{"EnvironmentName": "udagram"}"#).await.unwrap();

        let err = read_parameters(&path).await.unwrap_err();
        assert!(matches!(err, StratusError::InvalidParameters { .. }));
    }
}
