//! Shared dependency tracker.
//!
//! Every lifecycle task holds a clone of the same [`DependencyTracker`]. In
//! create mode it records stacks that finished creating; in delete mode it
//! counts, per stack, the dependents that still exist. Both views sit behind a
//! single mutex so a decrement-to-zero-then-remove is one atomic step.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

#[derive(Debug, Default)]
struct TrackerState {
    /// Stacks that reached CREATE_COMPLETE
    created: HashSet<String>,
    /// Stack -> dependents not yet deleted; absent means deletable
    outstanding: HashMap<String, usize>,
    /// Stacks whose task failed
    failed: HashSet<String>,
}

/// Coordination state shared by all lifecycle tasks of one run.
#[derive(Debug, Clone, Default)]
pub struct DependencyTracker {
    state: Arc<Mutex<TrackerState>>,
}

impl DependencyTracker {
    /// Tracker for a create run: nothing is created yet.
    pub fn for_create() -> Self {
        Self::default()
    }

    /// Tracker for a delete run, seeded with each stack's dependent count.
    pub fn for_delete(dependent_counts: HashMap<String, usize>) -> Self {
        let outstanding = dependent_counts.into_iter().filter(|(_, count)| *count > 0).collect();
        Self {
            state: Arc::new(Mutex::new(TrackerState { outstanding, ..Default::default() })),
        }
    }

    /// True iff `dep` has been recorded as created.
    pub async fn is_satisfied(&self, dep: &str) -> bool {
        self.state.lock().await.created.contains(dep)
    }

    /// First dependency in `deps` that is not yet created, checked in order.
    pub async fn first_unsatisfied<'a>(&self, deps: &'a [String]) -> Option<&'a str> {
        let state = self.state.lock().await;
        deps.iter().map(String::as_str).find(|dep| !state.created.contains(*dep))
    }

    /// Record `name` as created. Returns false if it was already recorded.
    pub async fn mark_created(&self, name: &str) -> bool {
        let inserted = self.state.lock().await.created.insert(name.to_string());
        if inserted {
            debug!(stack = %name, "Marked stack as created");
        }
        inserted
    }

    /// True iff no dependents of `name` remain outstanding.
    pub async fn is_deletable(&self, name: &str) -> bool {
        !self.state.lock().await.outstanding.contains_key(name)
    }

    /// Dependents of `name` that have not been deleted yet.
    pub async fn outstanding(&self, name: &str) -> usize {
        self.state.lock().await.outstanding.get(name).copied().unwrap_or(0)
    }

    /// One dependent of `dep` is gone. Returns the remaining count.
    ///
    /// The entry is removed when the count reaches zero. Releasing a stack with
    /// no outstanding dependents leaves the tracker unchanged.
    pub async fn release(&self, dep: &str) -> usize {
        let mut state = self.state.lock().await;
        let Some(count) = state.outstanding.get_mut(dep) else {
            warn!(stack = %dep, "Release for stack with no outstanding dependents ignored");
            return 0;
        };

        *count -= 1;
        let remaining = *count;
        if remaining == 0 {
            state.outstanding.remove(dep);
            debug!(stack = %dep, "All dependents deleted, stack unblocked");
        }
        remaining
    }

    /// Record that the task for `name` ended in failure.
    pub async fn mark_failed(&self, name: &str) {
        self.state.lock().await.failed.insert(name.to_string());
    }

    /// First stack in `names` whose task failed.
    pub async fn first_failed<'a>(&self, names: &'a [String]) -> Option<&'a str> {
        let state = self.state.lock().await;
        names.iter().map(String::as_str).find(|name| state.failed.contains(*name))
    }

    /// Number of stacks recorded as created.
    pub async fn created_count(&self) -> usize {
        self.state.lock().await.created.len()
    }
}
