//! Stack dependency graph.
//!
//! Built once from the parsed config and read-only afterwards. Construction
//! rejects duplicate names, references to unknown stacks and cycles, so a run
//! never starts on a graph whose tasks could wait on each other forever.

use crate::error::{Result, StratusError};
use crate::types::StackDescriptor;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Validated dependency graph over stack descriptors.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    /// Descriptors in config order
    stacks: Vec<StackDescriptor>,
    /// Stack name -> position in `stacks`
    index: HashMap<String, usize>,
    /// Stack name -> stacks that declare it in `depends_on`
    dependents: HashMap<String, Vec<String>>,
}

impl DependencyGraph {
    /// Build and validate a graph.
    pub fn new(stacks: Vec<StackDescriptor>) -> Result<Self> {
        let mut stacks = stacks;
        let mut index = HashMap::new();

        for (pos, stack) in stacks.iter().enumerate() {
            if index.insert(stack.name.clone(), pos).is_some() {
                return Err(StratusError::DuplicateStack { name: stack.name.clone() });
            }
        }

        let mut dependents: HashMap<String, Vec<String>> =
            stacks.iter().map(|s| (s.name.clone(), Vec::new())).collect();

        for stack in stacks.iter_mut() {
            // A dependency listed twice would be released twice during deletion.
            let mut seen = HashSet::new();
            let before = stack.depends_on.len();
            stack.depends_on.retain(|dep| seen.insert(dep.clone()));
            if stack.depends_on.len() != before {
                warn!(stack = %stack.name, "Ignoring repeated entries in depends_on");
            }

            for dep in &stack.depends_on {
                if dep == &stack.name {
                    return Err(StratusError::CircularDependency { stack: stack.name.clone() });
                }
                match dependents.get_mut(dep) {
                    Some(list) => list.push(stack.name.clone()),
                    None => {
                        return Err(StratusError::MissingDependency {
                            stack: stack.name.clone(),
                            dependency: dep.clone(),
                        })
                    }
                }
            }
        }

        let graph = Self { stacks, index, dependents };
        let waves = graph.creation_waves_checked()?;
        debug!(stacks = graph.stacks.len(), waves = waves.len(), "Dependency graph validated");
        Ok(graph)
    }

    /// Descriptors in config order.
    pub fn stacks(&self) -> &[StackDescriptor] {
        &self.stacks
    }

    pub fn get(&self, name: &str) -> Option<&StackDescriptor> {
        self.index.get(name).map(|&pos| &self.stacks[pos])
    }

    pub fn len(&self) -> usize {
        self.stacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stacks.is_empty()
    }

    /// Stacks that declare `name` in their `depends_on`.
    pub fn dependents_of(&self, name: &str) -> &[String] {
        self.dependents.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of dependents per stack, for stacks that have any.
    ///
    /// Seeds the delete-mode tracker: a stack is deletable once its entry is gone.
    pub fn dependent_counts(&self) -> HashMap<String, usize> {
        self.dependents
            .iter()
            .filter(|(_, deps)| !deps.is_empty())
            .map(|(name, deps)| (name.clone(), deps.len()))
            .collect()
    }

    /// Groups of stacks that can be created concurrently, in creation order.
    pub fn creation_waves(&self) -> Vec<Vec<String>> {
        // Cycles are rejected in `new`.
        self.creation_waves_checked().unwrap_or_default()
    }

    /// Groups of stacks that can be deleted concurrently, in deletion order.
    pub fn deletion_waves(&self) -> Vec<Vec<String>> {
        let mut waves = self.creation_waves();
        waves.reverse();
        waves
    }

    /// Kahn's algorithm, layer by layer, keeping config order within a layer.
    fn creation_waves_checked(&self) -> Result<Vec<Vec<String>>> {
        let mut in_degree: HashMap<&str, usize> =
            self.stacks.iter().map(|s| (s.name.as_str(), s.depends_on.len())).collect();

        let mut waves = Vec::new();
        let mut placed = 0;

        while placed < self.stacks.len() {
            let wave: Vec<String> = self
                .stacks
                .iter()
                .filter(|s| in_degree.get(s.name.as_str()) == Some(&0))
                .map(|s| s.name.clone())
                .collect();

            if wave.is_empty() {
                let stuck = self
                    .stacks
                    .iter()
                    .find(|s| in_degree.contains_key(s.name.as_str()))
                    .map(|s| s.name.clone())
                    .unwrap_or_default();
                return Err(StratusError::CircularDependency { stack: stuck });
            }

            for name in &wave {
                in_degree.remove(name.as_str());
                for dependent in self.dependents_of(name) {
                    if let Some(count) = in_degree.get_mut(dependent.as_str()) {
                        *count -= 1;
                    }
                }
            }

            placed += wave.len();
            waves.push(wave);
        }

        Ok(waves)
    }
}
