use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::task::JoinHandle;
use tracing::{error, warn};

use crate::error::{VectorSearchError, VectorSearchResult};
use crate::initializer::{CollectionInitializer, InitializationReport, RunGuard};
use crate::models::CollectionState;
use crate::status::InitializationStatusTracker;

pub const PANIC_MESSAGE: &str = "initialization task panicked";

/// How one supervised run ended
#[derive(Debug)]
pub enum TaskOutcome {
    Completed(InitializationReport),
    Failed(VectorSearchError),
    Panicked,
}

/// Runs collection initializers as background tasks
///
/// A run that panics is recorded as `Failed` in the tracker before the collection is
/// released, so a following rebuild always reports after it.
pub struct InitializationSupervisor {
    tracker: Arc<InitializationStatusTracker>,
    initializers: BTreeMap<String, Arc<CollectionInitializer>>,
}

/// Tasks started by one `spawn_all` or `rebuild` call
pub struct InitializationHandle {
    tasks: Vec<(String, JoinHandle<TaskOutcome>)>,
}

impl InitializationHandle {
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Wait for every task, returning outcomes in collection-name order
    pub async fn join(self) -> Vec<(String, TaskOutcome)> {
        let mut outcomes = Vec::with_capacity(self.tasks.len());
        for (name, task) in self.tasks {
            // Panics are caught inside the task; a join error means it was cancelled
            let outcome = task.await.unwrap_or_else(|join_error| {
                error!(collection = %name, error = %join_error, "Initialization task cancelled");
                TaskOutcome::Panicked
            });
            outcomes.push((name, outcome));
        }
        outcomes
    }
}

impl InitializationSupervisor {
    pub fn new(
        tracker: Arc<InitializationStatusTracker>,
        initializers: Vec<Arc<CollectionInitializer>>,
    ) -> Self {
        let initializers = initializers
            .into_iter()
            .map(|init| (init.name().to_string(), init))
            .collect();
        Self {
            tracker,
            initializers,
        }
    }

    pub fn collections(&self) -> impl Iterator<Item = &str> {
        self.initializers.keys().map(String::as_str)
    }

    /// Whether `name` is a registered collection
    pub fn contains(&self, name: &str) -> bool {
        self.initializers.contains_key(name)
    }

    /// Register every collection with the tracker and start one run per collection
    pub fn spawn_all(&self) -> InitializationHandle {
        for name in self.initializers.keys() {
            self.tracker.get_status(name);
        }

        let mut tasks = Vec::with_capacity(self.initializers.len());
        for (name, initializer) in &self.initializers {
            match initializer.claim() {
                Ok(guard) => tasks.push((name.clone(), self.supervise(initializer, guard))),
                Err(err) => warn!(collection = %name, error = %err, "Skipping initialization"),
            }
        }
        InitializationHandle { tasks }
    }

    /// Start a background rebuild of one collection
    pub fn rebuild(&self, name: &str) -> VectorSearchResult<InitializationHandle> {
        let initializer = self
            .initializers
            .get(name)
            .ok_or_else(|| VectorSearchError::CollectionNotFound(name.to_string()))?;
        let guard = initializer.claim()?;

        Ok(InitializationHandle {
            tasks: vec![(name.to_string(), self.supervise(initializer, guard))],
        })
    }

    fn supervise(
        &self,
        initializer: &Arc<CollectionInitializer>,
        guard: RunGuard,
    ) -> JoinHandle<TaskOutcome> {
        let initializer = Arc::clone(initializer);
        let tracker = Arc::clone(&self.tracker);

        tokio::spawn(async move {
            let result = AssertUnwindSafe(initializer.run(&guard))
                .catch_unwind()
                .await;
            let outcome = match result {
                Ok(Ok(report)) => TaskOutcome::Completed(report),
                Ok(Err(err)) => TaskOutcome::Failed(err),
                Err(_) => {
                    let name = initializer.name();
                    error!(collection = %name, "Initialization task panicked");
                    if let Err(err) = tracker.set_status(
                        name,
                        CollectionState::Failed,
                        Some(PANIC_MESSAGE.to_string()),
                    ) {
                        error!(collection = %name, error = %err, "Failed to record panicked task");
                    }
                    TaskOutcome::Panicked
                }
            };
            drop(guard);
            outcome
        })
    }
}
