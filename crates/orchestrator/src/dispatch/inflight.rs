//! Registry of executions currently being dispatched, keyed by cache key.
//!
//! Concurrent identical requests attach to the same dispatch instead of each
//! reaching a runner. Every dispatch runs as its own task, so callers that go
//! away do not cancel it for the others.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use coderun_core::ExecutionOutcome;
use futures::future::{BoxFuture, FutureExt, Shared};

/// Errors a dispatch can end with. Cloned to every attached caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    #[error("Runner unavailable: {message}")]
    RunnerUnavailable { message: String, elapsed_ms: u64 },

    #[error("Dispatch task failed: {0}")]
    TaskFailed(String),
}

pub type DispatchResult = Result<ExecutionOutcome, DispatchError>;

/// Handle any number of callers can await for the same dispatch.
pub type PendingDispatch = Shared<BoxFuture<'static, DispatchResult>>;

#[derive(Clone, Default)]
pub struct InflightRegistry {
    entries: Arc<Mutex<HashMap<String, PendingDispatch>>>,
}

impl InflightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The dispatch currently running for `key`, if any.
    pub fn get(&self, key: &str) -> Option<PendingDispatch> {
        self.lock().get(key).cloned()
    }

    /// Attach to the dispatch for `key`, or start one with `start`.
    ///
    /// `start` receives the guard that removes the entry; the returned future
    /// must hold it until it has finished all its work. Returns the handle and
    /// whether an existing dispatch was joined.
    pub fn join_or_start<F>(&self, key: &str, start: F) -> (PendingDispatch, bool)
    where
        F: FnOnce(InflightGuard) -> BoxFuture<'static, DispatchResult>,
    {
        let mut entries = self.lock();
        if let Some(pending) = entries.get(key) {
            return (pending.clone(), true);
        }

        let guard = InflightGuard {
            registry: self.clone(),
            key: key.to_string(),
        };
        let task = tokio::spawn(start(guard));
        let pending = async move {
            match task.await {
                Ok(result) => result,
                Err(e) => Err(DispatchError::TaskFailed(e.to_string())),
            }
        }
        .boxed()
        .shared();

        entries.insert(key.to_string(), pending.clone());
        (pending, false)
    }

    /// Number of dispatches currently running.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, PendingDispatch>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Removes its registry entry when dropped, including on panic.
pub struct InflightGuard {
    registry: InflightRegistry,
    key: String,
}

impl Drop for InflightGuard {
    fn drop(&mut self) {
        self.registry.lock().remove(&self.key);
    }
}
