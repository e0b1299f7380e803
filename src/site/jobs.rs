//! Background edit jobs.
//!
//! Jobs are dispatched on their own tokio task so the caller never waits on
//! the dispatcher's retry sleeps. Failures are logged and otherwise dropped:
//! nobody is listening for the outcome. Every task is tracked so the server
//! can drain the queue on shutdown and name the jobs it had to abandon.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;

use super::dispatch::JobDispatcher;

/// An edit to dispatch without waiting for the result.
#[derive(Debug, Clone, PartialEq)]
pub struct EditJob {
    pub slug: String,
    pub prompt: String,
    pub model: Option<String>,
}

/// Slugs of the jobs currently running, keyed by submission order.
#[derive(Default)]
struct InFlight {
    next_id: AtomicU64,
    jobs: Mutex<HashMap<u64, String>>,
}

impl InFlight {
    fn jobs(&self) -> std::sync::MutexGuard<'_, HashMap<u64, String>> {
        self.jobs.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Removes a job from [`InFlight`] when its task ends, however it ends.
struct InFlightGuard {
    registry: Arc<InFlight>,
    id: u64,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.registry.jobs().remove(&self.id);
    }
}

#[derive(Clone)]
pub struct BackgroundJobs {
    dispatcher: JobDispatcher,
    tracker: TaskTracker,
    in_flight: Arc<InFlight>,
}

impl BackgroundJobs {
    pub fn new(dispatcher: JobDispatcher) -> Self {
        Self {
            dispatcher,
            tracker: TaskTracker::new(),
            in_flight: Arc::new(InFlight::default()),
        }
    }

    /// Spawn `job` and return immediately. The handle is only useful to
    /// tests; dropping it does not cancel the job.
    pub fn submit(&self, job: EditJob) -> JoinHandle<()> {
        let dispatcher = self.dispatcher.clone();
        let id = self.in_flight.next_id.fetch_add(1, Ordering::Relaxed);
        self.in_flight.jobs().insert(id, job.slug.clone());
        let guard = InFlightGuard {
            registry: Arc::clone(&self.in_flight),
            id,
        };

        tracing::debug!(slug = %job.slug, "Queued background edit");
        self.tracker.spawn(async move {
            let _guard = guard;
            match dispatcher
                .dispatch(&job.slug, &job.prompt, job.model.as_deref())
                .await
            {
                Ok(()) => tracing::info!(slug = %job.slug, "Background edit dispatched"),
                Err(e) => {
                    tracing::error!(slug = %job.slug, error = %e, "Background edit failed")
                }
            }
        })
    }

    /// Slugs of the jobs still running, in submission order.
    pub fn in_flight(&self) -> Vec<String> {
        let jobs = self.in_flight.jobs();
        let mut entries: Vec<(&u64, &String)> = jobs.iter().collect();
        entries.sort_by_key(|(id, _)| **id);
        entries.into_iter().map(|(_, slug)| slug.clone()).collect()
    }

    /// Wait up to `timeout` for running jobs to finish. Returns the slugs of
    /// the jobs abandoned when the wait runs out.
    pub async fn shutdown(&self, timeout: Duration) -> Vec<String> {
        self.tracker.close();
        let pending = self.tracker.len();
        if pending > 0 {
            tracing::info!(pending, "Waiting for background edits");
        }

        if tokio::time::timeout(timeout, self.tracker.wait()).await.is_ok() {
            return Vec::new();
        }

        let abandoned = self.in_flight();
        for slug in &abandoned {
            tracing::warn!(slug = %slug, "Abandoning background edit at shutdown");
        }
        abandoned
    }
}
