//! Client-side edit watcher.
//!
//! Polls a site's workflow status on a fixed interval and turns the raw
//! states into transitions a UI can act on:
//!
//! ```text
//! idle ──working──> working ──done──> done ──(15 s grace)──> idle + refresh
//!                      │
//!                      └──failed──> failed ──next poll──> idle
//! ```
//!
//! The grace period gives the host time to publish the commit the job just
//! pushed before the preview is reloaded. Dropping the [`WatchHandle`] stops
//! polling and cancels any pending refresh.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::errors::ClientError;
use crate::site::models::{RunState, WorkflowStatus};

pub const POLL_INTERVAL: Duration = Duration::from_secs(6);
pub const REFRESH_GRACE: Duration = Duration::from_secs(15);

/// Anything that can report a site's current workflow status.
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn fetch_status(&self, site_id: &str) -> Result<WorkflowStatus, ClientError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchPhase {
    Idle,
    Working,
    Done,
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WatchEvent {
    /// Every successful poll, before any transition it causes
    Polled(WorkflowStatus),
    Started { html_url: Option<String> },
    Completed { html_url: Option<String> },
    Failed {
        conclusion: Option<String>,
        html_url: Option<String>,
    },
    /// Grace period after completion elapsed; reload the preview
    RefreshPreview,
    PollFailed { message: String },
}

/// Pure transition logic, separate from the timer plumbing.
#[derive(Debug)]
pub struct StatusWatcher {
    phase: WatchPhase,
}

impl Default for StatusWatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusWatcher {
    pub fn new() -> Self {
        Self {
            phase: WatchPhase::Idle,
        }
    }

    pub fn phase(&self) -> WatchPhase {
        self.phase
    }

    /// Feed one poll result. Returns the transition event, if any.
    ///
    /// A completed run seen while idle is an old run and is ignored. While
    /// `Done`, polls are ignored until [`StatusWatcher::grace_elapsed`].
    pub fn observe(&mut self, status: &WorkflowStatus) -> Option<WatchEvent> {
        let html_url = status.html_url.clone();
        match (self.phase, status.state) {
            (WatchPhase::Idle | WatchPhase::Failed, RunState::Working) => {
                self.phase = WatchPhase::Working;
                Some(WatchEvent::Started { html_url })
            }
            (WatchPhase::Failed, _) => {
                self.phase = WatchPhase::Idle;
                None
            }
            (WatchPhase::Working, RunState::Done) => {
                self.phase = WatchPhase::Done;
                Some(WatchEvent::Completed { html_url })
            }
            (WatchPhase::Working, RunState::Failed) => {
                self.phase = WatchPhase::Failed;
                Some(WatchEvent::Failed {
                    conclusion: status.conclusion.clone(),
                    html_url,
                })
            }
            _ => None,
        }
    }

    /// The post-completion grace period ran out.
    pub fn grace_elapsed(&mut self) -> Option<WatchEvent> {
        if self.phase == WatchPhase::Done {
            self.phase = WatchPhase::Idle;
            Some(WatchEvent::RefreshPreview)
        } else {
            None
        }
    }
}

/// Aborts the polling task when dropped.
pub struct WatchHandle {
    task: JoinHandle<()>,
}

impl WatchHandle {
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Start polling `site_id`, sending events to `events`. Polling also stops
/// when the receiver is dropped.
pub fn spawn_watch(
    source: Arc<dyn StatusSource>,
    site_id: String,
    events: mpsc::Sender<WatchEvent>,
) -> WatchHandle {
    let task = tokio::spawn(async move {
        let mut watcher = StatusWatcher::new();
        let mut ticker = tokio::time::interval(POLL_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut refresh_at: Option<Instant> = None;

        loop {
            let grace_at = refresh_at;
            let grace = async move {
                match grace_at {
                    Some(at) => tokio::time::sleep_until(at).await,
                    None => std::future::pending().await,
                }
            };

            let mut out = Vec::new();
            tokio::select! {
                _ = ticker.tick() => {
                    match source.fetch_status(&site_id).await {
                        Ok(status) => {
                            let transition = watcher.observe(&status);
                            if matches!(transition, Some(WatchEvent::Completed { .. })) {
                                refresh_at = Some(Instant::now() + REFRESH_GRACE);
                            }
                            out.push(WatchEvent::Polled(status));
                            out.extend(transition);
                        }
                        Err(e) => {
                            tracing::debug!(site_id = %site_id, error = %e, "Status poll failed");
                            out.push(WatchEvent::PollFailed { message: e.to_string() });
                        }
                    }
                }
                _ = grace => {
                    refresh_at = None;
                    out.extend(watcher.grace_elapsed());
                }
            }

            for event in out {
                if events.send(event).await.is_err() {
                    return;
                }
            }
        }
    });

    WatchHandle { task }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    fn status(state: RunState) -> WorkflowStatus {
        let (raw, conclusion) = match state {
            RunState::None => ("none", None),
            RunState::Working => ("in_progress", None),
            RunState::Done => ("completed", Some("success")),
            RunState::Failed => ("completed", Some("failure")),
        };
        WorkflowStatus {
            state,
            status: raw.into(),
            conclusion: conclusion.map(String::from),
            started_at: None,
            html_url: Some("https://github.com/o/r/actions/runs/1".into()),
        }
    }

    /// Serves the scripted states in order, then repeats the last one.
    struct ScriptedSource {
        states: Mutex<VecDeque<RunState>>,
        polls: Mutex<Vec<Instant>>,
    }

    impl ScriptedSource {
        fn new(states: &[RunState]) -> Arc<Self> {
            Arc::new(Self {
                states: Mutex::new(states.iter().copied().collect()),
                polls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl StatusSource for ScriptedSource {
        async fn fetch_status(&self, _site_id: &str) -> Result<WorkflowStatus, ClientError> {
            self.polls.lock().unwrap().push(Instant::now());
            let mut states = self.states.lock().unwrap();
            let state = if states.len() > 1 {
                states.pop_front().unwrap()
            } else {
                *states.front().unwrap()
            };
            Ok(status(state))
        }
    }

    fn transitions(events: Vec<(Duration, WatchEvent)>) -> Vec<(Duration, WatchEvent)> {
        events
            .into_iter()
            .filter(|(_, e)| !matches!(e, WatchEvent::Polled(_)))
            .collect()
    }

    #[test]
    fn test_idle_ignores_old_runs() {
        let mut watcher = StatusWatcher::new();
        assert_eq!(watcher.observe(&status(RunState::Done)), None);
        assert_eq!(watcher.observe(&status(RunState::Failed)), None);
        assert_eq!(watcher.observe(&status(RunState::None)), None);
        assert_eq!(watcher.phase(), WatchPhase::Idle);
    }

    #[test]
    fn test_working_done_idle() {
        let mut watcher = StatusWatcher::new();
        assert!(matches!(
            watcher.observe(&status(RunState::Working)),
            Some(WatchEvent::Started { .. })
        ));
        assert_eq!(watcher.observe(&status(RunState::Working)), None);
        assert!(matches!(
            watcher.observe(&status(RunState::Done)),
            Some(WatchEvent::Completed { .. })
        ));
        assert_eq!(watcher.phase(), WatchPhase::Done);
        // Polls during the grace period change nothing
        assert_eq!(watcher.observe(&status(RunState::Working)), None);
        assert_eq!(watcher.grace_elapsed(), Some(WatchEvent::RefreshPreview));
        assert_eq!(watcher.phase(), WatchPhase::Idle);
        assert_eq!(watcher.grace_elapsed(), None);
    }

    #[test]
    fn test_working_failed_idle() {
        let mut watcher = StatusWatcher::new();
        watcher.observe(&status(RunState::Working));
        match watcher.observe(&status(RunState::Failed)) {
            Some(WatchEvent::Failed { conclusion, .. }) => {
                assert_eq!(conclusion.as_deref(), Some("failure"))
            }
            other => panic!("Expected Failed, got {:?}", other),
        }
        assert_eq!(watcher.phase(), WatchPhase::Failed);
        assert_eq!(watcher.observe(&status(RunState::Failed)), None);
        assert_eq!(watcher.phase(), WatchPhase::Idle);
    }

    #[test]
    fn test_failed_then_new_run_starts_again() {
        let mut watcher = StatusWatcher::new();
        watcher.observe(&status(RunState::Working));
        watcher.observe(&status(RunState::Failed));
        assert!(matches!(
            watcher.observe(&status(RunState::Working)),
            Some(WatchEvent::Started { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_every_six_seconds_and_refreshes_after_grace() {
        let source = ScriptedSource::new(&[
            RunState::None,
            RunState::Working,
            RunState::Working,
            RunState::Done,
        ]);
        let (tx, mut rx) = mpsc::channel(32);
        let start = Instant::now();
        let _handle = spawn_watch(source.clone(), "shop".into(), tx);

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            let done = event == WatchEvent::RefreshPreview;
            events.push((start.elapsed(), event));
            if done {
                break;
            }
        }

        let transitions = transitions(events);
        assert_eq!(transitions.len(), 3);
        assert_eq!(transitions[0].0, Duration::from_secs(6));
        assert!(matches!(transitions[0].1, WatchEvent::Started { .. }));
        assert_eq!(transitions[1].0, Duration::from_secs(18));
        assert!(matches!(transitions[1].1, WatchEvent::Completed { .. }));
        assert_eq!(transitions[2], (Duration::from_secs(33), WatchEvent::RefreshPreview));

        let polls = source.polls.lock().unwrap().clone();
        for pair in polls.windows(2) {
            assert_eq!(pair[1] - pair[0], POLL_INTERVAL);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handle_stops_polling() {
        let source = ScriptedSource::new(&[RunState::Working]);
        let (tx, mut rx) = mpsc::channel(32);
        let handle = spawn_watch(source.clone(), "shop".into(), tx);

        // First poll fires immediately
        assert!(matches!(rx.recv().await, Some(WatchEvent::Polled(_))));
        drop(handle);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(source.polls.lock().unwrap().len(), 1);
        // Channel closes once the aborted task drops its sender
        while rx.recv().await.is_some() {}
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handle_cancels_pending_refresh() {
        let source = ScriptedSource::new(&[RunState::Working, RunState::Done]);
        let (tx, mut rx) = mpsc::channel(32);
        let handle = spawn_watch(source, "shop".into(), tx);

        loop {
            if let Some(WatchEvent::Completed { .. }) = rx.recv().await {
                break;
            }
        }
        drop(handle);

        let mut rest = Vec::new();
        while let Some(event) = rx.recv().await {
            rest.push(event);
        }
        assert!(!rest.contains(&WatchEvent::RefreshPreview));
    }
}
