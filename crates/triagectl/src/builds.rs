//! Build/clean action bookkeeping.
//!
//! Actions are unbounded: every requested build runs at once and nothing
//! queues or cancels them. The in-flight counter is the only shared state.
//! It is raised by `begin()` before the action starts and lowered exactly
//! once when the returned guard drops, whatever way the action ends. A hung
//! action keeps its guard and so keeps the counter raised.

use std::sync::Arc;
use tokio::sync::{watch, RwLock};
use tracing::{info, warn};
use triage_shared::build::is_no_output;
use triage_shared::{BuildCommand, TriageResult};
use uuid::Uuid;

use crate::executor::BuildExecutor;

/// Holds one unit of the in-flight counter
pub struct InFlightGuard {
    counter: Arc<watch::Sender<usize>>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.counter.send_modify(|n| *n = n.saturating_sub(1));
    }
}

/// What the caller should do once an action has been recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Successful clean: the listing must be searched again
    Refresh,
    Done,
}

pub struct BuildOrchestrator {
    executor: Arc<dyn BuildExecutor>,
    counter: Arc<watch::Sender<usize>>,
    output: RwLock<String>,
}

impl BuildOrchestrator {
    pub fn new(executor: Arc<dyn BuildExecutor>) -> Self {
        let (counter, _) = watch::channel(0);
        Self {
            executor,
            counter: Arc::new(counter),
            output: RwLock::new(String::new()),
        }
    }

    /// Count one more action in flight
    pub fn begin(&self) -> InFlightGuard {
        self.counter.send_modify(|n| *n += 1);
        InFlightGuard {
            counter: self.counter.clone(),
        }
    }

    pub fn in_flight(&self) -> usize {
        *self.counter.borrow()
    }

    /// Observe every change of the in-flight counter
    pub fn subscribe(&self) -> watch::Receiver<usize> {
        self.counter.subscribe()
    }

    /// Resolve once no action is in flight
    pub async fn wait_idle(&self) {
        let mut rx = self.counter.subscribe();
        loop {
            let busy = *rx.borrow_and_update() != 0;
            if !busy || rx.changed().await.is_err() {
                break;
            }
        }
    }

    pub async fn run(&self, action_id: Uuid, command: &BuildCommand) -> TriageResult<String> {
        info!(%action_id, command = %command, "build action started");
        let result = self.executor.exec(command).await;
        match &result {
            Ok(_) => info!(%action_id, "build action finished"),
            Err(e) => warn!(%action_id, error = %e, "build action failed"),
        }
        result
    }

    /// Record an action's result in the displayed output
    pub async fn finish(&self, command: &BuildCommand, result: TriageResult<String>) -> Completion {
        match result {
            Ok(_) if command.clean => {
                self.output.write().await.clear();
                Completion::Refresh
            }
            Ok(payload) => {
                if !is_no_output(&payload) {
                    *self.output.write().await = payload;
                }
                Completion::Done
            }
            Err(e) => {
                *self.output.write().await = format!("build failed: {}", e);
                Completion::Done
            }
        }
    }

    pub async fn output_text(&self) -> String {
        self.output.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::FakeBuildExecutor;
    use triage_shared::{BuildLevel, ColumnKey, ResultRow, TriageError};

    fn orchestrator() -> BuildOrchestrator {
        BuildOrchestrator::new(Arc::new(FakeBuildExecutor::new()))
    }

    fn command(clean: bool) -> BuildCommand {
        let row = ResultRow::from_pairs([(ColumnKey::Target, "omdoc")]);
        BuildCommand::for_row(&row, clean, &BuildLevel::default())
    }

    #[test]
    fn test_guard_releases_once() {
        let builds = orchestrator();
        let a = builds.begin();
        let b = builds.begin();
        assert_eq!(builds.in_flight(), 2);
        drop(a);
        assert_eq!(builds.in_flight(), 1);
        drop(b);
        assert_eq!(builds.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_sentinel_keeps_previous_output() {
        let builds = orchestrator();
        builds.finish(&command(false), Ok("<div>first</div>".into())).await;
        builds.finish(&command(false), Ok("<div></div>".into())).await;
        assert_eq!(builds.output_text().await, "<div>first</div>");
    }

    #[tokio::test]
    async fn test_clean_clears_output_and_requests_refresh() {
        let builds = orchestrator();
        builds.finish(&command(false), Ok("<div>log</div>".into())).await;
        let completion = builds.finish(&command(true), Ok("<div>x</div>".into())).await;
        assert_eq!(completion, Completion::Refresh);
        assert_eq!(builds.output_text().await, "");
    }

    #[tokio::test]
    async fn test_failure_surfaces_text() {
        let builds = orchestrator();
        let completion = builds
            .finish(&command(true), Err(TriageError::Action("exit 1".into())))
            .await;
        assert_eq!(completion, Completion::Done);
        assert_eq!(
            builds.output_text().await,
            "build failed: Build action failed: exit 1"
        );
    }

    #[tokio::test]
    async fn test_wait_idle_returns_when_released() {
        let builds = Arc::new(orchestrator());
        let guard = builds.begin();
        let waiter = {
            let builds = builds.clone();
            tokio::spawn(async move { builds.wait_idle().await })
        };
        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());
        drop(guard);
        waiter.await.unwrap();
        assert_eq!(builds.in_flight(), 0);
    }
}
