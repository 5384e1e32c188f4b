//! Build action executor.
//!
//! The executor is opaque to the dashboard: it takes a `BuildCommand` and
//! eventually answers with an HTML fragment (or the no-output sentinel).

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;
use tracing::debug;
use triage_shared::endpoints;
use triage_shared::{BuildCommand, TriageError, TriageResult, NO_OUTPUT_SENTINEL};

#[async_trait]
pub trait BuildExecutor: Send + Sync {
    async fn exec(&self, command: &BuildCommand) -> TriageResult<String>;
}

/// Sends the command to the server's action endpoint
pub struct HttpBuildExecutor {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBuildExecutor {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl BuildExecutor for HttpBuildExecutor {
    async fn exec(&self, command: &BuildCommand) -> TriageResult<String> {
        let url = endpoints::join(&self.base_url, &endpoints::action(command));
        debug!(%url, "action");

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| TriageError::Action(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| TriageError::Action(e.to_string()))?;

        if !status.is_success() {
            return Err(TriageError::Action(format!("{}: {}", status, body)));
        }

        Ok(body)
    }
}

type Reply = Box<dyn Fn(&BuildCommand) -> TriageResult<String> + Send + Sync>;

/// Fake executor for deterministic testing
pub struct FakeBuildExecutor {
    reply: Reply,
    commands: Mutex<Vec<BuildCommand>>,
    gate: Option<Arc<Semaphore>>,
    file_gates: Mutex<Vec<(String, Arc<Semaphore>)>>,
}

impl FakeBuildExecutor {
    /// Every command succeeds with the no-output sentinel
    pub fn new() -> Self {
        Self::with_reply(|_| Ok(NO_OUTPUT_SENTINEL.to_string()))
    }

    pub fn with_reply(
        reply: impl Fn(&BuildCommand) -> TriageResult<String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            reply: Box::new(reply),
            commands: Mutex::new(Vec::new()),
            gate: None,
            file_gates: Mutex::new(Vec::new()),
        }
    }

    /// Hold every command until the returned semaphore gets a permit
    pub fn gated(mut self) -> (Self, Arc<Semaphore>) {
        let semaphore = Arc::new(Semaphore::new(0));
        self.gate = Some(semaphore.clone());
        (self, semaphore)
    }

    /// Hold only the commands for `file_name` until the returned semaphore
    /// gets a permit, so completions can be released in any order
    pub fn gate(&self, file_name: &str) -> Arc<Semaphore> {
        let semaphore = Arc::new(Semaphore::new(0));
        lock(&self.file_gates).push((file_name.to_string(), semaphore.clone()));
        semaphore
    }

    /// Commands received so far, in call order
    pub fn commands(&self) -> Vec<BuildCommand> {
        lock(&self.commands).clone()
    }

    fn gate_for(&self, command: &BuildCommand) -> Option<Arc<Semaphore>> {
        lock(&self.file_gates)
            .iter()
            .find(|(file_name, _)| *file_name == command.file_name)
            .map(|(_, semaphore)| semaphore.clone())
    }
}

impl Default for FakeBuildExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BuildExecutor for FakeBuildExecutor {
    async fn exec(&self, command: &BuildCommand) -> TriageResult<String> {
        lock(&self.commands).push(command.clone());

        for gate in self.gate.iter().cloned().chain(self.gate_for(command)) {
            let permit = gate
                .acquire()
                .await
                .map_err(|e| TriageError::Action(e.to_string()))?;
            permit.forget();
        }

        (self.reply)(command)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
