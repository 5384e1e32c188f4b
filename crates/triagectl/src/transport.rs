//! HTTP transport for the error endpoints.
//!
//! Production code uses `HttpTransport` (reqwest). Tests use `FakeTransport`,
//! which answers from a closure, records every requested path and can hold
//! selected responses behind a gate so arrival order is under test control.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;
use tracing::debug;
use triage_shared::endpoints;
use triage_shared::{TriageError, TriageResult};

/// `get(path) -> JSON`, the only primitive the dashboard needs
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch a path relative to the server base URL
    async fn get(&self, path: &str) -> TriageResult<Value>;

    /// Absolute URL for a relative path (for views opened elsewhere)
    fn url(&self, path: &str) -> String;
}

pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, path: &str) -> TriageResult<Value> {
        let url = self.url(path);
        debug!(%url, "GET");

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| TriageError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(TriageError::Server { status, body });
        }

        resp.json::<Value>()
            .await
            .map_err(|e| TriageError::Decode(e.to_string()))
    }

    fn url(&self, path: &str) -> String {
        endpoints::join(&self.base_url, path)
    }
}

type Responder = Box<dyn Fn(&str) -> TriageResult<Value> + Send + Sync>;

/// Fake transport for deterministic testing
pub struct FakeTransport {
    responder: Responder,
    requests: Mutex<Vec<String>>,
    gates: Mutex<Vec<(String, Arc<Semaphore>)>>,
}

impl FakeTransport {
    /// Answer every request with `responder(path)`
    pub fn new(responder: impl Fn(&str) -> TriageResult<Value> + Send + Sync + 'static) -> Self {
        Self {
            responder: Box::new(responder),
            requests: Mutex::new(Vec::new()),
            gates: Mutex::new(Vec::new()),
        }
    }

    /// Hold every request whose path contains `pattern` until the returned
    /// semaphore gets a permit. Permits are consumed one per request.
    pub fn gate(&self, pattern: &str) -> Arc<Semaphore> {
        let semaphore = Arc::new(Semaphore::new(0));
        lock(&self.gates).push((pattern.to_string(), semaphore.clone()));
        semaphore
    }

    /// Paths requested so far, in issue order
    pub fn requests(&self) -> Vec<String> {
        lock(&self.requests).clone()
    }

    pub fn count_matching(&self, pattern: &str) -> usize {
        lock(&self.requests)
            .iter()
            .filter(|p| p.contains(pattern))
            .count()
    }

    fn gate_for(&self, path: &str) -> Option<Arc<Semaphore>> {
        lock(&self.gates)
            .iter()
            .find(|(pattern, _)| path.contains(pattern.as_str()))
            .map(|(_, semaphore)| semaphore.clone())
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn get(&self, path: &str) -> TriageResult<Value> {
        lock(&self.requests).push(path.to_string());

        if let Some(gate) = self.gate_for(path) {
            let permit = gate
                .acquire()
                .await
                .map_err(|e| TriageError::Network(e.to_string()))?;
            permit.forget();
        }

        (self.responder)(path)
    }

    fn url(&self, path: &str) -> String {
        endpoints::join("http://fake", path)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
