//! Shared fixtures for triagectl integration tests

#![allow(dead_code)]

use serde_json::{json, Value};
use std::sync::Arc;
use triage_shared::config::ViewConfig;
use triage_shared::{TriageError, TriageResult};
use triagectl::{Dashboard, FakeBuildExecutor, FakeTransport};

pub fn rows_payload() -> Value {
    json!([
        {
            "errLevel": 2,
            "group": "MMT",
            "repo": "urtheories",
            "fileName": "logic.mmt",
            "fileDate": "2016-03-01",
            "target": "mmt-omdoc",
            "shortMsg": "unbound token: foo",
            "sourceRef": "http://cds.omdoc.org/urtheories?Logic"
        },
        {
            "errLevel": 1,
            "group": "MMT",
            "repo": "examples",
            "fileName": "arith.mmt",
            "fileDate": "2016-05-10",
            "target": "mmt-omdoc",
            "shortMsg": "no type found"
        }
    ])
}

/// Canned server: two rows, count 2, one group, and a hide snapshot
pub fn canned(path: &str) -> TriageResult<Value> {
    if path.contains("hide=true") {
        Ok(json!({
            "fileName": "logic.mmt",
            "shortMsg": "unbound token: foo",
            "unknownKey": "ignored",
            "sourceRegion": null
        }))
    } else if path.starts_with("errors/count2") {
        Ok(json!([{ "count": 2 }]))
    } else if path.starts_with("errors/group/") {
        Ok(json!([{ "shortMsg": "unbound token: foo", "count": 1 }]))
    } else if path.starts_with("errors/search2") {
        Ok(rows_payload())
    } else {
        Err(TriageError::Server {
            status: 404,
            body: path.to_string(),
        })
    }
}

pub fn dashboard(transport: &Arc<FakeTransport>, executor: &Arc<FakeBuildExecutor>) -> Dashboard {
    Dashboard::new(transport.clone(), executor.clone(), &ViewConfig::default())
}

/// Dashboard over the canned server and an executor that prints nothing
pub fn canned_dashboard() -> (Dashboard, Arc<FakeTransport>, Arc<FakeBuildExecutor>) {
    let transport = Arc::new(FakeTransport::new(canned));
    let executor = Arc::new(FakeBuildExecutor::new());
    (dashboard(&transport, &executor), transport, executor)
}

/// Last request whose path starts with `prefix`
pub fn last_request(transport: &FakeTransport, prefix: &str) -> Option<String> {
    transport
        .requests()
        .into_iter()
        .rev()
        .find(|p| p.starts_with(prefix) && !p.contains("hide=true"))
}

/// Yield until `transport` has seen `n` requests containing `pattern`
pub async fn wait_for_requests(transport: &FakeTransport, pattern: &str, n: usize) {
    while transport.count_matching(pattern) < n {
        tokio::task::yield_now().await;
    }
}
