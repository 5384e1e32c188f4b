//! Last-fetched rows, row count and group aggregates.
//!
//! Every load draws a generation number when it is issued. A response is
//! applied only if it is newer than the last one applied to the same slot,
//! so a slow earlier request can never overwrite a faster later one.
//! Failed loads keep the previous value and mark the slot stale.

use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use triage_shared::endpoints;
use triage_shared::row::parse_count;
use triage_shared::{ColumnKey, GroupRow, ResultRow, TriageError, TriageResult};

use crate::transport::Transport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    Rows,
    Count,
    Groups,
}

impl FetchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchKind::Rows => "rows",
            FetchKind::Count => "count",
            FetchKind::Groups => "groups",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied,
    /// A newer response for the same slot was already applied
    Discarded,
    Failed(String),
}

#[derive(Debug, Clone, Default)]
struct Slot<T> {
    value: T,
    applied: u64,
    stale: bool,
}

impl<T> Slot<T> {
    fn apply(&mut self, generation: u64, result: TriageResult<T>) -> FetchOutcome {
        if generation <= self.applied {
            return FetchOutcome::Discarded;
        }
        self.applied = generation;
        match result {
            Ok(value) => {
                self.value = value;
                self.stale = false;
                FetchOutcome::Applied
            }
            Err(e) => {
                self.stale = true;
                FetchOutcome::Failed(e.to_string())
            }
        }
    }
}

#[derive(Debug, Default)]
struct StoreData {
    rows: Slot<Vec<ResultRow>>,
    count: Slot<u64>,
    groups: Slot<Vec<GroupRow>>,
    last_error: Option<String>,
}

/// Point-in-time copy of the store for display
#[derive(Debug, Clone, Default)]
pub struct StoreSnapshot {
    pub rows: Vec<ResultRow>,
    pub count: u64,
    pub groups: Vec<GroupRow>,
    pub stale: bool,
    pub last_error: Option<String>,
}

pub struct ResultsStore {
    transport: Arc<dyn Transport>,
    next_generation: AtomicU64,
    data: RwLock<StoreData>,
}

impl ResultsStore {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            next_generation: AtomicU64::new(0),
            data: RwLock::new(StoreData::default()),
        }
    }

    fn issue(&self) -> u64 {
        self.next_generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Fetch rows for `query` and replace `rows` wholesale
    pub async fn load_rows(&self, query: &str) -> FetchOutcome {
        let generation = self.issue();
        let result = self
            .transport
            .get(&endpoints::search(query))
            .await
            .and_then(|payload| decode::<Vec<ResultRow>>(payload, "rows"));
        let mut data = self.data.write().await;
        let outcome = data.rows.apply(generation, result);
        record(&mut data, FetchKind::Rows, generation, &outcome);
        outcome
    }

    /// Fetch the scalar row count for `query`
    pub async fn load_count(&self, query: &str) -> FetchOutcome {
        let generation = self.issue();
        let result = self
            .transport
            .get(&endpoints::count(query))
            .await
            .and_then(parse_count);
        let mut data = self.data.write().await;
        let outcome = data.count.apply(generation, result);
        record(&mut data, FetchKind::Count, generation, &outcome);
        outcome
    }

    /// Fetch group aggregates of `field` and replace `groups` wholesale
    pub async fn load_groups(&self, field: ColumnKey, query: &str) -> FetchOutcome {
        let generation = self.issue();
        let result = self
            .transport
            .get(&endpoints::group(field, query))
            .await
            .and_then(|payload| decode::<Vec<GroupRow>>(payload, "groups"));
        let mut data = self.data.write().await;
        let outcome = data.groups.apply(generation, result);
        record(&mut data, FetchKind::Groups, generation, &outcome);
        outcome
    }

    pub async fn rows(&self) -> Vec<ResultRow> {
        self.data.read().await.rows.value.clone()
    }

    pub async fn count(&self) -> u64 {
        self.data.read().await.count.value
    }

    pub async fn groups(&self) -> Vec<GroupRow> {
        self.data.read().await.groups.value.clone()
    }

    /// True while any slot's latest load failed
    pub async fn is_stale(&self) -> bool {
        let data = self.data.read().await;
        data.rows.stale || data.count.stale || data.groups.stale
    }

    pub async fn last_error(&self) -> Option<String> {
        self.data.read().await.last_error.clone()
    }

    pub async fn snapshot(&self) -> StoreSnapshot {
        let data = self.data.read().await;
        StoreSnapshot {
            rows: data.rows.value.clone(),
            count: data.count.value,
            groups: data.groups.value.clone(),
            stale: data.rows.stale || data.count.stale || data.groups.stale,
            last_error: data.last_error.clone(),
        }
    }
}

fn decode<T: serde::de::DeserializeOwned>(payload: Value, what: &str) -> TriageResult<T> {
    serde_json::from_value(payload)
        .map_err(|e| TriageError::Decode(format!("{} response: {}", what, e)))
}

fn record(data: &mut StoreData, kind: FetchKind, generation: u64, outcome: &FetchOutcome) {
    match outcome {
        FetchOutcome::Applied => {
            debug!(kind = kind.as_str(), generation, "applied");
        }
        FetchOutcome::Discarded => {
            debug!(kind = kind.as_str(), generation, "discarded superseded response");
        }
        FetchOutcome::Failed(message) => {
            warn!(kind = kind.as_str(), generation, error = %message, "fetch failed, keeping previous data");
            data.last_error = Some(message.clone());
        }
    }
}
