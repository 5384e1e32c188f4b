//! Dashboard controller.
//!
//! `Dashboard` is a cheap handle over shared state. It exclusively owns the
//! view (filters, exclusion stack, compare mode, active field, build level),
//! the results store and the build orchestrator. Remote calls are the only
//! suspension points; view locks are never held across them.

use chrono::{DateTime, Local};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, info_span, warn, Instrument};
use triage_shared::config::{TriageConfig, ViewConfig};
use triage_shared::endpoints;
use triage_shared::{
    BuildCommand, BuildLevel, ColumnKey, CompareMode, ExclusionSnapshot, GroupRow, ResultRow,
    SortSpec, TriageError, TriageResult, ViewState,
};
use uuid::Uuid;

use crate::builds::{BuildOrchestrator, Completion};
use crate::executor::{BuildExecutor, HttpBuildExecutor};
use crate::store::{FetchOutcome, ResultsStore, StoreSnapshot};
use crate::transport::{HttpTransport, Transport};

/// Outcome of each of the three loads issued by one search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOutcome {
    pub count: FetchOutcome,
    pub groups: FetchOutcome,
    pub rows: FetchOutcome,
}

struct Inner {
    transport: Arc<dyn Transport>,
    view: RwLock<ViewState>,
    store: ResultsStore,
    builds: BuildOrchestrator,
    max_number: usize,
    max_groups: usize,
    started_at: DateTime<Local>,
}

#[derive(Clone)]
pub struct Dashboard {
    inner: Arc<Inner>,
}

impl Dashboard {
    pub fn new(
        transport: Arc<dyn Transport>,
        executor: Arc<dyn BuildExecutor>,
        config: &ViewConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store: ResultsStore::new(transport.clone()),
                builds: BuildOrchestrator::new(executor),
                transport,
                view: RwLock::new(ViewState::from_config(config)),
                max_number: config.effective_max_number(),
                max_groups: config.effective_max_groups(),
                started_at: Local::now(),
            }),
        }
    }

    /// Dashboard talking HTTP to the configured server
    pub fn connect(config: &TriageConfig) -> Self {
        let base_url = config.server.base_url.clone();
        Self::new(
            Arc::new(HttpTransport::new(base_url.clone())),
            Arc::new(HttpBuildExecutor::new(base_url)),
            &config.view,
        )
    }

    pub fn started_at(&self) -> DateTime<Local> {
        self.inner.started_at
    }

    pub fn base_url(&self) -> String {
        self.inner.transport.url("")
    }

    // ------------------------------------------------------------------
    // View state
    // ------------------------------------------------------------------

    pub async fn view(&self) -> ViewState {
        self.inner.view.read().await.clone()
    }

    pub async fn set_search_text(&self, key: ColumnKey, text: impl Into<String>) {
        self.inner.view.write().await.filter.set_search_text(key, text);
    }

    /// Reset every column's search text; the exclusion stack stays
    pub async fn clear_filters(&self) {
        self.inner.view.write().await.filter.clear();
    }

    pub async fn set_compare(&self, mode: CompareMode) {
        self.inner.view.write().await.compare = mode;
    }

    pub async fn set_active_field(&self, key: ColumnKey) -> TriageResult<()> {
        if !key.is_groupable() {
            return Err(TriageError::NotGroupable(key.to_string()));
        }
        self.inner.view.write().await.active_field = key;
        Ok(())
    }

    pub async fn active_field(&self) -> ColumnKey {
        self.inner.view.read().await.active_field
    }

    pub async fn set_build_level(&self, level: BuildLevel) {
        self.inner.view.write().await.build_level = level;
    }

    pub async fn toggle_visible(&self, key: ColumnKey) -> bool {
        self.inner.view.write().await.filter.toggle_visible(key)
    }

    pub async fn set_sort(&self, sort: SortSpec) {
        self.inner.view.write().await.sort = sort;
    }

    pub async fn set_show_build_result(&self, show: bool) {
        self.inner.view.write().await.show_build_result = show;
    }

    /// Query used for rows and count
    pub async fn rows_query(&self) -> String {
        self.inner.view.read().await.query(self.inner.max_number, true)
    }

    /// Query used for groups: the active field's own filter is left out
    pub async fn groups_query(&self) -> String {
        self.inner.view.read().await.query(self.inner.max_groups, false)
    }

    // ------------------------------------------------------------------
    // Fetches
    // ------------------------------------------------------------------

    /// Refresh count, groups and rows. The three loads run concurrently and
    /// each applies its own response as it arrives.
    pub async fn search(&self) -> SearchOutcome {
        let (rows_query, groups_query, field) = {
            let mut view = self.inner.view.write().await;
            let field = view.active_field;
            view.filter.set_visible(field, true);
            (
                view.query(self.inner.max_number, true),
                view.query(self.inner.max_groups, false),
                field,
            )
        };
        debug!(query = %rows_query, "search");

        let store = &self.inner.store;
        let (count, groups, rows) = tokio::join!(
            store.load_count(&rows_query),
            store.load_groups(field, &groups_query),
            store.load_rows(&rows_query),
        );
        SearchOutcome {
            count,
            groups,
            rows,
        }
    }

    pub async fn count(&self) -> FetchOutcome {
        let query = self.rows_query().await;
        self.inner.store.load_count(&query).await
    }

    /// Refresh group aggregates for the active field, making it visible
    pub async fn group(&self) -> FetchOutcome {
        let (query, field) = {
            let mut view = self.inner.view.write().await;
            let field = view.active_field;
            view.filter.set_visible(field, true);
            (view.query(self.inner.max_groups, false), field)
        };
        self.inner.store.load_groups(field, &query).await
    }

    // ------------------------------------------------------------------
    // Exclusions
    // ------------------------------------------------------------------

    /// Hide the cluster whose active field equals `content`.
    ///
    /// On success the snapshot is pushed, the active field's search text is
    /// cleared and the listing is searched again. On failure nothing changes.
    pub async fn hide(&self, content: &str) -> TriageResult<SearchOutcome> {
        let field = self.active_field().await;
        let payload = self
            .inner
            .transport
            .get(&endpoints::hide(field, content))
            .await
            .map_err(|e| {
                warn!(field = %field, error = %e, "hide request failed");
                e
            })?;
        let snapshot = ExclusionSnapshot::from_json(&payload)?;

        {
            let mut view = self.inner.view.write().await;
            view.exclusions.push(snapshot);
            view.filter.set_search_text(field, "");
            info!(field = %field, depth = view.exclusions.len(), "cluster hidden");
        }

        Ok(self.search().await)
    }

    /// Push a snapshot built locally, without asking the server
    pub async fn push_hidden(&self, snapshot: ExclusionSnapshot) {
        self.inner.view.write().await.exclusions.push(snapshot);
    }

    /// Un-hide the most recent snapshot
    pub async fn clear_last_hidden(&self) -> (Option<ExclusionSnapshot>, SearchOutcome) {
        let popped = self.inner.view.write().await.exclusions.pop();
        (popped, self.search().await)
    }

    /// Un-hide everything
    pub async fn clear_hidden(&self) -> SearchOutcome {
        self.inner.view.write().await.exclusions.clear();
        self.search().await
    }

    pub async fn hidden(&self) -> Vec<ExclusionSnapshot> {
        self.inner
            .view
            .read()
            .await
            .exclusions
            .iter()
            .map(|(_, s)| s.clone())
            .collect()
    }

    // ------------------------------------------------------------------
    // Builds
    // ------------------------------------------------------------------

    /// Start a build (or clean) of one row.
    ///
    /// The in-flight counter is raised before anything else happens. The
    /// returned task lowers it once the executor answers; a successful clean
    /// then clears the output and searches again.
    pub async fn build_one(&self, row: ResultRow, clean: bool) -> JoinHandle<()> {
        let guard = self.inner.builds.begin();
        let level = self.inner.view.read().await.build_level.clone();
        let command = BuildCommand::for_row(&row, clean, &level);
        let action_id = Uuid::new_v4();
        let span = info_span!("build", %action_id, target = %command.target, clean);
        let dashboard = self.clone();

        tokio::spawn(
            async move {
                let builds = &dashboard.inner.builds;
                let result = builds.run(action_id, &command).await;
                let completion = builds.finish(&command, result).await;
                drop(guard);
                if completion == Completion::Refresh {
                    dashboard.search().await;
                }
            }
            .instrument(span),
        )
    }

    /// Build every loaded row that passes the live filter, all at once
    pub async fn build_all(&self, clean: bool) -> Vec<JoinHandle<()>> {
        let selected: Vec<ResultRow> = {
            let rows = self.inner.store.rows().await;
            let view = self.inner.view.read().await;
            rows.into_iter().filter(|row| view.matches(row)).collect()
        };
        info!(count = selected.len(), clean, "building all matching rows");

        let mut handles = Vec::with_capacity(selected.len());
        for row in selected {
            handles.push(self.build_one(row, clean).await);
        }
        handles
    }

    pub fn in_flight(&self) -> usize {
        self.inner.builds.in_flight()
    }

    pub fn subscribe_in_flight(&self) -> tokio::sync::watch::Receiver<usize> {
        self.inner.builds.subscribe()
    }

    pub async fn wait_idle(&self) {
        self.inner.builds.wait_idle().await
    }

    pub async fn output_text(&self) -> String {
        self.inner.builds.output_text().await
    }

    // ------------------------------------------------------------------
    // Results
    // ------------------------------------------------------------------

    pub async fn results(&self) -> Vec<ResultRow> {
        self.inner.store.rows().await
    }

    /// Scalar count from the last applied count response
    pub async fn number(&self) -> u64 {
        self.inner.store.count().await
    }

    pub async fn groups(&self) -> Vec<GroupRow> {
        self.inner.store.groups().await
    }

    /// Loaded rows passing the live filter, sorted for display
    pub async fn visible_results(&self) -> Vec<ResultRow> {
        let rows = self.inner.store.rows().await;
        self.inner.view.read().await.visible_rows(&rows)
    }

    pub async fn is_stale(&self) -> bool {
        self.inner.store.is_stale().await
    }

    pub async fn last_error(&self) -> Option<String> {
        self.inner.store.last_error().await
    }

    pub async fn snapshot(&self) -> StoreSnapshot {
        self.inner.store.snapshot().await
    }

    // ------------------------------------------------------------------
    // Views opened outside the dashboard
    // ------------------------------------------------------------------

    pub fn file_url(&self, path: &str, child: bool) -> String {
        self.inner.transport.url(&endpoints::file(path, child))
    }

    pub fn source_url(&self, path: &str) -> String {
        self.inner.transport.url(&endpoints::source(path))
    }
}
