//! Dashboard fetch, hide and race behaviour against a fake server

mod common;

use common::{canned, canned_dashboard, dashboard, last_request, wait_for_requests};
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use triage_shared::{ColumnKey, CompareMode, TriageError};
use triagectl::{FakeBuildExecutor, FakeTransport, FetchOutcome};

#[tokio::test]
async fn test_search_issues_rows_count_and_groups() {
    let (dash, transport, _) = canned_dashboard();
    dash.set_search_text(ColumnKey::Repo, "urtheories").await;
    dash.set_search_text(ColumnKey::ShortMsg, "unbound").await;

    let outcome = dash.search().await;
    assert_eq!(outcome.rows, FetchOutcome::Applied);
    assert_eq!(outcome.count, FetchOutcome::Applied);
    assert_eq!(outcome.groups, FetchOutcome::Applied);

    let requests = transport.requests();
    assert_eq!(requests.len(), 3);
    let sent = |path: &str| requests.iter().any(|p| p == path);
    assert!(sent("errors/search2?limit=100&repo=urtheories&shortMsg=unbound&compare=newer"));
    assert!(sent("errors/count2?limit=100&repo=urtheories&shortMsg=unbound&compare=newer"));
    // group counts ignore the grouped column's own filter
    assert!(sent("errors/group/shortMsg?limit=6&repo=urtheories&compare=newer"));

    assert_eq!(dash.number().await, 2);
    assert_eq!(dash.results().await.len(), 2);
    assert_eq!(dash.groups().await.len(), 1);
    assert!(!dash.is_stale().await);
}

#[tokio::test]
async fn test_older_compare_is_sent() {
    let (dash, transport, _) = canned_dashboard();
    dash.set_search_text(ColumnKey::FileDate, "2016-04-01").await;
    dash.set_compare(CompareMode::Older).await;
    dash.search().await;

    assert_eq!(
        last_request(&transport, "errors/search2").as_deref(),
        Some("errors/search2?limit=100&fileDate=2016-04-01&compare=older")
    );
}

#[tokio::test]
async fn test_visible_results_apply_live_filter() {
    let (dash, _, _) = canned_dashboard();
    dash.search().await;
    assert_eq!(dash.visible_results().await.len(), 2);

    // no new search: the loaded rows are filtered locally
    dash.set_search_text(ColumnKey::ShortMsg, "no type").await;
    let visible = dash.visible_results().await;
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].file_name(), "arith.mmt");
    assert_eq!(dash.results().await.len(), 2);
}

#[tokio::test]
async fn test_visible_results_sorted_by_date() {
    let (dash, _, _) = canned_dashboard();
    dash.search().await;
    let names: Vec<String> = dash
        .visible_results()
        .await
        .iter()
        .map(|r| r.file_name())
        .collect();
    assert_eq!(names, vec!["logic.mmt", "arith.mmt"]);
}

#[tokio::test]
async fn test_search_shows_active_field() {
    let (dash, _, _) = canned_dashboard();
    assert!(!dash.toggle_visible(ColumnKey::ShortMsg).await);
    dash.search().await;
    assert!(dash.view().await.filter.is_visible(ColumnKey::ShortMsg));
}

#[tokio::test]
async fn test_active_field_must_be_groupable() {
    let (dash, _, _) = canned_dashboard();
    let err = dash.set_active_field(ColumnKey::ErrChild).await.unwrap_err();
    assert!(matches!(err, TriageError::NotGroupable(_)));
    assert_eq!(dash.active_field().await, ColumnKey::ShortMsg);

    dash.set_active_field(ColumnKey::Repo).await.unwrap();
    dash.set_search_text(ColumnKey::Repo, "examples").await;
    assert_eq!(dash.groups_query().await, "?limit=6&compare=newer");
}

#[tokio::test]
async fn test_hide_pushes_snapshot_and_researches() {
    let (dash, transport, _) = canned_dashboard();
    dash.set_search_text(ColumnKey::ShortMsg, "unbound").await;

    dash.hide("unbound token: foo").await.unwrap();

    assert!(transport
        .requests()
        .contains(&"errors/search2?shortMsg=unbound%20token%3A%20foo&hide=true".to_string()));
    let hidden = dash.hidden().await;
    assert_eq!(hidden.len(), 1);
    assert_eq!(hidden[0].get(ColumnKey::FileName), Some("logic.mmt"));
    assert_eq!(hidden[0].get(ColumnKey::SourceRegion), None);
    assert_eq!(dash.view().await.filter.search_text(ColumnKey::ShortMsg), "");
    assert_eq!(
        last_request(&transport, "errors/search2").as_deref(),
        Some("errors/search2?limit=100&fileName0=logic.mmt&shortMsg0=unbound%20token%3A%20foo&compare=newer")
    );
}

#[tokio::test]
async fn test_unhide_restores_query() {
    let (dash, transport, _) = canned_dashboard();
    dash.search().await;
    let before = last_request(&transport, "errors/search2");

    dash.hide("unbound token: foo").await.unwrap();
    let (popped, _) = dash.clear_last_hidden().await;

    assert!(popped.is_some());
    assert_eq!(last_request(&transport, "errors/search2"), before);

    let (popped, _) = dash.clear_last_hidden().await;
    assert!(popped.is_none());
}

#[tokio::test]
async fn test_unhide_all() {
    let (dash, transport, _) = canned_dashboard();
    dash.hide("a").await.unwrap();
    dash.hide("b").await.unwrap();
    assert_eq!(dash.hidden().await.len(), 2);

    dash.clear_hidden().await;
    assert!(dash.hidden().await.is_empty());
    assert_eq!(
        last_request(&transport, "errors/search2").as_deref(),
        Some("errors/search2?limit=100&compare=newer")
    );
}

#[tokio::test]
async fn test_failed_hide_changes_nothing() {
    let transport = Arc::new(FakeTransport::new(|path| {
        if path.contains("hide=true") {
            Err(TriageError::Network("connection refused".into()))
        } else {
            canned(path)
        }
    }));
    let executor = Arc::new(FakeBuildExecutor::new());
    let dash = dashboard(&transport, &executor);
    dash.set_search_text(ColumnKey::ShortMsg, "unbound").await;

    assert!(dash.hide("unbound token: foo").await.is_err());
    assert!(dash.hidden().await.is_empty());
    assert_eq!(dash.view().await.filter.search_text(ColumnKey::ShortMsg), "unbound");
    assert_eq!(transport.count_matching("errors/count2"), 0);
}

#[tokio::test]
async fn test_failed_fetch_keeps_previous_data() {
    let failing = Arc::new(AtomicBool::new(false));
    let transport = {
        let failing = failing.clone();
        Arc::new(FakeTransport::new(move |path| {
            if failing.load(Ordering::SeqCst) && path.starts_with("errors/search2") {
                Err(TriageError::Server {
                    status: 500,
                    body: "database locked".into(),
                })
            } else {
                canned(path)
            }
        }))
    };
    let executor = Arc::new(FakeBuildExecutor::new());
    let dash = dashboard(&transport, &executor);

    dash.search().await;
    failing.store(true, Ordering::SeqCst);
    let outcome = dash.search().await;

    assert!(matches!(outcome.rows, FetchOutcome::Failed(_)));
    assert_eq!(outcome.count, FetchOutcome::Applied);
    assert_eq!(dash.results().await.len(), 2);
    assert!(dash.is_stale().await);
    assert!(dash.last_error().await.unwrap().contains("database locked"));

    failing.store(false, Ordering::SeqCst);
    dash.search().await;
    assert!(!dash.is_stale().await);
}

#[tokio::test]
async fn test_malformed_count_is_a_failure() {
    let transport = Arc::new(FakeTransport::new(|path| {
        if path.starts_with("errors/count2") {
            Ok(json!([]))
        } else {
            canned(path)
        }
    }));
    let executor = Arc::new(FakeBuildExecutor::new());
    let dash = dashboard(&transport, &executor);

    assert!(matches!(dash.count().await, FetchOutcome::Failed(_)));
    assert_eq!(dash.number().await, 0);
}

#[tokio::test]
async fn test_slow_earlier_search_is_discarded() {
    let transport = Arc::new(FakeTransport::new(|path| {
        let tag = if path.contains("repo=first") { "first" } else { "second" };
        if path.starts_with("errors/count2") {
            let count = if tag == "first" { 10 } else { 20 };
            Ok(json!([{ "count": count }]))
        } else if path.starts_with("errors/group/") {
            Ok(json!([{ "shortMsg": tag, "count": 1 }]))
        } else {
            Ok(json!([{ "repo": tag, "fileName": format!("{}.mmt", tag) }]))
        }
    }));
    let gate = transport.gate("repo=first");
    let executor = Arc::new(FakeBuildExecutor::new());
    let dash = dashboard(&transport, &executor);

    dash.set_search_text(ColumnKey::Repo, "first").await;
    let slow = {
        let dash = dash.clone();
        tokio::spawn(async move { dash.search().await })
    };
    wait_for_requests(&transport, "repo=first", 3).await;

    dash.set_search_text(ColumnKey::Repo, "second").await;
    let fast = dash.search().await;
    assert_eq!(fast.rows, FetchOutcome::Applied);

    gate.add_permits(3);
    let slow = slow.await.unwrap();
    assert_eq!(slow.rows, FetchOutcome::Discarded);
    assert_eq!(slow.count, FetchOutcome::Discarded);
    assert_eq!(slow.groups, FetchOutcome::Discarded);

    assert_eq!(dash.number().await, 20);
    assert_eq!(dash.results().await[0].repo(), "second");
}

#[tokio::test]
async fn test_view_urls() {
    let (dash, _, _) = canned_dashboard();
    assert_eq!(
        dash.file_url("MMT/urtheories/errors/logic.err", true),
        "http://fake/errors/file?child=true&file=MMT%2Furtheories%2Ferrors%2Flogic.err"
    );
    assert_eq!(
        dash.source_url("http://cds.omdoc.org/urtheories?Logic"),
        "http://fake/errors/source?http%3A%2F%2Fcds.omdoc.org%2Furtheories%3FLogic"
    );
}
