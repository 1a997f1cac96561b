//! Integration tests for the crawler
//!
//! These tests use wiremock to stand in for the paper API and run full
//! crawls end-to-end, from seed resolution to files on disk.

use cite_ripple::config::{
    Config, FailurePolicy, FetcherConfig, OutputConfig, SeedConfig, UserAgentConfig,
};
use cite_ripple::crawler::{
    build_http_client, run_crawl, Cooldown, FetchError, HttpFetcher, PaperFetcher, RetryPolicy,
};
use cite_ripple::output::load_statistics;
use cite_ripple::storage::{RunStatus, SqliteStorage, Storage};
use cite_ripple::{PaperRecord, RippleError};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::Path;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const USER_AGENT: &str = "TestBot/1.0.0 (+https://example.com/contact; test@example.com)";

/// Creates a test configuration pointing at the mock server
fn create_test_config(server: &MockServer, dir: &Path, seeds: SeedConfig) -> Config {
    Config {
        fetcher: FetcherConfig {
            api_base_url: format!("{}/v1", server.uri()),
            search_url: format!("{}/graph/v1/paper/search", server.uri()),
            cooldown_ms: 0,
            max_retries: 0,
            retry_backoff_ms: 10,
            ..FetcherConfig::default()
        },
        user_agent: test_user_agent(),
        output: OutputConfig {
            directory: dir.join("papers").to_string_lossy().into_owned(),
            database_path: dir.join("ledger.db").to_string_lossy().into_owned(),
            summary_path: dir.join("summary.md").to_string_lossy().into_owned(),
        },
        seeds,
    }
}

fn test_user_agent() -> UserAgentConfig {
    UserAgentConfig {
        crawler_name: "TestBot".to_string(),
        crawler_version: "1.0.0".to_string(),
        contact_url: "https://example.com/contact".to_string(),
        contact_email: "test@example.com".to_string(),
    }
}

/// Creates a fetcher talking to the mock server directly
fn create_test_fetcher(
    server: &MockServer,
    cooldown: Cooldown,
    retry: RetryPolicy,
) -> HttpFetcher {
    let client = build_http_client(&test_user_agent(), Duration::from_secs(5)).unwrap();
    HttpFetcher::new(client, &format!("{}/v1", server.uri()), cooldown, retry).unwrap()
}

fn id_seeds(ids: &[&str]) -> SeedConfig {
    SeedConfig {
        ids: ids.iter().map(|id| id.to_string()).collect(),
        ..SeedConfig::default()
    }
}

fn stubs(ids: &[&str]) -> Vec<Value> {
    ids.iter()
        .map(|id| json!({ "paperId": id, "title": format!("Paper {}", id) }))
        .collect()
}

fn paper_json(id: &str, references: &[&str], citations: &[&str]) -> Value {
    json!({
        "paperId": id,
        "title": format!("Paper {}", id),
        "year": 2017,
        "references": stubs(references),
        "citations": stubs(citations),
    })
}

async fn mount_paper(server: &MockServer, body: Value) {
    let id = body["paperId"].as_str().unwrap().to_string();
    Mock::given(method("GET"))
        .and(path(format!("/v1/paper/{}", id)))
        .and(query_param("include_unknown_references", "true"))
        .and(header("user-agent", USER_AGENT))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Mounts the diamond graph: A -> {B, C} by reference, B cited by {A, D}
async fn mount_diamond(server: &MockServer) {
    mount_paper(server, paper_json("A", &["B", "C"], &[])).await;
    mount_paper(server, paper_json("B", &[], &["A", "D"])).await;
    mount_paper(server, paper_json("C", &[], &[])).await;
    mount_paper(server, paper_json("D", &[], &[])).await;
}

/// Number of paper requests received per id
async fn fetch_counts(server: &MockServer) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for request in server.received_requests().await.unwrap() {
        if let Some(id) = request.url.path().strip_prefix("/v1/paper/") {
            *counts.entry(id.to_string()).or_insert(0) += 1;
        }
    }
    counts
}

fn written_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir.join("papers"))
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_full_crawl_diamond() {
    let server = MockServer::start().await;
    mount_diamond(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(&server, dir.path(), id_seeds(&["A"]));

    let report = run_crawl(&config, "hash", CancellationToken::new())
        .await
        .expect("crawl failed");

    assert_eq!(report.visit_order, vec!["A", "B", "C", "D"]);
    assert_eq!(report.seeds, 1);
    assert_eq!(report.fetched, 3);
    assert!(report.failed.is_empty());

    let counts = fetch_counts(&server).await;
    for id in ["A", "B", "C", "D"] {
        assert_eq!(counts.get(id), Some(&1), "paper {} fetched more than once", id);
    }

    assert_eq!(
        written_files(dir.path()),
        vec!["paper_a.json", "paper_b.json", "paper_c.json", "paper_d.json"]
    );

    // Unknown fields survive the round trip
    let text = std::fs::read_to_string(dir.path().join("papers/paper_b.json")).unwrap();
    let record: PaperRecord = serde_json::from_str(&text).unwrap();
    assert_eq!(record.id, "B");
    assert_eq!(record.extra.get("year"), Some(&json!(2017)));
    assert!(text.starts_with("{\n    \"citations\""));

    let storage = SqliteStorage::new(&dir.path().join("ledger.db")).unwrap();
    let run = storage.get_latest_run().unwrap().unwrap();
    assert_eq!(Some(run.id), report.run_id);
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(storage.count_persisted(run.id).unwrap(), 4);

    let summary = std::fs::read_to_string(dir.path().join("summary.md")).unwrap();
    assert!(summary.contains("- **Papers Written**: 4"));
}

#[tokio::test]
async fn test_untracked_references_are_not_fetched() {
    let server = MockServer::start().await;
    mount_paper(
        &server,
        json!({
            "paperId": "A",
            "title": "Paper A",
            "references": [
                { "paperId": null, "title": "Some Unindexed Thesis" },
                { "paperId": "", "title": "Another Unknown" },
                { "paperId": "B", "title": "Paper B" }
            ],
            "citations": null
        }),
    )
    .await;
    mount_paper(&server, paper_json("B", &[], &[])).await;

    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(&server, dir.path(), id_seeds(&["A"]));
    let report = run_crawl(&config, "hash", CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.visit_order, vec!["A", "B"]);
    let counts = fetch_counts(&server).await;
    assert_eq!(counts.len(), 2);
}

#[tokio::test]
async fn test_title_seeds_with_mismatch_guard() {
    let server = MockServer::start().await;
    mount_diamond(&server).await;

    Mock::given(method("GET"))
        .and(path("/graph/v1/paper/search"))
        .and(query_param("query", "Foo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{
                "paperId": "X",
                "title": "Completely Unrelated Document About Something Else Entirely"
            }]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/graph/v1/paper/search"))
        .and(query_param("query", "paper a"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "paperId": "A", "title": "Paper A" }]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/graph/v1/paper/search"))
        .and(query_param("query", "Nothing Matches This"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let seeds = SeedConfig {
        titles: vec![
            "Foo".to_string(),
            "Nothing Matches This".to_string(),
            "paper a".to_string(),
        ],
        ..SeedConfig::default()
    };
    let config = create_test_config(&server, dir.path(), seeds);

    let report = run_crawl(&config, "hash", CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.seeds, 1);
    assert_eq!(report.visit_order, vec!["A", "B", "C", "D"]);
    assert!(!fetch_counts(&server).await.contains_key("X"));
}

#[tokio::test]
async fn test_titles_dir_seeds() {
    let server = MockServer::start().await;
    mount_paper(&server, paper_json("C", &[], &[])).await;
    Mock::given(method("GET"))
        .and(path("/graph/v1/paper/search"))
        .and(query_param("query", "Paper C"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "paperId": "C", "title": "Paper C" }]
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let pdfs = dir.path().join("pdfs");
    std::fs::create_dir(&pdfs).unwrap();
    std::fs::write(pdfs.join("Paper C.pdf"), b"%PDF").unwrap();

    let seeds = SeedConfig {
        titles_dir: Some(pdfs),
        ..SeedConfig::default()
    };
    let config = create_test_config(&server, dir.path(), seeds);
    let report = run_crawl(&config, "hash", CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.visit_order, vec!["C"]);
    assert_eq!(written_files(dir.path()), vec!["paper_c.json"]);
}

#[tokio::test]
async fn test_skip_policy_continues_after_404() {
    let server = MockServer::start().await;
    mount_paper(&server, paper_json("A", &["B", "C"], &[])).await;
    mount_paper(&server, paper_json("C", &[], &[])).await;
    // B is not mounted: the mock server answers 404

    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(&server, dir.path(), id_seeds(&["A"]));
    let report = run_crawl(&config, "hash", CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.visit_order, vec!["A", "C"]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, "B");
    assert_eq!(written_files(dir.path()), vec!["paper_a.json", "paper_c.json"]);

    let storage = SqliteStorage::new(&dir.path().join("ledger.db")).unwrap();
    let run = storage.get_latest_run().unwrap().unwrap();
    let failures = storage.get_failures(run.id).unwrap();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].kind, "status");
    assert_eq!(failures[0].error, "HTTP 404 fetching B");
}

#[tokio::test]
async fn test_abort_policy_stops_crawl() {
    let server = MockServer::start().await;
    mount_paper(&server, paper_json("A", &["B", "C"], &[])).await;
    mount_paper(&server, paper_json("C", &[], &[])).await;

    let dir = tempfile::tempdir().unwrap();
    let mut config = create_test_config(&server, dir.path(), id_seeds(&["A"]));
    config.fetcher.on_fetch_failure = FailurePolicy::Abort;

    let err = run_crawl(&config, "hash", CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RippleError::Fetch(FetchError::Status { status: 404, .. })
    ));
    assert!(!fetch_counts(&server).await.contains_key("C"));

    let storage = SqliteStorage::new(&dir.path().join("ledger.db")).unwrap();
    let run = storage.get_latest_run().unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Failed);
}

#[tokio::test]
async fn test_retry_on_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/paper/A"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    mount_paper(&server, paper_json("A", &[], &[])).await;

    let fetcher = create_test_fetcher(
        &server,
        Cooldown::disabled(),
        RetryPolicy::new(2, Duration::from_millis(10)),
    );

    let record = fetcher.fetch_by_id("A").await.unwrap();
    assert_eq!(record.id, "A");
    assert_eq!(fetch_counts(&server).await.get("A"), Some(&3));
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/paper/A"))
        .respond_with(ResponseTemplate::new(400))
        .mount(&server)
        .await;

    let fetcher = create_test_fetcher(
        &server,
        Cooldown::disabled(),
        RetryPolicy::new(3, Duration::from_millis(10)),
    );

    let err = fetcher.fetch_by_id("A").await.unwrap_err();
    assert!(matches!(err, FetchError::Status { status: 400, .. }));
    assert_eq!(fetch_counts(&server).await.get("A"), Some(&1));
}

#[tokio::test]
async fn test_undecodable_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/paper/A"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let fetcher = create_test_fetcher(
        &server,
        Cooldown::disabled(),
        RetryPolicy::new(3, Duration::from_millis(10)),
    );

    let err = fetcher.fetch_by_id("A").await.unwrap_err();
    assert_eq!(err.kind(), "decode");
    assert_eq!(fetch_counts(&server).await.get("A"), Some(&1));
}

#[tokio::test]
async fn test_failures_are_grouped_by_kind() {
    let server = MockServer::start().await;
    mount_paper(&server, paper_json("A", &["B", "C", "D"], &[])).await;
    mount_paper(&server, paper_json("D", &[], &[])).await;
    Mock::given(method("GET"))
        .and(path("/v1/paper/B"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;
    // C is not mounted: the mock server answers 404

    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(&server, dir.path(), id_seeds(&["A"]));
    let report = run_crawl(&config, "hash", CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(report.visit_order, vec!["A", "D"]);

    let storage = SqliteStorage::new(&dir.path().join("ledger.db")).unwrap();
    let stats = load_statistics(&storage).unwrap().unwrap();
    assert_eq!(stats.papers_failed, 2);
    assert_eq!(
        stats.failures_by_kind,
        vec![("decode".to_string(), 1), ("status".to_string(), 1)]
    );
}

#[tokio::test]
async fn test_cooldown_spaces_api_calls() {
    let server = MockServer::start().await;
    mount_diamond(&server).await;

    let interval = Duration::from_millis(100);
    let fetcher = create_test_fetcher(&server, Cooldown::new(interval), RetryPolicy::none());

    let start = Instant::now();
    for id in ["A", "B", "C"] {
        fetcher.fetch_by_id(id).await.unwrap();
    }
    assert!(start.elapsed() >= interval * 2);
}
