//! Integration tests for `ApifySource::fetch_channel`.
//!
//! A `wiremock` server stands in for the Apify API so no real actor runs are
//! started. Covers video fetch, transcript attachment, non-fatal transcript
//! failures, and the status-to-error mapping.

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ytintel_fetcher::{ApifySettings, ApifySource, FetchError, JsonFileSource, VideoSource};

const VIDEO_PATH: &str = "/v2/acts/streamers~youtube-scraper/run-sync-get-dataset-items";
const CAPTION_PATH: &str = "/v2/acts/bernardo~youtube-captions-scraper/run-sync-get-dataset-items";

fn test_source(base_url: &str, max_retries: u32, transcript_limit: usize) -> ApifySource {
    ApifySource::new(ApifySettings {
        token: "test-token".to_string(),
        base_url: base_url.to_string(),
        video_actor: "streamers~youtube-scraper".to_string(),
        transcript_actor: "bernardo~youtube-captions-scraper".to_string(),
        timeout_secs: 5,
        max_retries,
        backoff_base_ms: 0,
        transcript_limit,
    })
    .expect("failed to build test ApifySource")
}

fn videos(n: usize) -> serde_json::Value {
    let items: Vec<_> = (0..n)
        .map(|i| {
            json!({
                "id": format!("vid{i}"),
                "title": format!("Video {i}"),
                "viewCount": 1000 * (i + 1),
                "date": "2024-03-04T15:00:00Z",
                "channelName": "Budget Bytes",
            })
        })
        .collect();
    serde_json::Value::Array(items)
}

#[tokio::test]
async fn fetch_channel_returns_records_and_channel_name() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(VIDEO_PATH))
        .and(header("authorization", "Bearer test-token"))
        .and(body_partial_json(json!({
            "startUrls": [{"url": "https://www.youtube.com/@budgetbytes"}],
            "maxResults": 20,
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(videos(3)))
        .expect(1)
        .mount(&server)
        .await;

    let source = test_source(&server.uri(), 0, 10);
    let fetch = source
        .fetch_channel("@budgetbytes", 20, false)
        .await
        .expect("fetch should succeed");

    assert_eq!(fetch.channel, "@budgetbytes");
    assert_eq!(fetch.channel_name.as_deref(), Some("Budget Bytes"));
    assert_eq!(fetch.records.len(), 3);
}

#[tokio::test]
async fn fetch_channel_truncates_to_requested_count() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(VIDEO_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(videos(15)))
        .mount(&server)
        .await;

    let source = test_source(&server.uri(), 0, 10);
    let fetch = source.fetch_channel("@big", 10, false).await.unwrap();
    assert_eq!(fetch.records.len(), 10);
}

#[tokio::test]
async fn fetch_channel_attaches_transcripts_for_leading_videos() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(VIDEO_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(videos(4)))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(CAPTION_PATH))
        .and(body_partial_json(json!({"language": "en"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"videoId": "vid0", "transcript": [{"text": "meal prep"}, {"text": "on a budget"}]},
            {"videoId": "vid1", "transcript": "cheap dinners"},
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let source = test_source(&server.uri(), 0, 2);
    let fetch = source.fetch_channel("@budgetbytes", 20, true).await.unwrap();

    assert_eq!(fetch.records[0]["transcript"], "meal prep on a budget");
    assert_eq!(fetch.records[1]["transcript"], "cheap dinners");
    assert!(fetch.records[2].get("transcript").is_none());
}

#[tokio::test]
async fn transcript_failure_is_not_fatal() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(VIDEO_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(videos(2)))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(CAPTION_PATH))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let source = test_source(&server.uri(), 0, 10);
    let fetch = source
        .fetch_channel("@budgetbytes", 20, true)
        .await
        .expect("video records survive a caption failure");

    assert_eq!(fetch.records.len(), 2);
    assert!(fetch.records.iter().all(|r| r.get("transcript").is_none()));
}

#[tokio::test]
async fn rate_limit_surfaces_retry_after() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(VIDEO_PATH))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "30"))
        .mount(&server)
        .await;

    let source = test_source(&server.uri(), 0, 10);
    let err = source.fetch_channel("@busy", 20, false).await.unwrap_err();

    assert!(
        matches!(err, FetchError::RateLimited { retry_after_secs: 30 }),
        "expected RateLimited(30), got: {err:?}"
    );
}

#[tokio::test]
async fn client_error_is_unexpected_status_without_retry() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(VIDEO_PATH))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let source = test_source(&server.uri(), 3, 10);
    let err = source.fetch_channel("@locked", 20, false).await.unwrap_err();

    assert!(
        matches!(err, FetchError::UnexpectedStatus { status: 401, .. }),
        "expected UnexpectedStatus(401), got: {err:?}"
    );
}

#[tokio::test]
async fn server_error_is_retried_then_succeeds() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(VIDEO_PATH))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(VIDEO_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(videos(1)))
        .mount(&server)
        .await;

    let source = test_source(&server.uri(), 2, 10);
    let fetch = source.fetch_channel("@flaky", 20, false).await.unwrap();
    assert_eq!(fetch.records.len(), 1);
}

#[tokio::test]
async fn non_array_body_is_deserialize_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(VIDEO_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"error": "nope"})))
        .mount(&server)
        .await;

    let source = test_source(&server.uri(), 0, 10);
    let err = source.fetch_channel("@odd", 20, false).await.unwrap_err();
    assert!(matches!(err, FetchError::Deserialize { .. }));
}

#[tokio::test]
async fn json_file_source_reads_and_strips_transcripts() {
    let dir = std::env::temp_dir().join(format!("ytintel-fetcher-test-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(
        dir.join("budgetbytes.json"),
        json!({
            "channelName": "Budget Bytes",
            "videos": [
                {"id": "a", "transcript": "hello"},
                {"id": "b", "transcript": "world"},
            ],
        })
        .to_string(),
    )
    .unwrap();

    let source = JsonFileSource::new(&dir);
    let with = source.fetch_channel("@budgetbytes", 20, true).await.unwrap();
    let without = source.fetch_channel("@budgetbytes", 20, false).await.unwrap();

    std::fs::remove_dir_all(&dir).ok();

    assert_eq!(with.channel_name.as_deref(), Some("Budget Bytes"));
    assert_eq!(with.records[0]["transcript"], "hello");
    assert!(without.records.iter().all(|r| r.get("transcript").is_none()));
}
