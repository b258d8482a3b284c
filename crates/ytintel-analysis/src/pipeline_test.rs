use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use ytintel_core::{AnalysisFocus, TopicMap};

use super::*;
use crate::error::SynthesisError;
use crate::synthesize::FALLBACK_RECOMMENDATION;
use crate::types::{Measured, SynthesisStatus};

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

#[derive(Default)]
struct FakeSource {
    channels: HashMap<String, (Option<String>, Vec<Value>)>,
    calls: Mutex<Vec<(String, bool)>>,
    cancel_on_fetch: Option<CancellationToken>,
    hang: bool,
}

impl FakeSource {
    fn with_channel(mut self, id: &str, name: Option<&str>, records: Vec<Value>) -> Self {
        self.channels
            .insert(id.to_string(), (name.map(str::to_string), records));
        self
    }

    fn calls(&self) -> Vec<(String, bool)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl VideoSource for FakeSource {
    async fn fetch_channel(
        &self,
        channel: &str,
        video_count: u32,
        include_transcripts: bool,
    ) -> Result<ChannelFetch, FetchError> {
        self.calls
            .lock()
            .unwrap()
            .push((channel.to_string(), include_transcripts));
        if let Some(token) = &self.cancel_on_fetch {
            token.cancel();
        }
        if self.hang {
            std::future::pending::<()>().await;
        }
        match self.channels.get(channel) {
            Some((name, records)) => Ok(ChannelFetch {
                channel: channel.to_string(),
                channel_name: name.clone(),
                records: records.iter().take(video_count as usize).cloned().collect(),
            }),
            None => Err(FetchError::UnexpectedStatus {
                status: 404,
                url: format!("fake://{channel}"),
            }),
        }
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

struct Canned {
    body: Result<String, u16>,
    calls: AtomicUsize,
}

impl Canned {
    fn ok(body: Value) -> Self {
        Self {
            body: Ok(body.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    fn failing(status: u16) -> Self {
        Self {
            body: Err(status),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ReasoningService for Canned {
    async fn complete(&self, _system: &str, _prompt: &str) -> Result<String, SynthesisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.body
            .clone()
            .map_err(|status| SynthesisError::UnexpectedStatus {
                status,
                message: "unavailable".to_string(),
            })
    }

    fn name(&self) -> &'static str {
        "canned"
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn video(id: &str, title: &str, views: u64, day: u32) -> Value {
    json!({
        "id": id,
        "title": title,
        "viewCount": views,
        "likes": 10,
        "date": format!("2024-03-{day:02}T15:00:00Z"),
    })
}

fn target_videos() -> Vec<Value> {
    (1..=4)
        .map(|i| {
            let mut v = video(&format!("t{i}"), &format!("Camera test {i}"), 1000 * u64::from(i), i);
            v["transcript"] = json!("camera settings matter. camera settings again.");
            v
        })
        .collect()
}

fn rival_videos() -> Vec<Value> {
    (1..=5)
        .map(|i| video(&format!("r{i}"), &format!("Budget build {i}"), 1_200_000, i))
        .collect()
}

fn request(channels: &[&str], competitors: &[&str]) -> RunRequest {
    RunRequest {
        channels: channels.iter().map(|s| (*s).to_string()).collect(),
        competitors: competitors.iter().map(|s| (*s).to_string()).collect(),
        video_count: 20,
        include_transcripts: true,
        analysis_focus: AnalysisFocus::Comprehensive,
        reasoning_api_key: None,
    }
}

fn config() -> AnalysisConfig {
    AnalysisConfig {
        topics: TopicMap::new([("budget", vec!["budget"]), ("gear", vec!["camera"])]).unwrap(),
        ..AnalysisConfig::default()
    }
}

fn standard_source() -> FakeSource {
    FakeSource::default()
        .with_channel("@target", Some("Target Channel"), target_videos())
        .with_channel("@rival", Some("Rival Channel"), rival_videos())
}

async fn run_one(
    source: &FakeSource,
    reasoner: Option<&dyn ReasoningService>,
    req: &RunRequest,
) -> Report {
    let mut reports = run(source, reasoner, req, &config(), &CancellationToken::new())
        .await
        .expect("run failed");
    assert_eq!(reports.len(), 1);
    reports.remove(0)
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

#[tokio::test]
async fn full_run_finds_competitor_gap() {
    let source = standard_source();
    let report = run_one(&source, None, &request(&["@target"], &["@rival"])).await;

    assert_eq!(report.channel.channel_name, "Target Channel");
    assert_eq!(report.channel.video_count, 4);
    assert_eq!(report.content_gaps.len(), 1);
    assert_eq!(report.content_gaps[0].topic, "budget");
    assert_eq!(report.content_gaps[0].competitor_name, "Rival Channel");
    assert_eq!(report.content_gaps[0].target_coverage, 0);
    assert_eq!(report.metadata.videos_analyzed, 4);
    assert_eq!(report.metadata.competitors_analyzed, 1);
    assert_eq!(report.metadata.transcripts_analyzed, 4);
    assert!(!report.metadata.partial_data);
    assert!(report
        .keyword_opportunities
        .iter()
        .any(|k| k.keyword == "camera settings"));
}

#[tokio::test]
async fn malformed_records_are_counted_in_metadata() {
    let mut records: Vec<Value> = (1..=10)
        .map(|i| video(&format!("v{i}"), "Camera day", 100, i))
        .collect();
    records.extend((0..10).map(|i| json!({ "title": format!("no id {i}") })));
    let source = FakeSource::default().with_channel("@target", None, records);

    let report = run_one(&source, None, &request(&["@target"], &[])).await;

    assert_eq!(report.metadata.videos_analyzed, 10);
    assert_eq!(report.metadata.records_skipped, 10);
    assert!(report.metadata.partial_data);
}

#[tokio::test]
async fn failed_competitor_fetch_still_yields_report() {
    let source = FakeSource::default().with_channel("@target", None, target_videos());
    let report = run_one(&source, None, &request(&["@target"], &["@missing"])).await;

    assert!(report.content_gaps.is_empty());
    assert_eq!(report.metadata.competitors_analyzed, 0);
    assert!(report.metadata.partial_data);
    assert!(report.metadata.data_quality_notes[0].contains("@missing"));
}

#[tokio::test]
async fn failed_target_fetch_reports_insufficient_data() {
    let source = FakeSource::default();
    let report = run_one(&source, None, &request(&["@gone"], &[])).await;

    assert_eq!(report.channel.channel_name, "@gone");
    assert_eq!(report.channel.video_count, 0);
    assert_eq!(report.channel.avg_views, Measured::InsufficientData);
    assert_eq!(report.channel.best_posting_day, Measured::InsufficientData);
    assert!(report.keyword_opportunities.is_empty());
    assert!(report.metadata.partial_data);
}

#[tokio::test]
async fn channel_name_falls_back_to_identifier() {
    let source = FakeSource::default().with_channel("@target", None, target_videos());
    let report = run_one(&source, None, &request(&["@target"], &[])).await;
    assert_eq!(report.channel.channel_name, "@target");
}

#[tokio::test]
async fn competitors_are_fetched_without_transcripts() {
    let source = standard_source();
    run_one(&source, None, &request(&["@target"], &["@rival"])).await;

    let mut calls = source.calls();
    calls.sort();
    assert_eq!(
        calls,
        vec![("@rival".to_string(), false), ("@target".to_string(), true)]
    );
}

#[tokio::test]
async fn reports_follow_target_order() {
    let source = standard_source().with_channel("@second", Some("Second"), target_videos());
    let reports = run(
        &source,
        None,
        &request(&["@second", "@target"], &["@rival"]),
        &config(),
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    let names: Vec<_> = reports
        .iter()
        .map(|r| r.channel.channel_name.as_str())
        .collect();
    assert_eq!(names, vec!["Second", "Target Channel"]);
}

#[tokio::test]
async fn analyze_channel_uses_first_target() {
    let source = standard_source().with_channel("@second", Some("Second"), target_videos());
    let report = analyze_channel(
        &source,
        None,
        &request(&["@second", "@target"], &[]),
        &config(),
        &CancellationToken::new(),
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(report.channel.channel_name, "Second");
}

// ---------------------------------------------------------------------------
// Synthesis
// ---------------------------------------------------------------------------

#[tokio::test]
async fn reasoning_failure_changes_only_recommendations() {
    let source = standard_source();
    let req = request(&["@target"], &["@rival"]);

    let good = Canned::ok(json!({
        "recommendations": [{
            "text": "Keep making camera videos",
            "references": [{ "kind": "topic", "id": "gear" }],
        }],
    }));
    let bad = Canned::failing(500);

    let generated = run_one(&source, Some(&good), &req).await;
    let fallback = run_one(&source, Some(&bad), &req).await;

    assert_eq!(generated.metadata.synthesis, SynthesisStatus::Generated);
    assert_eq!(generated.recommendations, vec!["Keep making camera videos"]);
    assert_eq!(fallback.recommendations, vec![FALLBACK_RECOMMENDATION]);
    assert!(matches!(
        fallback.metadata.synthesis,
        SynthesisStatus::Fallback { .. }
    ));

    assert_eq!(generated.channel, fallback.channel);
    assert_eq!(generated.content_gaps, fallback.content_gaps);
    assert_eq!(
        generated.keyword_opportunities,
        fallback.keyword_opportunities
    );
    assert_eq!(
        generated.metadata.partial_data,
        fallback.metadata.partial_data
    );
}

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn cancelled_before_start_fetches_nothing() {
    let source = standard_source();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = run(&source, None, &request(&["@target"], &[]), &config(), &cancel).await;

    assert!(matches!(result, Err(AnalysisError::Cancelled)));
    assert!(source.calls().is_empty());
}

#[tokio::test]
async fn cancellation_interrupts_pending_fetch() {
    let source = FakeSource {
        hang: true,
        ..standard_source()
    };
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        run(&source, None, &request(&["@target"], &["@rival"]), &config(), &cancel),
    )
    .await
    .expect("cancellation did not stop the run");

    assert!(matches!(result, Err(AnalysisError::Cancelled)));
}

#[tokio::test]
async fn cancellation_before_synthesis_skips_reasoning_call() {
    let cancel = CancellationToken::new();
    let source = FakeSource {
        cancel_on_fetch: Some(cancel.clone()),
        ..standard_source()
    };
    let reasoner = Canned::failing(500);

    let result = run(
        &source,
        Some(&reasoner),
        &request(&["@target"], &[]),
        &config(),
        &cancel,
    )
    .await;

    assert!(matches!(result, Err(AnalysisError::Cancelled)));
    assert_eq!(reasoner.calls.load(Ordering::SeqCst), 0);
}
