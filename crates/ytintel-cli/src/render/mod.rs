//! Report renderers. Pure consumers of [`Report`]; nothing here recomputes
//! statistics.

mod csv;
mod markdown;

use std::path::{Path, PathBuf};

use anyhow::Context;
use ytintel_analysis::{group_thousands, Measured, Report, ViewRange};

pub(crate) use csv::render_csv;
pub(crate) use markdown::render_markdown;

/// Write `<slug>_report.{json,md,csv}` under `dir`, creating it if needed.
///
/// # Errors
///
/// Returns an error if the directory cannot be created, the report cannot be
/// serialized, or a file cannot be written.
pub(crate) fn write_reports(dir: &Path, slug: &str, report: &Report) -> anyhow::Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory {}", dir.display()))?;

    let json = serde_json::to_string_pretty(report).context("failed to serialize report")?;
    let outputs = [
        (format!("{slug}_report.json"), json),
        (format!("{slug}_report.md"), render_markdown(report)),
        (format!("{slug}_report.csv"), render_csv(report)),
    ];

    let mut written = Vec::with_capacity(outputs.len());
    for (name, contents) in outputs {
        let path = dir.join(name);
        std::fs::write(&path, contents)
            .with_context(|| format!("failed to write {}", path.display()))?;
        tracing::info!(path = %path.display(), "report written");
        written.push(path);
    }
    Ok(written)
}

/// Whole-number view counts with thousands separators.
fn views(value: &Measured<f64>) -> String {
    value
        .value()
        .map_or_else(|| "insufficient data".to_string(), |v| group_thousands(*v))
}

fn one_decimal(value: &Measured<f64>, suffix: &str) -> String {
    value
        .value()
        .map_or_else(|| "insufficient data".to_string(), |v| format!("{v:.1}{suffix}"))
}

fn view_range(value: &Measured<ViewRange>) -> String {
    value.value().map_or_else(
        || "insufficient data".to_string(),
        |r| format!("{} - {} views", group_thousands(r.low), group_thousands(r.high)),
    )
}

fn hour(value: &Measured<u32>) -> String {
    value
        .value()
        .map_or_else(|| "insufficient data".to_string(), |h| format!("{h:02}:00"))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::{TimeZone, Utc};
    use ytintel_analysis::{
        ChannelAggregate, Competition, ContentGap, GrowthTrend, InsightAnnotation, InsightKind,
        KeywordOpportunity, RankedTopic, ReportMetadata, SynthesisStatus, TopicStats, ViewRange,
        Weekday,
    };
    use ytintel_core::AnalysisFocus;

    use super::*;

    pub(super) fn sample_report() -> Report {
        let mut per_topic_stats = BTreeMap::new();
        per_topic_stats.insert(
            "gear".to_string(),
            TopicStats {
                avg_views: 2500.0,
                video_count: 4,
            },
        );
        Report {
            channel: ChannelAggregate {
                channel_name: "Test | Channel".to_string(),
                video_count: 4,
                avg_views: Measured::Value(2500.0),
                best_posting_day: Measured::Value(Weekday::Thursday),
                per_topic_stats,
                total_views: 10_000,
                avg_likes: Measured::Value(42.25),
                avg_comments: Measured::Value(6.5),
                engagement_rate: Measured::Value(3.456),
                best_posting_hour_utc: Measured::Value(15),
                growth_trend: GrowthTrend::InsufficientData,
                consistency_score: Measured::InsufficientData,
                peak_performance_range: Measured::Value(ViewRange {
                    low: 2000.0,
                    high: 3750.0,
                }),
                top_topics: vec![RankedTopic {
                    topic: "gear".to_string(),
                    avg_views: 2500.0,
                    video_count: 4,
                }],
            },
            content_gaps: vec![ContentGap {
                topic: "budget".to_string(),
                competitor_avg_views: 1_200_000.0,
                competitor_name: "Rival".to_string(),
                competitor_video_count: 5,
                target_coverage: 0,
                target_avg_views: None,
                opportunity_note: "Rival averages 1,200,000 views across 5 'budget' videos; this channel has none.".to_string(),
            }],
            keyword_opportunities: vec![KeywordOpportunity {
                keyword: "camera settings".to_string(),
                source_video_ids: vec!["t1".to_string(), "t2".to_string()],
                estimated_competition: Competition::High,
                score: 20,
                note: String::new(),
            }],
            recommendations: vec!["Say \"hello\" to budget videos".to_string()],
            insights: vec![InsightAnnotation {
                kind: InsightKind::Gap,
                id: "budget".to_string(),
                note: "Rival owns this topic.".to_string(),
            }],
            metadata: ReportMetadata {
                videos_analyzed: 4,
                videos_requested: 20,
                records_skipped: 1,
                unreliable_metrics: 0,
                transcripts_analyzed: 4,
                competitors_analyzed: 1,
                analysis_focus: AnalysisFocus::Comprehensive,
                partial_data: true,
                data_quality_notes: vec!["1 of 5 fetched records were malformed and skipped".to_string()],
                synthesis: SynthesisStatus::Generated,
                generated_at: Utc.with_ymd_and_hms(2024, 6, 1, 12, 30, 0).unwrap(),
            },
        }
    }

    #[test]
    fn measured_helpers_render_sentinel() {
        assert_eq!(views(&Measured::Value(1_234_567.4)), "1,234,567");
        assert_eq!(views(&Measured::InsufficientData), "insufficient data");
        assert_eq!(one_decimal(&Measured::Value(3.456), "%"), "3.5%");
        assert_eq!(hour(&Measured::Value(7)), "07:00");
        assert_eq!(
            view_range(&Measured::Value(ViewRange {
                low: 1600.0,
                high: 3000.0
            })),
            "1,600 - 3,000 views"
        );
        assert_eq!(view_range(&Measured::InsufficientData), "insufficient data");
    }

    #[test]
    fn write_reports_creates_three_files() {
        let dir = std::env::temp_dir().join(format!("ytintel-render-{}", std::process::id()));
        let written = write_reports(&dir, "testchannel", &sample_report()).unwrap();

        let names: Vec<_> = written
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec![
                "testchannel_report.json",
                "testchannel_report.md",
                "testchannel_report.csv"
            ]
        );

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&written[0]).unwrap()).unwrap();
        assert_eq!(json["channel"]["bestPostingDay"], "Thursday");
        assert_eq!(json["metadata"]["partialData"], true);
        assert_eq!(json["channel"]["avgComments"], 6.5);
        assert_eq!(json["channel"]["peakPerformanceRange"]["high"], 3750.0);

        std::fs::remove_dir_all(&dir).ok();
    }
}
