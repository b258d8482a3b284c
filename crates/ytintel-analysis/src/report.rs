//! Final merge of every component's output into one [`Report`].

use chrono::{DateTime, Utc};
use ytintel_core::AnalysisFocus;

use crate::synthesize::Synthesis;
use crate::types::{ChannelAggregate, ContentGap, KeywordOpportunity, Report, ReportMetadata};

/// Everything the assembler needs for one target channel.
#[derive(Debug, Clone)]
pub struct ReportInputs {
    pub channel: ChannelAggregate,
    pub content_gaps: Vec<ContentGap>,
    pub keyword_opportunities: Vec<KeywordOpportunity>,
    pub synthesis: Synthesis,
    /// Records that survived normalization.
    pub videos_analyzed: usize,
    pub videos_requested: u32,
    pub records_skipped: usize,
    pub unreliable_metrics: usize,
    pub transcripts_analyzed: usize,
    pub competitors_analyzed: usize,
    pub analysis_focus: AnalysisFocus,
    /// One entry per failed fetch (target or competitor).
    pub fetch_failures: Vec<String>,
    pub generated_at: DateTime<Utc>,
}

/// Merge component outputs. Pure: the same inputs always give the same report.
///
/// `partialData` is set, with one note per cause, when the normalized count
/// disagrees with the aggregate, falls outside `1..=videos_requested`, any
/// record was skipped, or any fetch failed. Unreliable metrics only add a note.
#[must_use]
pub fn assemble_report(inputs: ReportInputs) -> Report {
    let mut partial_notes = Vec::new();

    if inputs.videos_analyzed != inputs.channel.video_count {
        partial_notes.push(format!(
            "{} videos were normalized but the channel aggregate covers {}",
            inputs.videos_analyzed, inputs.channel.video_count
        ));
    }

    let requested = usize::try_from(inputs.videos_requested).unwrap_or(usize::MAX);
    if inputs.videos_analyzed == 0 {
        partial_notes.push("no usable videos were available for this channel".to_string());
    } else if inputs.videos_analyzed > requested {
        partial_notes.push(format!(
            "{} videos analyzed, more than the {} requested",
            inputs.videos_analyzed, inputs.videos_requested
        ));
    }

    if inputs.records_skipped > 0 {
        partial_notes.push(format!(
            "{} of {} fetched records were malformed and skipped",
            inputs.records_skipped,
            inputs.records_skipped + inputs.videos_analyzed
        ));
    }

    partial_notes.extend(inputs.fetch_failures);

    let partial_data = !partial_notes.is_empty();
    let mut data_quality_notes = partial_notes;
    if inputs.unreliable_metrics > 0 {
        data_quality_notes.push(format!(
            "{} records had missing or unparseable view or like counts, counted as 0",
            inputs.unreliable_metrics
        ));
    }

    Report {
        channel: inputs.channel,
        content_gaps: inputs.content_gaps,
        keyword_opportunities: inputs.keyword_opportunities,
        recommendations: inputs.synthesis.recommendations,
        insights: inputs.synthesis.insights,
        metadata: ReportMetadata {
            videos_analyzed: inputs.videos_analyzed,
            videos_requested: inputs.videos_requested,
            records_skipped: inputs.records_skipped,
            unreliable_metrics: inputs.unreliable_metrics,
            transcripts_analyzed: inputs.transcripts_analyzed,
            competitors_analyzed: inputs.competitors_analyzed,
            analysis_focus: inputs.analysis_focus,
            partial_data,
            data_quality_notes,
            synthesis: inputs.synthesis.status,
            generated_at: inputs.generated_at,
        },
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::TimeZone;

    use super::*;
    use crate::types::{GrowthTrend, Measured, SynthesisStatus};

    fn channel(video_count: usize) -> ChannelAggregate {
        ChannelAggregate {
            channel_name: "Test".to_string(),
            video_count,
            avg_views: Measured::InsufficientData,
            best_posting_day: Measured::InsufficientData,
            per_topic_stats: BTreeMap::new(),
            total_views: 0,
            avg_likes: Measured::InsufficientData,
            avg_comments: Measured::InsufficientData,
            engagement_rate: Measured::InsufficientData,
            best_posting_hour_utc: Measured::InsufficientData,
            growth_trend: GrowthTrend::InsufficientData,
            consistency_score: Measured::InsufficientData,
            peak_performance_range: Measured::InsufficientData,
            top_topics: Vec::new(),
        }
    }

    fn inputs(videos_analyzed: usize) -> ReportInputs {
        ReportInputs {
            channel: channel(videos_analyzed),
            content_gaps: Vec::new(),
            keyword_opportunities: Vec::new(),
            synthesis: Synthesis {
                recommendations: vec!["Post more budget videos".to_string()],
                insights: Vec::new(),
                status: SynthesisStatus::Generated,
            },
            videos_analyzed,
            videos_requested: 20,
            records_skipped: 0,
            unreliable_metrics: 0,
            transcripts_analyzed: 0,
            competitors_analyzed: 0,
            analysis_focus: AnalysisFocus::Comprehensive,
            fetch_failures: Vec::new(),
            generated_at: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn complete_run_is_not_partial() {
        let report = assemble_report(inputs(20));
        assert!(!report.metadata.partial_data);
        assert!(report.metadata.data_quality_notes.is_empty());
        assert_eq!(report.recommendations, vec!["Post more budget videos"]);
    }

    #[test]
    fn skipped_records_mark_partial() {
        let mut i = inputs(10);
        i.records_skipped = 10;
        let report = assemble_report(i);

        assert!(report.metadata.partial_data);
        assert_eq!(report.metadata.videos_analyzed, 10);
        assert_eq!(report.metadata.records_skipped, 10);
        assert!(report.metadata.data_quality_notes[0].contains("10 of 20"));
    }

    #[test]
    fn zero_videos_mark_partial() {
        let report = assemble_report(inputs(0));
        assert!(report.metadata.partial_data);
    }

    #[test]
    fn count_mismatch_marks_partial() {
        let mut i = inputs(12);
        i.channel = channel(11);
        assert!(assemble_report(i).metadata.partial_data);
    }

    #[test]
    fn fetch_failures_become_notes() {
        let mut i = inputs(20);
        i.fetch_failures = vec!["competitor '@rival' could not be fetched".to_string()];
        let report = assemble_report(i);
        assert!(report.metadata.partial_data);
        assert_eq!(
            report.metadata.data_quality_notes,
            vec!["competitor '@rival' could not be fetched"]
        );
    }

    #[test]
    fn unreliable_metrics_note_without_partial() {
        let mut i = inputs(20);
        i.unreliable_metrics = 3;
        let report = assemble_report(i);
        assert!(!report.metadata.partial_data);
        assert_eq!(report.metadata.data_quality_notes.len(), 1);
    }

    #[test]
    fn report_serializes_camel_case_contract() {
        let json = serde_json::to_value(assemble_report(inputs(20))).unwrap();
        for key in [
            "channel",
            "contentGaps",
            "keywordOpportunities",
            "recommendations",
            "insights",
            "metadata",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert_eq!(json["metadata"]["partialData"], false);
        assert_eq!(json["metadata"]["synthesis"]["status"], "generated");
        assert_eq!(json["metadata"]["analysisFocus"], "comprehensive");
        assert_eq!(json["channel"]["avgViews"], "insufficient-data");
    }
}
