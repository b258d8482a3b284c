//! Markdown document renderer.

use ytintel_analysis::{group_thousands, Report, SynthesisStatus};

use super::{hour, one_decimal, view_range, views};

/// Render the human-readable report document.
pub(crate) fn render_markdown(report: &Report) -> String {
    let channel = &report.channel;
    let meta = &report.metadata;
    let mut lines: Vec<String> = Vec::new();

    lines.push(format!("# Channel Report: {}", channel.channel_name));
    lines.push(String::new());
    lines.push(format!(
        "**Generated**: {}",
        meta.generated_at.format("%Y-%m-%d %H:%M UTC")
    ));
    lines.push(format!(
        "**Videos analyzed**: {} of {} requested",
        meta.videos_analyzed, meta.videos_requested
    ));
    lines.push(format!("**Competitors analyzed**: {}", meta.competitors_analyzed));
    lines.push(format!("**Analysis focus**: {}", meta.analysis_focus));
    lines.push(match &meta.synthesis {
        SynthesisStatus::Generated => "**Recommendations**: generated".to_string(),
        SynthesisStatus::Fallback { reason } => {
            format!("**Recommendations**: unavailable ({reason})")
        }
    });
    if meta.partial_data {
        lines.push(String::new());
        lines.push("> **Partial data**: see the data quality section below.".to_string());
    }
    lines.push(String::new());
    lines.push("---".to_string());
    lines.push(String::new());

    lines.push("## Channel Summary".to_string());
    lines.push(String::new());
    lines.push("| Metric | Value |".to_string());
    lines.push("|--------|-------|".to_string());
    let summary = [
        ("Total views", group_thousands(as_f64(channel.total_views))),
        ("Average views", views(&channel.avg_views)),
        ("Average likes", views(&channel.avg_likes)),
        ("Average comments", views(&channel.avg_comments)),
        ("Engagement rate", one_decimal(&channel.engagement_rate, "%")),
        ("Best posting day", day_label(report)),
        ("Best posting hour (UTC)", hour(&channel.best_posting_hour_utc)),
        ("Growth trend", channel.growth_trend.to_string()),
        ("Consistency score", one_decimal(&channel.consistency_score, "")),
        ("Peak performance range", view_range(&channel.peak_performance_range)),
    ];
    for (metric, value) in summary {
        lines.push(format!("| {metric} | {} |", cell(&value)));
    }
    lines.push(String::new());

    lines.push("## Top Topics".to_string());
    lines.push(String::new());
    if channel.top_topics.is_empty() {
        lines.push("_No categorized videos._".to_string());
    } else {
        lines.push("| Topic | Avg Views | Videos |".to_string());
        lines.push("|-------|-----------|--------|".to_string());
        for topic in &channel.top_topics {
            lines.push(format!(
                "| {} | {} | {} |",
                cell(&topic.topic),
                group_thousands(topic.avg_views),
                topic.video_count
            ));
        }
    }
    lines.push(String::new());

    lines.push("## Content Gaps".to_string());
    lines.push(String::new());
    if report.content_gaps.is_empty() {
        lines.push("_No content gaps found._".to_string());
    } else {
        lines.push("| Topic | Competitor | Competitor Avg Views | Your Videos | Opportunity |".to_string());
        lines.push("|-------|------------|----------------------|-------------|-------------|".to_string());
        for gap in &report.content_gaps {
            lines.push(format!(
                "| {} | {} | {} | {} | {} |",
                cell(&gap.topic),
                cell(&gap.competitor_name),
                group_thousands(gap.competitor_avg_views),
                gap.target_coverage,
                cell(&gap.opportunity_note)
            ));
        }
    }
    lines.push(String::new());

    lines.push("## Keyword Opportunities".to_string());
    lines.push(String::new());
    if report.keyword_opportunities.is_empty() {
        lines.push("_No keyword opportunities (no transcripts analyzed)._".to_string());
    } else {
        lines.push("| Keyword | Score | Competition | Source Videos |".to_string());
        lines.push("|---------|-------|-------------|---------------|".to_string());
        for keyword in &report.keyword_opportunities {
            lines.push(format!(
                "| {} | {} | {} | {} |",
                cell(&keyword.keyword),
                keyword.score,
                keyword.estimated_competition,
                keyword.source_video_ids.join(", ")
            ));
        }
    }
    lines.push(String::new());

    lines.push("## Recommendations".to_string());
    lines.push(String::new());
    for (i, rec) in report.recommendations.iter().enumerate() {
        lines.push(format!("{}. {rec}", i + 1));
    }
    lines.push(String::new());

    if !report.insights.is_empty() {
        lines.push("## Insights".to_string());
        lines.push(String::new());
        for insight in &report.insights {
            lines.push(format!(
                "- **{}** `{}`: {}",
                insight.kind, insight.id, insight.note
            ));
        }
        lines.push(String::new());
    }

    lines.push("## Data Quality".to_string());
    lines.push(String::new());
    lines.push(format!(
        "- Records skipped: {}\n- Records with unreliable counts: {}\n- Transcripts analyzed: {}",
        meta.records_skipped, meta.unreliable_metrics, meta.transcripts_analyzed
    ));
    for note in &meta.data_quality_notes {
        lines.push(format!("- {note}"));
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn day_label(report: &Report) -> String {
    report
        .channel
        .best_posting_day
        .value()
        .map_or_else(|| "insufficient data".to_string(), ToString::to_string)
}

#[allow(clippy::cast_precision_loss)]
fn as_f64(n: u64) -> f64 {
    n as f64
}

/// Escape table-breaking characters inside a cell.
fn cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}
