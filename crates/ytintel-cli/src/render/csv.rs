//! Spreadsheet export. Every field is quoted so commas in notes and grouped
//! numbers never shift columns.

use ytintel_analysis::{group_thousands, Report};

use super::{hour, one_decimal, view_range, views};

pub(crate) fn render_csv(report: &Report) -> String {
    let channel = &report.channel;
    let mut rows: Vec<Vec<String>> = Vec::new();

    rows.push(vec![format!("Channel Report: {}", channel.channel_name)]);
    rows.push(vec![]);

    rows.push(vec!["SUMMARY METRICS".to_string()]);
    rows.push(vec!["Metric".to_string(), "Value".to_string()]);
    let summary = [
        ("Videos Analyzed", report.metadata.videos_analyzed.to_string()),
        ("Total Views", channel.total_views.to_string()),
        ("Average Views", views(&channel.avg_views)),
        ("Average Comments", views(&channel.avg_comments)),
        ("Engagement Rate", one_decimal(&channel.engagement_rate, "%")),
        ("Best Posting Day", channel.best_posting_day.to_string()),
        ("Best Posting Hour (UTC)", hour(&channel.best_posting_hour_utc)),
        ("Growth Trend", channel.growth_trend.to_string()),
        ("Consistency Score", one_decimal(&channel.consistency_score, "")),
        ("Peak Performance Range", view_range(&channel.peak_performance_range)),
        ("Partial Data", report.metadata.partial_data.to_string()),
    ];
    rows.extend(
        summary
            .into_iter()
            .map(|(metric, value)| vec![metric.to_string(), value]),
    );
    rows.push(vec![]);

    rows.push(vec!["TOP PERFORMING TOPICS".to_string()]);
    rows.push(strings(&["Topic", "Avg Views", "Video Count"]));
    for topic in &channel.top_topics {
        rows.push(vec![
            topic.topic.clone(),
            group_thousands(topic.avg_views),
            topic.video_count.to_string(),
        ]);
    }
    rows.push(vec![]);

    if !report.content_gaps.is_empty() {
        rows.push(vec!["CONTENT GAP OPPORTUNITIES".to_string()]);
        rows.push(strings(&[
            "Topic",
            "Competitor",
            "Competitor Avg Views",
            "Your Videos",
            "Opportunity",
        ]));
        for gap in &report.content_gaps {
            rows.push(vec![
                gap.topic.clone(),
                gap.competitor_name.clone(),
                group_thousands(gap.competitor_avg_views),
                gap.target_coverage.to_string(),
                gap.opportunity_note.clone(),
            ]);
        }
        rows.push(vec![]);
    }

    if !report.keyword_opportunities.is_empty() {
        rows.push(vec!["KEYWORD OPPORTUNITIES".to_string()]);
        rows.push(strings(&["Keyword", "Score", "Competition", "Source Videos"]));
        for keyword in &report.keyword_opportunities {
            rows.push(vec![
                keyword.keyword.clone(),
                keyword.score.to_string(),
                keyword.estimated_competition.to_string(),
                keyword.source_video_ids.join(" "),
            ]);
        }
        rows.push(vec![]);
    }

    rows.push(vec!["ACTIONABLE RECOMMENDATIONS".to_string()]);
    for (i, rec) in report.recommendations.iter().enumerate() {
        rows.push(vec![format!("{}. {rec}", i + 1)]);
    }

    let mut out = String::new();
    for row in rows {
        out.push_str(&quote_row(&row));
        out.push('\n');
    }
    out
}

fn strings(fields: &[&str]) -> Vec<String> {
    fields.iter().map(|f| (*f).to_string()).collect()
}

fn quote_row(fields: &[String]) -> String {
    fields
        .iter()
        .map(|f| format!("\"{}\"", f.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(",")
}
