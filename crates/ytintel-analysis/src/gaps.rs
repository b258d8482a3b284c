//! Target-versus-competitor topic comparison.

use std::collections::BTreeMap;

use ytintel_core::UNCATEGORIZED;

use crate::format::group_thousands;
use crate::types::{ChannelAggregate, ContentGap};

/// Strongest competitor showing for one topic.
struct BestCompetitor<'a> {
    name: &'a str,
    avg_views: f64,
    video_count: usize,
}

/// Topics competitors cover successfully that the target lacks or
/// underperforms on.
///
/// Only competitor topics with at least `min_sample` videos are considered.
/// A gap is emitted when the target has no videos in the topic, or its
/// average is below `gap_fraction` of the best competitor average. Ties
/// between competitors keep the one listed first. The result is sorted by
/// competitor average views, highest first, then by topic.
#[must_use]
pub fn find_content_gaps(
    target: &ChannelAggregate,
    competitors: &[ChannelAggregate],
    min_sample: usize,
    gap_fraction: f64,
) -> Vec<ContentGap> {
    let min_sample = min_sample.max(1);
    let mut best: BTreeMap<&str, BestCompetitor<'_>> = BTreeMap::new();

    for competitor in competitors {
        for (topic, stats) in &competitor.per_topic_stats {
            if topic == UNCATEGORIZED || stats.video_count < min_sample {
                continue;
            }
            let replace = best
                .get(topic.as_str())
                .is_none_or(|current| stats.avg_views > current.avg_views);
            if replace {
                best.insert(
                    topic.as_str(),
                    BestCompetitor {
                        name: &competitor.channel_name,
                        avg_views: stats.avg_views,
                        video_count: stats.video_count,
                    },
                );
            }
        }
    }

    let mut gaps: Vec<ContentGap> = best
        .into_iter()
        .filter_map(|(topic, best)| {
            let target_stats = target.per_topic_stats.get(topic);
            let target_coverage = target_stats.map_or(0, |s| s.video_count);
            let target_avg_views = target_stats.map(|s| s.avg_views);

            let is_gap = target_coverage == 0
                || target_avg_views.is_some_and(|avg| avg < gap_fraction * best.avg_views);
            if !is_gap {
                return None;
            }

            Some(ContentGap {
                topic: topic.to_string(),
                competitor_avg_views: best.avg_views,
                competitor_name: best.name.to_string(),
                competitor_video_count: best.video_count,
                target_coverage,
                target_avg_views,
                opportunity_note: opportunity_note(topic, &best, target_coverage, target_avg_views),
            })
        })
        .collect();

    gaps.sort_by(|a, b| {
        b.competitor_avg_views
            .total_cmp(&a.competitor_avg_views)
            .then_with(|| a.topic.cmp(&b.topic))
    });
    gaps
}

fn opportunity_note(
    topic: &str,
    best: &BestCompetitor<'_>,
    target_coverage: usize,
    target_avg_views: Option<f64>,
) -> String {
    let competitor = format!(
        "{} averages {} views across {} '{topic}' videos",
        best.name,
        group_thousands(best.avg_views),
        best.video_count
    );
    match target_avg_views {
        Some(avg) if target_coverage > 0 => format!(
            "{competitor}; this channel averages {} across {target_coverage}.",
            group_thousands(avg)
        ),
        _ => format!("{competitor}; this channel has none."),
    }
}
