//! Per-channel summary statistics.

use std::collections::BTreeMap;

use chrono::{Datelike, Timelike};
use ytintel_core::UNCATEGORIZED;

use crate::types::{
    ChannelAggregate, GrowthTrend, Measured, RankedTopic, TopicAssignment, TopicStats,
    VideoRecord, ViewRange, Weekday,
};

const TOP_TOPICS: usize = 10;
/// Growth trend needs at least this many uploads to compare two halves.
const GROWTH_MIN_VIDEOS: usize = 10;
/// Consistency needs more than this many uploads.
const CONSISTENCY_MIN_VIDEOS: usize = 5;

/// Build the aggregate for one channel from its classified videos.
///
/// Buckets (weekday, hour) with fewer than `min_sample` videos are never
/// chosen as "best"; ties go to the earliest bucket. A video tagged with
/// several topics counts toward each of them. Counts are summed in `u128`, so
/// saturated counts from scraped records cannot overflow.
#[must_use]
pub fn aggregate_channel(
    channel_name: &str,
    videos: &[VideoRecord],
    topics: &TopicAssignment,
    min_sample: usize,
) -> ChannelAggregate {
    let min_sample = min_sample.max(1);
    let views: Vec<u64> = videos.iter().map(|v| v.view_count).collect();

    let per_topic_stats = per_topic_stats(videos, topics);
    let mut top_topics: Vec<RankedTopic> = per_topic_stats
        .iter()
        .filter(|(topic, _)| topic.as_str() != UNCATEGORIZED)
        .map(|(topic, stats)| RankedTopic {
            topic: topic.clone(),
            avg_views: stats.avg_views,
            video_count: stats.video_count,
        })
        .collect();
    top_topics.sort_by(|a, b| {
        b.avg_views
            .total_cmp(&a.avg_views)
            .then_with(|| a.topic.cmp(&b.topic))
    });
    top_topics.truncate(TOP_TOPICS);

    let best_day = best_bucket(
        videos,
        7,
        |v| v.published_at.weekday().num_days_from_monday() as usize,
        min_sample,
    );
    let best_hour = best_bucket(videos, 24, |v| v.published_at.hour() as usize, min_sample);

    let avg_views: Measured<f64> = mean(&views).into();
    let reliable_mean = |reliable: fn(&VideoRecord) -> bool, count: fn(&VideoRecord) -> u64| {
        let values: Vec<u64> = videos.iter().filter(|v| reliable(v)).map(count).collect();
        Measured::from(mean(&values))
    };

    ChannelAggregate {
        channel_name: channel_name.to_string(),
        video_count: videos.len(),
        avg_views,
        best_posting_day: best_day.map(|idx| Weekday::ALL[idx]).into(),
        per_topic_stats,
        total_views: u64::try_from(sum(&views)).unwrap_or(u64::MAX),
        avg_likes: reliable_mean(|v| v.likes_reliable, |v| v.like_count),
        avg_comments: reliable_mean(|v| v.comments_reliable, |v| v.comment_count),
        engagement_rate: engagement_rate(videos),
        best_posting_hour_utc: best_hour
            .and_then(|h| u32::try_from(h).ok())
            .into(),
        growth_trend: growth_trend(videos),
        consistency_score: consistency_score(&views),
        peak_performance_range: avg_views.map(ViewRange::around_mean),
        top_topics,
    }
}

fn per_topic_stats(
    videos: &[VideoRecord],
    topics: &TopicAssignment,
) -> BTreeMap<String, TopicStats> {
    let mut sums: BTreeMap<&str, (u128, usize)> = BTreeMap::new();
    for video in videos {
        let Some(labels) = topics.get(&video.id) else {
            continue;
        };
        for label in labels {
            let entry = sums.entry(label.as_str()).or_default();
            entry.0 += u128::from(video.view_count);
            entry.1 += 1;
        }
    }
    sums.into_iter()
        .map(|(label, (sum, count))| {
            (
                label.to_string(),
                TopicStats {
                    avg_views: as_f64(sum) / as_f64_usize(count),
                    video_count: count,
                },
            )
        })
        .collect()
}

/// Index of the bucket with the highest mean views among buckets holding at
/// least `min_sample` videos. Strict comparison keeps the earliest on ties.
fn best_bucket<F>(
    videos: &[VideoRecord],
    buckets: usize,
    key: F,
    min_sample: usize,
) -> Option<usize>
where
    F: Fn(&VideoRecord) -> usize,
{
    let mut sums = vec![(0u128, 0usize); buckets];
    for video in videos {
        let slot = &mut sums[key(video)];
        slot.0 += u128::from(video.view_count);
        slot.1 += 1;
    }

    let mut best: Option<(usize, f64)> = None;
    for (idx, (sum, count)) in sums.into_iter().enumerate() {
        if count < min_sample {
            continue;
        }
        let avg = as_f64(sum) / as_f64_usize(count);
        if best.is_none_or(|(_, best_avg)| avg > best_avg) {
            best = Some((idx, avg));
        }
    }
    best.map(|(idx, _)| idx)
}

fn engagement_rate(videos: &[VideoRecord]) -> Measured<f64> {
    let rates: Vec<f64> = videos
        .iter()
        .filter(|v| v.view_count > 0)
        .map(|v| {
            as_f64(u128::from(v.like_count) + u128::from(v.comment_count)) * 100.0
                / as_f64(u128::from(v.view_count))
        })
        .collect();
    if rates.is_empty() {
        return Measured::InsufficientData;
    }
    Measured::Value(rates.iter().sum::<f64>() / as_f64_usize(rates.len()))
}

/// Compare mean views of the older half of uploads against the newer half.
fn growth_trend(videos: &[VideoRecord]) -> GrowthTrend {
    if videos.len() < GROWTH_MIN_VIDEOS {
        return GrowthTrend::InsufficientData;
    }
    let mut ordered: Vec<&VideoRecord> = videos.iter().collect();
    ordered.sort_by(|a, b| a.published_at.cmp(&b.published_at).then_with(|| a.id.cmp(&b.id)));

    let (older, newer) = ordered.split_at(ordered.len() / 2);
    let half_avg = |half: &[&VideoRecord]| {
        let total: u128 = half.iter().map(|v| u128::from(v.view_count)).sum();
        as_f64(total) / as_f64_usize(half.len())
    };
    let older_avg = half_avg(older);
    let newer_avg = half_avg(newer);

    let growth = if older_avg > 0.0 {
        (newer_avg - older_avg) / older_avg * 100.0
    } else {
        0.0
    };

    if growth > 20.0 {
        GrowthTrend::StrongGrowth
    } else if growth > 0.0 {
        GrowthTrend::SteadyGrowth
    } else if growth > -20.0 {
        GrowthTrend::Stable
    } else {
        GrowthTrend::Declining
    }
}

/// `100 - min(stddev / mean × 100, 100)`; 0 when the mean is 0.
fn consistency_score(views: &[u64]) -> Measured<f64> {
    if views.len() <= CONSISTENCY_MIN_VIDEOS {
        return Measured::InsufficientData;
    }
    let Some(mean) = mean(views) else {
        return Measured::InsufficientData;
    };
    if mean <= 0.0 {
        return Measured::Value(0.0);
    }
    let variance = views
        .iter()
        .map(|&v| (as_f64(u128::from(v)) - mean).powi(2))
        .sum::<f64>()
        / as_f64_usize(views.len());
    let cv = variance.sqrt() / mean * 100.0;
    Measured::Value(100.0 - cv.min(100.0))
}

fn mean(values: &[u64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(as_f64(sum(values)) / as_f64_usize(values.len()))
}

fn sum(values: &[u64]) -> u128 {
    values.iter().map(|&v| u128::from(v)).sum()
}

#[allow(clippy::cast_precision_loss)]
fn as_f64(n: u128) -> f64 {
    n as f64
}

#[allow(clippy::cast_precision_loss)]
fn as_f64_usize(n: usize) -> f64 {
    n as f64
}
