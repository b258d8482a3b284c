//! Heuristic topic tagging by trigger-phrase matching.

use std::collections::BTreeSet;

use ytintel_core::{TopicMap, UNCATEGORIZED};

use crate::types::{TopicAssignment, VideoRecord};

/// Assign topic labels to one video.
///
/// A trigger found in the title always assigns its label. The transcript is a
/// weaker signal: it assigns a label only when one of the label's triggers
/// occurs at least `transcript_min_mentions` times. A video matching nothing
/// gets [`UNCATEGORIZED`]. Matching is case-insensitive substring search and
/// depends only on the video and the map.
#[must_use]
pub fn classify_video(
    video: &VideoRecord,
    topics: &TopicMap,
    transcript_min_mentions: usize,
) -> BTreeSet<String> {
    let title = video.title.to_lowercase();
    let transcript = video.transcript.as_deref().map(str::to_lowercase);
    let min_mentions = transcript_min_mentions.max(1);

    let mut labels: BTreeSet<String> = topics
        .iter()
        .filter(|(_, triggers)| {
            triggers.iter().any(|t| title.contains(t.as_str()))
                || transcript.as_deref().is_some_and(|text| {
                    triggers
                        .iter()
                        .any(|t| text.matches(t.as_str()).count() >= min_mentions)
                })
        })
        .map(|(label, _)| label.to_string())
        .collect();

    if labels.is_empty() {
        labels.insert(UNCATEGORIZED.to_string());
    }
    labels
}

/// Classify every video of one channel.
#[must_use]
pub fn classify_videos(
    videos: &[VideoRecord],
    topics: &TopicMap,
    transcript_min_mentions: usize,
) -> TopicAssignment {
    videos
        .iter()
        .map(|v| {
            (
                v.id.clone(),
                classify_video(v, topics, transcript_min_mentions),
            )
        })
        .collect()
}
