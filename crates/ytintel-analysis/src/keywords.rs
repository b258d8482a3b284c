//! Keyword candidates mined from the transcripts of the best-performing videos.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::types::{Competition, KeywordOpportunity, VideoRecord};

const MIN_NGRAM: usize = 2;
const MAX_NGRAM: usize = 4;
/// Document-frequency ratio at or above which a phrase is common everywhere.
const HIGH_COMPETITION_RATIO: f64 = 0.5;
/// Document-frequency ratio at or below which a phrase is rare.
const LOW_COMPETITION_RATIO: f64 = 0.25;

const DEFAULT_STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "all", "also", "am", "an", "and", "any", "are",
    "as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
    "by", "can", "could", "did", "do", "does", "doing", "don", "down", "during", "each", "even",
    "few", "for", "from", "further", "get", "got", "gonna", "had", "has", "have", "having",
    "he", "her", "here", "hers", "him", "his", "how", "i", "if", "in", "into", "is", "it",
    "its", "just", "know", "like", "ll", "me", "more", "most", "my", "no", "nor", "not", "now",
    "of", "off", "okay", "on", "once", "one", "only", "or", "other", "our", "out", "over",
    "own", "re", "really", "right", "s", "same", "say", "she", "should", "so", "some", "such",
    "t", "than", "that", "the", "their", "them", "then", "there", "these", "they", "thing",
    "things", "this", "those", "through", "to", "too", "um", "uh", "under", "until", "up",
    "us", "ve", "very", "was", "we", "well", "were", "what", "when", "where", "which", "while",
    "who", "why", "will", "with", "would", "yeah", "you", "your", "yours",
];

/// Tuning for [`extract_keywords`].
#[derive(Debug, Clone)]
pub struct KeywordSettings {
    /// How many of the most-viewed transcribed videos feed candidate scoring.
    pub top_n: usize,
    pub max_keywords: usize,
    /// Candidates seen fewer times than this across the top videos are dropped.
    pub min_frequency: usize,
    pub stop_words: HashSet<String>,
}

impl Default for KeywordSettings {
    fn default() -> Self {
        Self {
            top_n: 5,
            max_keywords: 15,
            min_frequency: 2,
            stop_words: DEFAULT_STOP_WORDS.iter().map(|w| (*w).to_string()).collect(),
        }
    }
}

#[derive(Default)]
struct Candidate {
    score: u64,
    occurrences: usize,
    sources: Vec<String>,
}

/// Extract ranked keyword opportunities from transcripts.
///
/// The top `top_n` transcribed videos by views are scored; a phrase earns
/// `occurrences × weight` per video, where the most-viewed video weighs `N`
/// and the last weighs 1. Competition is estimated from how many of *all*
/// transcribed videos mention the phrase. Returns an empty list when no video
/// has a transcript.
#[must_use]
pub fn extract_keywords(
    videos: &[VideoRecord],
    settings: &KeywordSettings,
) -> Vec<KeywordOpportunity> {
    let transcribed: Vec<&VideoRecord> =
        videos.iter().filter(|v| v.transcript.is_some()).collect();
    if transcribed.is_empty() || settings.top_n == 0 {
        return Vec::new();
    }

    let mut top = transcribed.clone();
    top.sort_by(|a, b| b.view_count.cmp(&a.view_count).then_with(|| a.id.cmp(&b.id)));
    top.truncate(settings.top_n);

    let mut candidates: HashMap<String, Candidate> = HashMap::new();
    let weight_base = top.len();
    for (rank, video) in top.iter().enumerate() {
        let weight = (weight_base - rank) as u64;
        let text = video.transcript.as_deref().unwrap_or_default();
        for (phrase, count) in phrase_counts(text, &settings.stop_words) {
            let entry = candidates.entry(phrase).or_default();
            entry.score += count as u64 * weight;
            entry.occurrences += count;
            entry.sources.push(video.id.clone());
        }
    }

    candidates.retain(|_, c| c.occurrences >= settings.min_frequency.max(1));
    if candidates.is_empty() {
        return Vec::new();
    }

    let document_sets: Vec<BTreeSet<String>> = transcribed
        .iter()
        .map(|v| {
            phrase_counts(v.transcript.as_deref().unwrap_or_default(), &settings.stop_words)
                .into_keys()
                .collect()
        })
        .collect();
    let total_docs = document_sets.len();

    let mut keywords: Vec<KeywordOpportunity> = candidates
        .into_iter()
        .map(|(phrase, candidate)| {
            let doc_freq = document_sets.iter().filter(|s| s.contains(&phrase)).count();
            let competition = competition_for(doc_freq, total_docs);
            let note = format!(
                "mentioned {} times in {} of the top {weight_base} videos; \
                 appears in {doc_freq} of {total_docs} transcripts ({competition} competition)",
                candidate.occurrences,
                candidate.sources.len(),
            );
            KeywordOpportunity {
                keyword: phrase,
                source_video_ids: candidate.sources,
                estimated_competition: competition,
                score: candidate.score,
                note,
            }
        })
        .collect();

    keywords.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| word_count(&b.keyword).cmp(&word_count(&a.keyword)))
            .then_with(|| a.keyword.cmp(&b.keyword))
    });
    keywords.truncate(settings.max_keywords);
    keywords
}

fn competition_for(doc_freq: usize, total_docs: usize) -> Competition {
    if total_docs == 0 {
        return Competition::Low;
    }
    #[allow(clippy::cast_precision_loss)]
    let ratio = doc_freq as f64 / total_docs as f64;
    if ratio >= HIGH_COMPETITION_RATIO {
        Competition::High
    } else if ratio <= LOW_COMPETITION_RATIO {
        Competition::Low
    } else {
        Competition::Medium
    }
}

fn word_count(phrase: &str) -> usize {
    phrase.split(' ').count()
}

/// Count 2–4 word phrases in `text`. Punctuation, stop words and one-letter
/// tokens break phrases rather than being skipped over, so no phrase spans them.
fn phrase_counts(text: &str, stop_words: &HashSet<String>) -> BTreeMap<String, usize> {
    let lower = text.to_lowercase();
    let mut counts = BTreeMap::new();

    for segment in lower.split(|c: char| !c.is_alphanumeric() && !c.is_whitespace()) {
        let mut run: Vec<&str> = Vec::new();
        for token in segment.split_whitespace() {
            if token.chars().count() < 2 || stop_words.contains(token) {
                count_run(&run, &mut counts);
                run.clear();
            } else {
                run.push(token);
            }
        }
        count_run(&run, &mut counts);
    }
    counts
}

fn count_run(run: &[&str], counts: &mut BTreeMap<String, usize>) {
    for n in MIN_NGRAM..=MAX_NGRAM {
        for window in run.windows(n) {
            *counts.entry(window.join(" ")).or_insert(0) += 1;
        }
    }
}
