//! Topic trigger vocabulary: label → set of lowercase trigger phrases.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::Deserialize;

use crate::ConfigError;

/// Synthetic label for videos that match no configured topic.
pub const UNCATEGORIZED: &str = "uncategorized";

const DEFAULT_TOPICS: &[(&str, &[&str])] = &[
    (
        "tutorial",
        &["tutorial", "how to", "step by step", "guide", "explained", "for beginners"],
    ),
    (
        "review",
        &["review", "unboxing", "hands-on", "hands on", "first impressions", "worth it"],
    ),
    (
        "comparison",
        &["versus", "vs.", "compared", "comparison", "which is better"],
    ),
    (
        "budget",
        &["budget", "cheap", "affordable", "save money", "under $", "frugal"],
    ),
    (
        "productivity",
        &["productivity", "routine", "workflow", "habits", "time management"],
    ),
    (
        "vlog",
        &["vlog", "day in the life", "behind the scenes", "my week"],
    ),
    (
        "challenge",
        &["challenge", "i tried", "24 hours", "experiment"],
    ),
    ("news", &["news", "announced", "breaking", "leaked"]),
    ("listicle", &["top 10", "top 5", "things you", "tips", "mistakes"]),
    ("story", &["story time", "storytime", "my journey", "my story"]),
    ("q&a", &["q&a", "q and a", "ask me anything", "answering your"]),
];

/// Validated topic vocabulary. Labels and triggers are kept in sorted sets so
/// iteration order never depends on input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicMap {
    topics: BTreeMap<String, BTreeSet<String>>,
}

#[derive(Debug, Deserialize)]
struct TopicsFile {
    topics: BTreeMap<String, Vec<String>>,
}

impl TopicMap {
    /// Build a topic map, normalising triggers to trimmed lowercase.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] for an empty map, a blank label, the
    /// reserved `uncategorized` label, a label with no triggers, or a blank trigger.
    pub fn new<L, T, I>(entries: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (L, Vec<T>)>,
        L: AsRef<str>,
        T: AsRef<str>,
    {
        let mut topics: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

        for (label, triggers) in entries {
            let label = label.as_ref().trim();
            if label.is_empty() {
                return Err(ConfigError::Validation(
                    "topic label must be non-empty".to_string(),
                ));
            }
            if label.eq_ignore_ascii_case(UNCATEGORIZED) {
                return Err(ConfigError::Validation(format!(
                    "'{UNCATEGORIZED}' is reserved for videos matching no topic"
                )));
            }

            let mut normalized = BTreeSet::new();
            for trigger in &triggers {
                let trigger = trigger.as_ref().trim().to_lowercase();
                if trigger.is_empty() {
                    return Err(ConfigError::Validation(format!(
                        "topic '{label}' has a blank trigger phrase"
                    )));
                }
                normalized.insert(trigger);
            }
            if normalized.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "topic '{label}' has no trigger phrases"
                )));
            }

            topics
                .entry(label.to_string())
                .or_default()
                .extend(normalized);
        }

        if topics.is_empty() {
            return Err(ConfigError::Validation(
                "topic map must define at least one topic".to_string(),
            ));
        }

        Ok(Self { topics })
    }

    /// Iterate `(label, triggers)` in label order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeSet<String>)> {
        self.topics.iter().map(|(label, triggers)| (label.as_str(), triggers))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.topics.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }
}

impl Default for TopicMap {
    fn default() -> Self {
        let topics = DEFAULT_TOPICS
            .iter()
            .map(|(label, triggers)| {
                (
                    (*label).to_string(),
                    triggers.iter().map(|t| (*t).to_string()).collect(),
                )
            })
            .collect();
        Self { topics }
    }
}

/// Load and validate a topic map from a YAML file of the form:
///
/// ```yaml
/// topics:
///   budget: ["budget", "cheap"]
///   gear: ["camera", "lens"]
/// ```
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_topic_map(path: &Path) -> Result<TopicMap, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::TopicsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_topic_map(&content)
}

fn parse_topic_map(content: &str) -> Result<TopicMap, ConfigError> {
    let file: TopicsFile = serde_yaml::from_str(content)?;
    TopicMap::new(file.topics)
}
