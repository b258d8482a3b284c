use std::time::Duration;

use ytintel_core::{AppConfig, TopicMap};

use crate::keywords::KeywordSettings;
use crate::synthesize::SynthesisSettings;

/// Transcript mentions needed before a trigger assigns its topic.
pub const DEFAULT_TRANSCRIPT_MIN_MENTIONS: usize = 2;

/// Tuning knobs for one analysis run.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub topics: TopicMap,
    pub transcript_min_mentions: usize,
    /// Smallest bucket (weekday, hour, competitor topic) considered meaningful.
    pub min_sample: usize,
    /// Target underperforms a topic when below this fraction of the best competitor.
    pub gap_fraction: f64,
    pub keywords: KeywordSettings,
    pub synthesis: SynthesisSettings,
    pub max_parallel_fetches: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            topics: TopicMap::default(),
            transcript_min_mentions: DEFAULT_TRANSCRIPT_MIN_MENTIONS,
            min_sample: 2,
            gap_fraction: 0.5,
            keywords: KeywordSettings::default(),
            synthesis: SynthesisSettings::default(),
            max_parallel_fetches: 4,
        }
    }
}

impl AnalysisConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig, topics: TopicMap) -> Self {
        let defaults = Self::default();
        Self {
            topics,
            min_sample: config.min_sample,
            gap_fraction: config.gap_fraction,
            keywords: KeywordSettings {
                top_n: config.keyword_top_n,
                ..defaults.keywords
            },
            synthesis: SynthesisSettings {
                timeout: Duration::from_secs(config.reasoning_timeout_secs),
                ..defaults.synthesis
            },
            max_parallel_fetches: config.max_parallel_fetches,
            ..defaults
        }
    }
}
