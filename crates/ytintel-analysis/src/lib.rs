//! Channel intelligence pipeline for ytintel.
//!
//! Raw scraper records flow strictly forward: normalize, classify, aggregate,
//! compare against competitors, mine transcript keywords, ask a reasoning
//! service for recommendations, and assemble one [`Report`] per target channel.
//! Every stage except synthesis is deterministic and pure.

pub mod aggregate;
pub mod anthropic;
pub mod classify;
pub mod config;
pub mod error;
pub mod format;
pub mod gaps;
pub mod keywords;
pub mod normalize;
pub mod pipeline;
pub mod report;
pub mod synthesize;
pub mod types;

pub use aggregate::aggregate_channel;
pub use anthropic::{resolve_credential, AnthropicClient};
pub use classify::{classify_video, classify_videos};
pub use config::AnalysisConfig;
pub use error::{AnalysisError, NormalizeError, SynthesisError};
pub use format::group_thousands;
pub use gaps::find_content_gaps;
pub use keywords::{extract_keywords, KeywordSettings};
pub use normalize::{normalize_records, NormalizationOutcome};
pub use pipeline::{analyze_channel, run};
pub use report::{assemble_report, ReportInputs};
pub use synthesize::{
    synthesize_insights, ReasoningService, Synthesis, SynthesisInput, SynthesisSettings,
    FALLBACK_RECOMMENDATION,
};
pub use types::{
    ChannelAggregate, Competition, ContentGap, GrowthTrend, InsightAnnotation, InsightKind,
    KeywordOpportunity, Measured, RankedTopic, Report, ReportMetadata, SynthesisStatus,
    TopicAssignment, TopicStats, VideoRecord, ViewRange, Weekday, INSUFFICIENT_DATA,
};
