//! Entities produced by the pipeline. Everything here is immutable once built
//! and serializes as camelCase JSON; `Report` is the external contract.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use ytintel_core::AnalysisFocus;

/// Serialized form of [`Measured::InsufficientData`].
pub const INSUFFICIENT_DATA: &str = "insufficient-data";

/// A statistic that is either computed from at least one sample or explicitly
/// marked as lacking data. Never stands in for zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Measured<T> {
    Value(T),
    InsufficientData,
}

impl<T> Measured<T> {
    #[must_use]
    pub fn value(&self) -> Option<&T> {
        match self {
            Measured::Value(v) => Some(v),
            Measured::InsufficientData => None,
        }
    }

    #[must_use]
    pub fn is_insufficient(&self) -> bool {
        matches!(self, Measured::InsufficientData)
    }
}

impl<T> Measured<T> {
    #[must_use]
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Measured<U> {
        match self {
            Measured::Value(v) => Measured::Value(f(v)),
            Measured::InsufficientData => Measured::InsufficientData,
        }
    }
}

impl<T> From<Option<T>> for Measured<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Measured::InsufficientData, Measured::Value)
    }
}

impl<T: Serialize> Serialize for Measured<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Measured::Value(v) => v.serialize(serializer),
            Measured::InsufficientData => serializer.serialize_str(INSUFFICIENT_DATA),
        }
    }
}

impl<T: std::fmt::Display> std::fmt::Display for Measured<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Measured::Value(v) => std::fmt::Display::fmt(v, f),
            Measured::InsufficientData => f.write_str(INSUFFICIENT_DATA),
        }
    }
}

/// Day of week, Monday first. Declaration order is the tie-break order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];
}

impl From<chrono::Weekday> for Weekday {
    fn from(day: chrono::Weekday) -> Self {
        Weekday::ALL[day.num_days_from_monday() as usize]
    }
}

impl std::fmt::Display for Weekday {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

/// One validated video.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRecord {
    pub id: String,
    pub title: String,
    pub published_at: DateTime<Utc>,
    pub view_count: u64,
    pub like_count: u64,
    pub comment_count: u64,
    #[serde(skip_serializing)]
    pub transcript: Option<String>,
    /// `false` when the view count was absent or unparseable and defaulted to 0.
    pub views_reliable: bool,
    /// `false` when the like count was absent or unparseable and defaulted to 0.
    pub likes_reliable: bool,
    /// `false` when the comment count was absent or unparseable and defaulted to 0.
    pub comments_reliable: bool,
}

/// Video id → topic labels. Sorted so iteration is order-independent.
pub type TopicAssignment = BTreeMap<String, BTreeSet<String>>;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicStats {
    pub avg_views: f64,
    pub video_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedTopic {
    pub topic: String,
    pub avg_views: f64,
    pub video_count: usize,
}

/// Band of view counts a typical well-performing upload lands in:
/// 0.8× to 1.5× the channel's mean views.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewRange {
    pub low: f64,
    pub high: f64,
}

impl ViewRange {
    #[must_use]
    pub fn around_mean(avg_views: f64) -> Self {
        Self {
            low: (avg_views * 0.8).floor(),
            high: (avg_views * 1.5).floor(),
        }
    }
}

/// Direction of view counts between the older and newer half of the uploads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum GrowthTrend {
    StrongGrowth,
    SteadyGrowth,
    Stable,
    Declining,
    InsufficientData,
}

impl std::fmt::Display for GrowthTrend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            GrowthTrend::StrongGrowth => "strong growth",
            GrowthTrend::SteadyGrowth => "steady growth",
            GrowthTrend::Stable => "stable",
            GrowthTrend::Declining => "declining",
            GrowthTrend::InsufficientData => INSUFFICIENT_DATA,
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelAggregate {
    pub channel_name: String,
    pub video_count: usize,
    pub avg_views: Measured<f64>,
    pub best_posting_day: Measured<Weekday>,
    pub per_topic_stats: BTreeMap<String, TopicStats>,
    pub total_views: u64,
    pub avg_likes: Measured<f64>,
    pub avg_comments: Measured<f64>,
    /// Mean of (likes + comments) / views × 100 over videos with views.
    pub engagement_rate: Measured<f64>,
    pub best_posting_hour_utc: Measured<u32>,
    pub growth_trend: GrowthTrend,
    pub consistency_score: Measured<f64>,
    pub peak_performance_range: Measured<ViewRange>,
    pub top_topics: Vec<RankedTopic>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentGap {
    pub topic: String,
    pub competitor_avg_views: f64,
    pub competitor_name: String,
    pub competitor_video_count: usize,
    pub target_coverage: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_avg_views: Option<f64>,
    pub opportunity_note: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Competition {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Competition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Competition::Low => f.write_str("low"),
            Competition::Medium => f.write_str("medium"),
            Competition::High => f.write_str("high"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordOpportunity {
    pub keyword: String,
    pub source_video_ids: Vec<String>,
    pub estimated_competition: Competition,
    pub score: u64,
    pub note: String,
}

/// What an insight annotation or recommendation reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightKind {
    Topic,
    Gap,
    Keyword,
}

impl std::str::FromStr for InsightKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "topic" => Ok(InsightKind::Topic),
            "gap" | "content_gap" | "contentgap" => Ok(InsightKind::Gap),
            "keyword" => Ok(InsightKind::Keyword),
            other => Err(format!("unknown reference kind '{other}'")),
        }
    }
}

impl std::fmt::Display for InsightKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InsightKind::Topic => f.write_str("topic"),
            InsightKind::Gap => f.write_str("gap"),
            InsightKind::Keyword => f.write_str("keyword"),
        }
    }
}

/// A short note tied to a topic, gap or keyword computed locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightAnnotation {
    pub kind: InsightKind,
    pub id: String,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SynthesisStatus {
    Generated,
    Fallback { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetadata {
    pub videos_analyzed: usize,
    pub videos_requested: u32,
    pub records_skipped: usize,
    pub unreliable_metrics: usize,
    pub transcripts_analyzed: usize,
    pub competitors_analyzed: usize,
    pub analysis_focus: AnalysisFocus,
    pub partial_data: bool,
    pub data_quality_notes: Vec<String>,
    pub synthesis: SynthesisStatus,
    pub generated_at: DateTime<Utc>,
}

/// The single artifact of a run for one target channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub channel: ChannelAggregate,
    pub content_gaps: Vec<ContentGap>,
    pub keyword_opportunities: Vec<KeywordOpportunity>,
    pub recommendations: Vec<String>,
    pub insights: Vec<InsightAnnotation>,
    pub metadata: ReportMetadata,
}
