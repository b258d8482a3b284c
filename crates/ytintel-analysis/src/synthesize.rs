//! Qualitative recommendations from an external reasoning service, validated
//! against the locally computed aggregates before they reach the report.
//!
//! Only deterministic data is sent out: the channel aggregate, content gaps
//! and keyword opportunities. Transcripts never leave the process. Output that
//! cites unknown identifiers or numbers absent from the local data is dropped;
//! if nothing survives, the run falls back to a fixed recommendation.

use std::collections::HashMap;
use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use ytintel_core::AnalysisFocus;

use crate::error::SynthesisError;
use crate::types::{
    ChannelAggregate, ContentGap, InsightAnnotation, InsightKind, KeywordOpportunity,
    SynthesisStatus,
};

/// Sole recommendation of a report whose synthesis failed.
pub const FALLBACK_RECOMMENDATION: &str = "insufficient data to synthesize recommendations";

/// Relative tolerance when matching a quoted figure to a local number.
const FIGURE_TOLERANCE: f64 = 0.01;
/// Figures below this are small counts ("3 uploads a week") and are not checked.
const FIGURE_CHECK_THRESHOLD: f64 = 100.0;

static FIGURE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b\d[\d,]*(?:\.\d+)?(?:\s?(?:[kmb]|thousand|million|billion)\b)?")
        .expect("valid regex")
});

const SYSTEM_PROMPT: &str = "You are a YouTube content strategist. You only reason about the \
statistics you are given and never invent numbers. You answer with a single JSON object and \
nothing else.";

/// Anything that can turn a prompt into text. Implemented by the Anthropic
/// client and by fakes in tests.
#[async_trait]
pub trait ReasoningService: Send + Sync {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, SynthesisError>;

    /// Short identifier used in logs.
    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone)]
pub struct SynthesisSettings {
    pub min_recommendations: usize,
    pub max_recommendations: usize,
    pub max_insights: usize,
    pub timeout: Duration,
}

impl Default for SynthesisSettings {
    fn default() -> Self {
        Self {
            min_recommendations: 5,
            max_recommendations: 7,
            max_insights: 10,
            timeout: Duration::from_secs(45),
        }
    }
}

/// Deterministic inputs forwarded to the reasoning service.
#[derive(Debug, Clone, Copy)]
pub struct SynthesisInput<'a> {
    pub channel: &'a ChannelAggregate,
    pub gaps: &'a [ContentGap],
    pub keywords: &'a [KeywordOpportunity],
    pub focus: AnalysisFocus,
}

/// What the synthesizer contributes to a report.
#[derive(Debug, Clone, PartialEq)]
pub struct Synthesis {
    pub recommendations: Vec<String>,
    pub insights: Vec<InsightAnnotation>,
    pub status: SynthesisStatus,
}

impl Synthesis {
    #[must_use]
    pub fn fallback(reason: &SynthesisError) -> Self {
        Self {
            recommendations: vec![FALLBACK_RECOMMENDATION.to_string()],
            insights: Vec::new(),
            status: SynthesisStatus::Fallback {
                reason: reason.to_string(),
            },
        }
    }
}

/// Ask the reasoning service for recommendations and keep only those that
/// survive validation. Never fails: any problem yields [`Synthesis::fallback`].
pub async fn synthesize_insights(
    service: Option<&dyn ReasoningService>,
    input: SynthesisInput<'_>,
    settings: &SynthesisSettings,
) -> Synthesis {
    match request_synthesis(service, input, settings).await {
        Ok((recommendations, insights)) => Synthesis {
            recommendations,
            insights,
            status: SynthesisStatus::Generated,
        },
        Err(e) => {
            tracing::warn!(
                channel = %input.channel.channel_name,
                error = %e,
                "synthesis unavailable; using fallback recommendation"
            );
            Synthesis::fallback(&e)
        }
    }
}

async fn request_synthesis(
    service: Option<&dyn ReasoningService>,
    input: SynthesisInput<'_>,
    settings: &SynthesisSettings,
) -> Result<(Vec<String>, Vec<InsightAnnotation>), SynthesisError> {
    let service = service.ok_or(SynthesisError::MissingCredential)?;
    let prompt = build_prompt(input, settings)?;

    tracing::debug!(
        service = service.name(),
        prompt_chars = prompt.len(),
        "requesting synthesis"
    );
    let raw = tokio::time::timeout(settings.timeout, service.complete(SYSTEM_PROMPT, &prompt))
        .await
        .map_err(|_| SynthesisError::Timeout {
            secs: settings.timeout.as_secs(),
        })??;

    validate_response(&raw, input, settings)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PromptData<'a> {
    analysis_focus: AnalysisFocus,
    channel: &'a ChannelAggregate,
    content_gaps: &'a [ContentGap],
    keyword_opportunities: &'a [KeywordOpportunity],
}

/// Render the user prompt: instructions, valid identifiers and the data.
///
/// # Errors
///
/// Returns [`SynthesisError::Malformed`] if the data cannot be serialized.
pub fn build_prompt(
    input: SynthesisInput<'_>,
    settings: &SynthesisSettings,
) -> Result<String, SynthesisError> {
    let data = serde_json::to_string_pretty(&PromptData {
        analysis_focus: input.focus,
        channel: input.channel,
        content_gaps: input.gaps,
        keyword_opportunities: input.keywords,
    })
    .map_err(|e| SynthesisError::Malformed(format!("could not serialize prompt data: {e}")))?;

    let focus = match input.focus {
        AnalysisFocus::Comprehensive => {
            "Balance topic strategy, competitor content gaps and keyword targeting."
        }
        AnalysisFocus::Topics => "Concentrate on which topics the channel should make more or less of.",
        AnalysisFocus::Competitors => "Concentrate on the content gaps against competitor channels.",
        AnalysisFocus::Keywords => "Concentrate on keyword and search opportunities.",
    };

    let ids = |values: Vec<&str>| {
        if values.is_empty() {
            "(none)".to_string()
        } else {
            values.join(", ")
        }
    };
    let topic_ids = ids(input.channel.per_topic_stats.keys().map(String::as_str).collect());
    let gap_ids = ids(input.gaps.iter().map(|g| g.topic.as_str()).collect());
    let keyword_ids = ids(input.keywords.iter().map(|k| k.keyword.as_str()).collect());

    Ok(format!(
        "Analyze the YouTube channel statistics below and write between {min} and {max} \
actionable recommendations for the creator.\n\
{focus}\n\n\
Respond with JSON of exactly this shape:\n\
{{\"recommendations\": [{{\"text\": \"...\", \"references\": [{{\"kind\": \"topic|gap|keyword\", \"id\": \"...\"}}]}}], \
\"insights\": [{{\"kind\": \"topic|gap|keyword\", \"id\": \"...\", \"note\": \"...\"}}]}}\n\n\
Rules:\n\
- Every recommendation references at least one identifier from the lists below.\n\
- Only quote numbers that appear in the data; do not estimate or round large figures.\n\
- Insights are one sentence each and reference one identifier.\n\n\
Valid identifiers:\n\
topic: {topic_ids}\n\
gap: {gap_ids}\n\
keyword: {keyword_ids}\n\n\
Data:\n{data}\n",
        min = settings.min_recommendations,
        max = settings.max_recommendations,
    ))
}

#[derive(Debug, Deserialize)]
struct RawSynthesis {
    #[serde(default)]
    recommendations: Vec<RawRecommendation>,
    #[serde(default)]
    insights: Vec<RawInsight>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawRecommendation {
    Structured {
        text: String,
        #[serde(default)]
        references: Vec<RawReference>,
    },
    Plain(String),
}

#[derive(Debug, Deserialize)]
struct RawReference {
    kind: String,
    id: String,
}

#[derive(Debug, Deserialize)]
struct RawInsight {
    kind: String,
    id: String,
    note: String,
}

/// Identifiers computed locally, keyed by lowercase id so the model's casing
/// does not matter. Values are the canonical ids.
struct KnownIds {
    by_kind: HashMap<InsightKind, HashMap<String, String>>,
}

impl KnownIds {
    fn new(input: SynthesisInput<'_>) -> Self {
        let index = |ids: Vec<&String>| -> HashMap<String, String> {
            ids.into_iter()
                .map(|id| (id.to_lowercase(), id.clone()))
                .collect()
        };
        let mut by_kind = HashMap::new();
        by_kind.insert(
            InsightKind::Topic,
            index(input.channel.per_topic_stats.keys().collect()),
        );
        by_kind.insert(
            InsightKind::Gap,
            index(input.gaps.iter().map(|g| &g.topic).collect()),
        );
        by_kind.insert(
            InsightKind::Keyword,
            index(input.keywords.iter().map(|k| &k.keyword).collect()),
        );
        Self { by_kind }
    }

    fn resolve(&self, kind: &str, id: &str) -> Option<(InsightKind, String)> {
        let kind: InsightKind = kind.parse().ok()?;
        let canonical = self.by_kind.get(&kind)?.get(&id.trim().to_lowercase())?;
        Some((kind, canonical.clone()))
    }
}

/// Parse and validate raw service output.
///
/// # Errors
///
/// [`SynthesisError::Malformed`] when no JSON object can be parsed;
/// [`SynthesisError::Rejected`] when no recommendation passes validation.
fn validate_response(
    raw: &str,
    input: SynthesisInput<'_>,
    settings: &SynthesisSettings,
) -> Result<(Vec<String>, Vec<InsightAnnotation>), SynthesisError> {
    let parsed: RawSynthesis = serde_json::from_str(extract_json(raw))
        .map_err(|e| SynthesisError::Malformed(e.to_string()))?;

    let known = KnownIds::new(input);
    let numbers = local_numbers(input);
    let offered = parsed.recommendations.len();

    let mut recommendations = Vec::new();
    for rec in parsed.recommendations {
        match check_recommendation(rec, &known, &numbers) {
            Ok(text) => recommendations.push(text),
            Err(reason) => tracing::debug!(reason = %reason, "rejected recommendation"),
        }
    }

    if recommendations.is_empty() {
        return Err(SynthesisError::Rejected(format!(
            "none of {offered} recommendations could be traced to local data"
        )));
    }
    if recommendations.len() < settings.min_recommendations {
        tracing::debug!(
            kept = recommendations.len(),
            min = settings.min_recommendations,
            "fewer recommendations than requested survived validation"
        );
    }
    recommendations.truncate(settings.max_recommendations);

    let insights = parsed
        .insights
        .into_iter()
        .filter_map(|insight| {
            let note = insight.note.trim();
            if note.is_empty() {
                return None;
            }
            let (kind, id) = known.resolve(&insight.kind, &insight.id)?;
            Some(InsightAnnotation {
                kind,
                id,
                note: note.to_string(),
            })
        })
        .take(settings.max_insights)
        .collect();

    Ok((recommendations, insights))
}

fn check_recommendation(
    rec: RawRecommendation,
    known: &KnownIds,
    numbers: &[f64],
) -> Result<String, String> {
    let RawRecommendation::Structured { text, references } = rec else {
        return Err("recommendation has no references".to_string());
    };
    let text = text.trim().to_string();
    if text.is_empty() {
        return Err("empty recommendation".to_string());
    }
    if references.is_empty() {
        return Err(format!("no references: {text}"));
    }
    if let Some(bad) = references
        .iter()
        .find(|r| known.resolve(&r.kind, &r.id).is_none())
    {
        return Err(format!("unknown {} '{}': {text}", bad.kind, bad.id));
    }
    if let Some(figure) = untraceable_figure(&text, numbers) {
        return Err(format!("figure {figure} not in local data: {text}"));
    }
    Ok(text)
}

/// First figure of at least [`FIGURE_CHECK_THRESHOLD`] in `text` that is not
/// within [`FIGURE_TOLERANCE`] of any local number. Bare four-digit years and
/// percentages are not treated as figures.
fn untraceable_figure(text: &str, numbers: &[f64]) -> Option<String> {
    FIGURE_RE.find_iter(text).find_map(|m| {
        let raw = m.as_str().trim_end_matches(',');
        let value = parse_figure(raw)?;
        if value < FIGURE_CHECK_THRESHOLD
            || looks_like_year(raw)
            || is_percentage(&text[m.end()..])
        {
            return None;
        }
        let traceable = numbers
            .iter()
            .any(|n| (value - n).abs() <= FIGURE_TOLERANCE * n.abs().max(1.0));
        (!traceable).then(|| raw.to_string())
    })
}

fn parse_figure(raw: &str) -> Option<f64> {
    let lower = raw.to_ascii_lowercase().replace(',', "");
    let (digits, multiplier) = [
        ("thousand", 1e3),
        ("million", 1e6),
        ("billion", 1e9),
        ("k", 1e3),
        ("m", 1e6),
        ("b", 1e9),
    ]
    .iter()
    .find_map(|(suffix, mult)| {
        lower
            .strip_suffix(*suffix)
            .map(|d| (d.trim().to_string(), *mult))
    })
    .unwrap_or_else(|| (lower.clone(), 1.0));
    digits.parse::<f64>().ok().map(|n| n * multiplier)
}

fn is_percentage(after: &str) -> bool {
    let after = after.trim_start();
    after.starts_with('%') || after.to_ascii_lowercase().starts_with("percent")
}

fn looks_like_year(raw: &str) -> bool {
    raw.len() == 4
        && raw.chars().all(|c| c.is_ascii_digit())
        && raw.parse::<u32>().is_ok_and(|y| (1900..=2100).contains(&y))
}

/// Every number a recommendation may legitimately quote.
#[allow(clippy::cast_precision_loss)]
fn local_numbers(input: SynthesisInput<'_>) -> Vec<f64> {
    let channel = input.channel;
    let mut numbers = vec![channel.video_count as f64, channel.total_views as f64];
    numbers.extend(channel.avg_views.value().copied());
    numbers.extend(channel.avg_likes.value().copied());
    numbers.extend(channel.avg_comments.value().copied());
    if let Some(range) = channel.peak_performance_range.value() {
        numbers.extend([range.low, range.high]);
    }
    numbers.extend(channel.engagement_rate.value().copied());
    numbers.extend(channel.consistency_score.value().copied());
    for stats in channel.per_topic_stats.values() {
        numbers.push(stats.avg_views);
        numbers.push(stats.video_count as f64);
    }
    for gap in input.gaps {
        numbers.push(gap.competitor_avg_views);
        numbers.push(gap.competitor_video_count as f64);
        numbers.push(gap.target_coverage as f64);
        numbers.extend(gap.target_avg_views);
    }
    for keyword in input.keywords {
        numbers.push(keyword.score as f64);
    }
    numbers
}

/// Strip a markdown code fence, then cut to the outermost JSON object.
fn extract_json(raw: &str) -> &str {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```") {
        // Drop the fence line, which may carry a language tag.
        text = rest.split_once('\n').map_or("", |(_, body)| body);
        text = text.trim_end().strip_suffix("```").unwrap_or(text).trim();
    }
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => text,
    }
}

#[cfg(test)]
#[path = "synthesize_test.rs"]
mod tests;
