//! Run request: what the caller asked to analyze.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

pub const MIN_VIDEO_COUNT: u32 = 10;
pub const MAX_VIDEO_COUNT: u32 = 100;
pub const DEFAULT_VIDEO_COUNT: u32 = 20;
pub const MAX_COMPETITORS: usize = 5;

/// Steers the reasoning service toward one aspect of the report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisFocus {
    #[default]
    Comprehensive,
    Topics,
    Competitors,
    Keywords,
}

impl std::fmt::Display for AnalysisFocus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisFocus::Comprehensive => write!(f, "comprehensive"),
            AnalysisFocus::Topics => write!(f, "topics"),
            AnalysisFocus::Competitors => write!(f, "competitors"),
            AnalysisFocus::Keywords => write!(f, "keywords"),
        }
    }
}

impl std::str::FromStr for AnalysisFocus {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "comprehensive" => Ok(AnalysisFocus::Comprehensive),
            "topics" => Ok(AnalysisFocus::Topics),
            "competitors" | "competition" => Ok(AnalysisFocus::Competitors),
            "keywords" => Ok(AnalysisFocus::Keywords),
            other => Err(ConfigError::InvalidRequest(format!(
                "unknown analysis focus '{other}'; expected comprehensive, topics, competitors or keywords"
            ))),
        }
    }
}

/// Inputs for one invocation. Each entry in `channels` yields its own report.
#[derive(Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub channels: Vec<String>,
    pub competitors: Vec<String>,
    pub video_count: u32,
    pub include_transcripts: bool,
    pub analysis_focus: AnalysisFocus,
    /// Per-run reasoning credential; takes precedence over `ANTHROPIC_API_KEY`.
    pub reasoning_api_key: Option<String>,
}

impl std::fmt::Debug for RunRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunRequest")
            .field("channels", &self.channels)
            .field("competitors", &self.competitors)
            .field("video_count", &self.video_count)
            .field("include_transcripts", &self.include_transcripts)
            .field("analysis_focus", &self.analysis_focus)
            .field(
                "reasoning_api_key",
                &self.reasoning_api_key.as_ref().map(|_| "[redacted]"),
            )
            .finish()
    }
}

impl RunRequest {
    /// Trim identifiers, drop blanks and duplicates, then validate bounds.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidRequest`] when no channel remains, the
    /// video count is outside `MIN_VIDEO_COUNT..=MAX_VIDEO_COUNT`, too many
    /// competitors are given, or a competitor is also a target.
    pub fn validated(mut self) -> Result<Self, ConfigError> {
        self.channels = dedup_identifiers(&self.channels);
        self.competitors = dedup_identifiers(&self.competitors);
        self.reasoning_api_key = self
            .reasoning_api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());

        if self.channels.is_empty() {
            return Err(ConfigError::InvalidRequest(
                "at least one channel identifier is required".to_string(),
            ));
        }

        if !(MIN_VIDEO_COUNT..=MAX_VIDEO_COUNT).contains(&self.video_count) {
            return Err(ConfigError::InvalidRequest(format!(
                "video count {} is outside {MIN_VIDEO_COUNT}..={MAX_VIDEO_COUNT}",
                self.video_count
            )));
        }

        if self.competitors.len() > MAX_COMPETITORS {
            return Err(ConfigError::InvalidRequest(format!(
                "{} competitors given; at most {MAX_COMPETITORS} are supported",
                self.competitors.len()
            )));
        }

        let target_slugs: HashSet<String> = self.channels.iter().map(|c| channel_slug(c)).collect();
        if let Some(dup) = self
            .competitors
            .iter()
            .find(|c| target_slugs.contains(&channel_slug(c)))
        {
            return Err(ConfigError::InvalidRequest(format!(
                "competitor '{dup}' is also listed as a target channel"
            )));
        }

        Ok(self)
    }
}

fn dedup_identifiers(raw: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(channel_slug(s)))
        .map(str::to_string)
        .collect()
}

/// Derive a filesystem-safe slug from a channel URL or handle.
///
/// Recognises `/@handle`, `/c/name`, `/channel/ID` and `/user/name` URL forms;
/// anything else falls back to the last path segment.
#[must_use]
pub fn channel_slug(identifier: &str) -> String {
    let trimmed = identifier.trim();
    let without_query = trimmed.split(['?', '#']).next().unwrap_or(trimmed);
    let path = without_query.trim_end_matches('/');

    let raw = ["/@", "/c/", "/channel/", "/user/"]
        .iter()
        .find_map(|marker| {
            path.find(marker)
                .map(|idx| &path[idx + marker.len()..])
                .map(|rest| rest.split('/').next().unwrap_or(rest))
        })
        .unwrap_or_else(|| path.rsplit('/').next().unwrap_or(path));

    let slug = raw
        .trim_start_matches('@')
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-");

    if slug.is_empty() {
        "unknown".to_string()
    } else {
        slug
    }
}
