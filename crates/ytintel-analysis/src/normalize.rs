//! Validating boundary between untrusted scraper output and [`VideoRecord`].
//!
//! Scraper datasets are loosely typed and vary between actor versions, so
//! every field is looked up under several aliases and checked explicitly.
//! Records missing an id or a parseable publish timestamp are dropped as
//! [`NormalizeError::MalformedRecord`]; missing counts default to 0 but are
//! flagged unreliable.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Value};
use ytintel_fetcher::transcripts::transcript_text;

use crate::error::NormalizeError;
use crate::types::VideoRecord;

const ID_FIELDS: &[&str] = &["id", "videoId"];
const PUBLISHED_FIELDS: &[&str] = &["publishedAt", "date", "uploadDate"];
const VIEW_FIELDS: &[&str] = &["viewCount", "views"];
const LIKE_FIELDS: &[&str] = &["likeCount", "likes"];
const COMMENT_FIELDS: &[&str] = &["commentCount", "commentsCount", "comments"];

/// Result of normalizing one channel's raw records.
#[derive(Debug, Clone, Default)]
pub struct NormalizationOutcome {
    pub records: Vec<VideoRecord>,
    pub skipped: Vec<NormalizeError>,
    /// Records whose view or like count was defaulted to 0.
    pub unreliable: usize,
}

/// Normalize every raw record, dropping and counting malformed ones.
///
/// A video id seen earlier in the same batch is treated as malformed.
#[must_use]
pub fn normalize_records(raw: &[Value]) -> NormalizationOutcome {
    let mut outcome = NormalizationOutcome::default();
    let mut seen_ids = HashSet::new();

    for (index, value) in raw.iter().enumerate() {
        match normalize_record(index, value) {
            Ok(record) => {
                if !seen_ids.insert(record.id.clone()) {
                    outcome.skipped.push(NormalizeError::MalformedRecord {
                        index,
                        reason: format!("duplicate video id '{}'", record.id),
                    });
                    continue;
                }
                if !record.views_reliable || !record.likes_reliable {
                    outcome.unreliable += 1;
                }
                outcome.records.push(record);
            }
            Err(e) => {
                tracing::debug!(error = %e, "dropping malformed record");
                outcome.skipped.push(e);
            }
        }
    }

    outcome
}

/// Normalize a single raw record.
///
/// # Errors
///
/// Returns [`NormalizeError::MalformedRecord`] when the record is not an
/// object, has no non-blank id, or has no parseable publish timestamp.
pub fn normalize_record(index: usize, raw: &Value) -> Result<VideoRecord, NormalizeError> {
    let malformed = |reason: String| NormalizeError::MalformedRecord { index, reason };

    let Value::Object(obj) = raw else {
        return Err(malformed("record is not a JSON object".to_string()));
    };

    let id = first_field(obj, ID_FIELDS)
        .and_then(scalar_text)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| malformed("missing video id".to_string()))?;

    let published_raw = first_field(obj, PUBLISHED_FIELDS)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| malformed(format!("video '{id}' has no publish timestamp")))?;
    let published_at = parse_published_at(published_raw).ok_or_else(|| {
        malformed(format!(
            "video '{id}' has unparseable publish timestamp '{published_raw}'"
        ))
    })?;

    let views = first_field(obj, VIEW_FIELDS).and_then(parse_count);
    let likes = first_field(obj, LIKE_FIELDS).and_then(parse_count);
    let comments = first_field(obj, COMMENT_FIELDS).and_then(parse_count);

    if views.is_none() || likes.is_none() {
        tracing::debug!(
            video = %id,
            views_missing = views.is_none(),
            likes_missing = likes.is_none(),
            "count absent or unparseable; defaulting to 0 and flagging unreliable"
        );
    }

    let title = obj
        .get("title")
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or_default()
        .to_string();

    let transcript = obj.get("transcript").and_then(transcript_text);

    Ok(VideoRecord {
        id,
        title,
        published_at,
        view_count: views.unwrap_or(0),
        like_count: likes.unwrap_or(0),
        comment_count: comments.unwrap_or(0),
        transcript,
        views_reliable: views.is_some(),
        likes_reliable: likes.is_some(),
        comments_reliable: comments.is_some(),
    })
}

fn first_field<'a>(obj: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names
        .iter()
        .filter_map(|name| obj.get(*name))
        .find(|v| !v.is_null())
}

/// Ids occasionally arrive as numbers; accept both.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Parse a count that may be a JSON number or scraper text like `"1,234"`,
/// `"1.2M views"` or `"50K"`. Negative and non-finite values are rejected.
#[must_use]
pub fn parse_count(value: &Value) -> Option<u64> {
    let number = match value {
        Value::Number(n) => {
            if let Some(exact) = n.as_u64() {
                return Some(exact);
            }
            n.as_f64()?
        }
        Value::String(s) => parse_scaled_number(s)?,
        _ => return None,
    };
    if !number.is_finite() || number < 0.0 {
        return None;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let count = number.round() as u64;
    Some(count)
}

/// Parse the leading number of `text`, honouring thousands separators and a
/// `K`/`M`/`B` suffix. Trailing words (`"views"`) are ignored.
pub(crate) fn parse_scaled_number(text: &str) -> Option<f64> {
    let token = text.split_whitespace().next()?.replace(',', "");
    let lower = token.to_ascii_lowercase();
    let (digits, multiplier) = match lower.chars().last()? {
        'k' => (&lower[..lower.len() - 1], 1e3),
        'm' => (&lower[..lower.len() - 1], 1e6),
        'b' => (&lower[..lower.len() - 1], 1e9),
        _ => (lower.as_str(), 1.0),
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }
    digits.parse::<f64>().ok().map(|n| n * multiplier)
}

/// Accepts RFC 3339, a naive ISO-8601 date-time (taken as UTC), or a bare
/// `YYYY-MM-DD` date (midnight UTC).
#[must_use]
pub fn parse_published_at(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
