//! Joining caption-scraper output onto video records.

use std::collections::HashMap;

use serde_json::Value;

/// Video ids of the first `limit` records, in input order.
#[must_use]
pub fn leading_video_ids(records: &[Value], limit: usize) -> Vec<String> {
    records
        .iter()
        .filter_map(|r| r.get("id").and_then(Value::as_str))
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .take(limit)
        .map(str::to_string)
        .collect()
}

/// Build `video id → transcript text` from caption-scraper items.
///
/// Items carry `videoId` plus a `transcript` that is either plain text or an
/// array of `{ "text": ... }` segments. Items without usable text are skipped.
#[must_use]
pub fn transcripts_by_video(items: &[Value]) -> HashMap<String, String> {
    items
        .iter()
        .filter_map(|item| {
            let id = item
                .get("videoId")
                .or_else(|| item.get("id"))
                .and_then(Value::as_str)?
                .trim();
            let text = item.get("transcript").and_then(transcript_text)?;
            (!id.is_empty()).then(|| (id.to_string(), text))
        })
        .collect()
}

/// Flatten a transcript value into text. Returns `None` for blank output.
#[must_use]
pub fn transcript_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Array(segments) => segments
            .iter()
            .filter_map(|seg| match seg {
                Value::String(s) => Some(s.trim()),
                Value::Object(_) => seg.get("text").and_then(Value::as_str).map(str::trim),
                _ => None,
            })
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" "),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// Insert transcripts into records that do not already carry one.
///
/// Returns the number of records that gained a transcript.
pub fn attach_transcripts(records: &mut [Value], transcripts: &HashMap<String, String>) -> usize {
    let mut attached = 0;
    for record in records.iter_mut() {
        let Some(id) = record.get("id").and_then(Value::as_str).map(str::trim) else {
            continue;
        };
        let Some(text) = transcripts.get(id) else {
            continue;
        };
        let Value::Object(map) = record else {
            continue;
        };
        let has_existing = map
            .get("transcript")
            .is_some_and(|existing| transcript_text(existing).is_some());
        if !has_existing {
            map.insert("transcript".to_string(), Value::String(text.clone()));
            attached += 1;
        }
    }
    attached
}
