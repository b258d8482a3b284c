//! Offline source: previously scraped datasets stored as JSON files.
//!
//! Each channel is read from `<dir>/<channel-slug>.json`. The file is either a
//! bare array of video records or an object `{ "channelName": ..., "videos": [...] }`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use ytintel_core::channel_slug;

use crate::error::FetchError;
use crate::source::{channel_name_from_records, ChannelFetch, VideoSource};

pub struct JsonFileSource {
    dir: PathBuf,
}

impl JsonFileSource {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path the dataset for `channel` is expected at.
    #[must_use]
    pub fn path_for(&self, channel: &str) -> PathBuf {
        self.dir.join(format!("{}.json", channel_slug(channel)))
    }
}

#[async_trait]
impl VideoSource for JsonFileSource {
    async fn fetch_channel(
        &self,
        channel: &str,
        video_count: u32,
        include_transcripts: bool,
    ) -> Result<ChannelFetch, FetchError> {
        let path = self.path_for(channel);
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| FetchError::Io {
                path: path.display().to_string(),
                source: e,
            })?;

        let mut fetch = parse_dataset(&content, &path)?;
        fetch.channel = channel.to_string();
        fetch
            .records
            .truncate(usize::try_from(video_count).unwrap_or(usize::MAX));

        if !include_transcripts {
            for record in &mut fetch.records {
                if let Value::Object(map) = record {
                    map.remove("transcript");
                }
            }
        }

        tracing::debug!(
            channel,
            path = %path.display(),
            videos = fetch.records.len(),
            "loaded channel dataset from file"
        );
        Ok(fetch)
    }

    fn name(&self) -> &'static str {
        "json-file"
    }
}

fn parse_dataset(content: &str, path: &Path) -> Result<ChannelFetch, FetchError> {
    let value: Value = serde_json::from_str(content).map_err(|e| FetchError::Deserialize {
        context: path.display().to_string(),
        source: e,
    })?;

    let (declared_name, records) = match value {
        Value::Array(records) => (None, records),
        Value::Object(mut map) => {
            let name = map
                .get("channelName")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string);
            let records = match map.remove("videos") {
                Some(Value::Array(records)) => records,
                Some(_) | None => Vec::new(),
            };
            (name, records)
        }
        _ => (None, Vec::new()),
    };

    let channel_name = declared_name.or_else(|| channel_name_from_records(&records));
    Ok(ChannelFetch {
        channel: String::new(),
        channel_name,
        records,
    })
}
