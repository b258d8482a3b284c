//! The fetcher seam consumed by the analysis pipeline.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::FetchError;

/// Raw output for one channel: untrusted per-video records plus whatever
/// channel display name the scraper reported.
#[derive(Debug, Clone, Default)]
pub struct ChannelFetch {
    pub channel: String,
    pub channel_name: Option<String>,
    pub records: Vec<Value>,
}

/// Anything that can produce raw per-video records for a channel.
#[async_trait]
pub trait VideoSource: Send + Sync {
    /// Fetch up to `video_count` records for `channel`. When
    /// `include_transcripts` is set, implementations attach a `transcript`
    /// field to the records they could find captions for.
    async fn fetch_channel(
        &self,
        channel: &str,
        video_count: u32,
        include_transcripts: bool,
    ) -> Result<ChannelFetch, FetchError>;

    /// Short identifier used in logs.
    fn name(&self) -> &'static str;
}

/// Display name reported by the first record that carries one.
pub(crate) fn channel_name_from_records(records: &[Value]) -> Option<String> {
    records.iter().find_map(|r| {
        r.get("channelName")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}
