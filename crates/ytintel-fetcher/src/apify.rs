//! HTTP client for Apify actor runs.
//!
//! Both the video scraper and the caption scraper are invoked through the
//! synchronous `run-sync-get-dataset-items` endpoint, which runs the actor and
//! returns its dataset as a JSON array in one response.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde_json::{json, Value};
use ytintel_core::AppConfig;

use crate::error::FetchError;
use crate::retry::retry_with_backoff;
use crate::source::{channel_name_from_records, ChannelFetch, VideoSource};
use crate::transcripts::{attach_transcripts, leading_video_ids, transcripts_by_video};

/// The caption actor is called with at most this many watch URLs per run.
const TRANSCRIPT_BATCH_SIZE: usize = 10;

/// Connection and actor settings for [`ApifySource`].
#[derive(Clone)]
pub struct ApifySettings {
    pub token: String,
    pub base_url: String,
    pub video_actor: String,
    pub transcript_actor: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub backoff_base_ms: u64,
    pub transcript_limit: usize,
}

impl std::fmt::Debug for ApifySettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApifySettings")
            .field("token", &"[redacted]")
            .field("base_url", &self.base_url)
            .field("video_actor", &self.video_actor)
            .field("transcript_actor", &self.transcript_actor)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("backoff_base_ms", &self.backoff_base_ms)
            .field("transcript_limit", &self.transcript_limit)
            .finish()
    }
}

impl ApifySettings {
    /// Pull Apify settings out of the application config.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::MissingToken`] when `APIFY_TOKEN` was not set.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, FetchError> {
        let token = config.apify_token.clone().ok_or(FetchError::MissingToken)?;
        Ok(Self {
            token,
            base_url: config.apify_base_url.clone(),
            video_actor: config.video_actor.clone(),
            transcript_actor: config.transcript_actor.clone(),
            timeout_secs: config.fetch_timeout_secs,
            max_retries: config.fetch_max_retries,
            backoff_base_ms: config.fetch_retry_backoff_ms,
            transcript_limit: config.transcript_limit,
        })
    }
}

/// [`VideoSource`] backed by Apify's YouTube scraper and caption scraper actors.
pub struct ApifySource {
    client: Client,
    base_url: Url,
    settings: ApifySettings,
}

impl ApifySource {
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the `reqwest::Client` cannot be built,
    /// or [`FetchError::InvalidBaseUrl`] if the base URL does not parse.
    pub fn new(settings: ApifySettings) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("ytintel/0.1 (channel-intelligence)")
            .build()?;

        // Exactly one trailing slash so `Url::join` appends instead of replacing
        // the last path segment.
        let normalised = format!("{}/", settings.base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| FetchError::InvalidBaseUrl {
            base_url: settings.base_url.clone(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            base_url,
            settings,
        })
    }

    fn run_url(&self, actor: &str) -> Result<Url, FetchError> {
        self.base_url
            .join(&format!("v2/acts/{actor}/run-sync-get-dataset-items"))
            .map_err(|e| FetchError::InvalidBaseUrl {
                base_url: self.base_url.to_string(),
                reason: e.to_string(),
            })
    }

    /// Run `actor` with `input` and return its dataset items, retrying
    /// transient failures.
    async fn run_actor(&self, actor: &str, input: &Value) -> Result<Vec<Value>, FetchError> {
        let url = self.run_url(actor)?;
        retry_with_backoff(self.settings.max_retries, self.settings.backoff_base_ms, || {
            self.run_actor_once(&url, input)
        })
        .await
    }

    async fn run_actor_once(&self, url: &Url, input: &Value) -> Result<Vec<Value>, FetchError> {
        let response = self
            .client
            .post(url.clone())
            .bearer_auth(&self.settings.token)
            .json(input)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .unwrap_or(0);
            return Err(FetchError::RateLimited { retry_after_secs });
        }
        if !status.is_success() {
            return Err(FetchError::UnexpectedStatus {
                status: status.as_u16(),
                url: redacted_url(url),
            });
        }

        let body = response.text().await?;
        serde_json::from_str::<Vec<Value>>(&body).map_err(|e| FetchError::Deserialize {
            context: redacted_url(url),
            source: e,
        })
    }

    /// Fetch captions for `video_ids` in batches. Failures are logged and the
    /// transcripts gathered so far are returned.
    async fn fetch_transcripts(&self, video_ids: &[String]) -> Vec<Value> {
        let mut items = Vec::new();
        for (batch_idx, batch) in video_ids.chunks(TRANSCRIPT_BATCH_SIZE).enumerate() {
            let input = json!({
                "startUrls": batch
                    .iter()
                    .map(|id| json!({ "url": watch_url(id) }))
                    .collect::<Vec<_>>(),
                "language": "en",
            });
            match self.run_actor(&self.settings.transcript_actor, &input).await {
                Ok(batch_items) => items.extend(batch_items),
                Err(e) => {
                    tracing::warn!(
                        batch = batch_idx + 1,
                        videos = batch.len(),
                        error = %e,
                        "transcript fetch failed; continuing without these transcripts"
                    );
                    break;
                }
            }
        }
        items
    }
}

#[async_trait]
impl VideoSource for ApifySource {
    async fn fetch_channel(
        &self,
        channel: &str,
        video_count: u32,
        include_transcripts: bool,
    ) -> Result<ChannelFetch, FetchError> {
        let input = json!({
            "startUrls": [{ "url": channel_url(channel) }],
            "maxResults": video_count,
            "searchKeywords": "",
        });

        let mut records = self.run_actor(&self.settings.video_actor, &input).await?;
        records.truncate(usize::try_from(video_count).unwrap_or(usize::MAX));
        tracing::info!(channel, videos = records.len(), "fetched channel videos");

        if include_transcripts && self.settings.transcript_limit > 0 {
            let ids = leading_video_ids(&records, self.settings.transcript_limit);
            if !ids.is_empty() {
                let items = self.fetch_transcripts(&ids).await;
                let attached = attach_transcripts(&mut records, &transcripts_by_video(&items));
                tracing::info!(
                    channel,
                    requested = ids.len(),
                    attached,
                    "attached transcripts"
                );
            }
        }

        Ok(ChannelFetch {
            channel: channel.to_string(),
            channel_name: channel_name_from_records(&records),
            records,
        })
    }

    fn name(&self) -> &'static str {
        "apify"
    }
}

/// Turn a handle or partial identifier into a channel URL the scraper accepts.
/// Full URLs are passed through unchanged.
#[must_use]
pub fn channel_url(identifier: &str) -> String {
    let trimmed = identifier.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else if let Some(rest) = trimmed
        .strip_prefix("youtube.com/")
        .or_else(|| trimmed.strip_prefix("www.youtube.com/"))
    {
        format!("https://www.youtube.com/{rest}")
    } else if trimmed.starts_with("UC") && !trimmed.contains('/') && trimmed.len() == 24 {
        format!("https://www.youtube.com/channel/{trimmed}")
    } else {
        format!("https://www.youtube.com/@{}", trimmed.trim_start_matches('@'))
    }
}

fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={video_id}")
}

/// URL without its query string, for error messages and logs.
fn redacted_url(url: &Url) -> String {
    let mut url = url.clone();
    url.set_query(None);
    url.to_string()
}
