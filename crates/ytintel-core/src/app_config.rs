use std::path::PathBuf;

/// Process-wide settings resolved once at startup.
///
/// Credentials live here and are handed to the fetcher and the reasoning
/// client explicitly; nothing downstream reads the environment.
#[derive(Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub output_dir: PathBuf,
    pub topics_path: Option<PathBuf>,
    pub apify_token: Option<String>,
    pub apify_base_url: String,
    pub video_actor: String,
    pub transcript_actor: String,
    pub anthropic_api_key: Option<String>,
    pub anthropic_base_url: String,
    pub reasoning_model: String,
    pub reasoning_timeout_secs: u64,
    pub fetch_timeout_secs: u64,
    pub fetch_max_retries: u32,
    pub fetch_retry_backoff_ms: u64,
    pub max_parallel_fetches: usize,
    pub transcript_limit: usize,
    pub min_sample: usize,
    pub gap_fraction: f64,
    pub keyword_top_n: usize,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("log_level", &self.log_level)
            .field("output_dir", &self.output_dir)
            .field("topics_path", &self.topics_path)
            .field(
                "apify_token",
                &self.apify_token.as_ref().map(|_| "[redacted]"),
            )
            .field("apify_base_url", &self.apify_base_url)
            .field("video_actor", &self.video_actor)
            .field("transcript_actor", &self.transcript_actor)
            .field(
                "anthropic_api_key",
                &self.anthropic_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("anthropic_base_url", &self.anthropic_base_url)
            .field("reasoning_model", &self.reasoning_model)
            .field("reasoning_timeout_secs", &self.reasoning_timeout_secs)
            .field("fetch_timeout_secs", &self.fetch_timeout_secs)
            .field("fetch_max_retries", &self.fetch_max_retries)
            .field("fetch_retry_backoff_ms", &self.fetch_retry_backoff_ms)
            .field("max_parallel_fetches", &self.max_parallel_fetches)
            .field("transcript_limit", &self.transcript_limit)
            .field("min_sample", &self.min_sample)
            .field("gap_fraction", &self.gap_fraction)
            .field("keyword_top_n", &self.keyword_top_n)
            .finish()
    }
}
