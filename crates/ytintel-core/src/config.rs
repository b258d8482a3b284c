use crate::app_config::AppConfig;
use crate::ConfigError;

const DEFAULT_APIFY_BASE_URL: &str = "https://api.apify.com";
const DEFAULT_VIDEO_ACTOR: &str = "streamers~youtube-scraper";
const DEFAULT_TRANSCRIPT_ACTOR: &str = "bernardo~youtube-captions-scraper";
const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
const DEFAULT_REASONING_MODEL: &str = "claude-sonnet-4-20250514";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if values are present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if values are present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    // Empty strings count as unset so `FOO=` in a .env file disables the value.
    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let positive_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let value = parse_usize(var, default)?;
        if value == 0 {
            return Err(invalid(var, "must be at least 1".to_string()));
        }
        Ok(value)
    };

    let log_level = or_default("YTINTEL_LOG_LEVEL", "info");
    let output_dir = PathBuf::from(or_default("YTINTEL_OUTPUT_DIR", "./reports"));
    let topics_path = optional("YTINTEL_TOPICS_PATH").map(PathBuf::from);

    let apify_token = optional("APIFY_TOKEN");
    let apify_base_url = or_default("APIFY_BASE_URL", DEFAULT_APIFY_BASE_URL);
    let video_actor = or_default("YTINTEL_VIDEO_ACTOR", DEFAULT_VIDEO_ACTOR);
    let transcript_actor = or_default("YTINTEL_TRANSCRIPT_ACTOR", DEFAULT_TRANSCRIPT_ACTOR);

    let anthropic_api_key = optional("ANTHROPIC_API_KEY");
    let anthropic_base_url = or_default("ANTHROPIC_BASE_URL", DEFAULT_ANTHROPIC_BASE_URL);
    let reasoning_model = or_default("YTINTEL_REASONING_MODEL", DEFAULT_REASONING_MODEL);

    let reasoning_timeout_secs = parse_u64("YTINTEL_REASONING_TIMEOUT_SECS", "45")?;
    if reasoning_timeout_secs == 0 {
        return Err(invalid(
            "YTINTEL_REASONING_TIMEOUT_SECS",
            "must be at least 1".to_string(),
        ));
    }

    let fetch_timeout_secs = parse_u64("YTINTEL_FETCH_TIMEOUT_SECS", "300")?;
    let fetch_max_retries = parse_u32("YTINTEL_FETCH_MAX_RETRIES", "2")?;
    let fetch_retry_backoff_ms = parse_u64("YTINTEL_FETCH_RETRY_BACKOFF_MS", "1000")?;
    let max_parallel_fetches = positive_usize("YTINTEL_MAX_PARALLEL_FETCHES", "4")?;
    let transcript_limit = parse_usize("YTINTEL_TRANSCRIPT_LIMIT", "10")?;
    let min_sample = positive_usize("YTINTEL_MIN_SAMPLE", "2")?;
    let keyword_top_n = positive_usize("YTINTEL_KEYWORD_TOP_N", "5")?;

    let gap_fraction = or_default("YTINTEL_GAP_FRACTION", "0.5")
        .parse::<f64>()
        .map_err(|e| invalid("YTINTEL_GAP_FRACTION", e.to_string()))?;
    if !(gap_fraction > 0.0 && gap_fraction <= 1.0) {
        return Err(invalid(
            "YTINTEL_GAP_FRACTION",
            format!("{gap_fraction} is outside (0, 1]"),
        ));
    }

    Ok(AppConfig {
        log_level,
        output_dir,
        topics_path,
        apify_token,
        apify_base_url,
        video_actor,
        transcript_actor,
        anthropic_api_key,
        anthropic_base_url,
        reasoning_model,
        reasoning_timeout_secs,
        fetch_timeout_secs,
        fetch_max_retries,
        fetch_retry_backoff_ms,
        max_parallel_fetches,
        transcript_limit,
        min_sample,
        gap_fraction,
        keyword_top_n,
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
