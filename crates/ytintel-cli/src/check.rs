//! `check-config` command handler.

use ytintel_core::{load_topic_map, AppConfig, TopicMap};

/// Print the resolved configuration (secrets shown only as set/unset) and
/// validate the topic map.
///
/// # Errors
///
/// Returns an error if the configured topics file cannot be loaded.
pub(crate) fn run_check_config(config: &AppConfig) -> anyhow::Result<()> {
    let topics = match &config.topics_path {
        Some(path) => load_topic_map(path)?,
        None => TopicMap::default(),
    };

    let set = |v: &Option<String>| if v.is_some() { "set" } else { "not set" };
    let topics_source = config
        .topics_path
        .as_ref()
        .map_or_else(|| "built-in".to_string(), |p| p.display().to_string());

    println!("{:<28}VALUE", "SETTING");
    println!("{:<28}{}", "apify token", set(&config.apify_token));
    println!("{:<28}{}", "apify base url", config.apify_base_url);
    println!("{:<28}{}", "video actor", config.video_actor);
    println!("{:<28}{}", "transcript actor", config.transcript_actor);
    println!("{:<28}{}", "anthropic api key", set(&config.anthropic_api_key));
    println!("{:<28}{}", "anthropic base url", config.anthropic_base_url);
    println!("{:<28}{}", "reasoning model", config.reasoning_model);
    println!("{:<28}{}s", "reasoning timeout", config.reasoning_timeout_secs);
    println!("{:<28}{}s", "fetch timeout", config.fetch_timeout_secs);
    println!("{:<28}{}", "fetch retries", config.fetch_max_retries);
    println!("{:<28}{}", "parallel fetches", config.max_parallel_fetches);
    println!("{:<28}{}", "transcript limit", config.transcript_limit);
    println!("{:<28}{}", "min sample", config.min_sample);
    println!("{:<28}{}", "gap fraction", config.gap_fraction);
    println!("{:<28}{}", "keyword top n", config.keyword_top_n);
    println!("{:<28}{}", "output dir", config.output_dir.display());
    println!(
        "{:<28}{} ({} topics)",
        "topics",
        topics_source,
        topics.len()
    );

    if config.apify_token.is_none() {
        println!("note: APIFY_TOKEN is not set; only `analyze --from-dir` will work");
    }
    if config.anthropic_api_key.is_none() {
        println!("note: ANTHROPIC_API_KEY is not set; pass --api-key or expect fallback recommendations");
    }

    Ok(())
}
