//! `analyze` command handler.
//!
//! Validation and configuration errors abort before any fetch. Once the run
//! starts, every target gets a report unless the user interrupts it.

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use ytintel_analysis::{AnalysisConfig, AnthropicClient, ReasoningService, Report};
use ytintel_core::{channel_slug, load_topic_map, AppConfig, RunRequest, TopicMap};
use ytintel_fetcher::{ApifySettings, ApifySource, JsonFileSource, VideoSource};

use crate::render::write_reports;
use crate::AnalyzeArgs;

impl AnalyzeArgs {
    pub(crate) fn to_request(&self) -> RunRequest {
        RunRequest {
            channels: self.channels.clone(),
            competitors: self.competitors.clone(),
            video_count: self.video_count,
            include_transcripts: !self.no_transcripts,
            analysis_focus: self.focus,
            reasoning_api_key: self.api_key.clone(),
        }
    }
}

/// Run the full pipeline and write one set of report files per target.
///
/// # Errors
///
/// Returns an error if the request or topic map is invalid, the fetcher or
/// reasoning client cannot be built, the run is interrupted, or a report
/// cannot be written.
pub(crate) async fn run_analyze(config: &AppConfig, args: AnalyzeArgs) -> anyhow::Result<()> {
    let request = args.to_request().validated()?;

    let topics = match &config.topics_path {
        Some(path) => load_topic_map(path)?,
        None => TopicMap::default(),
    };
    let analysis_config = AnalysisConfig::from_app_config(config, topics);

    let source: Box<dyn VideoSource> = match &args.from_dir {
        Some(dir) => Box::new(JsonFileSource::new(dir.clone())),
        None => {
            let settings = ApifySettings::from_app_config(config)
                .context("APIFY_TOKEN is required unless --from-dir is given")?;
            Box::new(ApifySource::new(settings)?)
        }
    };

    let reasoner = AnthropicClient::from_app_config(config, request.reasoning_api_key.as_deref())?;
    if reasoner.is_none() {
        tracing::warn!(
            "no reasoning credential configured; reports will carry the fallback recommendation"
        );
    }

    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupt received; cancelling run");
                cancel.cancel();
            }
        })
    };

    let result = ytintel_analysis::run(
        source.as_ref(),
        reasoner.as_ref().map(|r| r as &dyn ReasoningService),
        &request,
        &analysis_config,
        &cancel,
    )
    .await;
    interrupt.abort();
    let reports = result?;

    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| config.output_dir.clone());

    for (channel, report) in request.channels.iter().zip(&reports) {
        let written = write_reports(&output_dir, &channel_slug(channel), report)?;
        print_summary(report);
        for path in written {
            println!("  wrote {}", path.display());
        }
    }

    Ok(())
}

fn print_summary(report: &Report) {
    let meta = &report.metadata;
    println!(
        "{}: {} of {} videos analyzed, {} content gaps, {} keywords, {} recommendations{}",
        report.channel.channel_name,
        meta.videos_analyzed,
        meta.videos_requested,
        report.content_gaps.len(),
        report.keyword_opportunities.len(),
        report.recommendations.len(),
        if meta.partial_data { " (partial data)" } else { "" }
    );
}
