//! Run orchestration: fetch every channel, then build one report per target.
//!
//! Target and competitor fetches are independent and run concurrently,
//! bounded by `max_parallel_fetches`. All channel aggregates are built before
//! gap analysis starts. A failed fetch counts as a channel with zero videos
//! and is noted in the report; only cancellation ends a run without reports.

use chrono::Utc;
use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;
use ytintel_core::RunRequest;
use ytintel_fetcher::{ChannelFetch, FetchError, VideoSource};

use crate::aggregate::aggregate_channel;
use crate::classify::classify_videos;
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::gaps::find_content_gaps;
use crate::keywords::extract_keywords;
use crate::normalize::{normalize_records, NormalizationOutcome};
use crate::report::{assemble_report, ReportInputs};
use crate::synthesize::{synthesize_insights, ReasoningService, SynthesisInput};
use crate::types::{ChannelAggregate, Report};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Target,
    Competitor,
}

struct FetchJob<'a> {
    identifier: &'a str,
    role: Role,
}

/// One fetched, normalized and aggregated channel.
struct ChannelData {
    identifier: String,
    role: Role,
    outcome: NormalizationOutcome,
    aggregate: ChannelAggregate,
    fetch_error: Option<String>,
}

/// Analyze every target channel of `request` against its competitors.
///
/// Reports come back in the order the targets were requested.
///
/// # Errors
///
/// Returns [`AnalysisError::Cancelled`] if `cancel` fires before a fetch
/// completes or before a synthesis call.
pub async fn run(
    source: &dyn VideoSource,
    reasoner: Option<&dyn ReasoningService>,
    request: &RunRequest,
    config: &AnalysisConfig,
    cancel: &CancellationToken,
) -> Result<Vec<Report>, AnalysisError> {
    let jobs: Vec<FetchJob<'_>> = request
        .channels
        .iter()
        .map(|c| FetchJob {
            identifier: c,
            role: Role::Target,
        })
        .chain(request.competitors.iter().map(|c| FetchJob {
            identifier: c,
            role: Role::Competitor,
        }))
        .collect();

    tracing::info!(
        source = source.name(),
        targets = request.channels.len(),
        competitors = request.competitors.len(),
        video_count = request.video_count,
        "starting analysis run"
    );

    let fetched = fetch_all(source, &jobs, request, config.max_parallel_fetches, cancel).await?;
    let channels: Vec<ChannelData> = jobs
        .iter()
        .zip(fetched)
        .map(|(job, result)| prepare_channel(job, result, config))
        .collect();

    let (targets, competitors): (Vec<_>, Vec<_>) =
        channels.into_iter().partition(|c| c.role == Role::Target);

    let mut reports = Vec::with_capacity(targets.len());
    for target in &targets {
        reports.push(build_report(target, &competitors, reasoner, request, config, cancel).await?);
    }

    tracing::info!(reports = reports.len(), "analysis run complete");
    Ok(reports)
}

/// Analyze a single target channel. Convenience wrapper over [`run`].
///
/// # Errors
///
/// Returns [`AnalysisError::Cancelled`] if `cancel` fires.
pub async fn analyze_channel(
    source: &dyn VideoSource,
    reasoner: Option<&dyn ReasoningService>,
    request: &RunRequest,
    config: &AnalysisConfig,
    cancel: &CancellationToken,
) -> Result<Option<Report>, AnalysisError> {
    let Some(first) = request.channels.first() else {
        return Ok(None);
    };
    let single = RunRequest {
        channels: vec![first.clone()],
        ..request.clone()
    };
    Ok(run(source, reasoner, &single, config, cancel)
        .await?
        .into_iter()
        .next())
}

/// Fetch every job concurrently; results are returned in job order.
async fn fetch_all(
    source: &dyn VideoSource,
    jobs: &[FetchJob<'_>],
    request: &RunRequest,
    max_parallel: usize,
    cancel: &CancellationToken,
) -> Result<Vec<Result<ChannelFetch, FetchError>>, AnalysisError> {
    if cancel.is_cancelled() {
        return Err(AnalysisError::Cancelled);
    }

    let mut results: Vec<(usize, Option<Result<ChannelFetch, FetchError>>)> =
        stream::iter(jobs.iter().enumerate())
            .map(|(idx, job)| async move {
                // Competitors only feed topic statistics; transcripts are not needed.
                let include_transcripts =
                    request.include_transcripts && job.role == Role::Target;
                let result = tokio::select! {
                    biased;
                    () = cancel.cancelled() => None,
                    r = source.fetch_channel(job.identifier, request.video_count, include_transcripts) => Some(r),
                };
                (idx, result)
            })
            .buffer_unordered(max_parallel.max(1))
            .collect()
            .await;

    results.sort_by_key(|(idx, _)| *idx);
    results
        .into_iter()
        .map(|(_, result)| result.ok_or(AnalysisError::Cancelled))
        .collect()
}

fn prepare_channel(
    job: &FetchJob<'_>,
    result: Result<ChannelFetch, FetchError>,
    config: &AnalysisConfig,
) -> ChannelData {
    let (name, records, fetch_error) = match result {
        Ok(fetch) => (
            fetch.channel_name.unwrap_or_else(|| job.identifier.to_string()),
            fetch.records,
            None,
        ),
        Err(e) => {
            tracing::warn!(
                channel = job.identifier,
                role = ?job.role,
                error = %e,
                "channel fetch failed; continuing with zero videos"
            );
            (job.identifier.to_string(), Vec::new(), Some(e.to_string()))
        }
    };

    let outcome = normalize_records(&records);
    let assignment = classify_videos(
        &outcome.records,
        &config.topics,
        config.transcript_min_mentions,
    );
    let aggregate = aggregate_channel(&name, &outcome.records, &assignment, config.min_sample);

    tracing::debug!(
        channel = job.identifier,
        raw = records.len(),
        videos = outcome.records.len(),
        skipped = outcome.skipped.len(),
        "channel aggregated"
    );

    ChannelData {
        identifier: job.identifier.to_string(),
        role: job.role,
        outcome,
        aggregate,
        fetch_error,
    }
}

async fn build_report(
    target: &ChannelData,
    competitors: &[ChannelData],
    reasoner: Option<&dyn ReasoningService>,
    request: &RunRequest,
    config: &AnalysisConfig,
    cancel: &CancellationToken,
) -> Result<Report, AnalysisError> {
    let competitor_aggregates: Vec<ChannelAggregate> =
        competitors.iter().map(|c| c.aggregate.clone()).collect();
    let content_gaps = find_content_gaps(
        &target.aggregate,
        &competitor_aggregates,
        config.min_sample,
        config.gap_fraction,
    );
    let keyword_opportunities = extract_keywords(&target.outcome.records, &config.keywords);

    let input = SynthesisInput {
        channel: &target.aggregate,
        gaps: &content_gaps,
        keywords: &keyword_opportunities,
        focus: request.analysis_focus,
    };
    let synthesis = tokio::select! {
        biased;
        () = cancel.cancelled() => return Err(AnalysisError::Cancelled),
        s = synthesize_insights(reasoner, input, &config.synthesis) => s,
    };

    let mut fetch_failures = Vec::new();
    if let Some(e) = &target.fetch_error {
        fetch_failures.push(format!(
            "channel '{}' could not be fetched: {e}",
            target.identifier
        ));
    }
    fetch_failures.extend(competitors.iter().filter_map(|c| {
        c.fetch_error
            .as_ref()
            .map(|e| format!("competitor '{}' could not be fetched: {e}", c.identifier))
    }));

    Ok(assemble_report(ReportInputs {
        channel: target.aggregate.clone(),
        content_gaps,
        keyword_opportunities,
        synthesis,
        videos_analyzed: target.outcome.records.len(),
        videos_requested: request.video_count,
        records_skipped: target.outcome.skipped.len(),
        unreliable_metrics: target.outcome.unreliable,
        transcripts_analyzed: target
            .outcome
            .records
            .iter()
            .filter(|v| v.transcript.is_some())
            .count(),
        competitors_analyzed: competitors
            .iter()
            .filter(|c| c.fetch_error.is_none() && !c.outcome.records.is_empty())
            .count(),
        analysis_focus: request.analysis_focus,
        fetch_failures,
        generated_at: Utc::now(),
    }))
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod tests;
