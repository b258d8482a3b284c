use thiserror::Error;

/// A raw record that could not be turned into a `VideoRecord`.
///
/// Never fatal: the record is dropped and counted in the report metadata.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("malformed record #{index}: {reason}")]
    MalformedRecord { index: usize, reason: String },
}

/// Why the reasoning service could not contribute recommendations.
///
/// Every variant means "synthesis unavailable" and collapses to the fallback
/// recommendation; none of them abort the run.
#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("no reasoning service credential configured")]
    MissingCredential,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("reasoning service returned status {status}: {message}")]
    UnexpectedStatus { status: u16, message: String },

    #[error("reasoning service did not answer within {secs}s")]
    Timeout { secs: u64 },

    #[error("malformed reasoning output: {0}")]
    Malformed(String),

    #[error("reasoning output rejected: {0}")]
    Rejected(String),

    #[error("invalid reasoning service base URL \"{base_url}\": {reason}")]
    InvalidBaseUrl { base_url: String, reason: String },
}

/// Errors that end an analysis run without a report.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("analysis cancelled")]
    Cancelled,
}
