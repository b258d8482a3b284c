//! Shared configuration and run-request types for ytintel.
//!
//! Everything here is validated before a run starts: a [`ConfigError`] is the
//! only fatal error class in the system and must surface before any fetch.

pub mod app_config;
pub mod config;
pub mod request;
pub mod topics;

use thiserror::Error;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};
pub use request::{
    channel_slug, AnalysisFocus, RunRequest, DEFAULT_VIDEO_COUNT, MAX_COMPETITORS,
    MAX_VIDEO_COUNT, MIN_VIDEO_COUNT,
};
pub use topics::{load_topic_map, TopicMap, UNCATEGORIZED};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("invalid run request: {0}")]
    InvalidRequest(String),

    #[error("failed to read topics file {path}: {source}")]
    TopicsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse topics file: {0}")]
    TopicsFileParse(#[from] serde_yaml::Error),

    #[error("topic map validation failed: {0}")]
    Validation(String),
}
