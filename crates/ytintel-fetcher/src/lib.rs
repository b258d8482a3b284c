//! Raw video acquisition for ytintel.
//!
//! Everything returned from here is untrusted: records are passed through as
//! `serde_json::Value` and validated by the analysis crate's normalizer.

pub mod apify;
pub mod error;
pub mod file_source;
pub mod source;
pub mod transcripts;

mod retry;

pub use apify::{ApifySettings, ApifySource};
pub use error::FetchError;
pub use file_source::JsonFileSource;
pub use source::{ChannelFetch, VideoSource};
