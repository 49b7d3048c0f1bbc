//! MultiSearch-RS: concurrent multi-query search over a vector database
//!
//! Fans a list of free-text queries out to a nearest-neighbor backend and
//! returns the matches either as one combined batch or as a live stream
//! that delivers each query's candidates the moment they arrive.

pub mod backend;
pub mod config;
pub mod metrics;
pub mod network;
pub mod results;
pub mod search;
pub mod web;

pub use backend::{BackendError, SearchBackend};
pub use config::Settings;
pub use results::{AggregateResult, Candidate, QueryOutcome, StreamedItem};
pub use search::{Dispatcher, ResultStream, SearchRequest};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
