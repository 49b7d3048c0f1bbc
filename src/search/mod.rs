//! Search orchestration module
//!
//! Validates multi-query requests, fans each query out to the backend and
//! aggregates the outcomes as a batch or as a live stream.

mod dispatcher;
mod models;
mod stream;

pub use dispatcher::{Dispatch, Dispatcher};
pub use models::*;
pub use stream::ResultStream;
