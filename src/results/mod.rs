//! Result types and aggregation for query outcomes
//!
//! This module defines the candidate, outcome and stream record structures
//! shared by the dispatcher and the web layer.

mod aggregate;
mod types;

pub use aggregate::AggregateResult;
pub use types::*;
