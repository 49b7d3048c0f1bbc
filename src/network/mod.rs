//! HTTP networking module
//!
//! Provides the pooled HTTP client used to reach the vector database.

mod client;

pub use client::{HttpClient, HttpResponse};
