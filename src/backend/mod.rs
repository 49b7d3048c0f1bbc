//! Search backend module
//!
//! Defines the SearchBackend trait and the vector database implementation
//! queried once per input text.

mod traits;

pub mod weaviate;

pub use traits::*;
pub use weaviate::Weaviate;
