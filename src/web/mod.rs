//! Web server module
//!
//! Exposes batch and streaming multi-query search over HTTP.

mod handlers;
mod routes;
mod state;

pub use handlers::NDJSON_CONTENT_TYPE;
pub use routes::create_router;
pub use state::AppState;
