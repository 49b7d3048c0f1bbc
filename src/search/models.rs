//! Search request and related data models

use crate::config::SearchSettings;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised before any query is dispatched
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Multi-query search request as received from a client
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Free-text queries, one backend search each
    #[serde(default)]
    pub queries: Vec<String>,
    /// Candidates per query
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Request that passed validation and may be dispatched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRequest {
    pub queries: Vec<String>,
    pub limit: usize,
}

impl SearchRequest {
    pub fn new<I, S>(queries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            queries: queries.into_iter().map(Into::into).collect(),
            limit: None,
        }
    }

    /// Set limit
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Trim queries, drop blank entries and resolve the limit
    ///
    /// Duplicate queries are kept; each one is searched independently.
    pub fn validate(self, settings: &SearchSettings) -> Result<ValidatedRequest, SearchError> {
        let queries: Vec<String> = self
            .queries
            .into_iter()
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty())
            .collect();

        if queries.is_empty() {
            return Err(SearchError::InvalidInput(
                "at least one non-blank query is required".to_string(),
            ));
        }

        let limit = match self.limit {
            Some(0) => {
                return Err(SearchError::InvalidInput(
                    "limit must be a positive integer".to_string(),
                ))
            }
            Some(limit) => limit.min(settings.max_limit),
            None => settings.default_limit,
        };

        Ok(ValidatedRequest { queries, limit })
    }
}
