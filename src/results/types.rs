//! Result type definitions

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A single item returned by the backend for one query
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Candidate {
    /// Backend object identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Human readable label
    #[serde(default)]
    pub label: Option<String>,
    /// Raw image bytes, base64 on the wire
    #[serde(default, with = "image_base64")]
    pub image: Option<Vec<u8>>,
    /// Distance to the query vector as reported by the backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
}

impl Candidate {
    /// Create a candidate carrying only a label
    pub fn labeled(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_image(mut self, image: Vec<u8>) -> Self {
        self.image = Some(image);
        self
    }

    pub fn with_distance(mut self, distance: f64) -> Self {
        self.distance = Some(distance);
        self
    }
}

mod image_base64 {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(image: &Option<Vec<u8>>, s: S) -> Result<S::Ok, S::Error> {
        match image {
            Some(bytes) => s.serialize_some(&STANDARD.encode(bytes)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<u8>>, D::Error> {
        let encoded: Option<String> = Option::deserialize(d)?;
        encoded
            .map(|e| STANDARD.decode(e).map_err(serde::de::Error::custom))
            .transpose()
    }
}

/// Why a query produced no candidates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    BackendUnavailable,
    BackendTimeout,
    MalformedBackendResponse,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BackendUnavailable => write!(f, "Backend unavailable"),
            Self::BackendTimeout => write!(f, "Backend timed out"),
            Self::MalformedBackendResponse => write!(f, "Malformed backend response"),
        }
    }
}

/// Failure record for a single query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryFailure {
    /// Position of the query in the request
    pub index: usize,
    pub query: String,
    pub kind: FailureKind,
    pub message: String,
}

/// The resolution of one dispatched query
#[derive(Debug, Clone)]
pub struct QueryOutcome {
    /// Position of the query in the request
    pub index: usize,
    pub query: String,
    /// Time from dispatch to resolution, including any wait for a permit
    pub elapsed: Duration,
    pub result: std::result::Result<Vec<Candidate>, QueryFailure>,
}

impl QueryOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// Candidates of a successful outcome, empty for a failed one
    pub fn candidates(&self) -> &[Candidate] {
        match &self.result {
            Ok(candidates) => candidates,
            Err(_) => &[],
        }
    }

    pub fn timing(&self) -> Timing {
        Timing {
            index: self.index,
            query: self.query.clone(),
            time_ms: self.elapsed.as_millis() as u64,
            result_count: self.candidates().len(),
            success: self.is_success(),
        }
    }
}

/// One record of a streamed response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamedItem {
    Candidate {
        index: usize,
        query: String,
        candidate: Candidate,
    },
    Failure(QueryFailure),
}

impl StreamedItem {
    /// Split an outcome into stream records, keeping the backend's order
    pub fn from_outcome(outcome: QueryOutcome) -> Vec<StreamedItem> {
        let QueryOutcome {
            index,
            query,
            result,
            ..
        } = outcome;

        match result {
            Ok(candidates) => candidates
                .into_iter()
                .map(|candidate| StreamedItem::Candidate {
                    index,
                    query: query.clone(),
                    candidate,
                })
                .collect(),
            Err(failure) => vec![StreamedItem::Failure(failure)],
        }
    }

    /// Position of the originating query
    pub fn index(&self) -> usize {
        match self {
            Self::Candidate { index, .. } => *index,
            Self::Failure(failure) => failure.index,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }

    /// Serialize as a single newline-terminated JSON record
    pub fn to_ndjson(&self) -> serde_json::Result<Vec<u8>> {
        let mut line = serde_json::to_vec(self)?;
        line.push(b'\n');
        Ok(line)
    }
}

/// Per-query timing information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timing {
    pub index: usize,
    pub query: String,
    pub time_ms: u64,
    pub result_count: usize,
    pub success: bool,
}
