//! Weaviate vector database backend

use super::traits::*;
use crate::config::BackendSettings;
use crate::network::{HttpClient, HttpResponse};
use crate::results::Candidate;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

/// nearText search against one Weaviate class over the GraphQL API
pub struct Weaviate {
    client: HttpClient,
    endpoint: String,
    class_name: String,
    label_field: String,
    image_field: String,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

impl Weaviate {
    pub fn new(client: HttpClient, settings: &BackendSettings) -> anyhow::Result<Self> {
        let mut base = Url::parse(&settings.url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let endpoint = base.join("v1/graphql")?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            class_name: settings.class_name.clone(),
            label_field: settings.label_field.clone(),
            image_field: settings.image_field.clone(),
        })
    }

    /// GraphQL endpoint requests are sent to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Build the `Get` query for one text
    fn graphql_query(&self, query: &str, limit: usize) -> String {
        // A JSON string literal is a valid GraphQL string literal
        let concept = Value::String(query.to_string());
        format!(
            "{{ Get {{ {class}(nearText: {{concepts: [{concept}]}}, limit: {limit}) {{ {label} {image} _additional {{ id distance }} }} }} }}",
            class = self.class_name,
            concept = concept,
            limit = limit,
            label = self.label_field,
            image = self.image_field,
        )
    }

    fn parse_response(&self, response: HttpResponse) -> Result<Vec<Candidate>, BackendError> {
        if !response.is_success() {
            return Err(BackendError::Unavailable(format!(
                "HTTP error: {}",
                response.status
            )));
        }

        let body: GraphQlResponse = response.json()?;

        if !body.errors.is_empty() {
            let messages: Vec<_> = body.errors.into_iter().map(|e| e.message).collect();
            return Err(BackendError::Malformed(messages.join("; ")));
        }

        let objects = body
            .data
            .as_ref()
            .and_then(|d| d.get("Get"))
            .and_then(|g| g.get(&self.class_name))
            .and_then(|c| c.as_array())
            .ok_or_else(|| {
                BackendError::Malformed(format!("missing data.Get.{}", self.class_name))
            })?;

        objects.iter().map(|object| self.parse_object(object)).collect()
    }

    fn parse_object(&self, object: &Value) -> Result<Candidate, BackendError> {
        if !object.is_object() {
            return Err(BackendError::Malformed("result entry is not an object".into()));
        }

        let label = object
            .get(&self.label_field)
            .and_then(|l| l.as_str())
            .map(|s| s.to_string());

        let image = match object.get(&self.image_field).and_then(|i| i.as_str()) {
            Some(encoded) => Some(STANDARD.decode(encoded).map_err(|e| {
                BackendError::Malformed(format!("undecodable {}: {}", self.image_field, e))
            })?),
            None => None,
        };

        let additional = object.get("_additional");
        let id = additional
            .and_then(|a| a.get("id"))
            .and_then(|i| i.as_str())
            .map(|s| s.to_string());
        let distance = additional
            .and_then(|a| a.get("distance"))
            .and_then(|d| d.as_f64());

        Ok(Candidate {
            id,
            label,
            image,
            distance,
        })
    }
}

#[async_trait]
impl SearchBackend for Weaviate {
    fn name(&self) -> &str {
        "weaviate"
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Candidate>, BackendError> {
        let body = json!({ "query": self.graphql_query(query, limit) });
        let response = self.client.post_json(&self.endpoint, &body).await?;
        self.parse_response(response)
    }
}
