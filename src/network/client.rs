//! HTTP client for making requests to the vector database

use crate::backend::BackendError;
use crate::config::BackendSettings;
use anyhow::Result;
use reqwest::{header, Client, Response};
use serde::Serialize;
use std::time::Duration;

/// Pooled HTTP client shared by every in-flight query
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    api_key: Option<String>,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Result<Self> {
        Self::with_settings(&BackendSettings::default())
    }

    /// Create a new HTTP client with custom settings
    pub fn with_settings(settings: &BackendSettings) -> Result<Self> {
        let timeout = Duration::try_from_secs_f64(settings.request_timeout).map_err(|e| {
            anyhow::anyhow!("invalid request timeout {}: {}", settings.request_timeout, e)
        })?;

        let client = Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(settings.pool_maxsize)
            .user_agent(concat!("multisearch-rs/", env!("CARGO_PKG_VERSION")))
            .gzip(true)
            .build()?;

        Ok(Self {
            client,
            api_key: settings.api_key.clone(),
        })
    }

    /// POST a JSON body and read the whole response
    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &T,
    ) -> std::result::Result<HttpResponse, BackendError> {
        let mut req_builder = self
            .client
            .post(url)
            .header(header::ACCEPT, "application/json")
            .json(body);

        if let Some(ref key) = self.api_key {
            req_builder = req_builder.bearer_auth(key);
        }

        let response = req_builder.send().await?;

        Self::parse_response(response).await
    }

    async fn parse_response(response: Response) -> std::result::Result<HttpResponse, BackendError> {
        let status = response.status().as_u16();
        let text = response.text().await?;

        Ok(HttpResponse { status, text })
    }
}

/// Fully read HTTP response
#[derive(Debug)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body as text
    pub text: String,
}

impl HttpResponse {
    /// Parse response as JSON
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> std::result::Result<T, BackendError> {
        serde_json::from_str(&self.text).map_err(|e| BackendError::Malformed(e.to_string()))
    }

    /// Check if response is successful (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
