//! HTTP client for the remote record store.
//!
//! Four calls, no retries: `GET {base}`, `POST {base}`, `PUT {base}/{id}`,
//! `DELETE {base}/{id}`. A call either fully succeeds (2xx) or fails with an
//! [`ApiError`]; callers collapse every failure into a banner message.
//!
//! ERROR HANDLING
//! ==============
//! Transport failures (DNS, refused connection, timeout) become
//! `ApiError::Network`; any non-2xx status becomes `ApiError::Http` with the
//! response body kept for logs. Create/update bodies are returned as raw JSON
//! because callers only care about success.

use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response};
use serde_json::Value;

use super::types::{Record, RecordDraft};
use crate::config::ApiConfig;

// =============================================================================
// ERROR
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The request never produced a response.
    #[error("network error: {0}")]
    Network(String),

    /// The store answered with a non-success status.
    #[error("request failed with status {status}")]
    Http { status: u16, body: String },

    /// A success response carried a body that is not the expected JSON.
    #[error("unexpected response body: {0}")]
    Decode(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    ClientBuild(String),
}

impl ApiError {
    /// HTTP status for `Http` failures.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

// =============================================================================
// TRAIT
// =============================================================================

/// The four store operations. Implemented over HTTP by [`HttpRecordApi`] and by
/// scripted fakes in tests.
#[async_trait::async_trait]
pub trait RecordApi: Send + Sync {
    /// Fetch the full collection in server order.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport failure, non-2xx status, or a body
    /// that is not a JSON array of records.
    async fn list(&self) -> Result<Vec<Record>, ApiError>;

    /// Create a record from a draft. The body never carries an `id`.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport failure or non-2xx status.
    async fn create(&self, draft: &RecordDraft) -> Result<Value, ApiError>;

    /// Replace the record at `{base}/{id}`. The body's `id` always equals `id`.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport failure or non-2xx status.
    async fn update(&self, id: &str, record: &Record) -> Result<Value, ApiError>;

    /// Delete the record at `{base}/{id}`. The response body is ignored.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport failure or non-2xx status.
    async fn remove(&self, id: &str) -> Result<(), ApiError>;
}

// =============================================================================
// HTTP CLIENT
// =============================================================================

pub struct HttpRecordApi {
    http: reqwest::Client,
    config: ApiConfig,
}

impl HttpRecordApi {
    /// Build a client with the configured timeouts.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::ClientBuild` if the TLS backend cannot initialize.
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| ApiError::ClientBuild(e.to_string()))?;
        Ok(Self { http, config })
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        build: impl FnOnce(RequestBuilder) -> RequestBuilder + Send,
    ) -> Result<Response, ApiError> {
        tracing::debug!(%method, %url, "record store request");
        let request = build(self.http.request(method.clone(), url));

        let response = request.send().await.map_err(|e| {
            tracing::warn!(%method, %url, error = %e, "record store unreachable");
            ApiError::Network(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%method, %url, status = status.as_u16(), "record store rejected request");
            return Err(ApiError::Http { status: status.as_u16(), body });
        }
        Ok(response)
    }

    async fn send_json(
        &self,
        method: Method,
        url: &str,
        body: &(impl serde::Serialize + Sync),
    ) -> Result<Value, ApiError> {
        let response = self.send(method, url, |req| req.json(body)).await?;
        Ok(response.json::<Value>().await.unwrap_or(Value::Null))
    }
}

#[async_trait::async_trait]
impl RecordApi for HttpRecordApi {
    async fn list(&self) -> Result<Vec<Record>, ApiError> {
        let response = self.send(Method::GET, &self.config.base_url, |req| req).await?;
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let records = parse_record_list(&text)?;
        tracing::debug!(count = records.len(), "record list fetched");
        Ok(records)
    }

    async fn create(&self, draft: &RecordDraft) -> Result<Value, ApiError> {
        let created = self.send_json(Method::POST, &self.config.base_url, draft).await?;
        tracing::info!(id = ?created.get("id"), "record created");
        Ok(created)
    }

    async fn update(&self, id: &str, record: &Record) -> Result<Value, ApiError> {
        let body = with_path_id(id, record);
        let updated = self.send_json(Method::PUT, &self.config.item_url(id), &body).await?;
        tracing::info!(%id, "record updated");
        Ok(updated)
    }

    async fn remove(&self, id: &str) -> Result<(), ApiError> {
        self.send(Method::DELETE, &self.config.item_url(id), |req| req).await?;
        tracing::info!(%id, "record deleted");
        Ok(())
    }
}

/// Decode a `GET {base}` body.
pub(crate) fn parse_record_list(text: &str) -> Result<Vec<Record>, ApiError> {
    serde_json::from_str::<Vec<Record>>(text).map_err(|e| ApiError::Decode(e.to_string()))
}

/// The update body: the full record, with `id` pinned to the path id.
fn with_path_id(id: &str, record: &Record) -> Record {
    let mut body = record.clone();
    if body.id != id {
        tracing::warn!(path_id = %id, body_id = %body.id, "update body id differs from path id; using path id");
        id.clone_into(&mut body.id);
    }
    body
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
