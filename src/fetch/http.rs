// src/fetch/http.rs

//! HTTP status query against the image task history endpoint.
//!
//! `GET {base_url}/api/images/history/{task_id}` answers with an envelope
//! `{ "success": bool, "message": string, "data": <task> }`.

use std::fmt;
use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;

use crate::fetch::{QueryError, QueryFuture, StatusQuery};
use crate::types::TaskSnapshot;

#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<TaskSnapshot>,
}

/// HTTP client for the task history API.
#[derive(Clone)]
pub struct HttpStatusQuery {
    client: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

impl fmt::Debug for HttpStatusQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpStatusQuery")
            .field("base_url", &self.base_url.as_str())
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl HttpStatusQuery {
    /// Build a client with its own connection pool and per-request timeout.
    pub fn new(
        base_url: &str,
        token: Option<String>,
        request_timeout: Duration,
    ) -> Result<Self, QueryError> {
        let client = reqwest::Client::builder().timeout(request_timeout).build()?;
        Self::with_client(client, base_url, token)
    }

    /// Reuse an existing [`reqwest::Client`].
    pub fn with_client(
        client: reqwest::Client,
        base_url: &str,
        token: Option<String>,
    ) -> Result<Self, QueryError> {
        let base_url = parse_base_url(base_url)?;
        Ok(Self {
            client,
            base_url,
            token: token.filter(|t| !t.is_empty()),
        })
    }

    /// URL of the status endpoint for one task. The id is percent-encoded as
    /// a single path segment.
    pub fn status_url(&self, id: &str) -> Result<Url, QueryError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| QueryError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(["api", "images", "history", id]);
        Ok(url)
    }

    async fn fetch(&self, id: &str) -> Result<TaskSnapshot, QueryError> {
        let url = self.status_url(id)?;

        let mut request = self.client.get(url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(QueryError::Api {
                status: status.as_u16(),
                body,
            });
        }

        parse_envelope(&body)
    }
}

impl StatusQuery for HttpStatusQuery {
    fn query<'a>(&'a self, id: &'a str) -> QueryFuture<'a> {
        Box::pin(self.fetch(id))
    }
}

/// Decode a history response body into a snapshot.
pub fn parse_envelope(body: &str) -> Result<TaskSnapshot, QueryError> {
    let envelope: ApiEnvelope =
        serde_json::from_str(body).map_err(|e| QueryError::Decode(e.to_string()))?;

    if !envelope.success {
        return Err(QueryError::Rejected(
            envelope
                .message
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| "server reported failure".to_string()),
        ));
    }

    envelope
        .data
        .ok_or_else(|| QueryError::Rejected("response carried no task data".to_string()))
}

fn parse_base_url(raw: &str) -> Result<Url, QueryError> {
    let url = Url::parse(raw).map_err(|e| QueryError::InvalidUrl(format!("{raw}: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(QueryError::InvalidUrl(format!(
            "{raw}: unsupported scheme {other:?} (expected http or https)"
        ))),
    }
}
