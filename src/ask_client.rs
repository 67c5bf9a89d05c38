use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::config::Config;

/// Body of a `POST /ask` request.
#[derive(Debug, Serialize)]
pub struct AskRequest<'a> {
    pub query: &'a str,
}

/// What the server answered.
#[derive(Debug, Clone, PartialEq)]
pub enum AskReply {
    /// Markdown answer from the `response` field.
    Answer(String),
    /// The server reported an error. Holds its `error` value, or the status
    /// code when the body had none.
    Rejected(Value),
}

#[derive(Debug, Error)]
pub enum AskError {
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("response body is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("response payload has no string `response` field")]
    MissingResponse,

    #[error("request timed out after {0:?}")]
    TimedOut(Duration),

    #[error("request cancelled")]
    Cancelled,
}

/// Anything that can answer a query.
#[async_trait]
pub trait AskTransport: Send + Sync {
    async fn ask(&self, query: &str) -> Result<AskReply, AskError>;
}

pub struct AskClient {
    endpoint: Url,
    client: reqwest::Client,
}

impl AskClient {
    pub fn new(config: &Config) -> Result<Self, AskError> {
        Self::with_endpoint(config.endpoint.clone(), config.request_timeout, config.connect_timeout)
    }

    pub fn with_endpoint(endpoint: Url, request_timeout: Duration, connect_timeout: Duration) -> Result<Self, AskError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|source| AskError::Transport {
                endpoint: endpoint.to_string(),
                source,
            })?;

        Ok(Self { endpoint, client })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn transport_error(&self, source: reqwest::Error) -> AskError {
        AskError::Transport {
            endpoint: self.endpoint.to_string(),
            source,
        }
    }
}

#[async_trait]
impl AskTransport for AskClient {
    async fn ask(&self, query: &str) -> Result<AskReply, AskError> {
        debug!("Sending query to {}", self.endpoint);

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&AskRequest { query })
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| self.transport_error(e))?;
        debug!("Received {} ({} bytes) from {}", status, body.len(), self.endpoint);

        if !status.is_success() {
            let detail = serde_json::from_slice::<Value>(&body)
                .ok()
                .and_then(|payload| payload.get("error").filter(|v| is_truthy(v)).cloned())
                .unwrap_or_else(|| Value::from(status.as_u16()));
            return Ok(AskReply::Rejected(detail));
        }

        let payload: Value = serde_json::from_slice(&body)?;
        interpret_payload(payload)
    }
}

/// Classify a JSON payload from a successful response.
pub fn interpret_payload(payload: Value) -> Result<AskReply, AskError> {
    if let Some(detail) = payload.get("error").filter(|v| is_truthy(v)) {
        return Ok(AskReply::Rejected(detail.clone()));
    }

    match payload.get("response") {
        Some(Value::String(text)) => Ok(AskReply::Answer(text.clone())),
        _ => Err(AskError::MissingResponse),
    }
}

/// JSON truthiness: `null`, `false`, `0` and `""` are falsy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
