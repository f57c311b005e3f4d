use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A request sent from one agent to another over the A2A layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRequest {
    /// Unique identifier for this request.
    pub id: Uuid,
    /// Agent that issued the request.
    pub source: String,
    /// Agent the request is addressed to.
    pub target: String,
    /// Operation the target agent should perform.
    pub intent: String,
    /// Intent-specific arguments.
    pub payload: serde_json::Value,
    /// UTC timestamp of when the request was created.
    pub timestamp: DateTime<Utc>,
}

impl AgentRequest {
    /// Creates a new request with a fresh id and the current timestamp.
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        intent: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            source: source.into(),
            target: target.into(),
            intent: intent.into(),
            payload,
            timestamp: Utc::now(),
        }
    }
}

/// Outcome marker carried by an [`AgentResponse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    /// The request was handled.
    Success,
    /// The target agent reported an error.
    Error,
}

/// The reply to an [`AgentRequest`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResponse {
    /// The id of the request this response answers.
    pub request_id: Uuid,
    /// Agent that produced the response.
    pub source: String,
    /// Whether the request succeeded.
    pub status: ResponseStatus,
    /// Result body (empty object on error).
    pub result: serde_json::Value,
    /// Error description when `status` is [`ResponseStatus::Error`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// UTC timestamp of when the response was created.
    pub timestamp: DateTime<Utc>,
}

impl AgentResponse {
    /// Creates a successful response to `request`.
    pub fn success(request: &AgentRequest, result: serde_json::Value) -> Self {
        Self {
            request_id: request.id,
            source: request.target.clone(),
            status: ResponseStatus::Success,
            result,
            error: None,
            timestamp: Utc::now(),
        }
    }

    /// Creates an error response to `request`.
    pub fn error(request: &AgentRequest, error: impl Into<String>) -> Self {
        Self {
            request_id: request.id,
            source: request.target.clone(),
            status: ResponseStatus::Error,
            result: serde_json::Value::Object(serde_json::Map::new()),
            error: Some(error.into()),
            timestamp: Utc::now(),
        }
    }

    /// Returns true if the target agent handled the request.
    pub fn is_success(&self) -> bool {
        self.status == ResponseStatus::Success
    }
}
