use async_trait::async_trait;
use provocateur_core::{AgentRequest, AgentResponse, ProvocateurError, ProvocateurResult};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Sends intent-specific requests to named agents and returns their result.
#[async_trait]
pub trait AgentDispatcher: Send + Sync {
    /// Deliver `payload` to `target_agent` for the given `intent`.
    async fn send_request(
        &self,
        target_agent: &str,
        intent: &str,
        payload: serde_json::Value,
    ) -> ProvocateurResult<serde_json::Value>;
}

/// A worker agent reachable through a [`LocalDispatcher`].
#[async_trait]
pub trait AgentHandler: Send + Sync {
    /// Handle one request and return its result body.
    async fn handle(&self, request: &AgentRequest) -> ProvocateurResult<serde_json::Value>;
}

/// In-process A2A router: maps agent ids to registered handlers.
pub struct LocalDispatcher {
    source: String,
    handlers: HashMap<String, Arc<dyn AgentHandler>>,
}

impl LocalDispatcher {
    /// Create an empty dispatcher whose requests are sent on behalf of `source`.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            handlers: HashMap::new(),
        }
    }

    /// Register (or replace) the handler for `agent_id`.
    pub fn register(&mut self, agent_id: impl Into<String>, handler: Arc<dyn AgentHandler>) {
        self.handlers.insert(agent_id.into(), handler);
    }

    /// Builder-style variant of [`register`](Self::register).
    pub fn with_handler(
        mut self,
        agent_id: impl Into<String>,
        handler: Arc<dyn AgentHandler>,
    ) -> Self {
        self.register(agent_id, handler);
        self
    }

    /// Whether a handler is registered for `agent_id`.
    pub fn has_agent(&self, agent_id: &str) -> bool {
        self.handlers.contains_key(agent_id)
    }

    /// Number of registered handlers.
    pub fn agent_count(&self) -> usize {
        self.handlers.len()
    }
}

#[async_trait]
impl AgentDispatcher for LocalDispatcher {
    async fn send_request(
        &self,
        target_agent: &str,
        intent: &str,
        payload: serde_json::Value,
    ) -> ProvocateurResult<serde_json::Value> {
        let handler = self.handlers.get(target_agent).ok_or_else(|| {
            ProvocateurError::Dispatch(format!("no handler registered for agent '{target_agent}'"))
        })?;

        let request = AgentRequest::new(&self.source, target_agent, intent, payload);
        debug!(request_id = %request.id, target = %target_agent, intent = %intent, "Dispatching request");

        let response = match handler.handle(&request).await {
            Ok(result) => AgentResponse::success(&request, result),
            Err(e) => {
                warn!(request_id = %request.id, target = %target_agent, error = %e, "Agent returned error");
                AgentResponse::error(&request, e.to_string())
            }
        };

        if response.is_success() {
            Ok(response.result)
        } else {
            Err(ProvocateurError::Agent(
                response.error.unwrap_or_else(|| "unknown agent error".to_string()),
            ))
        }
    }
}
