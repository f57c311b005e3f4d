use crate::dispatch::AgentHandler;
use async_trait::async_trait;
use provocateur_core::{AgentRequest, ProvocateurResult};
use serde_json::json;

/// Agent that answers every request with the request itself.
///
/// Used for dry runs where the routing decisions matter but no real worker
/// agents are available.
pub struct EchoAgent {
    agent_id: String,
}

impl EchoAgent {
    /// Create an echo agent answering as `agent_id`.
    pub fn new(agent_id: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
        }
    }
}

#[async_trait]
impl AgentHandler for EchoAgent {
    async fn handle(&self, request: &AgentRequest) -> ProvocateurResult<serde_json::Value> {
        Ok(json!({
            "agent": self.agent_id,
            "intent": request.intent,
            "payload": request.payload,
        }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_echo_returns_intent_and_payload() {
        let agent = EchoAgent::new("web_search_agent");
        let req = AgentRequest::new("s", "web_search_agent", "search", json!({"query": "q"}));
        let result = agent.handle(&req).await.unwrap();
        assert_eq!(result["agent"], "web_search_agent");
        assert_eq!(result["intent"], "search");
        assert_eq!(result["payload"]["query"], "q");
    }
}
