//! Intent resolution and per-intent payload construction.

use crate::profiles::{DOC_AGENT, GRAPHRAG_AGENT, SUPERVISOR_AGENT, WEB_SEARCH_AGENT, XML_AGENT};
use crate::types::{RunOptions, Task};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// An operation exposed by a worker agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Search,
    ResearchEntity,
    ExtractEntities,
    ValidateEntities,
    GetDocument,
    SearchDocuments,
    QueryGraph,
    ExplainWithSources,
    Summarize,
}

impl Intent {
    /// Wire name of the intent.
    pub fn as_str(self) -> &'static str {
        match self {
            Intent::Search => "search",
            Intent::ResearchEntity => "research_entity",
            Intent::ExtractEntities => "extract_entities",
            Intent::ValidateEntities => "validate_entities",
            Intent::GetDocument => "get_document",
            Intent::SearchDocuments => "search_documents",
            Intent::QueryGraph => "query_graph",
            Intent::ExplainWithSources => "explain_with_sources",
            Intent::Summarize => "summarize",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// (agent, capability) -> intent.
const INTENT_TABLE: &[(&str, &str, Intent)] = &[
    (WEB_SEARCH_AGENT, "search", Intent::Search),
    (WEB_SEARCH_AGENT, "web_search", Intent::Search),
    (WEB_SEARCH_AGENT, "research_entity", Intent::ResearchEntity),
    (XML_AGENT, "extract_entities", Intent::ExtractEntities),
    (XML_AGENT, "validate_entities", Intent::ValidateEntities),
    (XML_AGENT, "analyze_xml", Intent::ExtractEntities),
    (DOC_AGENT, "get_document", Intent::GetDocument),
    (DOC_AGENT, "search_documents", Intent::SearchDocuments),
    (GRAPHRAG_AGENT, "query_graph", Intent::QueryGraph),
    (GRAPHRAG_AGENT, "graph_search", Intent::QueryGraph),
    (GRAPHRAG_AGENT, "explain_with_sources", Intent::ExplainWithSources),
    (SUPERVISOR_AGENT, "summarize", Intent::Summarize),
];

/// Look up the intent `agent` exposes for `capability`.
pub fn intent_for(agent: &str, capability: &str) -> Option<Intent> {
    INTENT_TABLE
        .iter()
        .find(|(a, c, _)| *a == agent && *c == capability)
        .map(|(_, _, intent)| *intent)
}

/// Guess an intent from the task description. First matching rule wins.
pub fn intent_from_description(description: &str) -> Option<Intent> {
    let text = description.to_lowercase();
    if text.contains("research") {
        Some(Intent::ResearchEntity)
    } else if text.contains("search") {
        Some(Intent::Search)
    } else if text.contains("extract") && text.contains("entit") {
        Some(Intent::ExtractEntities)
    } else if text.contains("validat") {
        Some(Intent::ValidateEntities)
    } else if text.contains("graph") {
        Some(Intent::QueryGraph)
    } else if text.contains("summar") {
        Some(Intent::Summarize)
    } else {
        None
    }
}

/// Resolve the intent for an assigned task.
///
/// The first capability with a table entry for the assigned agent wins;
/// otherwise the description keywords decide. `None` means the task is skipped.
pub fn resolve_intent(task: &Task) -> Option<Intent> {
    let agent = task.assigned_agent.as_deref().unwrap_or_default();
    task.capabilities
        .iter()
        .find_map(|cap| intent_for(agent, cap))
        .or_else(|| intent_from_description(&task.description))
}

/// Why a payload could not be built.
#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("intent '{intent}' requires option '{key}'")]
    MissingOption { intent: Intent, key: &'static str },

    #[error("failed to encode payload: {0}")]
    Encode(#[from] serde_json::Error),
}

/// The request body for one intent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TaskPayload {
    Search {
        query: String,
        max_results: u64,
        #[serde(skip_serializing_if = "Option::is_none")]
        provider: Option<String>,
    },
    ResearchEntity {
        entity: String,
    },
    ExtractEntities {
        doc_id: String,
    },
    ValidateEntities {
        doc_id: String,
    },
    GetDocument {
        doc_id: String,
    },
    SearchDocuments {
        query: String,
        max_results: u64,
    },
    QueryGraph {
        query: String,
        max_results: u64,
    },
    ExplainWithSources {
        query: String,
        max_results: u64,
    },
    Summarize {
        text: String,
    },
}

impl TaskPayload {
    /// The intent this payload is sent with.
    pub fn intent(&self) -> Intent {
        match self {
            TaskPayload::Search { .. } => Intent::Search,
            TaskPayload::ResearchEntity { .. } => Intent::ResearchEntity,
            TaskPayload::ExtractEntities { .. } => Intent::ExtractEntities,
            TaskPayload::ValidateEntities { .. } => Intent::ValidateEntities,
            TaskPayload::GetDocument { .. } => Intent::GetDocument,
            TaskPayload::SearchDocuments { .. } => Intent::SearchDocuments,
            TaskPayload::QueryGraph { .. } => Intent::QueryGraph,
            TaskPayload::ExplainWithSources { .. } => Intent::ExplainWithSources,
            TaskPayload::Summarize { .. } => Intent::Summarize,
        }
    }

    /// Encode as the JSON object the target agent expects.
    pub fn to_value(&self) -> Result<serde_json::Value, PayloadError> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Builds [`TaskPayload`]s from tasks and run options.
#[derive(Debug, Clone)]
pub struct PayloadBuilder {
    default_max_results: u64,
}

impl Default for PayloadBuilder {
    fn default() -> Self {
        Self {
            default_max_results: 5,
        }
    }
}

impl PayloadBuilder {
    /// Builder using `default_max_results` when no valid `max_results` option is set.
    pub fn new(default_max_results: u64) -> Self {
        Self {
            default_max_results,
        }
    }

    /// Build the payload for `intent` from the task and the merged run options.
    pub fn build(
        &self,
        intent: Intent,
        task: &Task,
        options: &RunOptions,
    ) -> Result<TaskPayload, PayloadError> {
        let options = merge_options(options, &task.options);
        let query = || task.description.clone();

        let payload = match intent {
            Intent::Search => TaskPayload::Search {
                query: query(),
                max_results: self.max_results(&options),
                provider: option_string(&options, "search_provider"),
            },
            Intent::ResearchEntity => TaskPayload::ResearchEntity {
                entity: task
                    .description
                    .split_whitespace()
                    .last()
                    .unwrap_or_default()
                    .to_string(),
            },
            Intent::ExtractEntities => TaskPayload::ExtractEntities {
                doc_id: require_doc_id(intent, &options)?,
            },
            Intent::ValidateEntities => TaskPayload::ValidateEntities {
                doc_id: require_doc_id(intent, &options)?,
            },
            Intent::GetDocument => TaskPayload::GetDocument {
                doc_id: require_doc_id(intent, &options)?,
            },
            Intent::SearchDocuments => TaskPayload::SearchDocuments {
                query: query(),
                max_results: self.max_results(&options),
            },
            Intent::QueryGraph => TaskPayload::QueryGraph {
                query: query(),
                max_results: self.max_results(&options),
            },
            Intent::ExplainWithSources => TaskPayload::ExplainWithSources {
                query: query(),
                max_results: self.max_results(&options),
            },
            Intent::Summarize => TaskPayload::Summarize { text: query() },
        };

        Ok(payload)
    }

    fn max_results(&self, options: &RunOptions) -> u64 {
        match options.get("max_results") {
            None => self.default_max_results,
            Some(value) => value
                .as_u64()
                .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
                .unwrap_or_else(|| {
                    warn!(value = %value, "Ignoring invalid max_results option");
                    self.default_max_results
                }),
        }
    }
}

/// Global options overlaid with task-local ones (task wins).
pub fn merge_options(global: &RunOptions, task: &RunOptions) -> RunOptions {
    let mut merged = global.clone();
    for (key, value) in task {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

fn option_string(options: &RunOptions, key: &str) -> Option<String> {
    match options.get(key)? {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn require_doc_id(intent: Intent, options: &RunOptions) -> Result<String, PayloadError> {
    option_string(options, "doc_id").ok_or(PayloadError::MissingOption {
        intent,
        key: "doc_id",
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn assigned(description: &str, caps: &[&str], agent: &str) -> Task {
        let mut task = Task::new(description, caps.iter().copied());
        task.assigned_agent = Some(agent.to_string());
        task
    }

    fn opts(value: serde_json::Value) -> RunOptions {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_intent_table_lookup() {
        assert_eq!(intent_for(WEB_SEARCH_AGENT, "search"), Some(Intent::Search));
        assert_eq!(
            intent_for(XML_AGENT, "extract_entities"),
            Some(Intent::ExtractEntities)
        );
        assert_eq!(intent_for(XML_AGENT, "search"), None);
        assert_eq!(intent_for("unknown_agent", "search"), None);
    }

    #[test]
    fn test_resolve_intent_first_mapped_capability() {
        let task = assigned(
            "Look into it",
            &["unknown", "research_entity", "search"],
            WEB_SEARCH_AGENT,
        );
        assert_eq!(resolve_intent(&task), Some(Intent::ResearchEntity));
    }

    #[test]
    fn test_resolve_intent_keyword_fallback() {
        let task = assigned("search for rust crates", &["mystery"], "custom_agent");
        assert_eq!(resolve_intent(&task), Some(Intent::Search));

        let task = assigned("Extract the entities", &[], SUPERVISOR_AGENT);
        assert_eq!(resolve_intent(&task), Some(Intent::ExtractEntities));
    }

    #[test]
    fn test_resolve_intent_research_beats_search_keyword() {
        let task = assigned("Research machine learning", &[], SUPERVISOR_AGENT);
        assert_eq!(resolve_intent(&task), Some(Intent::ResearchEntity));
    }

    #[test]
    fn test_resolve_intent_none() {
        let task = assigned("xyz", &["process_text", "search", "analyze"], DOC_AGENT);
        assert_eq!(resolve_intent(&task), None);
    }

    #[test]
    fn test_search_payload_has_required_keys() {
        let builder = PayloadBuilder::default();
        let task = assigned("rust async runtimes", &["search"], WEB_SEARCH_AGENT);
        let payload = builder
            .build(Intent::Search, &task, &RunOptions::new())
            .unwrap();
        let value = payload.to_value().unwrap();
        assert_eq!(value["query"], "rust async runtimes");
        assert_eq!(value["max_results"], 5);
        assert!(value.get("provider").is_none());
    }

    #[test]
    fn test_search_payload_uses_options() {
        let builder = PayloadBuilder::default();
        let task = assigned("q", &["search"], WEB_SEARCH_AGENT);
        let options = opts(json!({"max_results": 10, "search_provider": "brave"}));
        let value = builder
            .build(Intent::Search, &task, &options)
            .unwrap()
            .to_value()
            .unwrap();
        assert_eq!(value["max_results"], 10);
        assert_eq!(value["provider"], "brave");
    }

    #[test]
    fn test_task_options_override_global() {
        let builder = PayloadBuilder::default();
        let task = assigned("q", &["search"], WEB_SEARCH_AGENT).with_option("max_results", json!(2));
        let options = opts(json!({"max_results": 10}));
        let payload = builder.build(Intent::Search, &task, &options).unwrap();
        assert_eq!(
            payload,
            TaskPayload::Search {
                query: "q".to_string(),
                max_results: 2,
                provider: None
            }
        );
    }

    #[test]
    fn test_invalid_max_results_uses_default() {
        let builder = PayloadBuilder::new(7);
        let task = assigned("q", &["search_documents"], DOC_AGENT);
        let options = opts(json!({"max_results": "lots"}));
        let value = builder
            .build(Intent::SearchDocuments, &task, &options)
            .unwrap()
            .to_value()
            .unwrap();
        assert_eq!(value["max_results"], 7);

        let options = opts(json!({"max_results": "3"}));
        let value = builder
            .build(Intent::SearchDocuments, &task, &options)
            .unwrap()
            .to_value()
            .unwrap();
        assert_eq!(value["max_results"], 3);
    }

    #[test]
    fn test_research_entity_uses_last_word() {
        let builder = PayloadBuilder::default();
        let task = assigned("Research the company Anthropic.", &["research_entity"], WEB_SEARCH_AGENT);
        let value = builder
            .build(Intent::ResearchEntity, &task, &RunOptions::new())
            .unwrap()
            .to_value()
            .unwrap();
        assert_eq!(value, json!({"entity": "Anthropic."}));
    }

    #[test]
    fn test_extract_entities_requires_doc_id() {
        let builder = PayloadBuilder::default();
        let task = assigned("Extract entities", &["extract_entities"], XML_AGENT);

        let err = builder
            .build(Intent::ExtractEntities, &task, &RunOptions::new())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "intent 'extract_entities' requires option 'doc_id'"
        );

        let options = opts(json!({"doc_id": "ABC123"}));
        let value = builder
            .build(Intent::ExtractEntities, &task, &options)
            .unwrap()
            .to_value()
            .unwrap();
        assert_eq!(value, json!({"doc_id": "ABC123"}));
    }

    #[test]
    fn test_payload_intent_matches_builder_intent() {
        let builder = PayloadBuilder::default();
        let task = assigned("Summarize findings", &["summarize"], SUPERVISOR_AGENT);
        let options = opts(json!({"doc_id": "d"}));
        for intent in [
            Intent::Search,
            Intent::ResearchEntity,
            Intent::ExtractEntities,
            Intent::ValidateEntities,
            Intent::GetDocument,
            Intent::SearchDocuments,
            Intent::QueryGraph,
            Intent::ExplainWithSources,
            Intent::Summarize,
        ] {
            let payload = builder.build(intent, &task, &options).unwrap();
            assert_eq!(payload.intent(), intent);
        }
    }

    #[test]
    fn test_intent_serialization_matches_as_str() {
        let json = serde_json::to_string(&Intent::ExplainWithSources).unwrap();
        assert_eq!(json, "\"explain_with_sources\"");
        assert_eq!(Intent::ExplainWithSources.to_string(), "explain_with_sources");
    }
}
