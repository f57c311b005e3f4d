use crate::types::{AgentCapabilityProfile, AgentRegistry};

/// Document retrieval agent.
pub const DOC_AGENT: &str = "doc_agent";
/// Web search and entity research agent.
pub const WEB_SEARCH_AGENT: &str = "web_search_agent";
/// XML processing and entity extraction agent.
pub const XML_AGENT: &str = "xml_agent";
/// GraphRAG knowledge-graph agent.
pub const GRAPHRAG_AGENT: &str = "graphrag_agent";
/// The supervisor. Receives every task no other agent can claim.
pub const SUPERVISOR_AGENT: &str = "supervisor_agent";

/// Create the default agent profiles, in tie-breaking order.
pub fn default_profiles() -> Vec<AgentCapabilityProfile> {
    vec![
        doc_profile(),
        web_search_profile(),
        xml_profile(),
        graphrag_profile(),
        supervisor_profile(),
    ]
}

/// [`default_profiles`] wrapped in a registry.
pub fn default_registry() -> AgentRegistry {
    AgentRegistry::from_profiles(default_profiles())
}

fn doc_profile() -> AgentCapabilityProfile {
    AgentCapabilityProfile::new(
        DOC_AGENT,
        "Retrieves and searches stored documents",
        ["get_document", "search_documents", "process_text"],
    )
}

fn web_search_profile() -> AgentCapabilityProfile {
    AgentCapabilityProfile::new(
        WEB_SEARCH_AGENT,
        "Searches the web and researches named entities",
        ["search", "research_entity", "web_search"],
    )
}

fn xml_profile() -> AgentCapabilityProfile {
    AgentCapabilityProfile::new(
        XML_AGENT,
        "Extracts and validates entities in XML documents",
        ["extract_entities", "validate_entities", "analyze_xml"],
    )
}

fn graphrag_profile() -> AgentCapabilityProfile {
    AgentCapabilityProfile::new(
        GRAPHRAG_AGENT,
        "Answers questions from the entity knowledge graph with source attribution",
        ["query_graph", "explain_with_sources", "graph_search"],
    )
}

fn supervisor_profile() -> AgentCapabilityProfile {
    AgentCapabilityProfile::new(
        SUPERVISOR_AGENT,
        "Coordinates other agents and summarizes their results",
        ["analyze", "summarize", "coordinate"],
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_profiles_count() {
        assert_eq!(default_profiles().len(), 5);
    }

    #[test]
    fn test_default_registry_is_valid() {
        default_registry().validate().unwrap();
    }

    #[test]
    fn test_default_registry_order() {
        let registry = default_registry();
        assert_eq!(
            registry.agent_ids(),
            vec![
                DOC_AGENT,
                WEB_SEARCH_AGENT,
                XML_AGENT,
                GRAPHRAG_AGENT,
                SUPERVISOR_AGENT
            ]
        );
    }

    #[test]
    fn test_only_xml_agent_extracts_entities() {
        let registry = default_registry();
        let extractors: Vec<&str> = registry
            .iter()
            .filter(|p| p.capabilities.contains("extract_entities"))
            .map(|p| p.agent_id.as_str())
            .collect();
        assert_eq!(extractors, vec![XML_AGENT]);
    }

    #[test]
    fn test_profiles_have_descriptions() {
        for profile in default_profiles() {
            assert!(!profile.description.is_empty());
            assert!(!profile.capabilities.is_empty());
        }
    }
}
