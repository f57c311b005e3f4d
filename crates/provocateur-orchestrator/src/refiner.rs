//! Goal decomposition and capability-based agent matching.
//!
//! A goal is turned into tasks by prompting the [`TextGenerator`] for a JSON
//! task list. If no generator is configured, generation fails, or the output
//! cannot be decoded, the refiner falls back to a single generic task built
//! from the goal itself. Every task is then assigned to the agent whose
//! declared capabilities overlap most with the task's.

use crate::profiles::SUPERVISOR_AGENT;
use crate::types::{generate_task_id, AgentRegistry, RunOptions, Task};
use provocateur_agent::TextGenerator;
use provocateur_core::ProvocateurResult;
use serde::de::IgnoredAny;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Capabilities given to the fallback task.
pub const FALLBACK_CAPABILITIES: [&str; 3] = ["process_text", "search", "analyze"];

/// Why the primary decomposition path produced no tasks.
///
/// Never surfaced to callers of [`GoalRefiner::refine_goal`]; every variant
/// leads to the fallback task.
#[derive(Debug, thiserror::Error)]
pub enum DecompositionError {
    /// No generator is configured.
    #[error("no text generator configured")]
    Unavailable,

    /// The generator returned an error.
    #[error("text generation failed: {0}")]
    Generation(String),

    #[error("no JSON found in generator output")]
    NoJson,

    #[error("generator output is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("expected a JSON array of tasks")]
    NotAnArray,

    #[error("generator returned no tasks")]
    EmptyPlan,

    /// A task entry could not be turned into a [`Task`].
    #[error("task {index} is invalid: {reason}")]
    InvalidTask {
        /// Position in the generator's array.
        index: usize,
        /// What was wrong with it.
        reason: String,
    },
}

/// Task as emitted by the generator, before normalization.
#[derive(Debug, Deserialize)]
struct RawTask {
    #[serde(default, alias = "id")]
    task_id: Option<serde_json::Value>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    capabilities: Vec<String>,
    #[serde(default)]
    dependencies: Vec<serde_json::Value>,
    #[serde(default)]
    priority: Option<i64>,
    #[serde(default)]
    options: RunOptions,
}

impl RawTask {
    fn into_task(self, index: usize) -> Result<Task, DecompositionError> {
        let description = self
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
            .ok_or_else(|| DecompositionError::InvalidTask {
                index,
                reason: "missing description".to_string(),
            })?;

        let task_id = self
            .task_id
            .as_ref()
            .and_then(value_to_id)
            .unwrap_or_else(generate_task_id);

        Ok(Task {
            task_id,
            description,
            capabilities: self.capabilities,
            dependencies: self.dependencies.iter().filter_map(value_to_id).collect(),
            priority: self.priority.unwrap_or(1),
            assigned_agent: None,
            options: self.options,
        })
    }
}

fn value_to_id(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Locate the JSON body inside generator output.
///
/// Accepts bare JSON, a fenced code block, or an array embedded in prose.
fn extract_json(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    let bare = trimmed.starts_with('[') || trimmed.starts_with('{');
    if bare && serde_json::from_str::<IgnoredAny>(trimmed).is_ok() {
        return Some(trimmed);
    }

    if let Some(inner) = fenced_body(trimmed) {
        return Some(inner);
    }

    match (trimmed.find('['), trimmed.rfind(']')) {
        (Some(start), Some(end)) if end > start => Some(&trimmed[start..=end]),
        // Let the parser report what is wrong with it.
        _ => bare.then_some(trimmed),
    }
}

/// Contents of the first ``` block, without its language tag.
fn fenced_body(text: &str) -> Option<&str> {
    let fence = text.find("```")?;
    let after = &text[fence + 3..];
    let end = after.find("```")?;
    let block = &after[..end];

    let inner = match block.split_once('\n') {
        Some((tag, rest)) if tag.trim().chars().all(|c| c.is_ascii_alphanumeric()) => rest,
        Some(_) => block,
        None => block.trim_start_matches(|c: char| c.is_ascii_alphanumeric()),
    }
    .trim();

    (!inner.is_empty()).then_some(inner)
}

/// Point dependencies at task ids.
///
/// A dependency naming a task id in the plan is kept. Otherwise an integer
/// within range is read as the position of a task in the plan.
fn resolve_dependencies(tasks: &mut [Task]) {
    let ids: Vec<String> = tasks.iter().map(|t| t.task_id.clone()).collect();
    for task in tasks.iter_mut() {
        for dep in &mut task.dependencies {
            if ids.contains(dep) {
                continue;
            }
            if let Some(id) = dep.parse::<usize>().ok().and_then(|i| ids.get(i)) {
                *dep = id.clone();
            }
        }
    }
}

/// Decode generator output into tasks.
///
/// The output must be a JSON array of task objects, or an object holding
/// that array under `"tasks"`.
pub fn decode_tasks(text: &str) -> Result<Vec<Task>, DecompositionError> {
    let body = extract_json(text).ok_or(DecompositionError::NoJson)?;
    let value: serde_json::Value = serde_json::from_str(body)?;

    let items = match value {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(mut obj) => match obj.remove("tasks") {
            Some(serde_json::Value::Array(items)) => items,
            _ => return Err(DecompositionError::NotAnArray),
        },
        _ => return Err(DecompositionError::NotAnArray),
    };

    if items.is_empty() {
        return Err(DecompositionError::EmptyPlan);
    }

    let mut tasks = items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let raw: RawTask = serde_json::from_value(item).map_err(|e| {
                DecompositionError::InvalidTask {
                    index,
                    reason: e.to_string(),
                }
            })?;
            raw.into_task(index)
        })
        .collect::<Result<Vec<_>, _>>()?;

    resolve_dependencies(&mut tasks);
    Ok(tasks)
}

/// Decomposes goals into tasks and assigns each task to an agent.
pub struct GoalRefiner {
    registry: AgentRegistry,
    generator: Option<Arc<dyn TextGenerator>>,
    fallback_agent: String,
}

impl GoalRefiner {
    /// Create a refiner without a text generator; every goal takes the fallback path.
    pub fn new(registry: AgentRegistry) -> Self {
        Self {
            registry,
            generator: None,
            fallback_agent: SUPERVISOR_AGENT.to_string(),
        }
    }

    /// Decompose goals with `generator` instead of the fallback task.
    pub fn with_generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Override the agent that receives unmatched tasks.
    pub fn with_fallback_agent(mut self, agent_id: impl Into<String>) -> Self {
        self.fallback_agent = agent_id.into();
        self
    }

    /// The agents tasks are matched against.
    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    /// Agent that receives tasks no profile matches.
    pub fn fallback_agent(&self) -> &str {
        &self.fallback_agent
    }

    /// Decompose `goal` and assign every resulting task to an agent.
    ///
    /// Always yields at least one task. Only a malformed registry is an error.
    pub async fn refine_goal(&self, goal: &str) -> ProvocateurResult<Vec<Task>> {
        self.registry.validate()?;

        let mut tasks = match self.decompose(goal).await {
            Ok(tasks) => tasks,
            Err(DecompositionError::Unavailable) => {
                debug!("No text generator configured, using fallback task");
                self.fallback_tasks(goal)
            }
            Err(e) => {
                warn!(error = %e, "Goal decomposition failed, using fallback task");
                self.fallback_tasks(goal)
            }
        };

        self.map_tasks_to_agents(&mut tasks);

        info!(task_count = tasks.len(), "Goal refined");
        Ok(tasks)
    }

    /// Primary decomposition path: prompt the generator and decode its answer.
    pub async fn decompose(&self, goal: &str) -> Result<Vec<Task>, DecompositionError> {
        let generator = self
            .generator
            .as_ref()
            .ok_or(DecompositionError::Unavailable)?;

        let system_prompt = self.system_prompt();
        let prompt = format!("Goal: {goal}");

        let text = generator
            .generate(&system_prompt, &prompt)
            .await
            .map_err(|e| DecompositionError::Generation(e.to_string()))?;

        debug!(response_len = text.len(), "Decomposition response received");
        decode_tasks(&text)
    }

    /// The single generic task used when decomposition is unavailable.
    pub fn fallback_tasks(&self, goal: &str) -> Vec<Task> {
        vec![Task::new(goal, FALLBACK_CAPABILITIES)]
    }

    /// Pick the agent with the largest capability overlap.
    ///
    /// Ties go to the agent registered first. With no capabilities, or no
    /// overlap at all, the fallback agent is returned.
    pub fn find_matching_agent(&self, required: &[String]) -> &str {
        if required.is_empty() {
            return &self.fallback_agent;
        }

        let mut best: Option<&str> = None;
        let mut best_score = 0;
        for profile in self.registry.iter() {
            let score = profile.score(required);
            if score > best_score {
                best_score = score;
                best = Some(profile.agent_id.as_str());
            }
        }

        best.unwrap_or(self.fallback_agent.as_str())
    }

    /// Assign every task to its best-matching agent.
    pub fn map_tasks_to_agents(&self, tasks: &mut [Task]) {
        for task in tasks.iter_mut() {
            let agent = self.find_matching_agent(&task.capabilities).to_string();
            debug!(task_id = %task.task_id, agent = %agent, "Task assigned");
            task.assigned_agent = Some(agent);
        }
    }

    fn system_prompt(&self) -> String {
        let agents = self
            .registry
            .iter()
            .map(|p| {
                let caps: Vec<&str> = p.capabilities.iter().map(String::as_str).collect();
                format!(
                    "- {}: {} (capabilities: {})",
                    p.agent_id,
                    p.description,
                    caps.join(", ")
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        format!("{DECOMPOSITION_PROMPT}\nAvailable agents:\n{agents}\n")
    }
}

const DECOMPOSITION_PROMPT: &str = "\
You are the goal refinement component of a multi-agent system. Break the \
user's goal into a small number of concrete tasks that the available agents \
can carry out.

Respond ONLY with a JSON array. Each element must be an object with:
- \"description\": what the task does, in one sentence
- \"capabilities\": array of capability names taken from the agent list below
- \"dependencies\": array of zero-based indices of tasks in this array that must finish first
- \"priority\": integer, 1 is highest
";

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::profiles::{default_registry, WEB_SEARCH_AGENT, XML_AGENT};
    use crate::types::AgentCapabilityProfile;

    fn caps(list: &[&str]) -> Vec<String> {
        list.iter().map(|c| (*c).to_string()).collect()
    }

    #[test]
    fn test_decode_bare_array() {
        let tasks = decode_tasks(
            r#"[{"description": "Search the web", "capabilities": ["search"], "dependencies": [], "priority": 2}]"#,
        )
        .unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].description, "Search the web");
        assert_eq!(tasks[0].capabilities, caps(&["search"]));
        assert_eq!(tasks[0].priority, 2);
        assert!(tasks[0].task_id.starts_with("task-"));
    }

    #[test]
    fn test_decode_fenced_block() {
        let text = "Here is the plan:\n```json\n[{\"description\": \"Extract entities\"}]\n```\nDone.";
        let tasks = decode_tasks(text).unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].priority, 1);
        assert!(tasks[0].capabilities.is_empty());
    }

    #[test]
    fn test_decode_array_in_prose() {
        let text = "Sure! [{\"description\": \"a\"}, {\"description\": \"b\"}] hope that helps";
        assert_eq!(decode_tasks(text).unwrap().len(), 2);
    }

    #[test]
    fn test_decode_array_followed_by_prose() {
        let text = "[{\"description\": \"Search the web\", \"capabilities\": [\"search\"]}]\nLet me know if you need more.";
        let tasks = decode_tasks(text).unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].description, "Search the web");
    }

    #[test]
    fn test_decode_single_line_fence() {
        let text = "```json [{\"description\": \"Query the graph\"}]```";
        let tasks = decode_tasks(text).unwrap();
        assert_eq!(tasks[0].description, "Query the graph");

        let untagged = "```[{\"description\": \"a\"}]```";
        assert_eq!(decode_tasks(untagged).unwrap().len(), 1);
    }

    #[test]
    fn test_index_dependencies_resolve_to_task_ids() {
        let text = r#"[
            {"description": "Search the web", "dependencies": []},
            {"description": "Summarize results", "dependencies": [0]},
            {"description": "Report", "dependencies": [0, 1, 7]}
        ]"#;
        let tasks = decode_tasks(text).unwrap();
        assert_eq!(tasks[1].dependencies, vec![tasks[0].task_id.clone()]);
        assert_eq!(
            tasks[2].dependencies,
            vec![
                tasks[0].task_id.clone(),
                tasks[1].task_id.clone(),
                "7".to_string()
            ]
        );
    }

    #[test]
    fn test_decode_tasks_object() {
        let text = r#"{"tasks": [{"id": 1, "description": "a"}, {"id": 2, "description": "b", "dependencies": [1]}]}"#;
        let tasks = decode_tasks(text).unwrap();
        assert_eq!(tasks[0].task_id, "1");
        assert_eq!(tasks[1].dependencies, vec!["1".to_string()]);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            decode_tasks("I cannot help with that."),
            Err(DecompositionError::NoJson)
        ));
        assert!(matches!(
            decode_tasks("[{\"description\": "),
            Err(DecompositionError::Parse(_))
        ));
        assert!(matches!(
            decode_tasks("\"just a string\""),
            Err(DecompositionError::NoJson)
        ));
        assert!(matches!(
            decode_tasks("{\"plan\": 1}"),
            Err(DecompositionError::NotAnArray)
        ));
    }

    #[test]
    fn test_decode_rejects_empty_plan() {
        assert!(matches!(
            decode_tasks("[]"),
            Err(DecompositionError::EmptyPlan)
        ));
    }

    #[test]
    fn test_decode_rejects_task_without_description() {
        let err = decode_tasks(r#"[{"description": "ok"}, {"capabilities": ["search"]}]"#)
            .unwrap_err();
        assert!(matches!(err, DecompositionError::InvalidTask { index: 1, .. }));
    }

    #[test]
    fn test_fallback_task_shape() {
        let refiner = GoalRefiner::new(default_registry());
        let tasks = refiner.fallback_tasks("xyz");
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].description, "xyz");
        assert_eq!(
            tasks[0].capabilities,
            caps(&["process_text", "search", "analyze"])
        );
        assert!(tasks[0].dependencies.is_empty());
        assert_eq!(tasks[0].priority, 1);
    }

    #[test]
    fn test_find_matching_agent_empty_caps() {
        let refiner = GoalRefiner::new(default_registry());
        assert_eq!(refiner.find_matching_agent(&[]), SUPERVISOR_AGENT);
    }

    #[test]
    fn test_find_matching_agent_unknown_capability() {
        let refiner = GoalRefiner::new(default_registry());
        assert_eq!(
            refiner.find_matching_agent(&caps(&["unknown_capability"])),
            SUPERVISOR_AGENT
        );
    }

    #[test]
    fn test_find_matching_agent_highest_score() {
        let refiner = GoalRefiner::new(default_registry());
        assert_eq!(
            refiner.find_matching_agent(&caps(&["search", "research_entity"])),
            WEB_SEARCH_AGENT
        );
        assert_eq!(
            refiner.find_matching_agent(&caps(&["extract_entities"])),
            XML_AGENT
        );
    }

    #[test]
    fn test_find_matching_agent_tie_goes_to_first() {
        let registry = AgentRegistry::from_profiles(vec![
            AgentCapabilityProfile::new("alpha_search", "", ["search"]),
            AgentCapabilityProfile::new("beta_search", "", ["search", "other"]),
        ]);
        let refiner = GoalRefiner::new(registry);
        assert_eq!(refiner.find_matching_agent(&caps(&["search"])), "alpha_search");

        let reversed = AgentRegistry::from_profiles(vec![
            AgentCapabilityProfile::new("beta_search", "", ["search", "other"]),
            AgentCapabilityProfile::new("alpha_search", "", ["search"]),
        ]);
        let refiner = GoalRefiner::new(reversed);
        assert_eq!(refiner.find_matching_agent(&caps(&["search"])), "beta_search");
    }

    #[test]
    fn test_find_matching_agent_strictly_higher_wins() {
        let registry = AgentRegistry::from_profiles(vec![
            AgentCapabilityProfile::new("one", "", ["search"]),
            AgentCapabilityProfile::new("two", "", ["search", "analyze"]),
        ]);
        let refiner = GoalRefiner::new(registry);
        assert_eq!(
            refiner.find_matching_agent(&caps(&["search", "analyze"])),
            "two"
        );
    }

    #[test]
    fn test_custom_fallback_agent() {
        let refiner = GoalRefiner::new(AgentRegistry::new()).with_fallback_agent("catch_all");
        assert_eq!(refiner.find_matching_agent(&caps(&["search"])), "catch_all");
    }

    #[tokio::test]
    async fn test_refine_goal_without_generator() {
        let refiner = GoalRefiner::new(default_registry());
        let tasks = refiner.refine_goal("xyz").await.unwrap();
        assert_eq!(tasks.len(), 1);
        // doc_agent (process_text), web_search_agent (search) and
        // supervisor_agent (analyze) all score 1; doc_agent is registered first.
        assert_eq!(tasks[0].assigned_agent.as_deref(), Some("doc_agent"));
    }

    #[tokio::test]
    async fn test_refine_goal_malformed_registry_is_fatal() {
        let registry = AgentRegistry::from_profiles(vec![
            AgentCapabilityProfile::new("a", "", ["x"]),
            AgentCapabilityProfile::new("a", "", ["y"]),
        ]);
        let refiner = GoalRefiner::new(registry);
        assert!(refiner.refine_goal("anything").await.is_err());
    }

    #[test]
    fn test_system_prompt_lists_agents() {
        let refiner = GoalRefiner::new(default_registry());
        let prompt = refiner.system_prompt();
        assert!(prompt.contains("JSON array"));
        assert!(prompt.contains("- xml_agent:"));
        assert!(prompt.contains("extract_entities"));
    }
}
