use chrono::{DateTime, Utc};
use provocateur_core::{ProvocateurError, ProvocateurResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use uuid::Uuid;

/// Run-time options supplied with a goal (`doc_id`, `max_results`,
/// `search_provider`, `timeout_secs`, or caller-defined keys).
pub type RunOptions = serde_json::Map<String, serde_json::Value>;

fn default_priority() -> i64 {
    1
}

/// An atomic unit of work derived from a goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub task_id: String,
    pub description: String,
    #[serde(default)]
    pub capabilities: Vec<String>,
    /// Ids of tasks this one depends on. Carried through, not enforced.
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default = "default_priority")]
    pub priority: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_agent: Option<String>,
    /// Task-local options; these win over the run options on key collisions.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub options: RunOptions,
}

impl Task {
    pub fn new<I, S>(description: impl Into<String>, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            task_id: generate_task_id(),
            description: description.into(),
            capabilities: capabilities.into_iter().map(Into::into).collect(),
            dependencies: Vec::new(),
            priority: default_priority(),
            assigned_agent: None,
            options: RunOptions::new(),
        }
    }

    pub fn with_id(mut self, task_id: impl Into<String>) -> Self {
        self.task_id = task_id.into();
        self
    }

    pub fn with_dependencies(mut self, deps: Vec<String>) -> Self {
        self.dependencies = deps;
        self
    }

    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_option(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }

    pub fn is_assigned(&self) -> bool {
        self.assigned_agent.is_some()
    }
}

/// Generate a fresh task identifier.
pub fn generate_task_id() -> String {
    format!("task-{}", Uuid::new_v4())
}

/// What an agent declares it can do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentCapabilityProfile {
    pub agent_id: String,
    pub description: String,
    pub capabilities: BTreeSet<String>,
}

impl AgentCapabilityProfile {
    pub fn new<I, S>(agent_id: impl Into<String>, description: impl Into<String>, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            agent_id: agent_id.into(),
            description: description.into(),
            capabilities: capabilities.into_iter().map(Into::into).collect(),
        }
    }

    /// Number of distinct `required` capabilities this agent declares.
    pub fn score(&self, required: &[String]) -> usize {
        required
            .iter()
            .collect::<HashSet<_>>()
            .into_iter()
            .filter(|cap| self.capabilities.contains(*cap))
            .count()
    }
}

/// Ordered collection of agent profiles.
///
/// Iteration follows insertion order, which is what breaks ties when two
/// agents score the same for a task.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentRegistry {
    profiles: Vec<AgentCapabilityProfile>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_profiles(profiles: Vec<AgentCapabilityProfile>) -> Self {
        Self { profiles }
    }

    /// Append a profile. Duplicates are reported by [`validate`](Self::validate).
    pub fn register(&mut self, profile: AgentCapabilityProfile) {
        self.profiles.push(profile);
    }

    pub fn get(&self, agent_id: &str) -> Option<&AgentCapabilityProfile> {
        self.profiles.iter().find(|p| p.agent_id == agent_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AgentCapabilityProfile> {
        self.profiles.iter()
    }

    pub fn agent_ids(&self) -> Vec<&str> {
        self.profiles.iter().map(|p| p.agent_id.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Reject blank or duplicate agent ids.
    pub fn validate(&self) -> ProvocateurResult<()> {
        let mut seen = HashSet::new();
        for profile in &self.profiles {
            if profile.agent_id.trim().is_empty() {
                return Err(ProvocateurError::Registry(
                    "agent profile with blank id".to_string(),
                ));
            }
            if !seen.insert(profile.agent_id.as_str()) {
                return Err(ProvocateurError::Registry(format!(
                    "duplicate agent id '{}'",
                    profile.agent_id
                )));
            }
        }
        Ok(())
    }
}

/// Lifecycle of a workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl WorkflowStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, WorkflowStatus::Completed | WorkflowStatus::Failed)
    }
}

impl std::fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkflowStatus::Pending => write!(f, "pending"),
            WorkflowStatus::Running => write!(f, "running"),
            WorkflowStatus::Completed => write!(f, "completed"),
            WorkflowStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Per-task result status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Completed,
    Failed,
    TimedOut,
    /// No intent could be determined; the task was skipped.
    Unmapped,
}

/// The record of one task's execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskOutcome {
    pub task: Task,
    pub agent: String,
    pub intent: Option<String>,
    pub status: OutcomeStatus,
    pub result: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TaskOutcome {
    pub fn completed(
        task: Task,
        agent: impl Into<String>,
        intent: impl Into<String>,
        result: serde_json::Value,
    ) -> Self {
        Self {
            task,
            agent: agent.into(),
            intent: Some(intent.into()),
            status: OutcomeStatus::Completed,
            result,
            error: None,
        }
    }

    pub fn failed(
        task: Task,
        agent: impl Into<String>,
        intent: Option<String>,
        error: impl Into<String>,
    ) -> Self {
        Self::errored(task, agent.into(), intent, OutcomeStatus::Failed, error.into())
    }

    pub fn timed_out(
        task: Task,
        agent: impl Into<String>,
        intent: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self::errored(
            task,
            agent.into(),
            Some(intent.into()),
            OutcomeStatus::TimedOut,
            error.into(),
        )
    }

    pub fn unmapped(task: Task, agent: impl Into<String>) -> Self {
        Self {
            task,
            agent: agent.into(),
            intent: None,
            status: OutcomeStatus::Unmapped,
            result: empty_object(),
            error: None,
        }
    }

    fn errored(
        task: Task,
        agent: String,
        intent: Option<String>,
        status: OutcomeStatus,
        error: String,
    ) -> Self {
        Self {
            task,
            agent,
            intent,
            status,
            result: empty_object(),
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Completed
    }
}

fn empty_object() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

/// The record of one goal's decomposition and execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    pub workflow_id: Uuid,
    pub goal: String,
    pub tasks: Vec<Task>,
    pub results: Vec<TaskOutcome>,
    pub status: WorkflowStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Why the workflow failed, when it did.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Workflow {
    pub fn new(goal: impl Into<String>) -> Self {
        Self {
            workflow_id: Uuid::new_v4(),
            goal: goal.into(),
            tasks: Vec::new(),
            results: Vec::new(),
            status: WorkflowStatus::Pending,
            created_at: Utc::now(),
            completed_at: None,
            error: None,
        }
    }

    /// Attach the decomposed tasks and move to `running`.
    pub fn start(&mut self, tasks: Vec<Task>) -> ProvocateurResult<()> {
        if self.status != WorkflowStatus::Pending {
            return Err(self.invalid_transition(WorkflowStatus::Running));
        }
        self.tasks = tasks;
        self.status = WorkflowStatus::Running;
        Ok(())
    }

    pub fn record(&mut self, outcome: TaskOutcome) -> ProvocateurResult<()> {
        if self.status != WorkflowStatus::Running {
            return Err(ProvocateurError::Workflow(format!(
                "workflow {} is {}, cannot record outcomes",
                self.workflow_id, self.status
            )));
        }
        self.results.push(outcome);
        Ok(())
    }

    pub fn complete(&mut self) -> ProvocateurResult<()> {
        if self.status != WorkflowStatus::Running {
            return Err(self.invalid_transition(WorkflowStatus::Completed));
        }
        self.status = WorkflowStatus::Completed;
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    pub fn fail(&mut self, reason: impl Into<String>) -> ProvocateurResult<()> {
        if self.status.is_terminal() {
            return Err(self.invalid_transition(WorkflowStatus::Failed));
        }
        self.status = WorkflowStatus::Failed;
        self.error = Some(reason.into());
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|o| !o.is_success()).count()
    }

    pub fn to_result(&self) -> WorkflowResult {
        WorkflowResult {
            workflow_id: self.workflow_id,
            goal: self.goal.clone(),
            task_count: self.tasks.len(),
            status: self.status,
            results: self.results.clone(),
        }
    }

    fn invalid_transition(&self, to: WorkflowStatus) -> ProvocateurError {
        ProvocateurError::Workflow(format!(
            "workflow {} cannot move from {} to {}",
            self.workflow_id, self.status, to
        ))
    }
}

/// Caller-facing summary of a processed goal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowResult {
    pub workflow_id: Uuid,
    pub goal: String,
    pub task_count: usize,
    pub status: WorkflowStatus,
    pub results: Vec<TaskOutcome>,
}
