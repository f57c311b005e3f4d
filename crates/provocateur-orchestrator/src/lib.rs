//! Goal refinement and task-to-agent routing for Agent Provocateur.
//!
//! Implements the supervisor side of the multi-agent system: a free-form
//! goal is decomposed into tasks, each task is routed to the agent whose
//! capabilities overlap most, an intent-specific payload is built, and the
//! tasks are executed one after another with their outcomes collected into
//! a workflow record.
//!
//! # Main types
//!
//! - [`Orchestrator`] — Runs goals end to end and owns the workflow store.
//! - [`GoalRefiner`] — Decomposes goals and matches tasks to agents.
//! - [`PayloadBuilder`] — Turns a task and run options into a [`TaskPayload`].
//! - [`WorkflowStore`] — In-memory record of processed workflows.
//! - [`AgentRegistry`] — Ordered agent capability profiles.

/// Configuration file parsing.
pub mod config;
/// Workflow execution engine.
pub mod engine;
/// Intent resolution and payload construction.
pub mod payload;
/// Default agent profiles.
pub mod profiles;
/// Goal decomposition and agent matching.
pub mod refiner;
/// Workflow store.
pub mod store;
/// Shared types (Task, Workflow, TaskOutcome, etc.).
pub mod types;

pub use config::{AgentConfig, OrchestratorConfig, ProvocateurConfig};
pub use engine::Orchestrator;
pub use payload::{resolve_intent, Intent, PayloadBuilder, PayloadError, TaskPayload};
pub use profiles::{default_profiles, default_registry, SUPERVISOR_AGENT};
pub use refiner::{decode_tasks, DecompositionError, GoalRefiner, FALLBACK_CAPABILITIES};
pub use store::WorkflowStore;
pub use types::{
    AgentCapabilityProfile, AgentRegistry, OutcomeStatus, RunOptions, Task, TaskOutcome, Workflow,
    WorkflowResult, WorkflowStatus,
};
