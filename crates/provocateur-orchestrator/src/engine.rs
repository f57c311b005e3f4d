use crate::config::ProvocateurConfig;
use crate::payload::{resolve_intent, PayloadBuilder};
use crate::refiner::GoalRefiner;
use crate::store::WorkflowStore;
use crate::types::{RunOptions, Task, TaskOutcome, Workflow, WorkflowResult};
use provocateur_agent::{AgentDispatcher, TextGenerator};
use provocateur_core::ProvocateurResult;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};
use uuid::Uuid;

/// The supervisor: refines goals into tasks and runs them against agents.
///
/// Tasks run one at a time in the order the refiner produced them. Task
/// dependencies are carried in the workflow record but not used for
/// ordering.
pub struct Orchestrator {
    refiner: GoalRefiner,
    dispatcher: Arc<dyn AgentDispatcher>,
    store: Arc<WorkflowStore>,
    payloads: PayloadBuilder,
    task_timeout: Duration,
}

impl Orchestrator {
    /// Create an orchestrator with its own empty workflow store.
    pub fn new(refiner: GoalRefiner, dispatcher: Arc<dyn AgentDispatcher>) -> Self {
        Self {
            refiner,
            dispatcher,
            store: Arc::new(WorkflowStore::new()),
            payloads: PayloadBuilder::default(),
            task_timeout: Duration::from_secs(30),
        }
    }

    /// Build an orchestrator from a parsed config file.
    pub fn from_config(
        config: &ProvocateurConfig,
        generator: Option<Arc<dyn TextGenerator>>,
        dispatcher: Arc<dyn AgentDispatcher>,
    ) -> Self {
        let mut refiner = GoalRefiner::new(config.registry())
            .with_fallback_agent(config.orchestrator.fallback_agent.clone());
        if let Some(generator) = generator {
            refiner = refiner.with_generator(generator);
        }

        Self::new(refiner, dispatcher)
            .with_payload_builder(PayloadBuilder::new(config.orchestrator.default_max_results))
            .with_task_timeout(Duration::from_secs(config.orchestrator.task_timeout_secs))
    }

    /// Share a workflow store with other components.
    pub fn with_store(mut self, store: Arc<WorkflowStore>) -> Self {
        self.store = store;
        self
    }

    /// Replace the payload builder (e.g. a different `max_results` default).
    pub fn with_payload_builder(mut self, payloads: PayloadBuilder) -> Self {
        self.payloads = payloads;
        self
    }

    /// Upper bound on each agent round trip.
    pub fn with_task_timeout(mut self, timeout: Duration) -> Self {
        self.task_timeout = timeout;
        self
    }

    /// The goal refiner used for decomposition and routing.
    pub fn refiner(&self) -> &GoalRefiner {
        &self.refiner
    }

    /// The workflow store this orchestrator writes to.
    pub fn store(&self) -> &Arc<WorkflowStore> {
        &self.store
    }

    /// Snapshot of a stored workflow.
    pub async fn get_workflow(&self, id: Uuid) -> Option<Workflow> {
        self.store.get(id).await
    }

    /// All stored workflows, oldest first.
    pub async fn list_workflows(&self) -> Vec<Workflow> {
        self.store.list().await
    }

    /// Refine `goal`, execute every task, and return the workflow summary.
    ///
    /// Per-task failures (agent errors, timeouts, missing options, unmapped
    /// intents) are recorded in the outcomes; only a refinement failure is
    /// returned as an error, after marking the workflow failed.
    pub async fn process_goal(
        &self,
        goal: &str,
        options: &RunOptions,
    ) -> ProvocateurResult<WorkflowResult> {
        let start = Instant::now();
        let workflow_id = self.store.insert(Workflow::new(goal)).await;

        info!(workflow_id = %workflow_id, goal = %goal, "Processing goal");

        let tasks = match self.refiner.refine_goal(goal).await {
            Ok(tasks) => tasks,
            Err(e) => {
                error!(workflow_id = %workflow_id, error = %e, "Goal refinement failed");
                let reason = e.to_string();
                self.store
                    .update(workflow_id, |wf| wf.fail(reason))
                    .await?;
                return Err(e);
            }
        };

        self.store
            .update(workflow_id, |wf| wf.start(tasks.clone()))
            .await?;

        let timeout = self.timeout_for(options);
        for task in tasks {
            let outcome = self.execute_task(task, options, timeout).await;
            self.store
                .update(workflow_id, |wf| wf.record(outcome))
                .await?;
        }

        let result = self
            .store
            .update(workflow_id, |wf| {
                wf.complete()?;
                Ok(wf.to_result())
            })
            .await?;

        let failed = result.results.iter().filter(|o| !o.is_success()).count();
        info!(
            workflow_id = %workflow_id,
            task_count = result.task_count,
            failed,
            duration_ms = start.elapsed().as_millis(),
            "Workflow complete"
        );

        Ok(result)
    }

    /// Execute one assigned task. Never fails; problems become the outcome.
    async fn execute_task(&self, task: Task, options: &RunOptions, timeout: Duration) -> TaskOutcome {
        let agent = task
            .assigned_agent
            .clone()
            .unwrap_or_else(|| self.refiner.fallback_agent().to_string());

        let Some(intent) = resolve_intent(&task) else {
            warn!(task_id = %task.task_id, agent = %agent, "No intent for task, skipping");
            return TaskOutcome::unmapped(task, agent);
        };

        let payload = match self
            .payloads
            .build(intent, &task, options)
            .and_then(|p| p.to_value())
        {
            Ok(payload) => payload,
            Err(e) => {
                warn!(task_id = %task.task_id, intent = %intent, error = %e, "Could not build payload");
                return TaskOutcome::failed(task, agent, Some(intent.to_string()), e.to_string());
            }
        };

        info!(task_id = %task.task_id, agent = %agent, intent = %intent, "Executing task");

        let response = tokio::time::timeout(
            timeout,
            self.dispatcher
                .send_request(&agent, intent.as_str(), payload),
        )
        .await;

        match response {
            Ok(Ok(result)) => {
                info!(task_id = %task.task_id, agent = %agent, "Task completed");
                TaskOutcome::completed(task, agent, intent.as_str(), result)
            }
            Ok(Err(e)) => {
                error!(task_id = %task.task_id, agent = %agent, error = %e, "Task failed");
                TaskOutcome::failed(task, agent, Some(intent.to_string()), e.to_string())
            }
            Err(_) => {
                error!(task_id = %task.task_id, agent = %agent, timeout_ms = timeout.as_millis(), "Task timed out");
                let message = format!(
                    "agent '{agent}' did not respond within {}ms",
                    timeout.as_millis()
                );
                TaskOutcome::timed_out(task, agent, intent.as_str(), message)
            }
        }
    }

    /// The `timeout_secs` run option, if positive, else the configured timeout.
    fn timeout_for(&self, options: &RunOptions) -> Duration {
        options
            .get("timeout_secs")
            .and_then(serde_json::Value::as_f64)
            .filter(|secs| *secs > 0.0)
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
            .unwrap_or(self.task_timeout)
    }
}
