use crate::types::Workflow;
use provocateur_core::{ProvocateurError, ProvocateurResult};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory record of every workflow an orchestrator has processed.
pub struct WorkflowStore {
    workflows: RwLock<HashMap<Uuid, Workflow>>,
}

impl Default for WorkflowStore {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkflowStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            workflows: RwLock::new(HashMap::new()),
        }
    }

    /// Add a workflow. Returns its id.
    pub async fn insert(&self, workflow: Workflow) -> Uuid {
        let id = workflow.workflow_id;
        self.workflows.write().await.insert(id, workflow);
        id
    }

    /// Snapshot of a workflow.
    pub async fn get(&self, id: Uuid) -> Option<Workflow> {
        self.workflows.read().await.get(&id).cloned()
    }

    /// Snapshots of all workflows, oldest first.
    pub async fn list(&self) -> Vec<Workflow> {
        let mut workflows: Vec<Workflow> = self.workflows.read().await.values().cloned().collect();
        workflows.sort_by_key(|w| w.created_at);
        workflows
    }

    /// Apply `f` to the stored workflow under the write lock.
    pub async fn update<F, T>(&self, id: Uuid, f: F) -> ProvocateurResult<T>
    where
        F: FnOnce(&mut Workflow) -> ProvocateurResult<T>,
    {
        let mut workflows = self.workflows.write().await;
        let workflow = workflows
            .get_mut(&id)
            .ok_or_else(|| ProvocateurError::Workflow(format!("workflow {id} not found")))?;
        f(workflow)
    }

    /// Number of stored workflows.
    pub async fn len(&self) -> usize {
        self.workflows.read().await.len()
    }

    /// Whether no workflow has been stored yet.
    pub async fn is_empty(&self) -> bool {
        self.workflows.read().await.is_empty()
    }
}
