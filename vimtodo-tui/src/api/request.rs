use crate::types::Task;

/// Fields of a partial task update. At least one is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskChanges {
    pub task: Option<String>,
    pub completed: Option<bool>,
}

impl TaskChanges {
    /// Write the changes onto a local copy of the task.
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(text) = &self.task {
            task.task = text.clone();
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
    }
}

/// One call against the task endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskRequest {
    List,
    Create { text: String },
    Update { id: String, changes: TaskChanges },
    Delete { id: String },
}

impl TaskRequest {
    /// The task id this call targets, if any.
    pub fn task_id(&self) -> Option<&str> {
        match self {
            Self::Update { id, .. } | Self::Delete { id } => Some(id),
            Self::List | Self::Create { .. } => None,
        }
    }

    pub(crate) fn retarget(&mut self, new_id: &str) {
        if let Self::Update { id, .. } | Self::Delete { id } = self {
            *id = new_id.to_string();
        }
    }
}

/// Successful outcome of a [`TaskRequest`].
#[derive(Debug, Clone, PartialEq)]
pub enum TaskResponse {
    Listed(Vec<Task>),
    Created(Task),
    Updated,
    Deleted,
}
