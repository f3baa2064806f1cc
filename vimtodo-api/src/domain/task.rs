use serde::Serialize;
use time::OffsetDateTime;

use super::{
    models::{TaskId, UserId},
    ValidationError,
};

pub const MAX_TASK_LENGTH: usize = 500;

/// A task as stored and as sent over the wire.
///
/// The owner is never serialized: a caller only ever sees its own tasks, so
/// the field carries no information for it.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub task: String,
    pub completed: bool,
    #[serde(skip)]
    pub owner_id: UserId,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Trimmed, non-empty task text that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskText(String);

impl TaskText {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyTask);
        }
        if trimmed.chars().count() > MAX_TASK_LENGTH {
            return Err(ValidationError::TaskTooLong(MAX_TASK_LENGTH));
        }
        if trimmed.to_lowercase().contains("<script") {
            return Err(ValidationError::ScriptTag);
        }

        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A validated partial update. At least one field is always present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskPatch {
    pub task: Option<TaskText>,
    pub completed: Option<bool>,
}

impl TaskPatch {
    pub fn parse(task: Option<&str>, completed: Option<bool>) -> Result<Self, ValidationError> {
        if task.is_none() && completed.is_none() {
            return Err(ValidationError::EmptyPatch);
        }

        let task = task.map(TaskText::parse).transpose()?;
        Ok(Self { task, completed })
    }

    /// Apply the patch to an in-memory task, refreshing `updated_at`.
    pub fn apply_to(&self, task: &mut Task, now: OffsetDateTime) {
        if let Some(text) = &self.task {
            task.task = text.as_str().to_string();
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
        task.updated_at = now;
    }
}
