use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use crate::domain::{
    models::{TaskId, UserId},
    Task, TaskPatch, TaskText,
};

use super::repo_error::RepositoryError;

/// Persistence for tasks, always scoped to an owner.
///
/// Every operation that takes an id also takes the caller's [`UserId`]; a task
/// owned by someone else is reported exactly like a missing one.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// All tasks of `owner`, newest first.
    async fn list_tasks(&self, owner: UserId) -> Result<Vec<Task>, RepositoryError>;
    async fn create_task(&self, owner: UserId, text: &TaskText) -> Result<Task, RepositoryError>;
    async fn update_task(
        &self,
        id: &TaskId,
        owner: UserId,
        patch: &TaskPatch,
    ) -> Result<Task, RepositoryError>;
    async fn delete_task(&self, id: &TaskId, owner: UserId) -> Result<(), RepositoryError>;
}

fn task_not_found(id: &TaskId) -> RepositoryError {
    RepositoryError::NotFound(format!("task {id}"))
}

pub struct PgTaskRepository {
    pool: PgPool,
}

impl PgTaskRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskRepository for PgTaskRepository {
    async fn list_tasks(&self, owner: UserId) -> Result<Vec<Task>, RepositoryError> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, task, completed, owner_id, created_at, updated_at
            FROM tasks
            WHERE owner_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        Ok(tasks)
    }

    async fn create_task(&self, owner: UserId, text: &TaskText) -> Result<Task, RepositoryError> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (id, task, completed, owner_id)
            VALUES ($1, $2, FALSE, $3)
            RETURNING id, task, completed, owner_id, created_at, updated_at
            "#,
        )
        .bind(TaskId::generate())
        .bind(text.as_str())
        .bind(owner)
        .fetch_one(&self.pool)
        .await?;

        Ok(task)
    }

    async fn update_task(
        &self,
        id: &TaskId,
        owner: UserId,
        patch: &TaskPatch,
    ) -> Result<Task, RepositoryError> {
        sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET task = COALESCE($3, task),
                completed = COALESCE($4, completed),
                updated_at = NOW()
            WHERE id = $1 AND owner_id = $2
            RETURNING id, task, completed, owner_id, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(owner)
        .bind(patch.task.as_ref().map(TaskText::as_str))
        .bind(patch.completed)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| task_not_found(id))
    }

    async fn delete_task(&self, id: &TaskId, owner: UserId) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"
            DELETE FROM tasks
            WHERE id = $1 AND owner_id = $2
            "#,
        )
        .bind(id)
        .bind(owner)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(task_not_found(id));
        }

        Ok(())
    }
}

/// Task store kept in process memory. Backs `--in-memory` server runs and tests.
#[derive(Default)]
pub struct InMemoryTaskRepository {
    // Newest first, matching the list order.
    tasks: RwLock<Vec<Task>>,
}

impl InMemoryTaskRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn list_tasks(&self, owner: UserId) -> Result<Vec<Task>, RepositoryError> {
        let tasks = self.tasks.read().await;
        Ok(tasks
            .iter()
            .filter(|task| task.owner_id == owner)
            .cloned()
            .collect())
    }

    async fn create_task(&self, owner: UserId, text: &TaskText) -> Result<Task, RepositoryError> {
        let now = OffsetDateTime::now_utc();
        let task = Task {
            id: TaskId::generate(),
            task: text.as_str().to_string(),
            completed: false,
            owner_id: owner,
            created_at: now,
            updated_at: now,
        };

        self.tasks.write().await.insert(0, task.clone());
        Ok(task)
    }

    async fn update_task(
        &self,
        id: &TaskId,
        owner: UserId,
        patch: &TaskPatch,
    ) -> Result<Task, RepositoryError> {
        let mut tasks = self.tasks.write().await;
        let task = tasks
            .iter_mut()
            .find(|task| &task.id == id && task.owner_id == owner)
            .ok_or_else(|| task_not_found(id))?;

        patch.apply_to(task, OffsetDateTime::now_utc());
        Ok(task.clone())
    }

    async fn delete_task(&self, id: &TaskId, owner: UserId) -> Result<(), RepositoryError> {
        let mut tasks = self.tasks.write().await;
        let position = tasks
            .iter()
            .position(|task| &task.id == id && task.owner_id == owner)
            .ok_or_else(|| task_not_found(id))?;

        tasks.remove(position);
        Ok(())
    }
}
