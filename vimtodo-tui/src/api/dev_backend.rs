use crate::api::error::ClientError;
use crate::api::request::TaskChanges;
use crate::types::Task;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex,
};
use time::{Duration, OffsetDateTime};

/// Upper bound the server puts on task text.
const MAX_TASK_LENGTH: usize = 500;

/// The user every dev session signs in as.
pub const DEV_USER_ID: i32 = 1;
/// Owner of the seeded task the dev user must never see.
const OTHER_USER_ID: i32 = 2;

#[derive(Debug, Clone)]
struct OwnedTask {
    owner_id: i32,
    task: Task,
}

/// In-memory stand-in for vimtodo-api used by `vimtodo dev`. Like the server,
/// it only shows and changes the caller's own tasks; anyone else's answer
/// not found.
#[derive(Debug, Clone)]
pub struct DevBackend {
    user_id: i32,
    store: Arc<Mutex<Vec<OwnedTask>>>,
    next_id: Arc<AtomicU64>,
}

impl DevBackend {
    pub fn new() -> Self {
        let seed = seed_dev_tasks();
        Self {
            user_id: DEV_USER_ID,
            next_id: Arc::new(AtomicU64::new(seed.len() as u64 + 1)),
            store: Arc::new(Mutex::new(seed)),
        }
    }

    /// Newest first, like the server.
    pub fn tasks(&self) -> Vec<Task> {
        let store = self.store.lock().expect("dev store lock poisoned");
        let mut tasks: Vec<Task> = store
            .iter()
            .filter(|owned| owned.owner_id == self.user_id)
            .map(|owned| owned.task.clone())
            .collect();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        tasks
    }

    pub fn create_task(&self, text: &str) -> Result<Task, ClientError> {
        let text = validate(text)?;
        let now = OffsetDateTime::now_utc();
        let task = Task {
            id: format!("dev-{}", self.next_id.fetch_add(1, Ordering::Relaxed)),
            task: text,
            completed: false,
            created_at: now,
            updated_at: now,
        };

        self.store
            .lock()
            .expect("dev store lock poisoned")
            .push(OwnedTask {
                owner_id: self.user_id,
                task: task.clone(),
            });
        Ok(task)
    }

    pub fn update_task(&self, id: &str, changes: &TaskChanges) -> Result<(), ClientError> {
        if changes.task.is_none() && changes.completed.is_none() {
            return Err(ClientError::Status(400));
        }
        let changes = TaskChanges {
            task: changes.task.as_deref().map(validate).transpose()?,
            completed: changes.completed,
        };

        let mut store = self.store.lock().expect("dev store lock poisoned");
        let owned = store
            .iter_mut()
            .find(|owned| owned.task.id == id && owned.owner_id == self.user_id)
            .ok_or(ClientError::NotFound)?;

        changes.apply_to(&mut owned.task);
        owned.task.updated_at = OffsetDateTime::now_utc();
        Ok(())
    }

    pub fn delete_task(&self, id: &str) -> Result<(), ClientError> {
        let mut store = self.store.lock().expect("dev store lock poisoned");
        let index = store
            .iter()
            .position(|owned| owned.task.id == id && owned.owner_id == self.user_id)
            .ok_or(ClientError::NotFound)?;
        store.remove(index);
        Ok(())
    }
}

fn validate(text: &str) -> Result<String, ClientError> {
    let text = text.trim();
    if text.is_empty() || text.chars().count() > MAX_TASK_LENGTH {
        return Err(ClientError::Status(400));
    }
    Ok(text.to_string())
}

fn seed_dev_tasks() -> Vec<OwnedTask> {
    let now = OffsetDateTime::now_utc();

    let task = |owner_id: i32, idx: i64, text: &str, completed: bool| {
        let created = now - Duration::minutes(10 * idx);
        OwnedTask {
            owner_id,
            task: Task {
                id: format!("dev-{}", idx),
                task: text.to_string(),
                completed,
                created_at: created,
                updated_at: created,
            },
        }
    };

    vec![
        task(DEV_USER_ID, 1, "Press ? for the key bindings", false),
        task(DEV_USER_ID, 2, "Move with j and k, jump with gg and G", false),
        task(DEV_USER_ID, 3, "Toggle done with Enter", true),
        task(DEV_USER_ID, 4, "Edit with e, delete with dd", false),
        task(DEV_USER_ID, 5, "Add a task with i or o", false),
        task(OTHER_USER_ID, 6, "Someone else's errand", false),
    ]
}
