use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Prefix of ids handed out locally before the server has assigned one.
pub const PROVISIONAL_ID_PREFIX: &str = "temp-";

/// A task as returned by vimtodo-api.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub task: String,
    pub completed: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Task {
    /// True while the task only exists locally, waiting for its create call.
    pub fn is_provisional(&self) -> bool {
        self.id.starts_with(PROVISIONAL_ID_PREFIX)
    }
}

/// The current user, as returned by GET /me.
#[derive(Debug, Clone, Deserialize)]
pub struct Me {
    pub id: i32,
    pub email: String,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_parses_server_timestamps() {
        let json = r#"{
            "id": "6f1c",
            "task": "buy milk",
            "completed": false,
            "createdAt": "2025-06-01T10:00:00Z",
            "updatedAt": "2025-06-01T10:05:30+02:00"
        }"#;

        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.task, "buy milk");
        assert_eq!(task.created_at.unix_timestamp(), 1_748_772_000);
        assert_eq!(task.updated_at - task.created_at, time::Duration::seconds(-6870));
        assert!(!task.is_provisional());
    }
}
