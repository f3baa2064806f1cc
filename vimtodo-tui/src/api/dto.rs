use serde::{Deserialize, Serialize};

/// Response envelope used by every vimtodo-api task endpoint.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    #[allow(dead_code)]
    pub status: String,
    pub data: Option<T>,
}

#[derive(Serialize)]
pub struct CreateTaskRequest<'a> {
    pub task: &'a str,
}

#[derive(Serialize)]
pub struct UpdateTaskRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

#[derive(Serialize)]
pub struct PasswordLoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}
