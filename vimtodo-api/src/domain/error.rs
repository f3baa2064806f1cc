use thiserror::Error;

/// Input rejected before it reaches the task store.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("task must not be empty")]
    EmptyTask,
    #[error("task must be at most {0} characters")]
    TaskTooLong(usize),
    #[error("script tags are not allowed")]
    ScriptTag,
    #[error("nothing to update")]
    EmptyPatch,
    #[error("name must be between 1 and {0} characters")]
    InvalidName(usize),
    #[error("invalid email address")]
    InvalidEmail,
    #[error("password must be between {min} and {max} characters")]
    PasswordLength { min: usize, max: usize },
    #[error("password must contain a lowercase letter, an uppercase letter and a digit")]
    WeakPassword,
}
