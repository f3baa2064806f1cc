pub mod client;
pub mod dev_backend;
pub mod dto;
pub mod error;
pub mod request;

pub use client::{ApiClient, SESSION_COOKIE};
pub use error::ClientError;
pub use request::{TaskChanges, TaskRequest, TaskResponse};
