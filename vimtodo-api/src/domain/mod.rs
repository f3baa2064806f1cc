mod error;
pub mod models;
mod task;
mod user;

pub use error::ValidationError;
pub use task::*;
pub use user::*;
