mod envelope;
mod extract;
pub(crate) mod error;
pub(crate) mod tasks;

pub(crate) use envelope::Envelope;
pub(crate) use error::ApiError;
pub(crate) use extract::JsonBody;
