use axum::extract::FromRequest;

use super::ApiError;

/// `axum::Json` whose rejections answer 400 in the error envelope.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);
