use axum::extract::FromRequest;

use crate::error::ApiError;

/// `Json` extractor whose rejections become 400 `ApiError`s instead of
/// axum's default 415/422 plain-text responses
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ValidJson<T>(pub T);

/// Field-level checks a request body runs after it has been parsed
pub trait Validate {
    fn validate(&self) -> Result<(), ApiError>;
}
