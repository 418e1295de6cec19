use crate::models::FieldErrors;
use crate::storage::StoreError;
use axum::http::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum EmissionError {
    #[error("please fill all fields: {0}")]
    Validation(FieldErrors),

    #[error("entry not found: {0}")]
    NotFound(u64),

    /// The in-memory change was applied but could not be saved.
    #[error("failed to persist state: {0}")]
    Persistence(#[from] StoreError),

    #[error("no fields changed")]
    Unchanged,

    #[error("invalid preference: {0}")]
    InvalidPreference(String),
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl From<EmissionError> for AppError {
    fn from(err: EmissionError) -> Self {
        let status = match err {
            EmissionError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            EmissionError::NotFound(_) => StatusCode::NOT_FOUND,
            EmissionError::Unchanged => StatusCode::CONFLICT,
            EmissionError::InvalidPreference(_) => StatusCode::BAD_REQUEST,
            EmissionError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}
