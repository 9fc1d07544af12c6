use axum::http::StatusCode;
use serde::Serialize;
use thiserror::Error;

/// Application-level error codes returned alongside the HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidCredentials,
    UserAlreadyExists,
    ResourceNotFound,
    RouteNotFound,
    Unauthorized,
    Forbidden,
    ValidationFailed,
    DeadlinePassed,
    NoAnswers,
    ConsensusGenerationFailed,
    InternalServerError,
}

/// Application-wide error types.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("{0}")]
    InvalidCredentials(String),

    #[error("{0}")]
    UserAlreadyExists(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("The resource {0} doesn't exist")]
    RouteNotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("The deadline for this question has passed")]
    DeadlinePassed,

    #[error("Question has no answers to summarize")]
    NoAnswers,

    #[error("Consensus generation failed: {0}")]
    Consensus(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidCredentials(_) | AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::UserAlreadyExists(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) | AppError::RouteNotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::BadRequest(_) | AppError::DeadlinePassed | AppError::NoAnswers => {
                StatusCode::BAD_REQUEST
            }
            AppError::Consensus(_) => StatusCode::BAD_GATEWAY,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::InvalidCredentials(_) => ErrorCode::InvalidCredentials,
            AppError::UserAlreadyExists(_) => ErrorCode::UserAlreadyExists,
            AppError::Auth(_) => ErrorCode::Unauthorized,
            AppError::NotFound(_) => ErrorCode::ResourceNotFound,
            AppError::RouteNotFound(_) => ErrorCode::RouteNotFound,
            AppError::Forbidden(_) => ErrorCode::Forbidden,
            AppError::BadRequest(_) => ErrorCode::ValidationFailed,
            AppError::DeadlinePassed => ErrorCode::DeadlinePassed,
            AppError::NoAnswers => ErrorCode::NoAnswers,
            AppError::Consensus(_) => ErrorCode::ConsensusGenerationFailed,
            AppError::Database(_) | AppError::Internal(_) => ErrorCode::InternalServerError,
        }
    }
}

/// Helper conversion from anyhow::Error
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<mongodb::error::Error> for AppError {
    fn from(err: mongodb::error::Error) -> Self {
        AppError::Database(err.to_string())
    }
}
