use service_core::error::AppError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Invalid or expired session")]
    SessionInvalid,

    #[error("CSRF token validation failed")]
    CsrfMismatch,

    #[error("{message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("Username already taken")]
    UsernameTaken,

    #[error("Email already registered")]
    EmailRegistered,

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::InvalidCredentials => {
                AppError::AuthError(anyhow::anyhow!("Invalid username or password"))
            }
            ServiceError::SessionInvalid => {
                AppError::Unauthorized(anyhow::anyhow!("Invalid or expired session"))
            }
            ServiceError::CsrfMismatch => {
                AppError::Forbidden(anyhow::anyhow!("CSRF token validation failed"))
            }
            ServiceError::Validation { field, message } => AppError::Validation { field, message },
            ServiceError::UsernameTaken => {
                AppError::Conflict(anyhow::anyhow!("Username already taken"))
            }
            ServiceError::EmailRegistered => {
                AppError::Conflict(anyhow::anyhow!("Email already registered"))
            }
            ServiceError::Internal(e) => AppError::InternalError(e),
        }
    }
}
