use thiserror::Error;

/// Client-side error taxonomy. The Display strings are exactly what may be
/// shown to a person; transport and backend detail never leaks into them.
#[derive(Debug, Error)]
pub enum AuthFlowError {
    /// Field-level problem the user can correct. Surfaced next to the field,
    /// never as the global auth error.
    #[error("{message}")]
    Validation { field: String, message: String },

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Your session has expired. Please sign in again.")]
    SessionInvalid,

    #[error("The request could not be verified. Please refresh and try again.")]
    CsrfInvalid,

    #[error("Could not reach the server")]
    Network(#[source] reqwest::Error),

    #[error("Something went wrong on our side. Please try again later.")]
    Server,
}
