use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::io;

/// Custom error type for deploy_relay operations
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("{0}")]
    Validation(String),

    #[error("Pipeline '{0}' not found.")]
    NotFound(String),

    #[error("Invalid signature.")]
    Auth,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl RelayError {
    fn status_code(&self) -> StatusCode {
        match self {
            RelayError::Validation(_) => StatusCode::BAD_REQUEST,
            RelayError::NotFound(_) => StatusCode::NOT_FOUND,
            RelayError::Auth => StatusCode::UNAUTHORIZED,
            RelayError::Config(_)
            | RelayError::Database(_)
            | RelayError::Io(_)
            | RelayError::TomlParse(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Webhook responses are plaintext, so errors render the same way.
impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        (self.status_code(), format!("Error: {}\n", self)).into_response()
    }
}

/// Helper type for Results that use RelayError
pub type Result<T> = std::result::Result<T, RelayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(
            RelayError::Validation("bad".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            RelayError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(RelayError::Auth.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            RelayError::Config("corrupt".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn not_found_message_names_pipeline() {
        let err = RelayError::NotFound("api-server".into());
        assert_eq!(err.to_string(), "Pipeline 'api-server' not found.");
    }
}
