/// Error types for postboard-service
///
/// Errors are converted to JSON HTTP responses of the form
/// `{"error": <message>, "status": <code>}`; validation failures add `fields`.
use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use crypto_core::CryptoError;
use doc_store::StoreError;
use std::collections::BTreeMap;
use thiserror::Error;

/// Result type for postboard-service operations
pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    /// Store operation failed
    #[error("Store error: {0}")]
    Store(StoreError),

    /// One or more request fields failed validation
    #[error("Validation failed: {0:?}")]
    Validation(BTreeMap<String, String>),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Single-field validation failure.
    pub fn field(field: &str, message: &str) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(field.to_string(), message.to_string());
        AppError::Validation(fields)
    }

    fn public_message(&self) -> String {
        match self {
            AppError::Store(_) | AppError::Internal(_) => "Internal server error".to_string(),
            AppError::Validation(_) => "Validation failed".to_string(),
            AppError::BadRequest(msg)
            | AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg) => msg.clone(),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Store(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let mut body = serde_json::json!({
            "error": self.public_message(),
            "status": status.as_u16(),
        });
        if let AppError::Validation(fields) = self {
            body["fields"] = serde_json::json!(fields);
        }

        HttpResponse::build(status).json(body)
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(reference) => {
                AppError::NotFound(format!("Document {} not found", reference))
            }
            other => AppError::Store(other),
        }
    }
}

impl From<CryptoError> for AppError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::InvalidToken(msg) => AppError::Unauthorized(format!("Invalid token: {}", msg)),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[actix_web::test]
    async fn validation_errors_render_fields() {
        let err = AppError::field("body", "Must not be empty");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let body = to_bytes(err.error_response().into_body()).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["fields"]["body"], "Must not be empty");
        assert_eq!(value["status"], 400);
    }

    #[actix_web::test]
    async fn store_errors_hide_details() {
        let err = AppError::from(StoreError::Unavailable("pg down at 10.0.0.3".into()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(err.error_response().into_body()).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["error"], "Internal server error");
    }

    #[test]
    fn missing_documents_map_to_not_found() {
        let err = AppError::from(StoreError::NotFound(doc_store::DocRef::new("users", "ghost")));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn invalid_tokens_are_unauthorized() {
        let err = AppError::from(CryptoError::InvalidToken("expired".into()));
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }
}
