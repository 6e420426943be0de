use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use orders_types::domain::order::ValidationError;
use orders_types::ports::order_repository::RepoError;
use orders_types::ports::payment_gateway::GatewayError;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Order not found: {0}")]
    NotFound(String),

    #[error("Order already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Order already paid: {0}")]
    AlreadyPaid(String),

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    #[error("Malformed event: {0}")]
    MalformedEvent(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Payment processor error: {0}")]
    Processor(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Internal error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// External dependency failures; the caller may try again unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::Processor(_) | AppError::Store(_))
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_)
            | AppError::AlreadyPaid(_)
            | AppError::InvalidSignature(_)
            | AppError::MalformedEvent(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::AlreadyExists(_) | AppError::InvalidTransition(_) => StatusCode::CONFLICT,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Processor(_) => StatusCode::BAD_GATEWAY,
            AppError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(e: ValidationError) -> Self {
        AppError::BadRequest(e.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<RepoError> for AppError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::AlreadyExists(id) => AppError::AlreadyExists(format!("order {id}")),
            e @ RepoError::PaymentRegression(_) => AppError::InvalidTransition(e.to_string()),
            RepoError::DbError(m) => AppError::Store(m),
        }
    }
}

impl From<GatewayError> for AppError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::InvalidSignature(m) => AppError::InvalidSignature(m),
            GatewayError::MalformedPayload(m) => AppError::MalformedEvent(m),
            GatewayError::Processor(m) => AppError::Processor(m),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.status();
        let msg = match &self {
            AppError::Internal(e) => {
                tracing::error!(error = ?e, "internal error");
                "internal error".to_string()
            }
            AppError::Store(m) => {
                tracing::error!(error = %m, "store unavailable");
                "store unavailable".to_string()
            }
            other => other.to_string(),
        };

        let body = serde_json::to_string(&ErrorBody { error: msg })
            .unwrap_or_else(|_| "{\"error\":\"internal serialization\"}".into());
        (code, [("content-type", "application/json")], body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_errors_map_to_taxonomy() {
        let id = uuid::Uuid::new_v4();
        assert!(matches!(
            AppError::from(RepoError::AlreadyExists(id)),
            AppError::AlreadyExists(_)
        ));
        assert!(matches!(
            AppError::from(RepoError::PaymentRegression(id)),
            AppError::InvalidTransition(_)
        ));
        let store = AppError::from(RepoError::DbError("disk full".into()));
        assert!(store.is_retryable());
        assert_eq!(store.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn gateway_errors_map_to_taxonomy() {
        assert!(matches!(
            AppError::from(GatewayError::InvalidSignature("x".into())),
            AppError::InvalidSignature(_)
        ));
        assert!(matches!(
            AppError::from(GatewayError::MalformedPayload("x".into())),
            AppError::MalformedEvent(_)
        ));
        let processor = AppError::from(GatewayError::Processor("down".into()));
        assert!(processor.is_retryable());
        assert_eq!(processor.status(), StatusCode::BAD_GATEWAY);
        assert!(!AppError::NotFound("order".into()).is_retryable());
    }
}
