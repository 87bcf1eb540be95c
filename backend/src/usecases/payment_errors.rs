use axum::http::StatusCode;
use sakina_core::payments::alif_client::AlifGatewayError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("{0}")]
    Validation(String),
    #[error("payment gateway returned an invalid response: {0}")]
    GatewayProtocol(String),
    /// The gateway's own message, kept verbatim for support.
    #[error("{message}")]
    GatewayRejection { code: i64, message: String },
    #[error("{0}")]
    Authentication(String),
    #[error("{0}")]
    NotFound(String),
    #[error("failed to persist payment data: {0}")]
    Persistence(anyhow::Error),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl PaymentError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            PaymentError::Validation(_) => StatusCode::BAD_REQUEST,
            PaymentError::GatewayProtocol(_) | PaymentError::GatewayRejection { .. } => {
                StatusCode::BAD_GATEWAY
            }
            PaymentError::Authentication(_) => StatusCode::UNAUTHORIZED,
            PaymentError::NotFound(_) => StatusCode::NOT_FOUND,
            PaymentError::Persistence(_) | PaymentError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Text safe to return to callers. Datastore and internal details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            PaymentError::Persistence(_) | PaymentError::Internal(_) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl From<AlifGatewayError> for PaymentError {
    fn from(err: AlifGatewayError) -> Self {
        match err {
            AlifGatewayError::Rejected { code, message } => {
                PaymentError::GatewayRejection { code, message }
            }
            AlifGatewayError::Transport(err) => PaymentError::GatewayProtocol(err.to_string()),
            AlifGatewayError::Protocol(detail) => PaymentError::GatewayProtocol(detail),
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, PaymentError>;

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn maps_variants_to_http_statuses() {
        assert_eq!(
            PaymentError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            PaymentError::GatewayProtocol("x".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            PaymentError::Authentication("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            PaymentError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            PaymentError::Persistence(anyhow!("db down")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn gateway_rejection_keeps_the_gateway_message() {
        let err = PaymentError::from(AlifGatewayError::Rejected {
            code: -1,
            message: "Неверный токен".to_string(),
        });

        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.public_message(), "Неверный токен");
    }

    #[test]
    fn internal_details_are_not_exposed() {
        let err = PaymentError::Persistence(anyhow!("duplicate key value violates constraint"));
        assert_eq!(err.public_message(), "Internal server error");
    }
}
