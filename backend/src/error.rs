use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use log::error;
use serde::{Deserialize, Serialize};
use store::LedgerError;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("request deadline exceeded")]
    DeadlineExceeded,
}

impl ApiError {
    fn client_message(&self) -> String {
        match self {
            ApiError::Ledger(LedgerError::Storage(_))
            | ApiError::Ledger(LedgerError::UnknownOperationType(_)) => {
                "internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Ledger(LedgerError::Validation(_)) => StatusCode::BAD_REQUEST,
            ApiError::Ledger(LedgerError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Ledger(LedgerError::InsufficientFunds { .. }) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ApiError::Ledger(LedgerError::Storage(_))
            | ApiError::Ledger(LedgerError::UnknownOperationType(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::DeadlineExceeded => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            error!("request failed: {}", self);
        }
        HttpResponse::build(status).json(ErrorResponse {
            message: self.client_message(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use rstest::rstest;
    use rust_decimal::Decimal;

    #[rstest]
    #[case(ApiError::BadRequest("bad json".into()), StatusCode::BAD_REQUEST)]
    #[case(LedgerError::validation("amount must be greater than zero").into(), StatusCode::BAD_REQUEST)]
    #[case(LedgerError::NotFound(9).into(), StatusCode::NOT_FOUND)]
    #[case(
        LedgerError::InsufficientFunds { user_id: 1, balance: Decimal::ZERO, requested: Decimal::ONE }.into(),
        StatusCode::UNPROCESSABLE_ENTITY
    )]
    #[case(LedgerError::Storage(sqlx::Error::PoolTimedOut).into(), StatusCode::INTERNAL_SERVER_ERROR)]
    #[case(ApiError::DeadlineExceeded, StatusCode::GATEWAY_TIMEOUT)]
    fn maps_errors_to_status(#[case] err: ApiError, #[case] expected: StatusCode) {
        assert_eq!(err.status_code(), expected);
    }

    #[actix_web::test]
    async fn insufficient_funds_message_reaches_client() {
        let err = ApiError::from(LedgerError::InsufficientFunds {
            user_id: 1,
            balance: Decimal::ZERO,
            requested: Decimal::ONE,
        });

        let body = to_bytes(err.error_response().into_body()).await.unwrap();
        let payload: ErrorResponse = serde_json::from_slice(&body).unwrap();

        assert_eq!(payload.message, "insufficient funds");
    }

    #[actix_web::test]
    async fn storage_details_are_redacted() {
        let err = ApiError::from(LedgerError::Storage(sqlx::Error::PoolTimedOut));

        let body = to_bytes(err.error_response().into_body()).await.unwrap();
        let payload: ErrorResponse = serde_json::from_slice(&body).unwrap();

        assert_eq!(payload.message, "internal server error");
    }
}
