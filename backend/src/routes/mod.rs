pub mod ledger;
pub mod user;

use actix_web::web;
use async_trait::async_trait;
use rust_decimal::Decimal;
use store::{LedgerError, Operation};

use crate::error::ApiError;

pub use ledger::*;
pub use user::*;

/// Ledger use-cases the HTTP handlers call into.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Ledger: Send + Sync {
    async fn replenishment_balance(
        &self,
        user_id: i32,
        amount: Decimal,
    ) -> Result<Operation, LedgerError>;

    async fn payment(
        &self,
        sender_id: i32,
        recipient_id: i32,
        amount: Decimal,
    ) -> Result<Operation, LedgerError>;

    async fn recent_operations(&self, user_id: i32) -> Result<Vec<Operation>, LedgerError>;
}

/// Registers the ledger endpoints. Malformed JSON bodies answer 400 with `{message}`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    let json = web::JsonConfig::default()
        .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into());

    cfg.app_data(json)
        .service(payment)
        .service(replenishment)
        .service(recent_operations);
}
