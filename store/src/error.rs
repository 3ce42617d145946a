use rust_decimal::Decimal;

/// Failures surfaced by the ledger.
///
/// Every variant is returned only after the enclosing transaction has been
/// rolled back, so none of them leaves a balance without its operation row.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("insufficient funds")]
    InsufficientFunds {
        user_id: i32,
        balance: Decimal,
        requested: Decimal,
    },

    #[error("user {0} not found")]
    NotFound(i32),

    #[error("unknown operation type `{0}`")]
    UnknownOperationType(String),

    #[error("database error: {0}")]
    Storage(#[from] sqlx::Error),
}

impl LedgerError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}
