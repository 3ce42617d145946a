pub mod error;
pub mod ledger;
pub mod models;

use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

pub use error::LedgerError;
pub use ledger::RECENT_OPERATIONS_LIMIT;
pub use models::operation::{NO_SENDER, Operation, OperationKind};
pub use models::user::User;

/// Handle to the ledger database. Cloning shares the underlying pool.
#[derive(Clone)]
pub struct Store {
    pub pool: PgPool,
}

impl Store {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a pool against `database_url`.
    ///
    /// `acquire_timeout` bounds both the initial connect and every later checkout,
    /// so a saturated or unreachable database surfaces as `LedgerError::Storage`
    /// instead of blocking a request forever.
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, LedgerError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }
}
