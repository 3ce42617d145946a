use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::LedgerError;

/// Sender recorded on a replenishment, which has no paying user.
pub const NO_SENDER: i32 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Replenishment,
    Payment,
}

impl OperationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::Replenishment => "replenishment",
            OperationKind::Payment => "payment",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationKind {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "replenishment" => Ok(OperationKind::Replenishment),
            "payment" => Ok(OperationKind::Payment),
            other => Err(LedgerError::UnknownOperationType(other.to_string())),
        }
    }
}

/// Immutable ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    pub id: i64,
    pub operation_type: OperationKind,
    pub sender: i32,
    pub recipient: i32,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Row shape of the `operations` table; `type` is stored as text.
#[derive(Debug, FromRow)]
pub(crate) struct OperationRow {
    pub id: i64,
    pub operation_type: String,
    pub sender: i32,
    pub recipient: i32,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<OperationRow> for Operation {
    type Error = LedgerError;

    fn try_from(row: OperationRow) -> Result<Self, Self::Error> {
        Ok(Operation {
            id: row.id,
            operation_type: row.operation_type.parse()?,
            sender: row.sender,
            recipient: row.recipient,
            amount: row.amount,
            created_at: row.created_at,
        })
    }
}
