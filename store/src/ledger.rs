//! Balance mutations and the operation log.
//!
//! Every write path runs inside one `sqlx::Transaction`: the balance change and
//! the appended `operations` row commit together or not at all. Returning early
//! with `?` drops the transaction, which rolls it back; business rejections roll
//! back explicitly before returning.

use log::{debug, warn};
use rust_decimal::Decimal;
use sqlx::{Postgres, Transaction};

use crate::models::operation::{NO_SENDER, Operation, OperationKind, OperationRow};
use crate::models::user::User;
use crate::{LedgerError, Store};

/// Size of the window returned by [`Store::recent_operations`].
pub const RECENT_OPERATIONS_LIMIT: i64 = 10;

impl Store {
    /// Credits `amount` to `user_id` and records a replenishment.
    pub async fn deposit(&self, user_id: i32, amount: Decimal) -> Result<Operation, LedgerError> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query("UPDATE users SET balance = balance + $1 WHERE id = $2")
            .bind(amount)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(LedgerError::NotFound(user_id));
        }

        let operation = append_operation(
            &mut tx,
            OperationKind::Replenishment,
            NO_SENDER,
            user_id,
            amount,
        )
        .await?;

        tx.commit().await?;
        debug!("replenishment {} credited {} to user {}", operation.id, amount, user_id);
        Ok(operation)
    }

    /// Moves `amount` from `sender_id` to `recipient_id` and records a payment.
    ///
    /// Both user rows are locked with `FOR UPDATE` before the balance check, so
    /// the check and the debit see the same snapshot and a concurrent transfer
    /// from the same sender waits for this one to finish. Rows are locked in
    /// ascending id order so opposite-direction transfers cannot deadlock.
    pub async fn transfer(
        &self,
        sender_id: i32,
        recipient_id: i32,
        amount: Decimal,
    ) -> Result<Operation, LedgerError> {
        let mut tx = self.pool.begin().await?;

        let locked: Vec<User> = sqlx::query_as(
            "SELECT id, balance FROM users WHERE id = ANY($1) ORDER BY id FOR UPDATE",
        )
        .bind(vec![sender_id, recipient_id])
        .fetch_all(&mut *tx)
        .await?;

        let Some(sender) = locked.iter().find(|user| user.id == sender_id) else {
            tx.rollback().await?;
            return Err(LedgerError::NotFound(sender_id));
        };
        if !locked.iter().any(|user| user.id == recipient_id) {
            tx.rollback().await?;
            return Err(LedgerError::NotFound(recipient_id));
        }

        if sender.balance < amount {
            let balance = sender.balance;
            tx.rollback().await?;
            warn!(
                "payment from user {} rejected: balance {} below requested {}",
                sender_id, balance, amount
            );
            return Err(LedgerError::InsufficientFunds {
                user_id: sender_id,
                balance,
                requested: amount,
            });
        }

        sqlx::query("UPDATE users SET balance = balance - $1 WHERE id = $2")
            .bind(amount)
            .bind(sender_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE users SET balance = balance + $1 WHERE id = $2")
            .bind(amount)
            .bind(recipient_id)
            .execute(&mut *tx)
            .await?;

        let operation = append_operation(
            &mut tx,
            OperationKind::Payment,
            sender_id,
            recipient_id,
            amount,
        )
        .await?;

        tx.commit().await?;
        debug!(
            "payment {} moved {} from user {} to user {}",
            operation.id, amount, sender_id, recipient_id
        );
        Ok(operation)
    }

    /// Latest operations where `user_id` is sender or recipient, newest first.
    pub async fn recent_operations(&self, user_id: i32) -> Result<Vec<Operation>, LedgerError> {
        let rows: Vec<OperationRow> = sqlx::query_as(
            r#"
            SELECT id, type AS operation_type, sender, recipient, amount, created_at
            FROM operations
            WHERE recipient = $1 OR sender = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(RECENT_OPERATIONS_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Operation::try_from).collect()
    }

    pub async fn get_user(&self, user_id: i32) -> Result<Option<User>, LedgerError> {
        let user = sqlx::query_as("SELECT id, balance FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }
}

async fn append_operation(
    tx: &mut Transaction<'_, Postgres>,
    kind: OperationKind,
    sender: i32,
    recipient: i32,
    amount: Decimal,
) -> Result<Operation, LedgerError> {
    let row: OperationRow = sqlx::query_as(
        r#"
        INSERT INTO operations (type, recipient, sender, amount)
        VALUES ($1, $2, $3, $4)
        RETURNING id, type AS operation_type, sender, recipient, amount, created_at
        "#,
    )
    .bind(kind.as_str())
    .bind(recipient)
    .bind(sender)
    .bind(amount)
    .fetch_one(&mut **tx)
    .await?;

    Operation::try_from(row)
}
