use async_trait::async_trait;
use rust_decimal::Decimal;
use store::{LedgerError, Operation, Store};

use crate::routes::Ledger;

/// Persistence the service needs. `store::Store` is the production implementation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OperationStorage: Send + Sync {
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

#[async_trait]
impl OperationStorage for Store {
    async fn replenishment_balance(
        &self,
        user_id: i32,
        amount: Decimal,
    ) -> Result<Operation, LedgerError> {
        self.deposit(user_id, amount).await
    }

    async fn payment(
        &self,
        sender_id: i32,
        recipient_id: i32,
        amount: Decimal,
    ) -> Result<Operation, LedgerError> {
        self.transfer(sender_id, recipient_id, amount).await
    }

    async fn recent_operations(&self, user_id: i32) -> Result<Vec<Operation>, LedgerError> {
        Store::recent_operations(self, user_id).await
    }
}

/// Business rules in front of the ledger. Storage errors pass through untouched.
pub struct UserService<S> {
    storage: S,
}

impl<S: OperationStorage> UserService<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }
}

const MAX_AMOUNT_SCALE: u32 = 2;
/// Exclusive upper bound; amounts must fit `NUMERIC(20, 2)`.
const MAX_AMOUNT: i64 = 1_000_000_000_000_000_000;

fn check_user_id(field: &str, id: i32) -> Result<(), LedgerError> {
    if id <= 0 {
        return Err(LedgerError::validation(format!("{field} must be a positive user id")));
    }
    Ok(())
}

fn check_amount(amount: Decimal) -> Result<(), LedgerError> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::validation("amount must be greater than zero"));
    }
    if amount.normalize().scale() > MAX_AMOUNT_SCALE {
        return Err(LedgerError::validation(format!(
            "amount must have at most {MAX_AMOUNT_SCALE} decimal places"
        )));
    }
    if amount >= Decimal::from(MAX_AMOUNT) {
        return Err(LedgerError::validation(format!(
            "amount must be less than {MAX_AMOUNT}"
        )));
    }
    Ok(())
}

#[async_trait]
impl<S: OperationStorage> Ledger for UserService<S> {
    async fn replenishment_balance(
        &self,
        user_id: i32,
        amount: Decimal,
    ) -> Result<Operation, LedgerError> {
        check_user_id("recipient", user_id)?;
        check_amount(amount)?;
        self.storage.replenishment_balance(user_id, amount).await
    }

    async fn payment(
        &self,
        sender_id: i32,
        recipient_id: i32,
        amount: Decimal,
    ) -> Result<Operation, LedgerError> {
        check_user_id("sender", sender_id)?;
        check_user_id("recipient", recipient_id)?;
        if sender_id == recipient_id {
            return Err(LedgerError::validation("sender and recipient must differ"));
        }
        check_amount(amount)?;
        self.storage.payment(sender_id, recipient_id, amount).await
    }

    async fn recent_operations(&self, user_id: i32) -> Result<Vec<Operation>, LedgerError> {
        check_user_id("id", user_id)?;
        self.storage.recent_operations(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use mockall::predicate::eq;
    use rstest::rstest;
    use std::str::FromStr;
    use store::{NO_SENDER, OperationKind};

    fn dec(value: &str) -> Decimal {
        Decimal::from_str(value).unwrap()
    }

    fn operation(id: i64, kind: OperationKind, sender: i32, recipient: i32, amount: &str) -> Operation {
        Operation {
            id,
            operation_type: kind,
            sender,
            recipient,
            amount: dec(amount),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn replenishment_delegates_to_storage() {
        let mut storage = MockOperationStorage::new();
        let recorded = operation(1, OperationKind::Replenishment, NO_SENDER, 1, "100.00");
        let returned = recorded.clone();
        storage
            .expect_replenishment_balance()
            .with(eq(1), eq(dec("100.00")))
            .times(1)
            .returning(move |_, _| Ok(returned.clone()));
        let service = UserService::new(storage);

        let result = service.replenishment_balance(1, dec("100.00")).await.unwrap();

        assert_eq!(result, recorded);
    }

    #[tokio::test]
    async fn replenishment_propagates_storage_error() {
        let mut storage = MockOperationStorage::new();
        storage
            .expect_replenishment_balance()
            .returning(|user_id, _| Err(LedgerError::NotFound(user_id)));
        let service = UserService::new(storage);

        let err = service.replenishment_balance(5, dec("1.00")).await.unwrap_err();

        assert!(matches!(err, LedgerError::NotFound(5)));
    }

    #[tokio::test]
    async fn payment_delegates_to_storage() {
        let mut storage = MockOperationStorage::new();
        storage
            .expect_payment()
            .with(eq(1), eq(2), eq(dec("50.00")))
            .times(1)
            .returning(|sender, recipient, amount| {
                Ok(Operation {
                    id: 2,
                    operation_type: OperationKind::Payment,
                    sender,
                    recipient,
                    amount,
                    created_at: Utc::now(),
                })
            });
        let service = UserService::new(storage);

        let result = service.payment(1, 2, dec("50.00")).await.unwrap();

        assert_eq!(result.operation_type, OperationKind::Payment);
        assert_eq!((result.sender, result.recipient), (1, 2));
    }

    #[tokio::test]
    async fn payment_propagates_insufficient_funds() {
        let mut storage = MockOperationStorage::new();
        storage.expect_payment().returning(|sender, _, amount| {
            Err(LedgerError::InsufficientFunds {
                user_id: sender,
                balance: Decimal::ZERO,
                requested: amount,
            })
        });
        let service = UserService::new(storage);

        let err = service.payment(1, 2, dec("50.00")).await.unwrap_err();

        assert!(matches!(err, LedgerError::InsufficientFunds { user_id: 1, .. }));
    }

    #[tokio::test]
    async fn recent_operations_returns_storage_rows() {
        let mut storage = MockOperationStorage::new();
        let rows = vec![
            operation(2, OperationKind::Payment, 1, 2, "50.00"),
            operation(1, OperationKind::Replenishment, NO_SENDER, 1, "100.00"),
        ];
        let returned = rows.clone();
        storage
            .expect_recent_operations()
            .with(eq(1))
            .returning(move |_| Ok(returned.clone()));
        let service = UserService::new(storage);

        assert_eq!(service.recent_operations(1).await.unwrap(), rows);
    }

    #[tokio::test]
    async fn recent_operations_propagates_storage_error() {
        let mut storage = MockOperationStorage::new();
        storage
            .expect_recent_operations()
            .returning(|_| Err(LedgerError::Storage(sqlx::Error::PoolTimedOut)));
        let service = UserService::new(storage);

        let err = service.recent_operations(1).await.unwrap_err();

        assert!(matches!(err, LedgerError::Storage(_)));
    }

    #[rstest]
    #[case("0")]
    #[case("-5.00")]
    #[case("0.001")]
    #[case("1000000000000000000")]
    #[case("100000000000000000000")]
    #[tokio::test]
    async fn rejects_bad_amounts_before_storage(#[case] amount: &str) {
        let service = UserService::new(MockOperationStorage::new());

        let deposit = service.replenishment_balance(1, dec(amount)).await;
        let transfer = service.payment(1, 2, dec(amount)).await;

        assert!(matches!(deposit, Err(LedgerError::Validation(_))));
        assert!(matches!(transfer, Err(LedgerError::Validation(_))));
    }

    #[tokio::test]
    async fn accepts_trailing_zero_precision() {
        let mut storage = MockOperationStorage::new();
        storage
            .expect_replenishment_balance()
            .returning(|user_id, amount| {
                Ok(operation(1, OperationKind::Replenishment, NO_SENDER, user_id, &amount.to_string()))
            });
        let service = UserService::new(storage);

        assert!(service.replenishment_balance(1, dec("10.5000")).await.is_ok());
    }

    #[tokio::test]
    async fn accepts_largest_storable_amount() {
        let mut storage = MockOperationStorage::new();
        storage
            .expect_replenishment_balance()
            .with(eq(1), eq(dec("999999999999999999.99")))
            .times(1)
            .returning(|user_id, amount| {
                Ok(operation(1, OperationKind::Replenishment, NO_SENDER, user_id, &amount.to_string()))
            });
        let service = UserService::new(storage);

        assert!(service.replenishment_balance(1, dec("999999999999999999.99")).await.is_ok());
    }

    #[tokio::test]
    async fn rejects_self_transfer() {
        let service = UserService::new(MockOperationStorage::new());

        let err = service.payment(3, 3, dec("1.00")).await.unwrap_err();

        assert!(matches!(err, LedgerError::Validation(ref msg) if msg.contains("differ")));
    }

    #[rstest]
    #[case(0, 2)]
    #[case(1, 0)]
    #[case(-1, 2)]
    #[tokio::test]
    async fn rejects_non_positive_user_ids(#[case] sender: i32, #[case] recipient: i32) {
        let service = UserService::new(MockOperationStorage::new());

        let err = service.payment(sender, recipient, dec("1.00")).await.unwrap_err();

        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[tokio::test]
    async fn sentinel_user_has_no_history() {
        let service = UserService::new(MockOperationStorage::new());

        let err = service.recent_operations(NO_SENDER).await.unwrap_err();

        assert!(matches!(err, LedgerError::Validation(_)));
    }
}
