use hourglass_rs::SafeTimeProvider;
use tracing::debug;
use uuid::Uuid;

use crate::decimal::Money;
use crate::errors::{LedgerError, Result};
use crate::ledger::accounts::AccountLedger;
use crate::ledger::owned_account;
use crate::model::{Transaction, Transfer};
use crate::store::MemoryStore;
use crate::types::{AccountId, Category, TransactionKind, TransferId, UserId};

/// parameters for moving funds between two accounts of one user
#[derive(Debug, Clone)]
pub struct NewTransfer {
    pub source_account_id: AccountId,
    pub destination_account_id: AccountId,
    pub amount: Money,
    pub description: String,
}

/// atomic two-account transfer
///
/// A transfer debits the source, credits the destination, records the
/// transfer row, and mirrors itself as a pair of transfer-category
/// transactions so account statements stay complete. All checks run before
/// the first balance mutation.
pub struct TransferEngine;

impl TransferEngine {
    pub fn transfer(
        store: &mut MemoryStore,
        user_id: UserId,
        req: NewTransfer,
        time: &SafeTimeProvider,
    ) -> Result<Transfer> {
        if !req.amount.is_positive() {
            return Err(LedgerError::InvalidAmount { amount: req.amount });
        }
        let source = owned_account(store, req.source_account_id, user_id)?;
        if source.balance < req.amount {
            return Err(LedgerError::InsufficientFunds {
                available: source.balance,
                requested: req.amount,
            });
        }
        let source_name = source.name.clone();
        let destination = owned_account(store, req.destination_account_id, user_id)?;
        let destination_name = destination.name.clone();

        let now = time.now();
        AccountLedger::debit(store, req.source_account_id, req.amount, time)?;
        AccountLedger::credit(store, req.destination_account_id, req.amount, time)?;

        let transfer = Transfer {
            id: Uuid::new_v4(),
            source_account_id: req.source_account_id,
            destination_account_id: req.destination_account_id,
            amount: req.amount,
            description: req.description.clone(),
            date: now,
            user_id,
        };

        // statement rows; the balance effects above are the only real ones,
        // so these are inserted directly instead of going through the engine
        store.insert_transaction(Transaction {
            id: Uuid::new_v4(),
            account_id: req.source_account_id,
            user_id,
            amount: req.amount,
            kind: TransactionKind::Expense,
            category: Category::Transfer,
            description: format!("{} (Transfer to {})", req.description, destination_name),
            notes: String::new(),
            date: now,
        });
        store.insert_transaction(Transaction {
            id: Uuid::new_v4(),
            account_id: req.destination_account_id,
            user_id,
            amount: req.amount,
            kind: TransactionKind::Income,
            category: Category::Transfer,
            description: format!("{} (Transfer from {})", req.description, source_name),
            notes: String::new(),
            date: now,
        });

        debug!(transfer = %transfer.id, amount = %transfer.amount, "transfer completed");
        Ok(store.insert_transfer(transfer))
    }

    pub fn get(store: &MemoryStore, user_id: UserId, transfer_id: TransferId) -> Result<Transfer> {
        let transfer = store.transfer(transfer_id)?;
        if transfer.user_id != user_id {
            return Err(LedgerError::Forbidden {
                resource: "transfer",
                id: transfer_id,
            });
        }
        Ok(transfer.clone())
    }

    pub fn list(store: &MemoryStore, user_id: UserId) -> Vec<Transfer> {
        store
            .transfers_for_user(user_id)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn list_for_account(
        store: &MemoryStore,
        user_id: UserId,
        account_id: AccountId,
    ) -> Result<Vec<Transfer>> {
        owned_account(store, account_id, user_id)?;
        Ok(store
            .transfers_for_account(account_id)
            .into_iter()
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::accounts::NewAccount;
    use crate::types::AccountType;
    use chrono::{TimeZone, Utc};
    use hourglass_rs::TimeSource;

    fn fixed_time() -> SafeTimeProvider {
        SafeTimeProvider::new(TimeSource::Test(
            Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
        ))
    }

    fn open(store: &mut MemoryStore, user: UserId, name: &str, balance: i64) -> AccountId {
        AccountLedger::create_account(
            store,
            user,
            NewAccount {
                name: name.to_string(),
                account_type: AccountType::Bank,
                opening_balance: Money::from_major(balance),
                account_number: None,
                description: None,
            },
            &fixed_time(),
        )
        .unwrap()
        .id
    }

    fn request(source: AccountId, destination: AccountId, amount: i64) -> NewTransfer {
        NewTransfer {
            source_account_id: source,
            destination_account_id: destination,
            amount: Money::from_major(amount),
            description: "monthly savings".to_string(),
        }
    }

    #[test]
    fn test_transfer_moves_funds_and_mirrors_transactions() {
        let mut store = MemoryStore::new();
        let user = Uuid::new_v4();
        let time = fixed_time();
        let checking = open(&mut store, user, "checking", 100);
        let savings = open(&mut store, user, "savings", 20);

        TransferEngine::transfer(&mut store, user, request(checking, savings, 40), &time).unwrap();

        assert_eq!(store.account(checking).unwrap().balance, Money::from_major(60));
        assert_eq!(store.account(savings).unwrap().balance, Money::from_major(60));

        let out = store.transactions_for_account(checking);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].kind, TransactionKind::Expense);
        assert_eq!(out[0].category, Category::Transfer);
        assert_eq!(out[0].description, "monthly savings (Transfer to savings)");

        let inbound = store.transactions_for_account(savings);
        assert_eq!(inbound.len(), 1);
        assert_eq!(inbound[0].kind, TransactionKind::Income);
        assert_eq!(inbound[0].description, "monthly savings (Transfer from checking)");
    }

    #[test]
    fn test_insufficient_funds_leaves_both_accounts_untouched() {
        let mut store = MemoryStore::new();
        let user = Uuid::new_v4();
        let time = fixed_time();
        let checking = open(&mut store, user, "checking", 10);
        let savings = open(&mut store, user, "savings", 0);

        let err = TransferEngine::transfer(&mut store, user, request(checking, savings, 40), &time)
            .unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientFunds {
                available: Money::from_major(10),
                requested: Money::from_major(40),
            }
        );
        assert_eq!(store.account(checking).unwrap().balance, Money::from_major(10));
        assert_eq!(store.account(savings).unwrap().balance, Money::ZERO);
        assert!(store.transactions_for_account(checking).is_empty());
    }

    #[test]
    fn test_zero_amount_rejected() {
        let mut store = MemoryStore::new();
        let user = Uuid::new_v4();
        let time = fixed_time();
        let checking = open(&mut store, user, "checking", 100);
        let savings = open(&mut store, user, "savings", 0);

        let err = TransferEngine::transfer(&mut store, user, request(checking, savings, 0), &time)
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidAmount { .. }));
    }

    #[test]
    fn test_destination_must_belong_to_the_same_user() {
        let mut store = MemoryStore::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let time = fixed_time();
        let source = open(&mut store, alice, "checking", 100);
        let foreign = open(&mut store, bob, "checking", 0);

        let err = TransferEngine::transfer(&mut store, alice, request(source, foreign, 40), &time)
            .unwrap_err();
        assert!(matches!(err, LedgerError::Forbidden { .. }));
        assert_eq!(store.account(source).unwrap().balance, Money::from_major(100));
    }

    #[test]
    fn test_listings_are_scoped_to_the_account() {
        let mut store = MemoryStore::new();
        let user = Uuid::new_v4();
        let time = fixed_time();
        let a = open(&mut store, user, "a", 100);
        let b = open(&mut store, user, "b", 100);
        let c = open(&mut store, user, "c", 100);

        TransferEngine::transfer(&mut store, user, request(a, b, 10), &time).unwrap();
        TransferEngine::transfer(&mut store, user, request(b, c, 5), &time).unwrap();

        assert_eq!(TransferEngine::list(&store, user).len(), 2);
        assert_eq!(TransferEngine::list_for_account(&store, user, a).unwrap().len(), 1);
        assert_eq!(TransferEngine::list_for_account(&store, user, b).unwrap().len(), 2);
    }
}
