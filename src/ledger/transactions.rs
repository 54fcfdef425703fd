use chrono::{DateTime, NaiveDate, Utc};
use hourglass_rs::SafeTimeProvider;
use tracing::debug;
use uuid::Uuid;

use crate::decimal::Money;
use crate::errors::{LedgerError, Result};
use crate::ledger::accounts::AccountLedger;
use crate::ledger::audit::TransactionAuditLog;
use crate::ledger::owned_account;
use crate::model::{Transaction, TransactionSnapshot};
use crate::store::MemoryStore;
use crate::types::{Category, TransactionId, TransactionKind, UserId};

/// parameters for creating or replacing a transaction
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub account_id: crate::types::AccountId,
    pub amount: Money,
    pub kind: TransactionKind,
    pub category: Category,
    pub description: String,
    pub notes: String,
    /// defaults to the current time when absent
    pub date: Option<DateTime<Utc>>,
}

/// transaction create/update/delete flows
///
/// Every committed transaction has been reflected exactly once in its
/// account's balance. Updates reverse the old effect before applying the new
/// one; deletes reverse the effect and close out the audit trail.
pub struct TransactionEngine;

impl TransactionEngine {
    pub fn create(
        store: &mut MemoryStore,
        user_id: UserId,
        req: NewTransaction,
        time: &SafeTimeProvider,
    ) -> Result<Transaction> {
        if !req.amount.is_positive() {
            return Err(LedgerError::InvalidAmount { amount: req.amount });
        }
        owned_account(store, req.account_id, user_id)?;

        let now = time.now();
        let txn = Transaction {
            id: Uuid::new_v4(),
            account_id: req.account_id,
            user_id,
            amount: req.amount,
            kind: req.kind,
            category: req.category,
            description: req.description,
            notes: req.notes,
            date: req.date.unwrap_or(now),
        };

        AccountLedger::apply_effect(store, txn.account_id, txn.signed_effect(), time)?;
        debug!(transaction = %txn.id, effect = %txn.signed_effect(), "transaction created");
        Ok(store.insert_transaction(txn))
    }

    /// replace a transaction's values, reversing the old balance effect and
    /// applying the new one; equivalent to delete-then-recreate for balances
    pub fn update(
        store: &mut MemoryStore,
        user_id: UserId,
        transaction_id: TransactionId,
        req: NewTransaction,
        time: &SafeTimeProvider,
    ) -> Result<Transaction> {
        if !req.amount.is_positive() {
            return Err(LedgerError::InvalidAmount { amount: req.amount });
        }
        let old = Self::owned_transaction(store, transaction_id, user_id)?.clone();
        owned_account(store, req.account_id, user_id)?;

        let now = time.now();
        let old_snapshot = TransactionSnapshot::from(&old);

        AccountLedger::reverse_effect(store, old.account_id, old.signed_effect(), time)?;

        let txn = store.transaction_mut(transaction_id)?;
        txn.account_id = req.account_id;
        txn.amount = req.amount;
        txn.kind = req.kind;
        txn.category = req.category;
        txn.description = req.description;
        txn.notes = req.notes;
        txn.date = req.date.unwrap_or(old.date);
        let updated = txn.clone();

        AccountLedger::apply_effect(store, updated.account_id, updated.signed_effect(), time)?;

        let new_snapshot = TransactionSnapshot::from(&updated);
        TransactionAuditLog::record_update(
            store,
            transaction_id,
            old_snapshot,
            new_snapshot,
            user_id,
            now,
        );
        debug!(transaction = %transaction_id, "transaction updated");
        Ok(updated)
    }

    /// reverse the balance effect, write the delete audit row, then remove the row
    pub fn delete(
        store: &mut MemoryStore,
        user_id: UserId,
        transaction_id: TransactionId,
        time: &SafeTimeProvider,
    ) -> Result<()> {
        let txn = Self::owned_transaction(store, transaction_id, user_id)?.clone();
        let now = time.now();

        AccountLedger::reverse_effect(store, txn.account_id, txn.signed_effect(), time)?;

        // the audit row must be durable before the transaction row disappears
        TransactionAuditLog::record_delete(store, TransactionSnapshot::from(&txn), user_id, now);
        store.remove_transaction(transaction_id);
        debug!(transaction = %transaction_id, "transaction deleted");
        Ok(())
    }

    /// notes are free-form and carry no balance effect or audit row
    pub fn update_notes(
        store: &mut MemoryStore,
        user_id: UserId,
        transaction_id: TransactionId,
        notes: String,
    ) -> Result<Transaction> {
        Self::owned_transaction(store, transaction_id, user_id)?;
        let txn = store.transaction_mut(transaction_id)?;
        txn.notes = notes;
        Ok(txn.clone())
    }

    pub fn get(
        store: &MemoryStore,
        user_id: UserId,
        transaction_id: TransactionId,
    ) -> Result<Transaction> {
        Self::owned_transaction(store, transaction_id, user_id).cloned()
    }

    pub fn list(store: &MemoryStore, user_id: UserId) -> Vec<Transaction> {
        store
            .transactions_for_user(user_id)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn list_for_account(
        store: &MemoryStore,
        user_id: UserId,
        account_id: crate::types::AccountId,
    ) -> Result<Vec<Transaction>> {
        owned_account(store, account_id, user_id)?;
        Ok(store
            .transactions_for_account(account_id)
            .into_iter()
            .cloned()
            .collect())
    }

    /// transactions inside [start, end], both dates inclusive
    pub fn list_in_range(
        store: &MemoryStore,
        user_id: UserId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Transaction>> {
        if start > end {
            return Err(LedgerError::InvalidDateRange { start, end });
        }
        let from = start
            .and_hms_opt(0, 0, 0)
            .unwrap_or_default()
            .and_utc();
        let to = end
            .and_hms_opt(23, 59, 59)
            .unwrap_or_default()
            .and_utc();
        Ok(store
            .transactions_in_range(user_id, from, to)
            .into_iter()
            .cloned()
            .collect())
    }

    fn owned_transaction(
        store: &MemoryStore,
        transaction_id: TransactionId,
        user_id: UserId,
    ) -> Result<&Transaction> {
        let txn = store.transaction(transaction_id)?;
        if txn.user_id != user_id {
            return Err(LedgerError::Forbidden {
                resource: "transaction",
                id: transaction_id,
            });
        }
        Ok(txn)
    }
}
