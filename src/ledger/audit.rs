use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::errors::{LedgerError, Result};
use crate::model::{TransactionHistory, TransactionSnapshot};
use crate::store::MemoryStore;
use crate::types::{ChangeType, TransactionId, UserId};

/// append-only audit trail of transaction edits
///
/// Update rows keep their transaction id so `history_for` can list them while
/// the transaction lives. Delete rows are written with a null transaction id
/// *before* the transaction row is removed, so no row ever references a
/// transaction that is already gone; `orphaned_history` recovers them.
pub struct TransactionAuditLog;

impl TransactionAuditLog {
    /// append one immutable row
    pub fn record_change(
        store: &mut MemoryStore,
        transaction_id: Option<TransactionId>,
        old_value: TransactionSnapshot,
        new_value: Option<TransactionSnapshot>,
        change_type: ChangeType,
        changed_by: UserId,
        changed_at: DateTime<Utc>,
    ) {
        store.push_history(TransactionHistory {
            id: Uuid::new_v4(),
            transaction_id,
            old_value,
            new_value,
            change_type,
            changed_by,
            changed_at,
        });
    }

    /// record an update, skipping no-op edits; returns whether a row was written
    pub fn record_update(
        store: &mut MemoryStore,
        transaction_id: TransactionId,
        old_value: TransactionSnapshot,
        new_value: TransactionSnapshot,
        changed_by: UserId,
        changed_at: DateTime<Utc>,
    ) -> bool {
        if old_value == new_value {
            return false;
        }
        Self::record_change(
            store,
            Some(transaction_id),
            old_value,
            Some(new_value),
            ChangeType::Update,
            changed_by,
            changed_at,
        );
        true
    }

    /// record a deletion; the transaction id is nulled at write time
    pub fn record_delete(
        store: &mut MemoryStore,
        old_value: TransactionSnapshot,
        changed_by: UserId,
        changed_at: DateTime<Utc>,
    ) {
        Self::record_change(
            store,
            None,
            old_value,
            None,
            ChangeType::Delete,
            changed_by,
            changed_at,
        );
    }

    /// history rows for a still-existing transaction, newest first
    pub fn history_for(
        store: &MemoryStore,
        user_id: UserId,
        transaction_id: TransactionId,
    ) -> Result<Vec<TransactionHistory>> {
        let txn = store.transaction(transaction_id)?;
        if txn.user_id != user_id {
            return Err(LedgerError::Forbidden {
                resource: "transaction",
                id: transaction_id,
            });
        }
        Ok(store
            .history_for(transaction_id)
            .into_iter()
            .cloned()
            .collect())
    }

    /// rows whose transaction has been deleted, newest first
    pub fn orphaned_history(store: &MemoryStore) -> Vec<TransactionHistory> {
        store.orphaned_history().into_iter().cloned().collect()
    }

    pub fn has_history(store: &MemoryStore, transaction_id: TransactionId) -> bool {
        store.has_history(transaction_id)
    }
}
