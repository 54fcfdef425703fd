pub mod accounts;
pub mod audit;
pub mod transactions;
pub mod transfer;

pub use accounts::{AccountLedger, NewAccount, UpdateAccount};
pub use audit::TransactionAuditLog;
pub use transactions::{NewTransaction, TransactionEngine};
pub use transfer::{NewTransfer, TransferEngine};

use crate::errors::{LedgerError, Result};
use crate::model::Account;
use crate::store::MemoryStore;
use crate::types::{AccountId, UserId};

/// look up an account and verify it belongs to the acting user
pub(crate) fn owned_account(
    store: &MemoryStore,
    account_id: AccountId,
    user_id: UserId,
) -> Result<&Account> {
    let account = store.account(account_id)?;
    if account.user_id != user_id {
        return Err(LedgerError::Forbidden {
            resource: "account",
            id: account_id,
        });
    }
    Ok(account)
}
