use hourglass_rs::SafeTimeProvider;
use tracing::debug;
use uuid::Uuid;

use crate::decimal::Money;
use crate::errors::{LedgerError, Result};
use crate::ledger::owned_account;
use crate::model::Account;
use crate::store::MemoryStore;
use crate::types::{AccountId, AccountType, UserId};

/// parameters for opening an account
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub account_type: AccountType,
    pub opening_balance: Money,
    pub account_number: Option<String>,
    pub description: Option<String>,
}

/// metadata changes; balance is never edited directly
#[derive(Debug, Clone, Default)]
pub struct UpdateAccount {
    pub name: Option<String>,
    pub account_type: Option<AccountType>,
    pub account_number: Option<String>,
    pub description: Option<String>,
}

/// single source of truth for account balance mutation
///
/// Every financial flow (transactions, transfers, loan disbursement and
/// repayment, savings deposits and withdrawals) routes through `apply_effect`,
/// `debit`, and `credit`, so a balance re-derived from history always matches
/// the stored balance. Each call persists the new balance immediately.
pub struct AccountLedger;

impl AccountLedger {
    pub fn create_account(
        store: &mut MemoryStore,
        user_id: UserId,
        req: NewAccount,
        time: &SafeTimeProvider,
    ) -> Result<Account> {
        if req.opening_balance.is_negative() {
            return Err(LedgerError::InvalidAmount {
                amount: req.opening_balance,
            });
        }
        if store.account_name_taken(user_id, &req.name, None) {
            return Err(LedgerError::DuplicateName {
                resource: "account",
                name: req.name,
            });
        }

        let now = time.now();
        let account = Account {
            id: Uuid::new_v4(),
            user_id,
            name: req.name,
            account_type: req.account_type,
            balance: req.opening_balance,
            account_number: req.account_number,
            description: req.description,
            created_at: now,
            updated_at: now,
        };
        debug!(account = %account.id, name = %account.name, "account created");
        Ok(store.insert_account(account))
    }

    pub fn update_account(
        store: &mut MemoryStore,
        user_id: UserId,
        account_id: AccountId,
        req: UpdateAccount,
        time: &SafeTimeProvider,
    ) -> Result<Account> {
        owned_account(store, account_id, user_id)?;
        if let Some(name) = &req.name {
            if store.account_name_taken(user_id, name, Some(account_id)) {
                return Err(LedgerError::DuplicateName {
                    resource: "account",
                    name: name.clone(),
                });
            }
        }

        let now = time.now();
        let account = store.account_mut(account_id)?;
        if let Some(name) = req.name {
            account.name = name;
        }
        if let Some(account_type) = req.account_type {
            account.account_type = account_type;
        }
        if let Some(number) = req.account_number {
            account.account_number = Some(number);
        }
        if let Some(description) = req.description {
            account.description = Some(description);
        }
        account.updated_at = now;
        Ok(account.clone())
    }

    /// deletion is refused while any transaction or transfer references the account
    pub fn delete_account(
        store: &mut MemoryStore,
        user_id: UserId,
        account_id: AccountId,
    ) -> Result<()> {
        owned_account(store, account_id, user_id)?;
        let (transactions, transfers) = store.account_reference_counts(account_id);
        if transactions > 0 || transfers > 0 {
            return Err(LedgerError::AccountInUse {
                transactions,
                transfers,
            });
        }
        store.remove_account(account_id);
        debug!(account = %account_id, "account deleted");
        Ok(())
    }

    pub fn get(store: &MemoryStore, user_id: UserId, account_id: AccountId) -> Result<Account> {
        owned_account(store, account_id, user_id).cloned()
    }

    pub fn list(store: &MemoryStore, user_id: UserId) -> Vec<Account> {
        store
            .accounts_for_user(user_id)
            .into_iter()
            .cloned()
            .collect()
    }

    /// add a signed amount to the balance and persist it
    pub fn apply_effect(
        store: &mut MemoryStore,
        account_id: AccountId,
        signed_amount: Money,
        time: &SafeTimeProvider,
    ) -> Result<()> {
        let now = time.now();
        let account = store.account_mut(account_id)?;
        account.balance += signed_amount;
        account.updated_at = now;
        debug!(account = %account_id, effect = %signed_amount, balance = %account.balance, "effect applied");
        Ok(())
    }

    /// undo a previously applied effect (same operation, sign flipped)
    pub fn reverse_effect(
        store: &mut MemoryStore,
        account_id: AccountId,
        signed_amount: Money,
        time: &SafeTimeProvider,
    ) -> Result<()> {
        Self::apply_effect(store, account_id, -signed_amount, time)
    }

    /// subtract a positive amount, requiring sufficient funds
    pub fn debit(
        store: &mut MemoryStore,
        account_id: AccountId,
        amount: Money,
        time: &SafeTimeProvider,
    ) -> Result<()> {
        if !amount.is_positive() {
            return Err(LedgerError::InvalidAmount { amount });
        }
        let balance = store.account(account_id)?.balance;
        if balance < amount {
            return Err(LedgerError::InsufficientFunds {
                available: balance,
                requested: amount,
            });
        }
        Self::apply_effect(store, account_id, -amount, time)
    }

    /// add a positive amount, no funds check
    pub fn credit(
        store: &mut MemoryStore,
        account_id: AccountId,
        amount: Money,
        time: &SafeTimeProvider,
    ) -> Result<()> {
        if !amount.is_positive() {
            return Err(LedgerError::InvalidAmount { amount });
        }
        Self::apply_effect(store, account_id, amount, time)
    }
}
