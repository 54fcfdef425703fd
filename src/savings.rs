use chrono::NaiveDate;
use hourglass_rs::SafeTimeProvider;
use rust_decimal::Decimal;
use tracing::{debug, info};
use uuid::Uuid;

use crate::dates::{days_between, months_after};
use crate::decimal::{Money, Rate};
use crate::errors::{LedgerError, Result};
use crate::ledger::accounts::AccountLedger;
use crate::ledger::owned_account;
use crate::model::{SavingsAccount, Transaction};
use crate::store::MemoryStore;
use crate::types::{AccountId, Category, SavingsId, SavingsStatus, TermType, TransactionKind, UserId};

/// parameters for opening a term deposit
#[derive(Debug, Clone)]
pub struct NewSavings {
    pub name: String,
    pub initial_deposit: Money,
    pub annual_rate: Rate,
    pub term_type: TermType,
    pub tag: Option<String>,
    pub source_account_id: AccountId,
    pub start_date: NaiveDate,
}

/// projected value at one point in time
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionPoint {
    pub date: NaiveDate,
    pub interest: Money,
    pub value: Money,
}

/// simple-interest growth projection from opening to maturity
#[derive(Debug, Clone, PartialEq)]
pub struct SavingsProjection {
    pub initial_deposit: Money,
    pub annual_rate: Rate,
    pub start_date: NaiveDate,
    pub maturity_date: NaiveDate,
    pub daily_interest: Money,
    pub monthly_interest: Money,
    pub yearly_interest: Money,
    pub total_interest: Money,
    pub final_amount: Money,
    pub timeline: Vec<ProjectionPoint>,
}

/// savings deposits with simple daily interest
///
/// Interest accrues on the initial deposit only, one rounded daily quantum
/// per elapsed day, and stops at maturity. Withdrawal freezes the value and
/// returns it to the funding account.
pub struct SavingsEngine;

impl SavingsEngine {
    pub fn open(
        store: &mut MemoryStore,
        user_id: UserId,
        req: NewSavings,
        time: &SafeTimeProvider,
    ) -> Result<SavingsAccount> {
        if !req.initial_deposit.is_positive() {
            return Err(LedgerError::InvalidAmount {
                amount: req.initial_deposit,
            });
        }
        if req.annual_rate.is_negative() {
            return Err(LedgerError::InvalidRate {
                rate: req.annual_rate,
            });
        }
        if store.savings_name_taken(user_id, &req.name) {
            return Err(LedgerError::DuplicateName {
                resource: "savings account",
                name: req.name,
            });
        }
        let source = owned_account(store, req.source_account_id, user_id)?;
        if source.balance < req.initial_deposit {
            return Err(LedgerError::InsufficientFunds {
                available: source.balance,
                requested: req.initial_deposit,
            });
        }

        let now = time.now();
        AccountLedger::debit(store, req.source_account_id, req.initial_deposit, time)?;
        store.insert_transaction(Transaction {
            id: Uuid::new_v4(),
            account_id: req.source_account_id,
            user_id,
            amount: req.initial_deposit,
            kind: TransactionKind::Expense,
            category: Category::Other,
            description: format!("Initial deposit for savings account: {}", req.name),
            notes: String::new(),
            date: now,
        });

        let account = SavingsAccount {
            id: Uuid::new_v4(),
            user_id,
            name: req.name,
            initial_deposit: req.initial_deposit,
            annual_rate: req.annual_rate,
            term_type: req.term_type,
            tag: req.tag,
            source_account_id: req.source_account_id,
            start_date: req.start_date,
            maturity_date: req.term_type.maturity_date(req.start_date),
            status: SavingsStatus::Active,
            withdrawal_date: None,
            created_at: now,
        };
        info!(savings = %account.id, deposit = %account.initial_deposit, "savings opened");
        Ok(store.insert_savings(account))
    }

    /// interest earned per day, rounded to cents before any multiplication
    pub fn daily_interest(account: &SavingsAccount) -> Money {
        Money::from_decimal(account.initial_deposit.as_decimal() * account.annual_rate.daily())
    }

    /// interest accrued from opening through `as_of`, capped at maturity
    pub fn accrued_interest(account: &SavingsAccount, as_of: NaiveDate) -> Money {
        let effective = as_of.min(account.maturity_date);
        let days = days_between(account.start_date, effective).max(0);
        Self::daily_interest(account) * Decimal::from(days)
    }

    /// deposit plus accrued interest; frozen at the deposit once withdrawn
    pub fn current_value(account: &SavingsAccount, as_of: NaiveDate) -> Money {
        match account.status {
            SavingsStatus::Withdrawn => {
                let frozen = account.withdrawal_date.unwrap_or(as_of);
                account.initial_deposit + Self::accrued_interest(account, frozen)
            }
            _ => account.initial_deposit + Self::accrued_interest(account, as_of),
        }
    }

    /// full growth projection with a month-by-month timeline
    pub fn projection(
        store: &MemoryStore,
        user_id: UserId,
        savings_id: SavingsId,
    ) -> Result<SavingsProjection> {
        let account = Self::owned_savings(store, savings_id, user_id)?;
        let daily = Self::daily_interest(account);
        let term_days = days_between(account.start_date, account.maturity_date).max(0);
        let total_interest = daily * Decimal::from(term_days);

        let mut timeline = vec![ProjectionPoint {
            date: account.start_date,
            interest: Money::ZERO,
            value: account.initial_deposit,
        }];
        let mut cursor = account.start_date;
        loop {
            // each point steps one month from the previous point, so a clamp
            // at a short month carries its day forward; the final point lands
            // exactly on the maturity date
            cursor = months_after(cursor, 1).min(account.maturity_date);
            let interest = Self::accrued_interest(account, cursor);
            timeline.push(ProjectionPoint {
                date: cursor,
                interest,
                value: account.initial_deposit + interest,
            });
            if cursor >= account.maturity_date {
                break;
            }
        }

        Ok(SavingsProjection {
            initial_deposit: account.initial_deposit,
            annual_rate: account.annual_rate,
            start_date: account.start_date,
            maturity_date: account.maturity_date,
            daily_interest: daily,
            monthly_interest: daily * Decimal::from(30),
            yearly_interest: daily * Decimal::from(365),
            total_interest,
            final_amount: account.initial_deposit + total_interest,
            timeline,
        })
    }

    /// close the deposit and return its current value to the funding account
    pub fn withdraw(
        store: &mut MemoryStore,
        user_id: UserId,
        savings_id: SavingsId,
        time: &SafeTimeProvider,
    ) -> Result<SavingsAccount> {
        let account = Self::owned_savings(store, savings_id, user_id)?.clone();
        if account.status == SavingsStatus::Withdrawn {
            return Err(LedgerError::AlreadyWithdrawn { id: savings_id });
        }

        let today = time.now().date_naive();
        let payout = Self::current_value(&account, today);
        AccountLedger::credit(store, account.source_account_id, payout, time)?;
        store.insert_transaction(Transaction {
            id: Uuid::new_v4(),
            account_id: account.source_account_id,
            user_id,
            amount: payout,
            kind: TransactionKind::Income,
            category: Category::Other,
            description: format!("Withdrawal from savings account: {}", account.name),
            notes: String::new(),
            date: time.now(),
        });

        let row = store.savings_mut(savings_id)?;
        row.status = SavingsStatus::Withdrawn;
        row.withdrawal_date = Some(today);
        let closed = row.clone();
        info!(savings = %savings_id, payout = %payout, "savings withdrawn");
        Ok(closed)
    }

    /// flip fixed-term deposits past their maturity date to matured;
    /// flexible deposits never auto-mature
    pub fn sweep_matured(store: &mut MemoryStore, time: &SafeTimeProvider) -> usize {
        let today = time.now().date_naive();
        let mut flipped = 0;
        for id in store.all_savings_ids() {
            if let Ok(account) = store.savings_mut(id) {
                if account.status == SavingsStatus::Active
                    && account.term_type.is_fixed()
                    && account.maturity_date <= today
                {
                    account.status = SavingsStatus::Matured;
                    flipped += 1;
                }
            }
        }
        if flipped > 0 {
            debug!(count = flipped, "deposits matured");
        }
        flipped
    }

    pub fn get(
        store: &MemoryStore,
        user_id: UserId,
        savings_id: SavingsId,
    ) -> Result<SavingsAccount> {
        Self::owned_savings(store, savings_id, user_id).cloned()
    }

    pub fn list(store: &MemoryStore, user_id: UserId) -> Vec<SavingsAccount> {
        store
            .savings_for_user(user_id)
            .into_iter()
            .cloned()
            .collect()
    }

    fn owned_savings(
        store: &MemoryStore,
        savings_id: SavingsId,
        user_id: UserId,
    ) -> Result<&SavingsAccount> {
        let account = store.savings(savings_id)?;
        if account.user_id != user_id {
            return Err(LedgerError::Forbidden {
                resource: "savings account",
                id: savings_id,
            });
        }
        Ok(account)
    }
}
