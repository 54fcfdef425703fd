use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::types::{
    AccountId, Category, ChangeType, DiaryEntryId, GoalId, GoalPeriod, HistoryId, InstallmentId,
    LoanId, LoanStatus, PaymentStatus, ReportId, ReportType, SavingsId, SavingsStatus, TermType,
    TransactionId, TransactionKind, TransferId, UserId,
};

/// a spending account holding a running balance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub user_id: UserId,
    pub name: String,
    pub account_type: crate::types::AccountType,
    pub balance: Money,
    pub account_number: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// one committed income or expense, already reflected in its account's balance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub account_id: AccountId,
    pub user_id: UserId,
    pub amount: Money,
    pub kind: TransactionKind,
    pub category: Category,
    pub description: String,
    pub notes: String,
    pub date: DateTime<Utc>,
}

impl Transaction {
    /// the signed balance effect this transaction has on its account
    pub fn signed_effect(&self) -> Money {
        self.kind.signed_effect(self.amount)
    }
}

/// structured before/after value of a transaction, compared field by field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionSnapshot {
    pub account_id: AccountId,
    pub amount: Money,
    pub kind: TransactionKind,
    pub category: Category,
    pub description: String,
    pub notes: String,
    pub date: DateTime<Utc>,
}

impl From<&Transaction> for TransactionSnapshot {
    fn from(txn: &Transaction) -> Self {
        Self {
            account_id: txn.account_id,
            amount: txn.amount,
            kind: txn.kind,
            category: txn.category,
            description: txn.description.clone(),
            notes: txn.notes.clone(),
            date: txn.date,
        }
    }
}

/// append-only audit row; `transaction_id` is None once the transaction is gone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionHistory {
    pub id: HistoryId,
    pub transaction_id: Option<TransactionId>,
    pub old_value: TransactionSnapshot,
    pub new_value: Option<TransactionSnapshot>,
    pub change_type: ChangeType,
    pub changed_by: UserId,
    pub changed_at: DateTime<Utc>,
}

/// a committed two-sided balance move between accounts of one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transfer {
    pub id: TransferId,
    pub source_account_id: AccountId,
    pub destination_account_id: AccountId,
    pub amount: Money,
    pub description: String,
    pub date: DateTime<Utc>,
    pub user_id: UserId,
}

/// an amortizing loan disbursed into a destination account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanAccount {
    pub id: LoanId,
    pub user_id: UserId,
    pub name: String,
    pub principal: Money,
    pub annual_rate: Rate,
    pub duration_months: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: LoanStatus,
    pub destination_account_id: AccountId,
    pub created_at: DateTime<Utc>,
}

/// one scheduled installment of a loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanPayment {
    pub id: InstallmentId,
    pub loan_id: LoanId,
    pub installment_number: u32,
    pub due_date: NaiveDate,
    pub amount: Money,
    pub principal: Money,
    pub interest: Money,
    pub remaining_balance: Money,
    pub status: PaymentStatus,
    pub payment_date: Option<NaiveDate>,
}

/// a term deposit funded from a source account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsAccount {
    pub id: SavingsId,
    pub user_id: UserId,
    pub name: String,
    pub initial_deposit: Money,
    pub annual_rate: Rate,
    pub term_type: TermType,
    pub tag: Option<String>,
    pub source_account_id: AccountId,
    pub start_date: NaiveDate,
    pub maturity_date: NaiveDate,
    pub status: SavingsStatus,
    pub withdrawal_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

/// a budget ceiling for one category over a recurring period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpendingGoal {
    pub id: GoalId,
    pub user_id: UserId,
    pub category: Category,
    pub amount_limit: Money,
    pub period: GoalPeriod,
    pub created_at: DateTime<Utc>,
}

/// a saved income/expense summary over a fixed date range; totals are
/// computed when the report is created or its range edited, not on read
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: ReportId,
    pub user_id: UserId,
    pub title: String,
    pub report_type: ReportType,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub total_income: Money,
    pub total_expense: Money,
    pub created_at: DateTime<Utc>,
}

/// one journal entry, at most one per user per calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiaryEntry {
    pub id: DiaryEntryId,
    pub user_id: UserId,
    pub title: String,
    pub content: String,
    pub entry_date: NaiveDate,
    pub related_amount: Option<Money>,
    pub financial_goal: Option<String>,
    pub tags: Option<String>,
    pub created_at: DateTime<Utc>,
}
