use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::{LedgerError, Result};
use crate::model::{
    Account, DiaryEntry, LoanAccount, LoanPayment, Report, SavingsAccount, SpendingGoal,
    Transaction, TransactionHistory, Transfer,
};
use crate::types::{
    AccountId, Category, DiaryEntryId, GoalId, GoalPeriod, InstallmentId, LoanId, LoanStatus,
    ReportId, ReportType, SavingsId, TransactionId, TransactionKind, TransferId, UserId,
};

/// in-memory entity store, id-keyed arenas with explicit foreign keys
///
/// stands in for the persistence collaborator: plain CRUD plus the filtered
/// list queries the engines need. All invariant checks live in the engines;
/// the store never inspects balances or statuses beyond filtering.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct MemoryStore {
    accounts: HashMap<AccountId, Account>,
    transactions: HashMap<TransactionId, Transaction>,
    transfers: HashMap<TransferId, Transfer>,
    history: Vec<TransactionHistory>,
    loans: HashMap<LoanId, LoanAccount>,
    loan_payments: HashMap<InstallmentId, LoanPayment>,
    savings: HashMap<SavingsId, SavingsAccount>,
    goals: HashMap<GoalId, SpendingGoal>,
    reports: HashMap<ReportId, Report>,
    diary_entries: HashMap<DiaryEntryId, DiaryEntry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- accounts ----

    pub fn insert_account(&mut self, account: Account) -> Account {
        self.accounts.insert(account.id, account.clone());
        account
    }

    pub fn account(&self, id: AccountId) -> Result<&Account> {
        self.accounts.get(&id).ok_or(LedgerError::NotFound {
            resource: "account",
            id,
        })
    }

    pub fn account_mut(&mut self, id: AccountId) -> Result<&mut Account> {
        self.accounts.get_mut(&id).ok_or(LedgerError::NotFound {
            resource: "account",
            id,
        })
    }

    pub fn remove_account(&mut self, id: AccountId) {
        self.accounts.remove(&id);
    }

    pub fn accounts_for_user(&self, user_id: UserId) -> Vec<&Account> {
        let mut accounts: Vec<_> = self
            .accounts
            .values()
            .filter(|a| a.user_id == user_id)
            .collect();
        accounts.sort_by(|a, b| a.name.cmp(&b.name));
        accounts
    }

    pub fn account_name_taken(
        &self,
        user_id: UserId,
        name: &str,
        exclude: Option<AccountId>,
    ) -> bool {
        self.accounts
            .values()
            .any(|a| a.user_id == user_id && a.name == name && Some(a.id) != exclude)
    }

    /// transaction and transfer rows still referencing the account
    pub fn account_reference_counts(&self, id: AccountId) -> (usize, usize) {
        let transactions = self
            .transactions
            .values()
            .filter(|t| t.account_id == id)
            .count();
        let transfers = self
            .transfers
            .values()
            .filter(|t| t.source_account_id == id || t.destination_account_id == id)
            .count();
        (transactions, transfers)
    }

    // ---- transactions ----

    pub fn insert_transaction(&mut self, txn: Transaction) -> Transaction {
        self.transactions.insert(txn.id, txn.clone());
        txn
    }

    pub fn transaction(&self, id: TransactionId) -> Result<&Transaction> {
        self.transactions.get(&id).ok_or(LedgerError::NotFound {
            resource: "transaction",
            id,
        })
    }

    pub fn transaction_mut(&mut self, id: TransactionId) -> Result<&mut Transaction> {
        self.transactions.get_mut(&id).ok_or(LedgerError::NotFound {
            resource: "transaction",
            id,
        })
    }

    pub fn remove_transaction(&mut self, id: TransactionId) {
        self.transactions.remove(&id);
    }

    pub fn transactions_for_user(&self, user_id: UserId) -> Vec<&Transaction> {
        let mut txns: Vec<_> = self
            .transactions
            .values()
            .filter(|t| t.user_id == user_id)
            .collect();
        txns.sort_by(|a, b| b.date.cmp(&a.date));
        txns
    }

    pub fn transactions_for_account(&self, account_id: AccountId) -> Vec<&Transaction> {
        let mut txns: Vec<_> = self
            .transactions
            .values()
            .filter(|t| t.account_id == account_id)
            .collect();
        txns.sort_by(|a, b| b.date.cmp(&a.date));
        txns
    }

    pub fn transactions_in_range(
        &self,
        user_id: UserId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Vec<&Transaction> {
        let mut txns: Vec<_> = self
            .transactions
            .values()
            .filter(|t| t.user_id == user_id && t.date >= start && t.date <= end)
            .collect();
        txns.sort_by(|a, b| b.date.cmp(&a.date));
        txns
    }

    /// sum of expense amounts for one user and category inside [start, end]
    pub fn sum_expenses(
        &self,
        user_id: UserId,
        category: Category,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Money {
        self.transactions
            .values()
            .filter(|t| {
                t.user_id == user_id
                    && t.kind == TransactionKind::Expense
                    && t.category == category
                    && t.date >= start
                    && t.date <= end
            })
            .fold(Money::ZERO, |acc, t| acc + t.amount)
    }

    // ---- transaction history ----

    pub fn push_history(&mut self, row: TransactionHistory) {
        self.history.push(row);
    }

    pub fn history_for(&self, transaction_id: TransactionId) -> Vec<&TransactionHistory> {
        let mut rows: Vec<_> = self
            .history
            .iter()
            .filter(|h| h.transaction_id == Some(transaction_id))
            .collect();
        rows.sort_by(|a, b| b.changed_at.cmp(&a.changed_at));
        rows
    }

    /// history rows whose transaction has been deleted
    pub fn orphaned_history(&self) -> Vec<&TransactionHistory> {
        let mut rows: Vec<_> = self
            .history
            .iter()
            .filter(|h| h.transaction_id.is_none())
            .collect();
        rows.sort_by(|a, b| b.changed_at.cmp(&a.changed_at));
        rows
    }

    pub fn has_history(&self, transaction_id: TransactionId) -> bool {
        self.history
            .iter()
            .any(|h| h.transaction_id == Some(transaction_id))
    }

    // ---- transfers ----

    pub fn insert_transfer(&mut self, transfer: Transfer) -> Transfer {
        self.transfers.insert(transfer.id, transfer.clone());
        transfer
    }

    pub fn transfer(&self, id: TransferId) -> Result<&Transfer> {
        self.transfers.get(&id).ok_or(LedgerError::NotFound {
            resource: "transfer",
            id,
        })
    }

    pub fn transfers_for_user(&self, user_id: UserId) -> Vec<&Transfer> {
        let mut transfers: Vec<_> = self
            .transfers
            .values()
            .filter(|t| t.user_id == user_id)
            .collect();
        transfers.sort_by(|a, b| b.date.cmp(&a.date));
        transfers
    }

    pub fn transfers_for_account(&self, account_id: AccountId) -> Vec<&Transfer> {
        let mut transfers: Vec<_> = self
            .transfers
            .values()
            .filter(|t| t.source_account_id == account_id || t.destination_account_id == account_id)
            .collect();
        transfers.sort_by(|a, b| b.date.cmp(&a.date));
        transfers
    }

    // ---- loans ----

    pub fn insert_loan(&mut self, loan: LoanAccount) -> LoanAccount {
        self.loans.insert(loan.id, loan.clone());
        loan
    }

    pub fn loan(&self, id: LoanId) -> Result<&LoanAccount> {
        self.loans.get(&id).ok_or(LedgerError::NotFound {
            resource: "loan account",
            id,
        })
    }

    pub fn loan_mut(&mut self, id: LoanId) -> Result<&mut LoanAccount> {
        self.loans.get_mut(&id).ok_or(LedgerError::NotFound {
            resource: "loan account",
            id,
        })
    }

    pub fn loans_for_user(&self, user_id: UserId) -> Vec<&LoanAccount> {
        let mut loans: Vec<_> = self
            .loans
            .values()
            .filter(|l| l.user_id == user_id)
            .collect();
        loans.sort_by(|a, b| a.name.cmp(&b.name));
        loans
    }

    pub fn loans_with_status(&self, status: LoanStatus) -> Vec<&LoanAccount> {
        self.loans.values().filter(|l| l.status == status).collect()
    }

    pub fn loan_name_taken(&self, user_id: UserId, name: &str) -> bool {
        self.loans
            .values()
            .any(|l| l.user_id == user_id && l.name == name)
    }

    pub fn insert_loan_payment(&mut self, payment: LoanPayment) -> LoanPayment {
        self.loan_payments.insert(payment.id, payment.clone());
        payment
    }

    pub fn loan_payment_mut(&mut self, id: InstallmentId) -> Result<&mut LoanPayment> {
        self.loan_payments.get_mut(&id).ok_or(LedgerError::NotFound {
            resource: "loan payment",
            id,
        })
    }

    pub fn payments_for_loan(&self, loan_id: LoanId) -> Vec<&LoanPayment> {
        let mut payments: Vec<_> = self
            .loan_payments
            .values()
            .filter(|p| p.loan_id == loan_id)
            .collect();
        payments.sort_by_key(|p| p.installment_number);
        payments
    }

    pub fn payment_by_installment(
        &self,
        loan_id: LoanId,
        installment_number: u32,
    ) -> Option<&LoanPayment> {
        self.loan_payments
            .values()
            .find(|p| p.loan_id == loan_id && p.installment_number == installment_number)
    }

    pub fn all_loan_payment_ids(&self) -> Vec<InstallmentId> {
        self.loan_payments.keys().copied().collect()
    }

    // ---- savings ----

    pub fn insert_savings(&mut self, account: SavingsAccount) -> SavingsAccount {
        self.savings.insert(account.id, account.clone());
        account
    }

    pub fn savings(&self, id: SavingsId) -> Result<&SavingsAccount> {
        self.savings.get(&id).ok_or(LedgerError::NotFound {
            resource: "savings account",
            id,
        })
    }

    pub fn savings_mut(&mut self, id: SavingsId) -> Result<&mut SavingsAccount> {
        self.savings.get_mut(&id).ok_or(LedgerError::NotFound {
            resource: "savings account",
            id,
        })
    }

    pub fn savings_for_user(&self, user_id: UserId) -> Vec<&SavingsAccount> {
        let mut accounts: Vec<_> = self
            .savings
            .values()
            .filter(|s| s.user_id == user_id)
            .collect();
        accounts.sort_by(|a, b| a.name.cmp(&b.name));
        accounts
    }

    pub fn all_savings_ids(&self) -> Vec<SavingsId> {
        self.savings.keys().copied().collect()
    }

    pub fn savings_name_taken(&self, user_id: UserId, name: &str) -> bool {
        self.savings
            .values()
            .any(|s| s.user_id == user_id && s.name == name)
    }

    // ---- spending goals ----

    pub fn insert_goal(&mut self, goal: SpendingGoal) -> SpendingGoal {
        self.goals.insert(goal.id, goal.clone());
        goal
    }

    pub fn goal(&self, id: GoalId) -> Result<&SpendingGoal> {
        self.goals.get(&id).ok_or(LedgerError::NotFound {
            resource: "spending goal",
            id,
        })
    }

    pub fn goal_mut(&mut self, id: GoalId) -> Result<&mut SpendingGoal> {
        self.goals.get_mut(&id).ok_or(LedgerError::NotFound {
            resource: "spending goal",
            id,
        })
    }

    pub fn remove_goal(&mut self, id: GoalId) {
        self.goals.remove(&id);
    }

    pub fn goals_for_user(&self, user_id: UserId) -> Vec<&SpendingGoal> {
        let mut goals: Vec<_> = self
            .goals
            .values()
            .filter(|g| g.user_id == user_id)
            .collect();
        goals.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        goals
    }

    /// at most one goal exists per (user, category, period)
    pub fn find_goal(
        &self,
        user_id: UserId,
        category: Category,
        period: GoalPeriod,
    ) -> Option<&SpendingGoal> {
        self.goals
            .values()
            .find(|g| g.user_id == user_id && g.category == category && g.period == period)
    }

    /// (income, expense) totals for one user's transactions inside [start, end]
    pub fn totals_in_range(
        &self,
        user_id: UserId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> (Money, Money) {
        self.transactions
            .values()
            .filter(|t| t.user_id == user_id && t.date >= start && t.date <= end)
            .fold((Money::ZERO, Money::ZERO), |(income, expense), t| {
                match t.kind {
                    TransactionKind::Income => (income + t.amount, expense),
                    TransactionKind::Expense => (income, expense + t.amount),
                }
            })
    }

    // ---- reports ----

    pub fn insert_report(&mut self, report: Report) -> Report {
        self.reports.insert(report.id, report.clone());
        report
    }

    pub fn report(&self, id: ReportId) -> Result<&Report> {
        self.reports.get(&id).ok_or(LedgerError::NotFound {
            resource: "report",
            id,
        })
    }

    pub fn report_mut(&mut self, id: ReportId) -> Result<&mut Report> {
        self.reports.get_mut(&id).ok_or(LedgerError::NotFound {
            resource: "report",
            id,
        })
    }

    pub fn remove_report(&mut self, id: ReportId) {
        self.reports.remove(&id);
    }

    pub fn reports_for_user(&self, user_id: UserId) -> Vec<&Report> {
        let mut reports: Vec<_> = self
            .reports
            .values()
            .filter(|r| r.user_id == user_id)
            .collect();
        reports.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        reports
    }

    pub fn reports_by_type(&self, user_id: UserId, report_type: ReportType) -> Vec<&Report> {
        let mut reports: Vec<_> = self
            .reports
            .values()
            .filter(|r| r.user_id == user_id && r.report_type == report_type)
            .collect();
        reports.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        reports
    }

    // ---- diary ----

    pub fn insert_diary_entry(&mut self, entry: DiaryEntry) -> DiaryEntry {
        self.diary_entries.insert(entry.id, entry.clone());
        entry
    }

    pub fn diary_entry(&self, id: DiaryEntryId) -> Result<&DiaryEntry> {
        self.diary_entries.get(&id).ok_or(LedgerError::NotFound {
            resource: "diary entry",
            id,
        })
    }

    pub fn remove_diary_entry(&mut self, id: DiaryEntryId) {
        self.diary_entries.remove(&id);
    }

    /// entries for one user, newest entry date first
    pub fn diary_entries_for_user(&self, user_id: UserId) -> Vec<&DiaryEntry> {
        let mut entries: Vec<_> = self
            .diary_entries
            .values()
            .filter(|e| e.user_id == user_id)
            .collect();
        entries.sort_by(|a, b| b.entry_date.cmp(&a.entry_date));
        entries
    }

    pub fn diary_entry_by_date(&self, user_id: UserId, date: NaiveDate) -> Option<&DiaryEntry> {
        self.diary_entries
            .values()
            .find(|e| e.user_id == user_id && e.entry_date == date)
    }

    pub fn diary_date_taken(&self, user_id: UserId, date: NaiveDate) -> bool {
        self.diary_entry_by_date(user_id, date).is_some()
    }

    // ---- snapshot ----

    /// serialize the whole store to JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// restore a store from a JSON snapshot
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AccountType;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn account(user_id: UserId, name: &str) -> Account {
        Account {
            id: Uuid::new_v4(),
            user_id,
            name: name.to_string(),
            account_type: AccountType::Bank,
            balance: Money::from_decimal(dec!(100)),
            account_number: None,
            description: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_account_lookup_and_not_found() {
        let mut store = MemoryStore::new();
        let user = Uuid::new_v4();
        let a = store.insert_account(account(user, "checking"));

        assert_eq!(store.account(a.id).unwrap().name, "checking");
        let missing = Uuid::new_v4();
        assert!(matches!(
            store.account(missing),
            Err(LedgerError::NotFound { resource: "account", id }) if id == missing
        ));
    }

    #[test]
    fn test_name_uniqueness_scoped_to_user() {
        let mut store = MemoryStore::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let a = store.insert_account(account(alice, "checking"));

        assert!(store.account_name_taken(alice, "checking", None));
        assert!(!store.account_name_taken(bob, "checking", None));
        // excluding the account itself allows renames to the same name
        assert!(!store.account_name_taken(alice, "checking", Some(a.id)));
    }

    #[test]
    fn test_store_round_trips_through_json() {
        let mut store = MemoryStore::new();
        let user = Uuid::new_v4();
        let a = store.insert_account(account(user, "wallet"));

        let json = store.to_json().unwrap();
        let restored = MemoryStore::from_json(&json).unwrap();
        assert_eq!(restored.account(a.id).unwrap(), store.account(a.id).unwrap());
    }
}
