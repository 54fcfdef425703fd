use chrono::NaiveDate;
use hourglass_rs::SafeTimeProvider;
use tracing::{debug, info};
use uuid::Uuid;

use crate::dates::{days_between, months_after};
use crate::decimal::{Money, Rate};
use crate::errors::{LedgerError, Result};
use crate::ledger::accounts::AccountLedger;
use crate::ledger::owned_account;
use crate::loans::amortization::AmortizationSchedule;
use crate::model::{LoanAccount, LoanPayment, Transaction};
use crate::store::MemoryStore;
use crate::types::{
    AccountId, Category, LoanId, LoanStatus, PaymentStatus, TransactionKind, UserId,
};

/// when an active loan is declared defaulted
///
/// A loan defaults once it carries at least `max_overdue_installments`
/// overdue rows, or once its oldest overdue row is `max_days_past_due` or
/// more days past due.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DefaultPolicy {
    pub max_overdue_installments: u32,
    pub max_days_past_due: i64,
}

impl Default for DefaultPolicy {
    fn default() -> Self {
        DefaultPolicy {
            max_overdue_installments: 3,
            max_days_past_due: 90,
        }
    }
}

/// parameters for originating a loan
#[derive(Debug, Clone)]
pub struct NewLoan {
    pub name: String,
    pub amount: Money,
    pub annual_rate: Rate,
    pub duration_months: u32,
    pub start_date: NaiveDate,
    pub destination_account_id: AccountId,
}

/// loan origination, repayment, and delinquency sweeps
pub struct LoanManager {
    policy: DefaultPolicy,
}

impl LoanManager {
    pub fn new(policy: DefaultPolicy) -> Self {
        LoanManager { policy }
    }

    /// originate a loan: persist the full repayment plan and disburse the
    /// principal into the destination account
    pub fn create_loan(
        &self,
        store: &mut MemoryStore,
        user_id: UserId,
        req: NewLoan,
        time: &SafeTimeProvider,
    ) -> Result<LoanAccount> {
        if store.loan_name_taken(user_id, &req.name) {
            return Err(LedgerError::DuplicateName {
                resource: "loan account",
                name: req.name,
            });
        }
        owned_account(store, req.destination_account_id, user_id)?;

        // validates amount, rate, and term before anything is persisted
        let plan = AmortizationSchedule::generate(
            req.amount,
            req.annual_rate,
            req.duration_months,
            req.start_date,
        )?;

        let now = time.now();
        let loan = LoanAccount {
            id: Uuid::new_v4(),
            user_id,
            name: req.name,
            principal: req.amount,
            annual_rate: req.annual_rate,
            duration_months: req.duration_months,
            start_date: req.start_date,
            end_date: months_after(req.start_date, req.duration_months),
            status: LoanStatus::Active,
            destination_account_id: req.destination_account_id,
            created_at: now,
        };
        for row in &plan.installments {
            store.insert_loan_payment(LoanPayment {
                id: Uuid::new_v4(),
                loan_id: loan.id,
                installment_number: row.number,
                due_date: row.due_date,
                amount: row.amount,
                principal: row.principal,
                interest: row.interest,
                remaining_balance: row.remaining_balance,
                status: PaymentStatus::Pending,
                payment_date: None,
            });
        }

        AccountLedger::credit(store, loan.destination_account_id, loan.principal, time)?;
        store.insert_transaction(Transaction {
            id: Uuid::new_v4(),
            account_id: loan.destination_account_id,
            user_id,
            amount: loan.principal,
            kind: TransactionKind::Income,
            category: Category::Other,
            description: format!("Loan disbursement: {}", loan.name),
            notes: String::new(),
            date: now,
        });

        info!(loan = %loan.id, principal = %loan.principal, "loan originated");
        Ok(store.insert_loan(loan))
    }

    /// settle one installment out of the loan's destination account
    pub fn make_payment(
        &self,
        store: &mut MemoryStore,
        user_id: UserId,
        loan_id: LoanId,
        installment_number: u32,
        time: &SafeTimeProvider,
    ) -> Result<LoanPayment> {
        let loan = Self::owned_loan(store, loan_id, user_id)?.clone();
        let from_account_id = loan.destination_account_id;

        let payment = store
            .payment_by_installment(loan_id, installment_number)
            .ok_or(LedgerError::InstallmentNotFound {
                loan: loan_id,
                installment: installment_number,
            })?
            .clone();
        if payment.status == PaymentStatus::Paid {
            return Err(LedgerError::InstallmentAlreadyPaid {
                installment: installment_number,
            });
        }
        let balance = store.account(from_account_id)?.balance;
        if balance < payment.amount {
            return Err(LedgerError::InsufficientFunds {
                available: balance,
                requested: payment.amount,
            });
        }

        let today = time.now().date_naive();
        AccountLedger::debit(store, from_account_id, payment.amount, time)?;
        store.insert_transaction(Transaction {
            id: Uuid::new_v4(),
            account_id: from_account_id,
            user_id,
            amount: payment.amount,
            kind: TransactionKind::Expense,
            category: Category::Other,
            description: format!(
                "Loan payment #{} for {}",
                installment_number, loan.name
            ),
            notes: String::new(),
            date: time.now(),
        });

        let row = store.loan_payment_mut(payment.id)?;
        row.status = PaymentStatus::Paid;
        row.payment_date = Some(today);
        let settled = row.clone();

        let all_paid = store
            .payments_for_loan(loan_id)
            .iter()
            .all(|p| p.status == PaymentStatus::Paid);
        if all_paid {
            store.loan_mut(loan_id)?.status = LoanStatus::Completed;
            info!(loan = %loan_id, "loan completed");
        }

        debug!(loan = %loan_id, installment = installment_number, "installment paid");
        Ok(settled)
    }

    /// mark every pending installment whose due date has passed as overdue;
    /// returns the number of rows flipped
    pub fn sweep_overdue(&self, store: &mut MemoryStore, time: &SafeTimeProvider) -> usize {
        let today = time.now().date_naive();
        let mut flipped = 0;
        for id in store.all_loan_payment_ids() {
            if let Ok(payment) = store.loan_payment_mut(id) {
                if payment.status == PaymentStatus::Pending && payment.due_date < today {
                    payment.status = PaymentStatus::Overdue;
                    flipped += 1;
                }
            }
        }
        if flipped > 0 {
            info!(count = flipped, "installments marked overdue");
        }
        flipped
    }

    /// refresh overdue flags, then default every active loan that breaches
    /// the policy; returns the ids of newly defaulted loans
    pub fn sweep_defaults(
        &self,
        store: &mut MemoryStore,
        time: &SafeTimeProvider,
    ) -> Vec<LoanId> {
        self.sweep_overdue(store, time);
        let today = time.now().date_naive();

        let mut defaulted = Vec::new();
        let active: Vec<LoanId> = store
            .loans_with_status(LoanStatus::Active)
            .iter()
            .map(|l| l.id)
            .collect();
        for loan_id in active {
            let overdue: Vec<NaiveDate> = store
                .payments_for_loan(loan_id)
                .iter()
                .filter(|p| p.status == PaymentStatus::Overdue)
                .map(|p| p.due_date)
                .collect();
            if overdue.is_empty() {
                continue;
            }
            let oldest = overdue.iter().min().copied().unwrap_or(today);
            let breaches = overdue.len() as u32 >= self.policy.max_overdue_installments
                || days_between(oldest, today) >= self.policy.max_days_past_due;
            if breaches {
                if let Ok(loan) = store.loan_mut(loan_id) {
                    loan.status = LoanStatus::Defaulted;
                    defaulted.push(loan_id);
                    info!(loan = %loan_id, "loan defaulted");
                }
            }
        }
        defaulted
    }

    pub fn get(&self, store: &MemoryStore, user_id: UserId, loan_id: LoanId) -> Result<LoanAccount> {
        Self::owned_loan(store, loan_id, user_id).cloned()
    }

    pub fn list(&self, store: &MemoryStore, user_id: UserId) -> Vec<LoanAccount> {
        store.loans_for_user(user_id).into_iter().cloned().collect()
    }

    /// the persisted repayment plan, ordered by installment number
    pub fn schedule(
        &self,
        store: &MemoryStore,
        user_id: UserId,
        loan_id: LoanId,
    ) -> Result<Vec<LoanPayment>> {
        Self::owned_loan(store, loan_id, user_id)?;
        Ok(store
            .payments_for_loan(loan_id)
            .into_iter()
            .cloned()
            .collect())
    }

    fn owned_loan(store: &MemoryStore, loan_id: LoanId, user_id: UserId) -> Result<&LoanAccount> {
        let loan = store.loan(loan_id)?;
        if loan.user_id != user_id {
            return Err(LedgerError::Forbidden {
                resource: "loan account",
                id: loan_id,
            });
        }
        Ok(loan)
    }
}

impl Default for LoanManager {
    fn default() -> Self {
        LoanManager::new(DefaultPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::accounts::NewAccount;
    use crate::types::AccountType;
    use chrono::{Duration, TimeZone, Utc};
    use hourglass_rs::TimeSource;
    use rust_decimal_macros::dec;

    fn time_at(y: i32, m: u32, d: u32) -> SafeTimeProvider {
        SafeTimeProvider::new(TimeSource::Test(
            Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap(),
        ))
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn setup() -> (MemoryStore, UserId, AccountId) {
        let mut store = MemoryStore::new();
        let user = Uuid::new_v4();
        let account = AccountLedger::create_account(
            &mut store,
            user,
            NewAccount {
                name: "checking".to_string(),
                account_type: AccountType::Bank,
                opening_balance: Money::from_major(500),
                account_number: None,
                description: None,
            },
            &time_at(2024, 1, 1),
        )
        .unwrap();
        (store, user, account.id)
    }

    fn originate(
        store: &mut MemoryStore,
        user: UserId,
        account: AccountId,
        time: &SafeTimeProvider,
    ) -> LoanAccount {
        LoanManager::default()
            .create_loan(
                store,
                user,
                NewLoan {
                    name: "car loan".to_string(),
                    amount: Money::from_major(1200),
                    annual_rate: Rate::from_percent(dec!(12)),
                    duration_months: 12,
                    start_date: d(2024, 1, 15),
                    destination_account_id: account,
                },
                time,
            )
            .unwrap()
    }

    #[test]
    fn test_origination_disburses_and_schedules() {
        let (mut store, user, account) = setup();
        let time = time_at(2024, 1, 15);
        let loan = originate(&mut store, user, account, &time);

        assert_eq!(loan.status, LoanStatus::Active);
        assert_eq!(loan.end_date, d(2025, 1, 15));
        assert_eq!(store.account(account).unwrap().balance, Money::from_major(1700));

        let plan = store.payments_for_loan(loan.id);
        assert_eq!(plan.len(), 12);
        assert!(plan.iter().all(|p| p.status == PaymentStatus::Pending));

        let txns = store.transactions_for_account(account);
        assert_eq!(txns.len(), 1);
        assert_eq!(txns[0].description, "Loan disbursement: car loan");
        assert_eq!(txns[0].kind, TransactionKind::Income);
    }

    #[test]
    fn test_payment_debits_and_marks_paid() {
        let (mut store, user, account) = setup();
        let manager = LoanManager::default();
        let time = time_at(2024, 1, 15);
        let loan = originate(&mut store, user, account, &time);
        let balance_after_disbursal = store.account(account).unwrap().balance;

        let paid = manager
            .make_payment(&mut store, user, loan.id, 1, &time)
            .unwrap();
        assert_eq!(paid.status, PaymentStatus::Paid);
        assert_eq!(paid.payment_date, Some(d(2024, 1, 15)));
        assert_eq!(
            store.account(account).unwrap().balance,
            balance_after_disbursal - paid.amount
        );

        let err = manager
            .make_payment(&mut store, user, loan.id, 1, &time)
            .unwrap_err();
        assert_eq!(err, LedgerError::InstallmentAlreadyPaid { installment: 1 });
    }

    #[test]
    fn test_loan_completes_when_every_installment_is_paid() {
        let (mut store, user, account) = setup();
        let manager = LoanManager::default();
        let time = time_at(2024, 1, 15);
        let loan = LoanManager::default()
            .create_loan(
                &mut store,
                user,
                NewLoan {
                    name: "short loan".to_string(),
                    amount: Money::from_major(300),
                    annual_rate: Rate::from_percent(dec!(12)),
                    duration_months: 3,
                    start_date: d(2024, 1, 15),
                    destination_account_id: account,
                },
                &time,
            )
            .unwrap();

        for n in 1..=3 {
            manager
                .make_payment(&mut store, user, loan.id, n, &time)
                .unwrap();
        }
        assert_eq!(store.loan(loan.id).unwrap().status, LoanStatus::Completed);
    }

    #[test]
    fn test_sweep_overdue_flips_only_past_due_pending_rows() {
        let (mut store, user, account) = setup();
        let manager = LoanManager::default();
        let time = time_at(2024, 1, 15);
        let loan = originate(&mut store, user, account, &time);

        // installments 1 and 2 fall due on feb 15 and mar 15
        let later = time_at(2024, 3, 20);
        assert_eq!(manager.sweep_overdue(&mut store, &later), 2);
        // a second sweep finds nothing new
        assert_eq!(manager.sweep_overdue(&mut store, &later), 0);

        let plan = manager.schedule(&store, user, loan.id).unwrap();
        assert_eq!(plan[0].status, PaymentStatus::Overdue);
        assert_eq!(plan[1].status, PaymentStatus::Overdue);
        assert_eq!(plan[2].status, PaymentStatus::Pending);
    }

    #[test]
    fn test_overdue_installment_can_still_be_paid() {
        let (mut store, user, account) = setup();
        let manager = LoanManager::default();
        let time = time_at(2024, 1, 15);
        let loan = originate(&mut store, user, account, &time);

        let later = time_at(2024, 3, 20);
        manager.sweep_overdue(&mut store, &later);
        let paid = manager
            .make_payment(&mut store, user, loan.id, 1, &later)
            .unwrap();
        assert_eq!(paid.status, PaymentStatus::Paid);
        assert_eq!(paid.payment_date, Some(d(2024, 3, 20)));
    }

    #[test]
    fn test_default_on_three_overdue_installments() {
        let (mut store, user, account) = setup();
        let manager = LoanManager::default();
        let time = time_at(2024, 1, 15);
        let loan = originate(&mut store, user, account, &time);

        // two overdue rows, oldest 34 days past due: no default yet
        let at_two = time_at(2024, 3, 20);
        assert!(manager.sweep_defaults(&mut store, &at_two).is_empty());
        assert_eq!(store.loan(loan.id).unwrap().status, LoanStatus::Active);

        // third row falls overdue on apr 16
        let at_three = time_at(2024, 4, 16);
        assert_eq!(manager.sweep_defaults(&mut store, &at_three), vec![loan.id]);
        assert_eq!(store.loan(loan.id).unwrap().status, LoanStatus::Defaulted);
    }

    #[test]
    fn test_default_on_ninety_days_past_due() {
        let (mut store, user, account) = setup();
        let manager = LoanManager::default();
        let time = time_at(2024, 1, 15);
        let loan = originate(&mut store, user, account, &time);

        // settle installments 2 through 4 so only the feb 15 row can age
        let feb = time_at(2024, 2, 1);
        manager.make_payment(&mut store, user, loan.id, 2, &feb).unwrap();
        manager.make_payment(&mut store, user, loan.id, 3, &feb).unwrap();
        manager.make_payment(&mut store, user, loan.id, 4, &feb).unwrap();

        // 89 days after feb 15 is under the threshold
        let almost = time_at(2024, 5, 14);
        assert!(manager.sweep_defaults(&mut store, &almost).is_empty());

        // exactly 90 days past due defaults
        let ninety = time_at(2024, 5, 15);
        assert_eq!(manager.sweep_defaults(&mut store, &ninety), vec![loan.id]);
    }

    #[test]
    fn test_loan_with_no_overdue_rows_never_defaults() {
        let (mut store, user, account) = setup();
        let manager = LoanManager::default();
        let time = time_at(2024, 1, 15);
        let loan = originate(&mut store, user, account, &time);

        let much_later = {
            let t = time_at(2024, 1, 15);
            t.test_control()
                .unwrap()
                .advance(Duration::days(20));
            t
        };
        assert!(manager.sweep_defaults(&mut store, &much_later).is_empty());
        assert_eq!(store.loan(loan.id).unwrap().status, LoanStatus::Active);
    }

    #[test]
    fn test_missing_installment_names_the_installment() {
        let (mut store, user, account) = setup();
        let manager = LoanManager::default();
        let time = time_at(2024, 1, 15);
        let loan = originate(&mut store, user, account, &time);

        // the plan has 12 rows; installment 13 does not exist
        let err = manager
            .make_payment(&mut store, user, loan.id, 13, &time)
            .unwrap_err();
        assert_eq!(
            err,
            LedgerError::InstallmentNotFound {
                loan: loan.id,
                installment: 13,
            }
        );
    }

    #[test]
    fn test_duplicate_loan_name_rejected() {
        let (mut store, user, account) = setup();
        let time = time_at(2024, 1, 15);
        originate(&mut store, user, account, &time);

        let err = LoanManager::default()
            .create_loan(
                &mut store,
                user,
                NewLoan {
                    name: "car loan".to_string(),
                    amount: Money::from_major(100),
                    annual_rate: Rate::from_percent(dec!(5)),
                    duration_months: 6,
                    start_date: d(2024, 2, 1),
                    destination_account_id: account,
                },
                &time,
            )
            .unwrap_err();
        assert!(matches!(err, LedgerError::DuplicateName { .. }));
    }

    #[test]
    fn test_insufficient_funds_leaves_installment_pending() {
        let (mut store, user, account) = setup();
        let manager = LoanManager::default();
        let time = time_at(2024, 1, 15);
        let loan = LoanManager::default()
            .create_loan(
                &mut store,
                user,
                NewLoan {
                    name: "big loan".to_string(),
                    amount: Money::from_major(100),
                    annual_rate: Rate::from_percent(dec!(12)),
                    duration_months: 2,
                    start_date: d(2024, 1, 15),
                    destination_account_id: account,
                },
                &time,
            )
            .unwrap();

        // drain the account below the installment amount
        AccountLedger::debit(&mut store, account, Money::from_decimal(dec!(595.00)), &time)
            .unwrap();
        let err = manager
            .make_payment(&mut store, user, loan.id, 1, &time)
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientFunds { .. }));
        let plan = manager.schedule(&store, user, loan.id).unwrap();
        assert_eq!(plan[0].status, PaymentStatus::Pending);
    }
}
