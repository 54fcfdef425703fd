use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dates::{months_after, start_of_month, start_of_week, start_of_year, years_after};
use crate::decimal::Money;

pub type UserId = Uuid;
pub type AccountId = Uuid;
pub type TransactionId = Uuid;
pub type HistoryId = Uuid;
pub type TransferId = Uuid;
pub type LoanId = Uuid;
pub type InstallmentId = Uuid;
pub type SavingsId = Uuid;
pub type GoalId = Uuid;
pub type ReportId = Uuid;
pub type DiaryEntryId = Uuid;

/// account types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountType {
    Cash,
    Bank,
    CreditCard,
    EWallet,
}

/// direction of a transaction's balance effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    /// the signed balance effect of a transaction with this kind
    pub fn signed_effect(&self, amount: Money) -> Money {
        match self {
            TransactionKind::Income => amount,
            TransactionKind::Expense => -amount,
        }
    }
}

/// transaction categories; Transfer and Other are reserved for synthetic entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Food,
    Transportation,
    Housing,
    Utilities,
    Entertainment,
    Healthcare,
    Education,
    Shopping,
    PersonalCare,
    Travel,
    Debt,
    Savings,
    Income,
    Transfer,
    Other,
}

/// audit row type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeType {
    Update,
    Delete,
}

/// loan status; Completed and Defaulted are terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoanStatus {
    Active,
    Completed,
    Defaulted,
}

/// installment status; Paid is terminal, Overdue may still be paid late
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    Pending,
    Paid,
    Overdue,
}

/// savings account status; Withdrawn is terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SavingsStatus {
    Active,
    Matured,
    Withdrawn,
}

/// savings term
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TermType {
    DailyFlexible,
    ThreeMonth,
    SixMonth,
    TwelveMonth,
}

impl TermType {
    /// maturity date for a deposit opened on `start`; flexible deposits get a
    /// nominal one-year horizon but stay withdrawable at any time
    pub fn maturity_date(&self, start: NaiveDate) -> NaiveDate {
        match self {
            TermType::ThreeMonth => months_after(start, 3),
            TermType::SixMonth => months_after(start, 6),
            TermType::TwelveMonth => years_after(start, 1),
            TermType::DailyFlexible => years_after(start, 1),
        }
    }

    /// whether this term auto-matures when the maturity date passes
    pub fn is_fixed(&self) -> bool {
        !matches!(self, TermType::DailyFlexible)
    }
}

/// label for the horizon a saved report covers; totals always come from the
/// report's explicit from/to dates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportType {
    Daily,
    Weekly,
    Monthly,
    Yearly,
    Custom,
}

/// spending goal recurrence period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GoalPeriod {
    Weekly,
    Monthly,
    Yearly,
}

impl GoalPeriod {
    /// start of the current period window containing `today`
    pub fn window_start(&self, today: NaiveDate) -> NaiveDate {
        match self {
            GoalPeriod::Weekly => start_of_week(today),
            GoalPeriod::Monthly => start_of_month(today),
            GoalPeriod::Yearly => start_of_year(today),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_signed_effect() {
        let amount = Money::from_decimal(dec!(25.50));
        assert_eq!(TransactionKind::Income.signed_effect(amount), amount);
        assert_eq!(TransactionKind::Expense.signed_effect(amount), -amount);
    }

    #[test]
    fn test_term_maturity_offsets() {
        let start = d(2024, 1, 15);
        assert_eq!(TermType::ThreeMonth.maturity_date(start), d(2024, 4, 15));
        assert_eq!(TermType::SixMonth.maturity_date(start), d(2024, 7, 15));
        assert_eq!(TermType::TwelveMonth.maturity_date(start), d(2025, 1, 15));
        // flexible gets the same nominal horizon as a one-year term
        assert_eq!(TermType::DailyFlexible.maturity_date(start), d(2025, 1, 15));
        assert!(!TermType::DailyFlexible.is_fixed());
    }

    #[test]
    fn test_goal_window_starts() {
        // 2024-06-13 is a thursday
        let today = d(2024, 6, 13);
        assert_eq!(GoalPeriod::Weekly.window_start(today), d(2024, 6, 10));
        assert_eq!(GoalPeriod::Monthly.window_start(today), d(2024, 6, 1));
        assert_eq!(GoalPeriod::Yearly.window_start(today), d(2024, 1, 1));
    }
}
