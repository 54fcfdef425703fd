use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use crate::decimal::Money;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: Uuid },

    #[error("{resource} {id} does not belong to the acting user")]
    Forbidden { resource: &'static str, id: Uuid },

    #[error("amount must be positive: {amount}")]
    InvalidAmount { amount: Money },

    #[error("{resource} name already in use: {name}")]
    DuplicateName { resource: &'static str, name: String },

    #[error("invalid interest rate: {rate}")]
    InvalidRate { rate: crate::decimal::Rate },

    #[error("loan term must be at least one month: {months}")]
    InvalidTerm { months: u32 },

    #[error("inverted date range: {start} is after {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("loan {loan} has no installment {installment}")]
    InstallmentNotFound { loan: Uuid, installment: u32 },

    #[error("a diary entry already exists for {date}")]
    DuplicateEntryDate { date: NaiveDate },

    #[error("insufficient funds: available {available}, requested {requested}")]
    InsufficientFunds { available: Money, requested: Money },

    #[error("installment {installment} has already been paid")]
    InstallmentAlreadyPaid { installment: u32 },

    #[error("savings account has already been withdrawn")]
    AlreadyWithdrawn { id: Uuid },

    #[error("account still has {transactions} transactions and {transfers} transfers")]
    AccountInUse {
        transactions: usize,
        transfers: usize,
    },
}

/// coarse classification for mapping to a transport layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Forbidden,
    InvalidArgument,
    InsufficientFunds,
    Conflict,
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::NotFound { .. } | LedgerError::InstallmentNotFound { .. } => {
                ErrorKind::NotFound
            }
            LedgerError::Forbidden { .. } => ErrorKind::Forbidden,
            LedgerError::InvalidAmount { .. }
            | LedgerError::DuplicateName { .. }
            | LedgerError::InvalidRate { .. }
            | LedgerError::InvalidTerm { .. }
            | LedgerError::InvalidDateRange { .. }
            | LedgerError::DuplicateEntryDate { .. } => ErrorKind::InvalidArgument,
            LedgerError::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            LedgerError::InstallmentAlreadyPaid { .. }
            | LedgerError::AlreadyWithdrawn { .. }
            | LedgerError::AccountInUse { .. } => ErrorKind::Conflict,
        }
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_kinds() {
        let err = LedgerError::NotFound {
            resource: "account",
            id: Uuid::nil(),
        };
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = LedgerError::InsufficientFunds {
            available: Money::from_decimal(dec!(10)),
            requested: Money::from_decimal(dec!(40)),
        };
        assert_eq!(err.kind(), ErrorKind::InsufficientFunds);

        let err = LedgerError::InstallmentAlreadyPaid { installment: 3 };
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let err = LedgerError::InvalidAmount { amount: Money::ZERO };
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_error_messages_carry_context() {
        let err = LedgerError::InsufficientFunds {
            available: Money::from_decimal(dec!(10.50)),
            requested: Money::from_decimal(dec!(40)),
        };
        assert_eq!(
            err.to_string(),
            "insufficient funds: available 10.50, requested 40.00"
        );
    }
}
