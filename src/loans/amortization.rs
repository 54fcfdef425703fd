use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::dates::months_after;
use crate::decimal::{Money, Rate};
use crate::errors::{LedgerError, Result};

/// one row of an equal-installment repayment plan
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledInstallment {
    pub number: u32,
    pub due_date: NaiveDate,
    pub amount: Money,
    pub principal: Money,
    pub interest: Money,
    pub remaining_balance: Money,
}

/// equal-installment (annuity) amortization plan
///
/// Installment k is due k calendar months after the start date. The final
/// row absorbs all rounding drift so that principals sum to the loan amount
/// exactly and the last remaining balance is exactly zero.
#[derive(Debug, Clone, PartialEq)]
pub struct AmortizationSchedule {
    pub principal: Money,
    pub annual_rate: Rate,
    pub term_months: u32,
    pub start_date: NaiveDate,
    pub installments: Vec<ScheduledInstallment>,
    pub total_interest: Money,
    pub total_payment: Money,
}

impl AmortizationSchedule {
    pub fn generate(
        principal: Money,
        annual_rate: Rate,
        term_months: u32,
        start_date: NaiveDate,
    ) -> Result<Self> {
        if term_months == 0 {
            return Err(LedgerError::InvalidTerm {
                months: term_months,
            });
        }
        if !principal.is_positive() {
            return Err(LedgerError::InvalidAmount { amount: principal });
        }
        if annual_rate.is_negative() {
            return Err(LedgerError::InvalidRate { rate: annual_rate });
        }

        // monthly rate at 10 digits, half-up
        let rate = annual_rate
            .monthly()
            .round_dp_with_strategy(10, RoundingStrategy::MidpointAwayFromZero);
        let installment = Self::installment_amount(principal, rate, term_months);

        let mut installments = Vec::with_capacity(term_months as usize);
        let mut balance = principal;
        let mut total_interest = Money::ZERO;

        for number in 1..=term_months {
            let interest = Money::from_decimal(balance.as_decimal() * rate);
            let (amount, row_principal) = if number == term_months {
                // final row clears the balance exactly
                (balance + interest, balance)
            } else {
                (installment, installment - interest)
            };
            balance -= row_principal;
            total_interest += interest;

            installments.push(ScheduledInstallment {
                number,
                due_date: months_after(start_date, number),
                amount,
                principal: row_principal,
                interest,
                remaining_balance: balance,
            });
        }

        let total_payment = principal + total_interest;
        Ok(AmortizationSchedule {
            principal,
            annual_rate,
            term_months,
            start_date,
            installments,
            total_interest,
            total_payment,
        })
    }

    /// fixed installment A = P * r * (1+r)^n / ((1+r)^n - 1), or P / n at zero rate
    fn installment_amount(principal: Money, rate: Decimal, term_months: u32) -> Money {
        if rate.is_zero() {
            return principal / Decimal::from(term_months);
        }
        let mut compound = Decimal::ONE;
        for _ in 0..term_months {
            compound *= Decimal::ONE + rate;
        }
        Money::from_decimal(principal.as_decimal() * rate * compound / (compound - Decimal::ONE))
    }
}
