use chrono::{DateTime, Duration, NaiveDate, Utc};
use hourglass_rs::SafeTimeProvider;
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::debug;
use uuid::Uuid;

use crate::dates::start_of_month;
use crate::decimal::Money;
use crate::errors::{LedgerError, Result};
use crate::model::Report;
use crate::store::MemoryStore;
use crate::types::{ReportId, ReportType, UserId};

/// parameters for saving a report over a date range
#[derive(Debug, Clone)]
pub struct NewReport {
    pub title: String,
    pub report_type: ReportType,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
}

/// this month's spending measured against last month's
#[derive(Debug, Clone, PartialEq)]
pub struct SpendingComparison {
    pub current_month_total: Money,
    pub previous_month_total: Money,
    pub difference: Money,
    pub percentage_change: Decimal,
}

/// saved income/expense summaries and month-over-month comparison
///
/// Report totals are snapshots: they are computed from the transactions
/// visible when the report is created or its range edited, and are not
/// refreshed by later transaction changes.
pub struct ReportEngine;

impl ReportEngine {
    pub fn create(
        store: &mut MemoryStore,
        user_id: UserId,
        req: NewReport,
        time: &SafeTimeProvider,
    ) -> Result<Report> {
        if req.from_date > req.to_date {
            return Err(LedgerError::InvalidDateRange {
                start: req.from_date,
                end: req.to_date,
            });
        }
        let (total_income, total_expense) =
            Self::range_totals(store, user_id, req.from_date, req.to_date);

        let report = Report {
            id: Uuid::new_v4(),
            user_id,
            title: req.title,
            report_type: req.report_type,
            from_date: req.from_date,
            to_date: req.to_date,
            total_income,
            total_expense,
            created_at: time.now(),
        };
        debug!(report = %report.id, income = %total_income, expense = %total_expense, "report saved");
        Ok(store.insert_report(report))
    }

    /// replace the report's fields and recompute its totals over the new range
    pub fn update(
        store: &mut MemoryStore,
        user_id: UserId,
        report_id: ReportId,
        req: NewReport,
    ) -> Result<Report> {
        Self::owned_report(store, report_id, user_id)?;
        if req.from_date > req.to_date {
            return Err(LedgerError::InvalidDateRange {
                start: req.from_date,
                end: req.to_date,
            });
        }
        let (total_income, total_expense) =
            Self::range_totals(store, user_id, req.from_date, req.to_date);

        let report = store.report_mut(report_id)?;
        report.title = req.title;
        report.report_type = req.report_type;
        report.from_date = req.from_date;
        report.to_date = req.to_date;
        report.total_income = total_income;
        report.total_expense = total_expense;
        Ok(report.clone())
    }

    pub fn delete(store: &mut MemoryStore, user_id: UserId, report_id: ReportId) -> Result<()> {
        Self::owned_report(store, report_id, user_id)?;
        store.remove_report(report_id);
        Ok(())
    }

    pub fn get(store: &MemoryStore, user_id: UserId, report_id: ReportId) -> Result<Report> {
        Self::owned_report(store, report_id, user_id).cloned()
    }

    pub fn list(store: &MemoryStore, user_id: UserId) -> Vec<Report> {
        store
            .reports_for_user(user_id)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn list_by_type(
        store: &MemoryStore,
        user_id: UserId,
        report_type: ReportType,
    ) -> Vec<Report> {
        store
            .reports_by_type(user_id, report_type)
            .into_iter()
            .cloned()
            .collect()
    }

    /// expenses this month so far against the whole of last month
    pub fn spending_comparison(
        store: &MemoryStore,
        user_id: UserId,
        time: &SafeTimeProvider,
    ) -> SpendingComparison {
        let today = time.now().date_naive();
        let current_start = start_of_month(today);
        let previous_end = current_start - Duration::days(1);
        let previous_start = start_of_month(previous_end);

        let (_, current_month_total) = store.totals_in_range(
            user_id,
            day_start(current_start),
            day_end(today),
        );
        let (_, previous_month_total) = store.totals_in_range(
            user_id,
            day_start(previous_start),
            day_end(previous_end),
        );

        let difference = current_month_total - previous_month_total;
        // no baseline month means no meaningful percentage
        let percentage_change = if previous_month_total.is_positive() {
            (difference.as_decimal() * Decimal::from(100) / previous_month_total.as_decimal())
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        } else {
            Decimal::ZERO
        };

        SpendingComparison {
            current_month_total,
            previous_month_total,
            difference,
            percentage_change,
        }
    }

    fn range_totals(
        store: &MemoryStore,
        user_id: UserId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> (Money, Money) {
        store.totals_in_range(user_id, day_start(from), day_end(to))
    }

    fn owned_report(store: &MemoryStore, report_id: ReportId, user_id: UserId) -> Result<&Report> {
        let report = store.report(report_id)?;
        if report.user_id != user_id {
            return Err(LedgerError::Forbidden {
                resource: "report",
                id: report_id,
            });
        }
        Ok(report)
    }
}

fn day_start(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc()
}

fn day_end(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(23, 59, 59).unwrap_or_default().and_utc()
}
