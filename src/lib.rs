pub mod dates;
pub mod decimal;
pub mod diary;
pub mod errors;
pub mod goals;
pub mod ledger;
pub mod loans;
pub mod model;
pub mod reports;
pub mod savings;
pub mod store;
pub mod types;

// re-export key types
pub use decimal::{Money, Rate};
pub use diary::{DiaryJournal, DiaryStats, NewDiaryEntry};
pub use errors::{ErrorKind, LedgerError, Result};
pub use goals::{GoalEvaluation, NewGoal, SpendingGoalEngine};
pub use ledger::{
    AccountLedger, NewAccount, NewTransaction, NewTransfer, TransactionAuditLog,
    TransactionEngine, TransferEngine, UpdateAccount,
};
pub use loans::{
    AmortizationSchedule, DefaultPolicy, LoanManager, NewLoan, ScheduledInstallment,
};
pub use model::{
    Account, DiaryEntry, LoanAccount, LoanPayment, Report, SavingsAccount, SpendingGoal,
    Transaction, TransactionHistory, TransactionSnapshot, Transfer,
};
pub use reports::{NewReport, ReportEngine, SpendingComparison};
pub use savings::{NewSavings, ProjectionPoint, SavingsEngine, SavingsProjection};
pub use store::MemoryStore;
pub use types::{
    AccountId, AccountType, Category, ChangeType, DiaryEntryId, GoalId, GoalPeriod, HistoryId,
    InstallmentId, LoanId, LoanStatus, PaymentStatus, ReportId, ReportType, SavingsId,
    SavingsStatus, TermType, TransactionId, TransactionKind, TransferId, UserId,
};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
