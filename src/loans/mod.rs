pub mod amortization;
pub mod lifecycle;

pub use amortization::{AmortizationSchedule, ScheduledInstallment};
pub use lifecycle::{DefaultPolicy, LoanManager, NewLoan};
