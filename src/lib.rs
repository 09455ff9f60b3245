pub mod amortization;
pub mod decimal;
pub mod errors;
pub mod records;
pub mod repository;
pub mod scoring;
pub mod servicing;
pub mod types;

// re-export key types
pub use amortization::{
    due_date, AmortizationSchedule, InstallmentLine, LoanTerms, ScheduleIter,
};
pub use decimal::{Money, Rate};
pub use errors::{LoanError, Result};
pub use records::{
    Customer, EmiPayment, KycRecord, Loan, LoanApplication, LoanRequest, NewApplication,
    NewCustomer, NewKyc, Receipt, DEFAULT_CREDIT_SCORE,
};
pub use repository::{FallbackRepository, InMemoryRepository, Repository, StoredRecord};
pub use scoring::{calculate_recommendation, RecommendationScore};
pub use servicing::BackOffice;
pub use types::{
    ApplicationStatus, CustomerId, CustomerStatus, DecisionTier, KycStatus, LoanId, LoanStatus,
};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
