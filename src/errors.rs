use thiserror::Error;
use uuid::Uuid;

use crate::decimal::Money;
use crate::types::LoanStatus;

#[derive(Error, Debug)]
pub enum LoanError {
    #[error("invalid loan terms: {message}")]
    InvalidLoanTerms {
        message: String,
    },

    #[error("record not found: {id}")]
    RecordNotFound {
        id: Uuid,
    },

    #[error("customer not found: {id}")]
    CustomerNotFound {
        id: Uuid,
    },

    #[error("loan not found: {id}")]
    LoanNotFound {
        id: Uuid,
    },

    #[error("no kyc record for customer: {customer_id}")]
    KycNotFound {
        customer_id: Uuid,
    },

    #[error("application not found: {id}")]
    ApplicationNotFound {
        id: Uuid,
    },

    #[error("application already decided: current status is {status}")]
    ApplicationAlreadyDecided {
        status: String,
    },

    #[error("loan not serviceable: current status is {status:?}")]
    LoanNotServiceable {
        status: LoanStatus,
    },

    #[error("tenure exhausted: {completed} of {tenure} installments already collected")]
    TenureExhausted {
        completed: u32,
        tenure: u32,
    },

    #[error("invalid payment amount: {amount}")]
    InvalidPaymentAmount {
        amount: Money,
    },

    #[error("store unavailable: {message}")]
    StoreUnavailable {
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, LoanError>;
