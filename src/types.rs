use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// unique identifier for a customer record
pub type CustomerId = Uuid;

/// unique identifier for a loan record
pub type LoanId = Uuid;

/// customer status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CustomerStatus {
    Active,
    /// soft-deleted; record is retained for loan history
    Inactive,
}

/// loan status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    /// disbursed and collecting installments
    Active,
    /// all installments collected
    Completed,
    /// soft-deleted before completion
    Cancelled,
}

/// loan application status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

/// kyc verification status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KycStatus {
    Pending,
    Verified,
    Rejected,
}

/// decision tier from the recommendation score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionTier {
    /// score >= 80
    Approve,
    /// score 60..=79
    ApproveWithConditions,
    /// score 40..=59
    ReviewRequired,
    /// score < 40
    Reject,
}
