use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::amortization::{due_date, AmortizationSchedule, LoanTerms};
use crate::decimal::Money;
use crate::errors::{LoanError, Result};
use crate::repository::StoredRecord;
use crate::types::{ApplicationStatus, CustomerId, CustomerStatus, KycStatus, LoanId, LoanStatus};

/// customer record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub full_name: String,
    pub phone_number: String,
    pub email: String,
    pub address: String,
    pub aadhar_number: String,
    pub pan_number: String,
    pub status: CustomerStatus,
    pub credit_score: u16,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// input for customer registration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCustomer {
    pub full_name: String,
    pub phone_number: String,
    pub email: String,
    pub address: String,
    pub aadhar_number: String,
    pub pan_number: String,
    pub credit_score: Option<u16>,
}

/// fallback credit score when none is supplied at registration
pub const DEFAULT_CREDIT_SCORE: u16 = 650;

impl Customer {
    pub fn register(new: NewCustomer, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            full_name: new.full_name,
            phone_number: new.phone_number,
            email: new.email,
            address: new.address,
            aadhar_number: new.aadhar_number,
            pan_number: new.pan_number,
            status: CustomerStatus::Active,
            credit_score: new.credit_score.unwrap_or(DEFAULT_CREDIT_SCORE),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == CustomerStatus::Active
    }
}

/// know-your-customer record, one per customer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KycRecord {
    pub id: Uuid,
    pub customer_id: CustomerId,
    pub id_proof_type: String,
    pub id_proof_number: String,
    pub address_proof_type: String,
    pub address_proof_number: String,
    pub photo_url: Option<String>,
    pub status: KycStatus,
    pub verified_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// input for kyc capture
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewKyc {
    pub customer_id: CustomerId,
    pub id_proof_type: String,
    pub id_proof_number: String,
    pub address_proof_type: String,
    pub address_proof_number: String,
    pub photo_url: Option<String>,
}

impl KycRecord {
    pub fn capture(new: NewKyc, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            customer_id: new.customer_id,
            id_proof_type: new.id_proof_type,
            id_proof_number: new.id_proof_number,
            address_proof_type: new.address_proof_type,
            address_proof_number: new.address_proof_number,
            photo_url: new.photo_url,
            status: KycStatus::Pending,
            verified_by: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// loan application awaiting a decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanApplication {
    pub id: Uuid,
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub requested_amount: Money,
    pub tenure_months: u32,
    pub purpose: String,
    pub monthly_income: Money,
    pub credit_score: u16,
    pub collateral_type: Option<String>,
    pub collateral_value: Money,
    pub has_existing_debt: bool,
    pub status: ApplicationStatus,
    pub applied_on: NaiveDate,
    pub reviewed_by: Option<String>,
    pub decided_on: Option<NaiveDate>,
    pub rejection_reason: Option<String>,
}

/// input for a new application
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewApplication {
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub requested_amount: Money,
    pub tenure_months: u32,
    pub purpose: String,
    pub monthly_income: Money,
    pub credit_score: u16,
    pub collateral_type: Option<String>,
    pub collateral_value: Money,
    pub has_existing_debt: bool,
}

impl LoanApplication {
    pub fn submit(new: NewApplication, applied_on: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            customer_id: new.customer_id,
            customer_name: new.customer_name,
            requested_amount: new.requested_amount,
            tenure_months: new.tenure_months,
            purpose: new.purpose,
            monthly_income: new.monthly_income,
            credit_score: new.credit_score,
            collateral_type: new.collateral_type,
            collateral_value: new.collateral_value,
            has_existing_debt: new.has_existing_debt,
            status: ApplicationStatus::Pending,
            applied_on,
            reviewed_by: None,
            decided_on: None,
            rejection_reason: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == ApplicationStatus::Pending
    }
}

/// Disbursed loan record.
///
/// Holds the immutable terms plus aggregate counters only; the installment
/// schedule is recomputed on demand and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    pub id: LoanId,
    pub loan_number: String,
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub customer_phone: String,
    pub terms: LoanTerms,
    pub purpose: String,
    pub processing_fee: Money,
    pub monthly_installment: Money,
    pub total_payable: Money,
    pub status: LoanStatus,
    pub disbursed_date: NaiveDate,
    pub next_due_date: NaiveDate,
    pub total_paid: Money,
    pub remaining_amount: Money,
    pub completed_installments: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// input for loan disbursal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanRequest {
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub customer_phone: String,
    pub terms: LoanTerms,
    pub purpose: String,
    pub processing_fee: Money,
    pub disbursed_date: NaiveDate,
}

impl Loan {
    /// Open a loan from a disbursal request.
    ///
    /// Installment and total payable come from the generated schedule, so
    /// stored aggregates always agree with the schedule shown to the customer.
    pub fn disburse(loan_number: String, request: LoanRequest, now: DateTime<Utc>) -> Self {
        let schedule = AmortizationSchedule::generate(&request.terms, request.disbursed_date);

        Self {
            id: Uuid::new_v4(),
            loan_number,
            customer_id: request.customer_id,
            customer_name: request.customer_name,
            customer_phone: request.customer_phone,
            terms: request.terms,
            purpose: request.purpose,
            processing_fee: request.processing_fee,
            monthly_installment: schedule.monthly_installment,
            total_payable: schedule.total_payment,
            status: LoanStatus::Active,
            disbursed_date: request.disbursed_date,
            next_due_date: due_date(request.disbursed_date, 1),
            total_paid: Money::ZERO,
            remaining_amount: schedule.total_payment,
            completed_installments: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// regenerate the amortization schedule from the stored terms
    pub fn schedule(&self) -> AmortizationSchedule {
        AmortizationSchedule::generate(&self.terms, self.disbursed_date)
    }

    /// next installment number due for collection
    pub fn next_installment_number(&self) -> u32 {
        self.completed_installments + 1
    }

    pub fn is_serviceable(&self) -> bool {
        self.status == LoanStatus::Active
    }

    /// Apply a collected installment to the aggregate counters.
    ///
    /// Advances the due date one calendar month and marks the loan completed
    /// once every installment has been collected.
    pub fn apply_collection(&mut self, amount: Money, now: DateTime<Utc>) -> Result<()> {
        if !self.is_serviceable() {
            return Err(LoanError::LoanNotServiceable { status: self.status });
        }
        if self.completed_installments >= self.terms.tenure_months() {
            return Err(LoanError::TenureExhausted {
                completed: self.completed_installments,
                tenure: self.terms.tenure_months(),
            });
        }
        if !amount.is_positive() {
            return Err(LoanError::InvalidPaymentAmount { amount });
        }

        self.total_paid += amount;
        self.remaining_amount = (self.remaining_amount - amount).max(Money::ZERO);
        self.completed_installments += 1;
        self.next_due_date = due_date(self.next_due_date, 1);
        self.updated_at = now;

        if self.completed_installments == self.terms.tenure_months() {
            self.status = LoanStatus::Completed;
            self.remaining_amount = Money::ZERO;
        }
        Ok(())
    }
}

/// record of a single collected installment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmiPayment {
    pub id: Uuid,
    pub loan_id: LoanId,
    pub installment_number: u32,
    pub amount: Money,
    pub payment_date: NaiveDate,
    pub collected_by: String,
    pub receipt_number: String,
    pub created_at: DateTime<Utc>,
}

/// Receipt issued for a collected installment.
///
/// Plain-text rendering only; document formatting lives outside this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    pub receipt_number: String,
    pub loan_number: String,
    pub customer_name: String,
    pub installment_number: u32,
    pub amount: Money,
    pub payment_date: NaiveDate,
    pub remaining_amount: Money,
    pub collected_by: String,
}

impl fmt::Display for Receipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "EMI PAYMENT RECEIPT")?;
        writeln!(f, "Receipt No: {}", self.receipt_number)?;
        writeln!(f, "Loan No: {}", self.loan_number)?;
        writeln!(f, "Customer: {}", self.customer_name)?;
        writeln!(f, "EMI Number: {}", self.installment_number)?;
        writeln!(f, "Amount Paid: Rs {}", self.amount)?;
        writeln!(f, "Payment Date: {}", self.payment_date)?;
        writeln!(f, "Remaining Balance: Rs {}", self.remaining_amount)?;
        write!(f, "Collected By: {}", self.collected_by)
    }
}

impl StoredRecord for Customer {
    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl StoredRecord for KycRecord {
    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl StoredRecord for LoanApplication {
    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        DateTime::from_naive_utc_and_offset(self.applied_on.and_time(chrono::NaiveTime::MIN), Utc)
    }
}

impl StoredRecord for Loan {
    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl StoredRecord for EmiPayment {
    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
