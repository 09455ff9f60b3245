use chrono::NaiveDate;
use hourglass_rs::SafeTimeProvider;
use uuid::Uuid;

use crate::amortization::AmortizationSchedule;
use crate::decimal::Money;
use crate::errors::{LoanError, Result};
use crate::records::{
    Customer, EmiPayment, KycRecord, Loan, LoanApplication, LoanRequest, NewApplication,
    NewCustomer, NewKyc, Receipt,
};
use crate::repository::{InMemoryRepository, Repository};
use crate::scoring::{calculate_recommendation, RecommendationScore};
use crate::types::{ApplicationStatus, CustomerStatus, KycStatus};

/// Back-office façade over the document collections.
///
/// Repositories are injected at construction; operations that need the
/// current time take a [`SafeTimeProvider`] by reference so tests control
/// the clock.
pub struct BackOffice {
    customers: Box<dyn Repository<Customer>>,
    kyc: Box<dyn Repository<KycRecord>>,
    applications: Box<dyn Repository<LoanApplication>>,
    loans: Box<dyn Repository<Loan>>,
    payments: Box<dyn Repository<EmiPayment>>,
}

impl BackOffice {
    pub fn new(
        customers: Box<dyn Repository<Customer>>,
        kyc: Box<dyn Repository<KycRecord>>,
        applications: Box<dyn Repository<LoanApplication>>,
        loans: Box<dyn Repository<Loan>>,
        payments: Box<dyn Repository<EmiPayment>>,
    ) -> Self {
        Self {
            customers,
            kyc,
            applications,
            loans,
            payments,
        }
    }

    /// fully in-memory wiring, used in tests and degraded deployments
    pub fn in_memory() -> Self {
        Self::new(
            Box::new(InMemoryRepository::new()),
            Box::new(InMemoryRepository::new()),
            Box::new(InMemoryRepository::new()),
            Box::new(InMemoryRepository::new()),
            Box::new(InMemoryRepository::new()),
        )
    }

    // ---- customers ----

    pub fn register_customer(
        &self,
        new: NewCustomer,
        time: &SafeTimeProvider,
    ) -> Result<Customer> {
        let customer = Customer::register(new, time.now());
        tracing::info!(customer_id = %customer.id, "customer registered");
        self.customers.create(customer)
    }

    /// soft delete: the record is kept for loan history
    pub fn deactivate_customer(&self, id: Uuid, time: &SafeTimeProvider) -> Result<Customer> {
        let now = time.now();
        self.customers
            .update(id, &mut |c| {
                c.status = CustomerStatus::Inactive;
                c.updated_at = now;
            })
            .map_err(|e| match e {
                LoanError::RecordNotFound { id } => LoanError::CustomerNotFound { id },
                other => other,
            })
    }

    pub fn customers(&self) -> Result<Vec<Customer>> {
        self.customers.list()
    }

    fn active_customer(&self, id: Uuid) -> Result<Customer> {
        let customer = self
            .customers
            .find(id)?
            .ok_or(LoanError::CustomerNotFound { id })?;
        if !customer.is_active() {
            return Err(LoanError::CustomerNotFound { id });
        }
        Ok(customer)
    }

    // ---- kyc ----

    pub fn record_kyc(&self, new: NewKyc, time: &SafeTimeProvider) -> Result<KycRecord> {
        self.active_customer(new.customer_id)?;
        self.kyc.create(KycRecord::capture(new, time.now()))
    }

    pub fn verify_kyc(
        &self,
        kyc_id: Uuid,
        verifier: &str,
        time: &SafeTimeProvider,
    ) -> Result<KycRecord> {
        let now = time.now();
        let verifier = verifier.to_string();
        self.kyc.update(kyc_id, &mut |k| {
            k.status = KycStatus::Verified;
            k.verified_by = Some(verifier.clone());
            k.updated_at = now;
        })
    }

    pub fn kyc_for_customer(&self, customer_id: Uuid) -> Result<KycRecord> {
        self.kyc
            .list()?
            .into_iter()
            .find(|k| k.customer_id == customer_id)
            .ok_or(LoanError::KycNotFound { customer_id })
    }

    // ---- applications ----

    pub fn submit_application(
        &self,
        new: NewApplication,
        time: &SafeTimeProvider,
    ) -> Result<LoanApplication> {
        self.active_customer(new.customer_id)?;
        let application = LoanApplication::submit(new, time.now().date_naive());
        self.applications.create(application)
    }

    /// pure scoring; touches no store
    pub fn review_application(&self, application: &LoanApplication) -> RecommendationScore {
        calculate_recommendation(application)
    }

    pub fn approve_application(
        &self,
        id: Uuid,
        reviewer: &str,
        time: &SafeTimeProvider,
    ) -> Result<LoanApplication> {
        self.decide_application(id, reviewer, ApplicationStatus::Approved, None, time)
    }

    pub fn reject_application(
        &self,
        id: Uuid,
        reviewer: &str,
        reason: &str,
        time: &SafeTimeProvider,
    ) -> Result<LoanApplication> {
        self.decide_application(
            id,
            reviewer,
            ApplicationStatus::Rejected,
            Some(reason.to_string()),
            time,
        )
    }

    fn decide_application(
        &self,
        id: Uuid,
        reviewer: &str,
        decision: ApplicationStatus,
        rejection_reason: Option<String>,
        time: &SafeTimeProvider,
    ) -> Result<LoanApplication> {
        let current = self
            .applications
            .find(id)?
            .ok_or(LoanError::ApplicationNotFound { id })?;
        if !current.is_pending() {
            return Err(LoanError::ApplicationAlreadyDecided {
                status: format!("{:?}", current.status),
            });
        }

        let decided_on = time.now().date_naive();
        let reviewer = reviewer.to_string();
        self.applications.update(id, &mut |a| {
            a.status = decision;
            a.reviewed_by = Some(reviewer.clone());
            a.decided_on = Some(decided_on);
            a.rejection_reason = rejection_reason.clone();
        })
    }

    pub fn applications(&self) -> Result<Vec<LoanApplication>> {
        self.applications.list()
    }

    // ---- loans ----

    /// Disburse a loan and assign the next sequential loan number.
    pub fn disburse_loan(&self, request: LoanRequest, time: &SafeTimeProvider) -> Result<Loan> {
        self.active_customer(request.customer_id)?;

        let loan_number = format!("L{:03}", self.loans.count()? + 1);
        let loan = Loan::disburse(loan_number, request, time.now());
        tracing::info!(
            loan_number = %loan.loan_number,
            installment = %loan.monthly_installment,
            "loan disbursed"
        );
        self.loans.create(loan)
    }

    pub fn loans(&self) -> Result<Vec<Loan>> {
        self.loans.list()
    }

    pub fn loans_for_customer(&self, customer_id: Uuid) -> Result<Vec<Loan>> {
        Ok(self
            .loans
            .list()?
            .into_iter()
            .filter(|l| l.customer_id == customer_id)
            .collect())
    }

    fn loan(&self, id: Uuid) -> Result<Loan> {
        self.loans.find(id)?.ok_or(LoanError::LoanNotFound { id })
    }

    /// Collect one installment: record the payment, roll the loan's
    /// aggregates forward, and issue a receipt.
    pub fn collect_installment(
        &self,
        loan_id: Uuid,
        amount: Money,
        payment_date: NaiveDate,
        collected_by: &str,
        time: &SafeTimeProvider,
    ) -> Result<(Loan, Receipt)> {
        let now = time.now();

        // validation and mutation run inside the repository update, so two
        // concurrent collectors cannot observe the same installment number
        let mut applied: Result<()> = Ok(());
        let updated = self
            .loans
            .update(loan_id, &mut |l| applied = l.apply_collection(amount, now))
            .map_err(|e| match e {
                LoanError::RecordNotFound { id } => LoanError::LoanNotFound { id },
                other => other,
            })?;
        applied?;

        let installment_number = updated.completed_installments;
        let receipt_number = format!("R{:03}", self.payments.count()? + 1);

        self.payments.create(EmiPayment {
            id: Uuid::new_v4(),
            loan_id,
            installment_number,
            amount,
            payment_date,
            collected_by: collected_by.to_string(),
            receipt_number: receipt_number.clone(),
            created_at: now,
        })?;

        tracing::info!(
            loan_number = %updated.loan_number,
            installment_number,
            %amount,
            "installment collected"
        );

        let receipt = Receipt {
            receipt_number,
            loan_number: updated.loan_number.clone(),
            customer_name: updated.customer_name.clone(),
            installment_number,
            amount,
            payment_date,
            remaining_amount: updated.remaining_amount,
            collected_by: collected_by.to_string(),
        };
        Ok((updated, receipt))
    }

    /// amortization schedule recomputed from the stored terms
    pub fn schedule_for(&self, loan_id: Uuid) -> Result<AmortizationSchedule> {
        Ok(self.loan(loan_id)?.schedule())
    }

    pub fn payments_for(&self, loan_id: Uuid) -> Result<Vec<EmiPayment>> {
        Ok(self
            .payments
            .list()?
            .into_iter()
            .filter(|p| p.loan_id == loan_id)
            .collect())
    }
}
