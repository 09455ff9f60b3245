use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::errors::{LoanError, Result};

/// Validated terms of a reducing-balance loan.
///
/// Terms are immutable once a loan is disbursed; the only way to obtain a
/// value is through [`LoanTerms::new`], so a schedule can never be requested
/// for a non-positive principal, a negative rate, or a zero tenure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawLoanTerms")]
pub struct LoanTerms {
    principal: Money,
    annual_rate: Rate,
    tenure_months: u32,
}

/// unvalidated wire shape for [`LoanTerms`]
#[derive(Debug, Clone, Deserialize)]
pub struct RawLoanTerms {
    pub principal: Money,
    pub annual_rate: Rate,
    pub tenure_months: u32,
}

impl TryFrom<RawLoanTerms> for LoanTerms {
    type Error = LoanError;

    fn try_from(raw: RawLoanTerms) -> Result<Self> {
        LoanTerms::new(raw.principal, raw.annual_rate, raw.tenure_months)
    }
}

impl LoanTerms {
    pub fn new(principal: Money, annual_rate: Rate, tenure_months: u32) -> Result<Self> {
        if !principal.is_positive() {
            return Err(LoanError::InvalidLoanTerms {
                message: format!("principal must be positive, got {principal}"),
            });
        }
        if annual_rate.is_negative() {
            return Err(LoanError::InvalidLoanTerms {
                message: format!("annual rate must not be negative, got {annual_rate}"),
            });
        }
        if tenure_months == 0 {
            return Err(LoanError::InvalidLoanTerms {
                message: "tenure must be at least one month".to_string(),
            });
        }
        Ok(Self {
            principal,
            annual_rate,
            tenure_months,
        })
    }

    pub fn principal(&self) -> Money {
        self.principal
    }

    pub fn annual_rate(&self) -> Rate {
        self.annual_rate
    }

    pub fn tenure_months(&self) -> u32 {
        self.tenure_months
    }

    /// Fixed monthly installment (EMI), rounded to the nearest whole rupee.
    ///
    /// Zero-rate loans divide the principal evenly; otherwise the standard
    /// reducing-balance annuity formula `P * r * (1+r)^n / ((1+r)^n - 1)`
    /// applies, with `(1+r)^n` computed by repeated multiplication over
    /// `Decimal`. Stable for tenures to at least 360 months.
    pub fn monthly_installment(&self) -> Money {
        let r = self.annual_rate.monthly_rate().as_decimal();

        if r.is_zero() {
            return (self.principal / Decimal::from(self.tenure_months)).round_rupee();
        }

        let base = Decimal::ONE + r;
        let mut compound = Decimal::ONE;
        for _ in 0..self.tenure_months {
            compound *= base;
        }

        let numerator = self.principal.as_decimal() * r * compound;
        let denominator = compound - Decimal::ONE;

        Money::from_decimal(numerator / denominator).round_rupee()
    }

    /// Lazy month-by-month breakdown starting one month after `start_date`.
    ///
    /// The iterator holds no hidden state between calls; iterating twice with
    /// identical terms and start date yields identical lines.
    pub fn schedule(&self, start_date: NaiveDate) -> ScheduleIter {
        ScheduleIter {
            monthly_rate: self.annual_rate.monthly_rate().as_decimal(),
            installment: self.monthly_installment(),
            balance: self.principal,
            tenure_months: self.tenure_months,
            start_date,
            next_number: 1,
        }
    }
}

/// single line of an amortization schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallmentLine {
    pub installment_number: u32,
    pub due_date: NaiveDate,
    pub installment_amount: Money,
    pub principal_component: Money,
    pub interest_component: Money,
    pub closing_balance: Money,
}

/// Iterator over installment lines.
///
/// The final line absorbs all rounding remainder: its principal component is
/// the full remaining balance, so the principal components sum to the
/// original principal exactly and the final closing balance is zero.
#[derive(Debug, Clone)]
pub struct ScheduleIter {
    monthly_rate: Decimal,
    installment: Money,
    balance: Money,
    tenure_months: u32,
    start_date: NaiveDate,
    next_number: u32,
}

impl Iterator for ScheduleIter {
    type Item = InstallmentLine;

    fn next(&mut self) -> Option<InstallmentLine> {
        if self.next_number > self.tenure_months {
            return None;
        }
        let number = self.next_number;
        self.next_number += 1;

        let interest = Money::from_decimal(self.balance.as_decimal() * self.monthly_rate)
            .round_rupee();

        let (installment_amount, principal_component) = if number == self.tenure_months {
            (self.balance + interest, self.balance)
        } else {
            // rounding can exhaust the balance before the tenure ends, so a
            // non-final line never bills more principal than remains
            let principal = (self.installment - interest).min(self.balance);
            (principal + interest, principal)
        };

        let closing_balance = (self.balance - principal_component).max(Money::ZERO);
        self.balance = closing_balance;

        Some(InstallmentLine {
            installment_number: number,
            due_date: due_date(self.start_date, number),
            installment_amount,
            principal_component,
            interest_component: interest,
            closing_balance,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.tenure_months + 1 - self.next_number) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for ScheduleIter {}

/// Materialized amortization schedule with totals.
///
/// Never persisted as a source of truth; recomputed on demand from the loan's
/// stored terms and disbursal date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    pub terms: LoanTerms,
    pub start_date: NaiveDate,
    pub monthly_installment: Money,
    pub lines: Vec<InstallmentLine>,
    pub total_interest: Money,
    pub total_payment: Money,
}

impl AmortizationSchedule {
    /// generate the full schedule
    pub fn generate(terms: &LoanTerms, start_date: NaiveDate) -> Self {
        let lines: Vec<InstallmentLine> = terms.schedule(start_date).collect();

        let total_interest = lines
            .iter()
            .map(|l| l.interest_component)
            .fold(Money::ZERO, |acc, x| acc + x);

        let total_payment = lines
            .iter()
            .map(|l| l.installment_amount)
            .fold(Money::ZERO, |acc, x| acc + x);

        Self {
            terms: *terms,
            start_date,
            monthly_installment: terms.monthly_installment(),
            lines,
            total_interest,
            total_payment,
        }
    }

    /// get the line for a specific installment number
    pub fn line(&self, installment_number: u32) -> Option<&InstallmentLine> {
        self.lines.get(installment_number.checked_sub(1)? as usize)
    }

    /// remaining balance after a given installment
    pub fn balance_after(&self, installment_number: u32) -> Money {
        self.line(installment_number)
            .map(|l| l.closing_balance)
            .unwrap_or(self.terms.principal)
    }
}

/// Due date `months_ahead` calendar months after `start`, same day-of-month,
/// clamped to the last valid day of shorter months. Saturates at the calendar
/// bounds rather than failing.
pub fn due_date(start: NaiveDate, months_ahead: u32) -> NaiveDate {
    start
        .checked_add_months(Months::new(months_ahead))
        .unwrap_or(NaiveDate::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn terms(principal: i64, rate_percent: u32, tenure: u32) -> LoanTerms {
        LoanTerms::new(
            Money::from_major(principal),
            Rate::from_percentage(rate_percent),
            tenure,
        )
        .unwrap()
    }

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    #[test]
    fn test_standard_emi() {
        // 50,000 at 12% over 12 months: formula gives 4442.44
        assert_eq!(terms(50_000, 12, 12).monthly_installment(), Money::from_major(4442));
    }

    #[test]
    fn test_zero_rate_emi() {
        assert_eq!(terms(12_000, 0, 12).monthly_installment(), Money::from_major(1_000));
    }

    #[rstest]
    #[case(75_000, 12, 24)]
    #[case(30_000, 18, 18)]
    #[case(1_000_000, 24, 360)]
    #[case(100_000, 100, 60)]
    fn test_emi_positive_and_covers_interest(
        #[case] principal: i64,
        #[case] rate: u32,
        #[case] tenure: u32,
    ) {
        let terms = terms(principal, rate, tenure);
        let emi = terms.monthly_installment();
        assert!(emi.is_positive());

        // first month's interest must be strictly less than the installment,
        // otherwise the balance would never reduce
        let first_interest = Money::from_decimal(
            Money::from_major(principal).as_decimal()
                * Rate::from_percentage(rate).monthly_rate().as_decimal(),
        );
        assert!(emi > first_interest);
    }

    #[test]
    fn test_emi_is_idempotent() {
        let t = terms(50_000, 12, 12);
        assert_eq!(t.monthly_installment(), t.monthly_installment());
    }

    #[rstest]
    #[case(0, 12, 12)]
    #[case(50_000, 12, 0)]
    fn test_invalid_terms_rejected(#[case] principal: i64, #[case] rate: u32, #[case] tenure: u32) {
        let result = LoanTerms::new(
            Money::from_major(principal),
            Rate::from_percentage(rate),
            tenure,
        );
        assert!(matches!(result, Err(LoanError::InvalidLoanTerms { .. })));
    }

    #[test]
    fn test_negative_values_rejected() {
        assert!(LoanTerms::new(
            Money::from_major(-1_000),
            Rate::from_percentage(12),
            12
        )
        .is_err());
        assert!(LoanTerms::new(
            Money::from_major(1_000),
            Rate::from_decimal(dec!(-0.01)),
            12
        )
        .is_err());
    }

    #[test]
    fn test_schedule_shape() {
        let t = terms(50_000, 12, 12);
        let schedule = AmortizationSchedule::generate(&t, start());

        assert_eq!(schedule.lines.len(), 12);
        for (i, line) in schedule.lines.iter().enumerate() {
            assert_eq!(line.installment_number, i as u32 + 1);
        }

        // due dates strictly increasing, one calendar month apart
        assert_eq!(schedule.lines[0].due_date, NaiveDate::from_ymd_opt(2024, 2, 15).unwrap());
        for pair in schedule.lines.windows(2) {
            assert_eq!(pair[1].due_date, due_date(pair[0].due_date, 1));
            assert!(pair[1].due_date > pair[0].due_date);
        }
    }

    #[test]
    fn test_principal_components_sum_exactly() {
        let t = terms(50_000, 12, 12);
        let schedule = AmortizationSchedule::generate(&t, start());

        let principal_sum = schedule
            .lines
            .iter()
            .map(|l| l.principal_component)
            .fold(Money::ZERO, |acc, x| acc + x);
        assert_eq!(principal_sum, t.principal());

        let last = schedule.lines.last().unwrap();
        assert_eq!(last.closing_balance, Money::ZERO);
    }

    #[test]
    fn test_installment_constant_except_last() {
        let t = terms(50_000, 12, 12);
        let schedule = AmortizationSchedule::generate(&t, start());
        let emi = schedule.monthly_installment;

        for line in &schedule.lines[..11] {
            assert_eq!(line.installment_amount, emi);
            assert_eq!(line.principal_component + line.interest_component, emi);
        }
        // last line absorbs the rounding remainder
        let last = schedule.lines.last().unwrap();
        assert!((last.installment_amount - emi).abs() <= Money::from_major(12));
    }

    #[test]
    fn test_zero_rate_schedule() {
        let t = terms(12_000, 0, 12);
        let schedule = AmortizationSchedule::generate(&t, start());

        for line in &schedule.lines {
            assert_eq!(line.interest_component, Money::ZERO);
            assert_eq!(line.principal_component, Money::from_major(1_000));
        }
        assert_eq!(schedule.total_interest, Money::ZERO);
        assert_eq!(schedule.total_payment, Money::from_major(12_000));
    }

    #[test]
    fn test_single_installment() {
        let t = terms(50_000, 18, 1);
        let schedule = AmortizationSchedule::generate(&t, start());

        assert_eq!(schedule.lines.len(), 1);
        let only = &schedule.lines[0];
        assert_eq!(only.principal_component, Money::from_major(50_000));
        assert_eq!(only.closing_balance, Money::ZERO);
        // one month's interest at 18%/12 = 1.5%
        assert_eq!(only.interest_component, Money::from_major(750));
        assert_eq!(only.installment_amount, Money::from_major(50_750));
    }

    #[test]
    fn test_schedule_is_deterministic() {
        let t = terms(75_000, 12, 24);
        let a = AmortizationSchedule::generate(&t, start());
        let b = AmortizationSchedule::generate(&t, start());
        assert_eq!(a, b);

        // the lazy iterator is restartable with no retained state
        let first: Vec<InstallmentLine> = t.schedule(start()).collect();
        let second: Vec<InstallmentLine> = t.schedule(start()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_iterator_is_exact_size() {
        let t = terms(75_000, 12, 24);
        let mut iter = t.schedule(start());
        assert_eq!(iter.len(), 24);
        iter.next();
        assert_eq!(iter.len(), 23);
    }

    #[test]
    fn test_month_end_clamping() {
        // Jan 31 start: February clamps to its last day, longer months keep 31
        let t = terms(50_000, 12, 4);
        let start = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let dates: Vec<NaiveDate> = t.schedule(start).map(|l| l.due_date).collect();

        assert_eq!(dates[0], NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()); // leap year
        assert_eq!(dates[1], NaiveDate::from_ymd_opt(2024, 3, 31).unwrap());
        assert_eq!(dates[2], NaiveDate::from_ymd_opt(2024, 4, 30).unwrap());
        assert_eq!(dates[3], NaiveDate::from_ymd_opt(2024, 5, 31).unwrap());
    }

    #[test]
    fn test_micro_principal_exhausts_balance_early() {
        // EMI rounds 0.50 up to 1, so the balance reaches zero at line 10;
        // the remaining lines must bill nothing
        let t = terms(10, 0, 20);
        let schedule = AmortizationSchedule::generate(&t, start());

        let principal_sum = schedule
            .lines
            .iter()
            .map(|l| l.principal_component)
            .fold(Money::ZERO, |acc, x| acc + x);
        assert_eq!(principal_sum, t.principal());
        assert_eq!(schedule.total_payment, Money::from_major(10));

        for line in &schedule.lines[10..] {
            assert_eq!(line.principal_component, Money::ZERO);
            assert_eq!(line.installment_amount, Money::ZERO);
            assert_eq!(line.closing_balance, Money::ZERO);
        }
        assert_eq!(schedule.lines.last().unwrap().closing_balance, Money::ZERO);
    }

    #[test]
    fn test_long_tenure_stability() {
        let t = terms(1_000_000, 24, 360);
        let schedule = AmortizationSchedule::generate(&t, start());

        assert_eq!(schedule.lines.len(), 360);
        assert_eq!(schedule.lines.last().unwrap().closing_balance, Money::ZERO);

        let principal_sum = schedule
            .lines
            .iter()
            .map(|l| l.principal_component)
            .fold(Money::ZERO, |acc, x| acc + x);
        assert_eq!(principal_sum, t.principal());
    }

    #[test]
    fn test_terms_deserialization_validates() {
        let ok: std::result::Result<LoanTerms, _> = serde_json::from_str(
            r#"{"principal":"50000","annual_rate":"0.12","tenure_months":12}"#,
        );
        assert!(ok.is_ok());

        let bad: std::result::Result<LoanTerms, _> = serde_json::from_str(
            r#"{"principal":"0","annual_rate":"0.12","tenure_months":12}"#,
        );
        assert!(bad.is_err());
    }
}
