use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::records::LoanApplication;
use crate::types::DecisionTier;

/// Recommendation produced for a loan application.
///
/// Pure function of the application's numeric inputs; the same application
/// always yields the same score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationScore {
    pub score: u32,
    pub tier: DecisionTier,
    pub reasons: Vec<String>,
}

/// Score an application on a 0..=100 scale and bucket it into a decision tier.
///
/// Four weighted factors: credit score band (10/20/30/40), loan-to-annual-income
/// ratio band (5/15/25), collateral coverage band (5/10/15/20), and existing
/// debt (5/15).
pub fn calculate_recommendation(application: &LoanApplication) -> RecommendationScore {
    let mut score = 0;
    let mut reasons = Vec::new();

    match application.credit_score {
        750.. => {
            score += 40;
            reasons.push("excellent credit score".to_string());
        }
        700..=749 => {
            score += 30;
            reasons.push("good credit score".to_string());
        }
        650..=699 => {
            score += 20;
            reasons.push("fair credit score".to_string());
        }
        _ => {
            score += 10;
            reasons.push("poor credit score".to_string());
        }
    }

    let annual_income = application.monthly_income * Decimal::from(12);
    if annual_income.is_zero() {
        // no declared income lands in the worst ratio band
        score += 5;
        reasons.push("high income to loan ratio".to_string());
    } else {
        let ratio = application.requested_amount.as_decimal() / annual_income.as_decimal();
        if ratio <= Decimal::from(3) {
            score += 25;
            reasons.push("good income to loan ratio".to_string());
        } else if ratio <= Decimal::from(5) {
            score += 15;
            reasons.push("acceptable income to loan ratio".to_string());
        } else {
            score += 5;
            reasons.push("high income to loan ratio".to_string());
        }
    }

    let requested = application.requested_amount;
    let strong_cover = Money::from_decimal(
        requested.as_decimal() * Decimal::new(15, 1), // 1.5x
    );
    if application.collateral_value >= strong_cover {
        score += 20;
        reasons.push("strong collateral coverage".to_string());
    } else if application.collateral_value >= requested {
        score += 15;
        reasons.push("adequate collateral coverage".to_string());
    } else if application.collateral_value.is_positive() {
        score += 10;
        reasons.push("partial collateral coverage".to_string());
    } else {
        score += 5;
        reasons.push("no collateral provided".to_string());
    }

    if application.has_existing_debt {
        score += 5;
        reasons.push("has existing loans".to_string());
    } else {
        score += 15;
        reasons.push("no existing loan burden".to_string());
    }

    RecommendationScore {
        score,
        tier: tier_for(score),
        reasons,
    }
}

fn tier_for(score: u32) -> DecisionTier {
    match score {
        80.. => DecisionTier::Approve,
        60..=79 => DecisionTier::ApproveWithConditions,
        40..=59 => DecisionTier::ReviewRequired,
        _ => DecisionTier::Reject,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::LoanApplication;
    use crate::types::ApplicationStatus;
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn application(
        credit_score: u16,
        monthly_income: i64,
        requested: i64,
        collateral: i64,
        has_existing_debt: bool,
    ) -> LoanApplication {
        LoanApplication {
            id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            customer_name: "Rajesh Kumar".to_string(),
            requested_amount: Money::from_major(requested),
            tenure_months: 12,
            purpose: "Business Expansion".to_string(),
            monthly_income: Money::from_major(monthly_income),
            credit_score,
            collateral_type: None,
            collateral_value: Money::from_major(collateral),
            has_existing_debt,
            status: ApplicationStatus::Pending,
            applied_on: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            reviewed_by: None,
            decided_on: None,
            rejection_reason: None,
        }
    }

    #[test]
    fn test_full_marks_application() {
        // 750+ credit, ratio well under 3, 1.5x collateral, no debt
        let app = application(780, 50_000, 100_000, 200_000, false);
        let rec = calculate_recommendation(&app);

        assert_eq!(rec.score, 100);
        assert_eq!(rec.tier, DecisionTier::Approve);
        assert!(rec.reasons.iter().any(|r| r == "excellent credit score"));
        assert!(rec.reasons.iter().any(|r| r == "no existing loan burden"));
    }

    #[test]
    fn test_recommendation_round_trips_through_json() {
        let app = application(780, 50_000, 100_000, 200_000, false);
        let rec = calculate_recommendation(&app);

        let json = serde_json::to_string(&rec).unwrap();
        let restored: RecommendationScore = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, rec);
    }

    #[test]
    fn test_weakest_application() {
        // sub-650 credit, zero income, no collateral, existing debt
        let app = application(600, 0, 100_000, 0, true);
        let rec = calculate_recommendation(&app);

        assert_eq!(rec.score, 25);
        assert_eq!(rec.tier, DecisionTier::Reject);
    }

    #[test]
    fn test_score_stays_in_bounds() {
        let samples = [
            application(0, 0, 1, 0, true),
            application(1000, 1_000_000, 1, 1_000_000, false),
            application(700, 10_000, 500_000, 50_000, true),
        ];
        for app in &samples {
            let rec = calculate_recommendation(app);
            assert!(rec.score <= 100);
        }
    }

    #[test]
    fn test_scoring_is_deterministic() {
        let app = application(700, 20_000, 300_000, 150_000, true);
        assert_eq!(calculate_recommendation(&app), calculate_recommendation(&app));
    }

    #[test]
    fn test_tier_boundaries() {
        // 40 + 25 + 10 + 5 = 80: approve
        let approve = application(760, 10_000, 100_000, 50_000, true);
        assert_eq!(calculate_recommendation(&approve).score, 80);
        assert_eq!(calculate_recommendation(&approve).tier, DecisionTier::Approve);

        // 30 + 15 + 10 + 5 = 60: approve with conditions
        let conditional = application(710, 5_000, 250_000, 100_000, true);
        assert_eq!(calculate_recommendation(&conditional).score, 60);
        assert_eq!(
            calculate_recommendation(&conditional).tier,
            DecisionTier::ApproveWithConditions
        );

        // 10 + 15 + 10 + 5 = 40: review required
        let review = application(600, 5_000, 250_000, 100_000, true);
        assert_eq!(calculate_recommendation(&review).score, 40);
        assert_eq!(calculate_recommendation(&review).tier, DecisionTier::ReviewRequired);

        // 10 + 5 + 5 + 5 = 25: reject
        let reject = application(600, 1_000, 250_000, 0, true);
        assert_eq!(calculate_recommendation(&reject).score, 25);
        assert_eq!(calculate_recommendation(&reject).tier, DecisionTier::Reject);
    }

    #[test]
    fn test_collateral_bands() {
        // exactly 1.5x is strong coverage
        let strong = application(600, 1_000, 100_000, 150_000, true);
        assert!(calculate_recommendation(&strong)
            .reasons
            .iter()
            .any(|r| r == "strong collateral coverage"));

        // exactly 1x is adequate
        let adequate = application(600, 1_000, 100_000, 100_000, true);
        assert!(calculate_recommendation(&adequate)
            .reasons
            .iter()
            .any(|r| r == "adequate collateral coverage"));

        let partial = application(600, 1_000, 100_000, 10_000, true);
        assert!(calculate_recommendation(&partial)
            .reasons
            .iter()
            .any(|r| r == "partial collateral coverage"));
    }
}
