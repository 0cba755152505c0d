//! Incentive selection and the compliance verdict.
//!
//! RULE: this module is the only place that compares an offer amount to
//! the tier ceiling. Selection and display both read the same verdict, so
//! the two can never drift.
//!
//! A non-compliant pick is reported, never clamped or auto-corrected;
//! policy violations must surface to the operator.

use crate::catalog::{IncentiveOption, SimCatalog};
use crate::types::Tier;
use serde::{Deserialize, Serialize};

/// Score thresholds for picking an option index: generous offer first for
/// strong leads, the cheaper fallback for the middle band.
const HIGH_SCORE: i64 = 300;
const MID_SCORE: i64 = 150;

/// The selector's full answer: the chosen offer plus the compliance
/// check against the catalog ceiling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceVerdict {
    pub incentive:    IncentiveOption,
    pub max_allowed:  f64,
    pub is_compliant: bool,
    pub tier:         Tier,
    pub reason:       String,
}

/// Pick an incentive for a tier/scenario pair, ranked by lead score.
///
/// Returns None when the catalog has no entry or no options for the pair;
/// callers treat that as "no offer available" and branch around any
/// offer-dependent steps.
pub fn select_incentive(
    catalog: &SimCatalog,
    tier: Tier,
    scenario_key: &str,
    score: i64,
) -> Option<ComplianceVerdict> {
    let menu = catalog.incentives_for(tier, scenario_key)?;
    if menu.options.is_empty() {
        return None;
    }

    let index = if score > HIGH_SCORE {
        0
    } else if score > MID_SCORE {
        1
    } else {
        0
    };
    let index = index.min(menu.options.len() - 1);
    let incentive = menu.options[index].clone();

    Some(verdict_for(incentive, menu.max_incentive, tier))
}

/// The single authoritative compliance check.
pub fn verdict_for(incentive: IncentiveOption, max_allowed: f64, tier: Tier) -> ComplianceVerdict {
    let is_compliant = incentive.amount <= max_allowed;
    let reason = if is_compliant {
        "Within tier limits".to_string()
    } else {
        "Exceeds tier limits".to_string()
    };
    ComplianceVerdict { incentive, max_allowed, is_compliant, tier, reason }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::IncentiveOption;

    fn option(amount: f64) -> IncentiveOption {
        IncentiveOption {
            incentive_type: "cashback".into(),
            amount,
            description: format!("₹{amount} cashback"),
        }
    }

    /// The chosen index never escapes [0, options.len() - 1], for any
    /// score including extremes.
    #[test]
    fn index_always_in_bounds() {
        let catalog = SimCatalog::default_test();
        for score in [i64::MIN, -1, 0, 149, 150, 151, 300, 301, 10_000, i64::MAX] {
            let verdict = select_incentive(&catalog, Tier::T1, "drop_off_recovery", score)
                .expect("T1 drop_off_recovery has options");
            assert!(
                verdict.incentive.amount == 500.0 || verdict.incentive.amount == 200.0,
                "score {score} selected an option outside the catalog"
            );
        }
    }

    /// Boundary equality is compliant: amount == ceiling passes.
    #[test]
    fn boundary_equality_is_compliant() {
        let verdict = verdict_for(option(1000.0), 1000.0, Tier::T1);
        assert!(verdict.is_compliant);
        assert_eq!(verdict.reason, "Within tier limits");
    }

    /// Over-ceiling amounts are reported non-compliant, amount untouched.
    #[test]
    fn over_ceiling_reported_not_clamped() {
        let verdict = verdict_for(option(1500.0), 1000.0, Tier::T1);
        assert!(!verdict.is_compliant);
        assert_eq!(verdict.incentive.amount, 1500.0);
        assert_eq!(verdict.reason, "Exceeds tier limits");
    }

    /// Missing scenario key or empty option list both mean "no offer".
    #[test]
    fn catalog_miss_returns_none() {
        let catalog = SimCatalog::default_test();
        assert!(select_incentive(&catalog, Tier::T1, "nonexistent_key", 400).is_none());
        assert!(select_incentive(&catalog, Tier::T1, "in_progress_assistance", 400).is_none());
    }
}
