//! Lead scoring — pure arithmetic, no side effects.
//!
//! The score ranks a prospect's value: income base, tier multiplier, and a
//! caller-supplied context penalty (drop-off recovery applies 0.7 because
//! the customer already abandoned once). The engine does not clamp;
//! display layers clamp to a zero floor.

use crate::types::Tier;

/// Context penalty applied to prospects recovered after a drop-off.
pub const DROP_OFF_PENALTY: f64 = 0.7;

/// Nominal score ceiling shown in operator views ("63/500").
pub const SCORE_SCALE: i64 = 500;

/// `round(income / 1000 * tier_multiplier * penalty)`.
///
/// Deterministic for identical inputs. Zero or negative income yields a
/// zero or negative score.
pub fn lead_score(income: f64, tier: Tier, penalty: f64) -> i64 {
    let base = income / 1000.0;
    (base * tier.multiplier() * penalty).round() as i64
}

/// Income component alone, as shown in the score breakdown panel.
pub fn base_score(income: f64) -> i64 {
    (income / 1000.0).round() as i64
}

/// Scores below zero render as zero. The clamp lives here in the display
/// helper, not in `lead_score`.
pub fn display_score(score: i64) -> i64 {
    score.max(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Income 60,000 at T1 with the drop-off penalty:
    /// round(60 * 1.5 * 0.7) = round(63) = 63.
    #[test]
    fn t1_literal_score() {
        assert_eq!(lead_score(60_000.0, Tier::T1, DROP_OFF_PENALTY), 63);
    }

    /// T2 drops the multiplier to 1.0: round(60 * 1.0 * 0.7) = 42.
    #[test]
    fn t2_literal_score() {
        assert_eq!(lead_score(60_000.0, Tier::T2, DROP_OFF_PENALTY), 42);
    }

    /// Identical inputs always produce identical scores.
    #[test]
    fn deterministic_for_identical_inputs() {
        for _ in 0..100 {
            assert_eq!(
                lead_score(45_000.0, Tier::T2, DROP_OFF_PENALTY),
                lead_score(45_000.0, Tier::T2, DROP_OFF_PENALTY),
            );
        }
    }

    /// The engine does not clamp; the display helper does.
    #[test]
    fn zero_and_negative_income() {
        assert_eq!(lead_score(0.0, Tier::T1, DROP_OFF_PENALTY), 0);
        let negative = lead_score(-10_000.0, Tier::T1, DROP_OFF_PENALTY);
        assert!(negative < 0);
        assert_eq!(display_score(negative), 0);
    }
}
