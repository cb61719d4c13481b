//! Score-to-tier resolution.

use crate::error::ScoreError;
use crate::model::ResultTier;

/// Resolve a total score to the lowest tier it still qualifies for: the
/// tier with the smallest `score_threshold >= total`. Ties on threshold are
/// broken by declared order (first match wins).
///
/// Fails with `NoTierFound` when no threshold covers the total, which means
/// the tier table is missing a ceiling entry.
pub fn resolve_tier(tiers: &[ResultTier], total: i32) -> Result<&ResultTier, ScoreError> {
    tiers
        .iter()
        .filter(|tier| tier.score_threshold >= total)
        .min_by_key(|tier| tier.score_threshold)
        .ok_or(ScoreError::NoTierFound(total))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tier(threshold: i32, name: &str) -> ResultTier {
        ResultTier {
            id: None,
            app_id: 1,
            score_threshold: threshold,
            result_name: name.to_string(),
            result_desc: format!("{name} description"),
            result_picture: None,
        }
    }

    fn tiers() -> Vec<ResultTier> {
        vec![tier(0, "low"), tier(60, "mid"), tier(100, "high")]
    }

    #[test]
    fn exact_and_between_thresholds() {
        let tiers = tiers();
        assert_eq!(resolve_tier(&tiers, 0).unwrap().result_name, "low");
        assert_eq!(resolve_tier(&tiers, 45).unwrap().result_name, "mid");
        assert_eq!(resolve_tier(&tiers, 75).unwrap().result_name, "high");
        assert_eq!(resolve_tier(&tiers, 100).unwrap().result_name, "high");
    }

    #[test]
    fn score_above_ceiling_fails() {
        let err = resolve_tier(&tiers(), 101).unwrap_err();
        assert!(matches!(err, ScoreError::NoTierFound(101)));
    }

    #[test]
    fn declaration_order_is_unsorted_safe() {
        // Same table, shuffled: resolution must not depend on sort order.
        let shuffled = vec![tier(100, "high"), tier(0, "low"), tier(60, "mid")];
        assert_eq!(resolve_tier(&shuffled, 45).unwrap().result_name, "mid");
    }

    #[test]
    fn threshold_ties_break_by_declared_order() {
        let tied = vec![tier(50, "first"), tier(50, "second")];
        assert_eq!(resolve_tier(&tied, 30).unwrap().result_name, "first");
    }

    #[test]
    fn empty_table_fails() {
        assert!(matches!(
            resolve_tier(&[], 0),
            Err(ScoreError::NoTierFound(0))
        ));
    }
}
