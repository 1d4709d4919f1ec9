//! Reconciliation proper: group-by-group comparison of the two sides.

use crate::model::{
    BalanceMap, Divergence, Pairing, RunSummary, UnitResult, UnitStatus,
};

/// Compare one unit's report balances against its SIAFI balances.
///
/// Groups are the union of both sides; a group missing from one side reads
/// as 0.0 there. A group is divergent when the absolute difference exceeds
/// `tolerance`; differences of exactly the tolerance are in bounds. The
/// comparison carries a small epsilon so sums that land a float ulp past
/// the boundary (50.10 vs 50.00 style) do not flip the verdict.
pub fn reconcile_unit(
    unit: &str,
    report: &BalanceMap,
    siafi: &BalanceMap,
    tolerance: f64,
) -> UnitResult {
    let mut groups: Vec<u8> = report.keys().chain(siafi.keys()).copied().collect();
    groups.sort_unstable();
    groups.dedup();

    let mut report_total = 0.0;
    let mut siafi_total = 0.0;
    let mut divergences = Vec::new();

    for group in groups {
        let report_value = report.get(&group).copied().unwrap_or(0.0);
        let siafi_value = siafi.get(&group).copied().unwrap_or(0.0);
        report_total += report_value;
        siafi_total += siafi_value;

        let diff = report_value - siafi_value;
        if exceeds(diff, report_value, siafi_value, tolerance) {
            divergences.push(Divergence {
                group,
                report_value,
                siafi_value,
                diff,
            });
        }
    }

    let total_diff = report_total - siafi_total;
    let status = if divergences.is_empty() {
        UnitStatus::Reconciled
    } else {
        UnitStatus::Divergent
    };

    UnitResult {
        unit: unit.to_string(),
        report_total,
        siafi_total,
        total_diff,
        status,
        reconciled: divergences.is_empty(),
        divergences,
    }
}

/// Whether the total difference alone would flag the unit. Used for the
/// report's color coding, independent of per-group verdicts.
pub fn total_exceeds(result: &UnitResult, tolerance: f64) -> bool {
    exceeds(
        result.total_diff,
        result.report_total,
        result.siafi_total,
        tolerance,
    )
}

// Strict comparison with a magnitude-scaled epsilon: values a few ulps past
// the tolerance boundary, which is where decimal sums land after binary
// rounding, still count as within bounds.
fn exceeds(diff: f64, a: f64, b: f64, tolerance: f64) -> bool {
    let scale = a.abs().max(b.abs()).max(1.0);
    let eps = f64::EPSILON * 16.0 * scale;
    diff.abs() > tolerance + eps
}

/// Batch-level counters for the summary block of the run output.
pub fn summarize(units: &[UnitResult], pairing: &Pairing) -> RunSummary {
    let reconciled = units.iter().filter(|u| u.reconciled).count();
    RunSummary {
        units: units.len(),
        reconciled,
        divergent: units.len() - reconciled,
        report_files: pairing.report_files,
        ledger_files: pairing.ledger_files,
        pairs: pairing.bundles.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 0.10;

    fn map(entries: &[(u8, f64)]) -> BalanceMap {
        entries.iter().copied().collect()
    }

    #[test]
    fn within_tolerance_is_reconciled() {
        let report = map(&[(4, 100.05)]);
        let siafi = map(&[(4, 100.00)]);
        let result = reconcile_unit("10", &report, &siafi, TOLERANCE);
        assert!(result.reconciled);
        assert_eq!(result.status, UnitStatus::Reconciled);
        assert!(result.divergences.is_empty());
    }

    #[test]
    fn exactly_the_tolerance_is_in_bounds() {
        // 50.10 - 50.00 is not representable exactly; the verdict must not
        // hinge on which side of 0.10 the rounding error falls.
        let report = map(&[(4, 50.10)]);
        let siafi = map(&[(4, 50.00)]);
        let result = reconcile_unit("10", &report, &siafi, TOLERANCE);
        assert!(result.reconciled);
    }

    #[test]
    fn a_cent_past_the_tolerance_diverges() {
        let report = map(&[(4, 50.11)]);
        let siafi = map(&[(4, 50.00)]);
        let result = reconcile_unit("10", &report, &siafi, TOLERANCE);
        assert!(!result.reconciled);
        assert_eq!(result.divergences.len(), 1);
        assert_eq!(result.divergences[0].group, 4);
    }

    #[test]
    fn groups_are_the_union_of_both_sides() {
        let report = map(&[(4, 10.0), (6, 5.0)]);
        let siafi = map(&[(6, 5.0), (52, 7.0)]);
        let result = reconcile_unit("10", &report, &siafi, TOLERANCE);
        // 4 and 52 are each missing from one side, so both diverge.
        let groups: Vec<u8> = result.divergences.iter().map(|d| d.group).collect();
        assert_eq!(groups, vec![4, 52]);
        assert_eq!(result.report_total, 15.0);
        assert_eq!(result.siafi_total, 12.0);
    }

    #[test]
    fn divergences_come_out_in_group_order() {
        let report = map(&[(52, 1.0), (4, 1.0), (19, 1.0)]);
        let siafi = BalanceMap::new();
        let result = reconcile_unit("10", &report, &siafi, TOLERANCE);
        let groups: Vec<u8> = result.divergences.iter().map(|d| d.group).collect();
        assert_eq!(groups, vec![4, 19, 52]);
    }

    #[test]
    fn totals_can_cancel_while_groups_diverge() {
        let report = map(&[(4, 100.0), (6, 0.0)]);
        let siafi = map(&[(4, 0.0), (6, 100.0)]);
        let result = reconcile_unit("10", &report, &siafi, TOLERANCE);
        assert!(!result.reconciled);
        assert_eq!(result.total_diff, 0.0);
        assert!(!total_exceeds(&result, TOLERANCE));
    }

    #[test]
    fn empty_sides_reconcile_trivially() {
        let result = reconcile_unit("10", &BalanceMap::new(), &BalanceMap::new(), TOLERANCE);
        assert!(result.reconciled);
        assert_eq!(result.report_total, 0.0);
        assert_eq!(result.divergences.len(), 0);
    }

    #[test]
    fn status_label_counts_divergences() {
        let report = map(&[(4, 10.0), (6, 20.0)]);
        let siafi = BalanceMap::new();
        let result = reconcile_unit("10", &report, &siafi, TOLERANCE);
        assert_eq!(result.status_label(), "2 Divergência(s)");

        let clean = reconcile_unit("10", &siafi, &siafi, TOLERANCE);
        assert_eq!(clean.status_label(), "Conciliado");
    }

    #[test]
    fn summary_counts_follow_the_results() {
        let report = map(&[(4, 10.0)]);
        let siafi = BalanceMap::new();
        let units = vec![
            reconcile_unit("10", &report, &report, TOLERANCE),
            reconcile_unit("20", &report, &siafi, TOLERANCE),
        ];
        let pairing = crate::pair::pair_files(&[
            "10_dep.pdf",
            "10_siafi.csv",
            "20_dep.pdf",
            "20_siafi.csv",
            "junk.txt",
        ]);
        let summary = summarize(&units, &pairing);
        assert_eq!(summary.units, 2);
        assert_eq!(summary.reconciled, 1);
        assert_eq!(summary.divergent, 1);
        assert_eq!(summary.report_files, 2);
        assert_eq!(summary.ledger_files, 2);
        assert_eq!(summary.pairs, 2);
    }
}
