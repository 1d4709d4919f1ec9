//! SIAFI ledger aggregation: tabular rows to per-group balances.
//!
//! Ledger exports carry leading banner rows before the real header, and the
//! layout varies between units. Two things hold across every export we have
//! seen: the account code is the first column and the balance is the last
//! column of the header row. Rows are aggregated by the two-digit group
//! suffix of the code, summing absolute values.

use crate::keys::group_code;
use crate::model::{BalanceMap, CellValue};
use crate::normalize::cell_amount;

/// Find the header row: the first row whose joined cell text contains
/// `label` (the original exports say "Nat Desp"). Returns its index.
pub fn find_header_row(rows: &[Vec<CellValue>], label: &str) -> Option<usize> {
    rows.iter().position(|row| {
        let joined = row
            .iter()
            .map(|cell| cell.to_text())
            .collect::<Vec<_>>()
            .join(" ");
        joined.contains(label)
    })
}

/// Aggregate balances from the rows below `header_row`.
///
/// Column positions come from the header row itself: codes in its first
/// cell, balances in its last. Data rows shorter than the header are padded
/// with empty cells, longer ones are cut to the header width. Rows whose
/// code has no group suffix (totals, blanks, footers) are skipped.
pub fn balances_from_rows(rows: &[Vec<CellValue>], header_row: usize) -> BalanceMap {
    let mut balances = BalanceMap::new();
    let width = match rows.get(header_row) {
        Some(header) if !header.is_empty() => header.len(),
        _ => return balances,
    };

    for row in rows.iter().skip(header_row + 1) {
        let code_cell = row.first().cloned().unwrap_or(CellValue::Empty);
        let balance_cell = row.get(width - 1).cloned().unwrap_or(CellValue::Empty);

        let group = match group_code(&code_cell) {
            Some(group) => group,
            None => continue,
        };
        *balances.entry(group).or_insert(0.0) += cell_amount(&balance_cell).abs();
    }
    balances
}

/// Header scan plus aggregation in one call. No header, no balances.
pub fn balances(rows: &[Vec<CellValue>], label: &str) -> BalanceMap {
    match find_header_row(rows, label) {
        Some(header_row) => balances_from_rows(rows, header_row),
        None => BalanceMap::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    fn num(n: f64) -> CellValue {
        CellValue::Number(n)
    }

    // Shape of a real export: banner rows, then the header, then data.
    fn sample_rows() -> Vec<Vec<CellValue>> {
        vec![
            vec![text("SIAFI - Sistema Integrado"), CellValue::Empty],
            vec![text("Unidade Gestora: 160222"), CellValue::Empty],
            vec![text("Nat Desp"), text("Titulo"), text("Mes"), text("Saldo Atual")],
            vec![num(333110402.0), text("APARELHOS"), text("01"), text("-1.000,00")],
            vec![num(333110402.0), text("APARELHOS"), text("02"), text("500,00")],
            vec![text("449052 34"), text("VEICULOS"), text("01"), num(-250.5)],
            vec![text("Total"), CellValue::Empty, CellValue::Empty, text("1.750,50")],
        ]
    }

    #[test]
    fn header_is_found_by_label() {
        assert_eq!(find_header_row(&sample_rows(), "Nat Desp"), Some(2));
        assert_eq!(find_header_row(&sample_rows(), "Conta Corrente"), None);
    }

    #[test]
    fn label_can_land_in_any_column() {
        let rows = vec![vec![text("x"), text("y Nat Desp z")]];
        assert_eq!(find_header_row(&rows, "Nat Desp"), Some(0));
    }

    #[test]
    fn balances_sum_absolute_values_per_group() {
        let balances = balances(&sample_rows(), "Nat Desp");
        assert_eq!(balances.len(), 2);
        assert_eq!(balances[&2], 1500.0);
        assert_eq!(balances[&34], 250.5);
    }

    #[test]
    fn total_and_banner_rows_are_skipped() {
        // "Total" has no 5-digit code; banner rows sit above the header.
        let balances = balances(&sample_rows(), "Nat Desp");
        let sum: f64 = balances.values().sum();
        assert_eq!(sum, 1750.5);
    }

    #[test]
    fn short_rows_read_an_empty_balance() {
        let rows = vec![
            vec![text("Nat Desp"), text("Titulo"), text("Saldo")],
            vec![num(333110402.0)],
        ];
        let balances = balances(&rows, "Nat Desp");
        assert_eq!(balances[&2], 0.0);
    }

    #[test]
    fn wide_rows_still_use_the_header_width() {
        let rows = vec![
            vec![text("Nat Desp"), text("Saldo")],
            vec![num(333110402.0), text("10,00"), text("99,99")],
        ];
        let balances = balances(&rows, "Nat Desp");
        assert_eq!(balances[&2], 10.0);
    }

    #[test]
    fn no_header_yields_no_balances() {
        let rows = vec![vec![text("just noise")], vec![num(333110402.0), num(5.0)]];
        assert!(balances(&rows, "Nat Desp").is_empty());
    }

    #[test]
    fn empty_header_row_yields_no_balances() {
        let rows: Vec<Vec<CellValue>> = vec![vec![]];
        assert!(balances_from_rows(&rows, 0).is_empty());
    }
}
