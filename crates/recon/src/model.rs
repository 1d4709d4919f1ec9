use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// A raw tabular cell, decoupled from whichever reader produced it.
///
/// Ledger exports mix numeric-typed cells with locale-formatted text; the
/// extractor has to accept both without caring which reader was used.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Number(f64),
    Text(String),
}

impl CellValue {
    /// Text rendering used for header scans. Whole numbers drop the
    /// fractional part so a numeric `333110402` reads back as its digits.
    pub fn to_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
            CellValue::Text(s) => s.clone(),
        }
    }
}

/// Per-source mapping from expense group code to monetary total.
/// BTreeMap keeps group iteration in ascending code order.
pub type BalanceMap = BTreeMap<u8, f64>;

// ---------------------------------------------------------------------------
// Pairing
// ---------------------------------------------------------------------------

/// One unit's pair of input files: the depreciation report PDF and the
/// SIAFI ledger export. Only complete bundles reach the engine.
#[derive(Debug, Clone)]
pub struct UnitBundle {
    pub unit: String,
    pub report: PathBuf,
    pub ledger: PathBuf,
}

/// Result of grouping input files by unit id.
#[derive(Debug, Default)]
pub struct Pairing {
    /// Complete bundles keyed by unit id, in ascending id order.
    pub bundles: BTreeMap<String, UnitBundle>,
    /// Count of PDF inputs seen, paired or not.
    pub report_files: usize,
    /// Count of spreadsheet/CSV inputs seen, paired or not.
    pub ledger_files: usize,
    /// Inputs with an unknown extension or no leading-digit unit id.
    pub skipped: Vec<PathBuf>,
}

// ---------------------------------------------------------------------------
// Reconciliation outcome
// ---------------------------------------------------------------------------

/// One group whose balances differ by more than the tolerance.
#[derive(Debug, Clone, Serialize)]
pub struct Divergence {
    pub group: u8,
    pub report_value: f64,
    pub siafi_value: f64,
    pub diff: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitStatus {
    Reconciled,
    Divergent,
}

impl std::fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reconciled => write!(f, "reconciled"),
            Self::Divergent => write!(f, "divergent"),
        }
    }
}

/// Per-unit outcome. `reconciled` is governed by the per-group check alone:
/// the aggregate difference can cancel across groups and does not decide.
#[derive(Debug, Clone, Serialize)]
pub struct UnitResult {
    pub unit: String,
    pub report_total: f64,
    pub siafi_total: f64,
    pub total_diff: f64,
    pub status: UnitStatus,
    pub reconciled: bool,
    pub divergences: Vec<Divergence>,
}

impl UnitResult {
    /// Human status string for the on-screen summary table.
    pub fn status_label(&self) -> String {
        if self.reconciled {
            "Conciliado".to_string()
        } else {
            let n = self.divergences.len();
            format!("{n} Divergência(s)")
        }
    }

    pub fn summary_row(&self) -> SummaryRow {
        SummaryRow {
            unit: self.unit.clone(),
            status: self.status_label(),
            total_diff: format!("R$ {}", crate::normalize::format_currency(self.total_diff)),
        }
    }
}

/// Flat row for the summary table shown after a batch run.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryRow {
    pub unit: String,
    pub status: String,
    pub total_diff: String,
}

// ---------------------------------------------------------------------------
// Batch output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub units: usize,
    pub reconciled: usize,
    pub divergent: usize,
    pub report_files: usize,
    pub ledger_files: usize,
    pub pairs: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunMeta {
    pub tool_version: String,
    pub run_at: String,
    pub tolerance: f64,
}

impl RunMeta {
    pub fn now(tolerance: f64) -> Self {
        Self {
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
            tolerance,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub meta: RunMeta,
    pub summary: RunSummary,
    pub units: Vec<UnitResult>,
    /// Display rows, one per unit, with formatted labels and amounts.
    pub table: Vec<SummaryRow>,
}

impl RunResult {
    pub fn new(meta: RunMeta, summary: RunSummary, units: Vec<UnitResult>) -> Self {
        let table = units.iter().map(UnitResult::summary_row).collect();
        Self {
            meta,
            summary,
            units,
            table,
        }
    }
}
