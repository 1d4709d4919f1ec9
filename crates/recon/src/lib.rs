//! Reconciliation engine for accumulated-depreciation audits.
//!
//! Units of the armed-forces accounting structure each produce two views of
//! the same balances: a depreciation report (PDF) and a SIAFI ledger export
//! (spreadsheet). This crate pairs the files of a batch by unit, reduces
//! both sides to per-group balance maps, and compares them group by group
//! under a configurable tolerance.
//!
//! The crate is pure: it works on extracted text and cell rows, never on
//! files. Parsing PDFs and workbooks lives in `conciliador-io`.

pub mod config;
pub mod depreciation;
pub mod engine;
pub mod error;
pub mod keys;
pub mod ledger;
pub mod model;
pub mod normalize;
pub mod pair;

pub use config::Config;
pub use engine::{reconcile_unit, summarize, total_exceeds};
pub use error::ReconError;
pub use model::{
    BalanceMap, CellValue, Divergence, Pairing, RunMeta, RunResult, RunSummary, SummaryRow,
    UnitBundle, UnitResult, UnitStatus,
};
pub use pair::{classify, pair_files, SourceKind};
