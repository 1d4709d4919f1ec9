//! File classification and unit pairing.
//!
//! A batch is a loose pile of files. Each file belongs to a unit (leading
//! digits of its name) and a side (PDF report or spreadsheet ledger); a
//! unit enters reconciliation only when both sides are present.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::keys::unit_id;
use crate::model::{Pairing, UnitBundle};

/// Which side of the reconciliation a file feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Report,
    Ledger,
}

/// Classify a path by extension. Anything but pdf/xlsx/csv is unhandled.
pub fn classify(path: &Path) -> Option<SourceKind> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "pdf" => Some(SourceKind::Report),
        "xlsx" | "csv" => Some(SourceKind::Ledger),
        _ => None,
    }
}

#[derive(Default)]
struct Slots {
    report: Option<PathBuf>,
    ledger: Option<PathBuf>,
}

/// Group files by unit and keep the units with both sides filled.
///
/// A second file for an already-filled slot overwrites the first, so the
/// last report and last ledger seen win for each unit. Files with no
/// leading digits or an unhandled extension land in `skipped`.
pub fn pair_files<P: AsRef<Path>>(paths: &[P]) -> Pairing {
    let mut slots: BTreeMap<String, Slots> = BTreeMap::new();
    let mut skipped = Vec::new();
    let mut report_files = 0;
    let mut ledger_files = 0;

    for path in paths {
        let path = path.as_ref();
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name,
            None => {
                skipped.push(path.to_path_buf());
                continue;
            }
        };
        let unit = match unit_id(name) {
            Some(unit) => unit.to_string(),
            None => {
                skipped.push(path.to_path_buf());
                continue;
            }
        };
        match classify(path) {
            Some(SourceKind::Report) => {
                report_files += 1;
                slots.entry(unit).or_default().report = Some(path.to_path_buf());
            }
            Some(SourceKind::Ledger) => {
                ledger_files += 1;
                slots.entry(unit).or_default().ledger = Some(path.to_path_buf());
            }
            None => skipped.push(path.to_path_buf()),
        }
    }

    let mut bundles = BTreeMap::new();
    for (unit, slot) in slots {
        if let (Some(report), Some(ledger)) = (slot.report, slot.ledger) {
            bundles.insert(
                unit.clone(),
                UnitBundle {
                    unit,
                    report,
                    ledger,
                },
            );
        }
    }

    Pairing {
        bundles,
        report_files,
        ledger_files,
        skipped,
    }
}
