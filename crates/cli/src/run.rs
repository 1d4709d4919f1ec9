//! `concil run` — pair inputs, reconcile every unit, render the report.

use std::fs;
use std::path::PathBuf;

use conciliador_io::{pdf, report, sheet};
use conciliador_recon::ledger;
use conciliador_recon::model::{BalanceMap, RunMeta, RunResult, UnitResult};
use conciliador_recon::{classify, pair_files, reconcile_unit, summarize};

use crate::exit_codes::{EXIT_DIVERGENCES, EXIT_NO_PAIRS, EXIT_REPORT_WRITE};
use crate::{load_config, CliError};

pub fn cmd_run(
    paths: Vec<PathBuf>,
    config: Option<PathBuf>,
    report_path: PathBuf,
    json: bool,
    output: Option<PathBuf>,
    quiet: bool,
) -> Result<(), CliError> {
    if paths.is_empty() {
        return Err(CliError::usage("no input paths given")
            .with_hint("pass report PDFs and SIAFI sheets, or a directory holding them"));
    }
    let config = load_config(config.as_deref())?;
    let tolerance = config.reconciliation.tolerance;

    let files = collect_files(&paths)?;
    let pairing = pair_files(&files);
    if !quiet {
        eprintln!(
            "identified {} PDF(s) and {} sheet(s), {} pair(s)",
            pairing.report_files,
            pairing.ledger_files,
            pairing.bundles.len()
        );
        for skipped in &pairing.skipped {
            eprintln!("  skipped {}", skipped.display());
        }
    }
    if pairing.bundles.is_empty() {
        return Err(CliError {
            code: EXIT_NO_PAIRS,
            message: "no report/sheet pairs found".to_string(),
            hint: Some(
                "a pair is a .pdf and a .xlsx/.csv whose file names start with the same unit digits"
                    .to_string(),
            ),
        });
    }

    let mut units: Vec<UnitResult> = Vec::with_capacity(pairing.bundles.len());
    for (unit, bundle) in &pairing.bundles {
        // An unreadable side reads as empty: its unit surfaces as fully
        // divergent, and the rest of the batch still runs.
        let report_side = pdf::report_balances(&bundle.report).unwrap_or_else(|e| {
            if !quiet {
                eprintln!("  {}: {}", unit, e);
            }
            BalanceMap::new()
        });
        let siafi_side = match sheet::read_rows(&bundle.ledger) {
            Ok(rows) => ledger::balances(&rows, &config.ledger.header_label),
            Err(e) => {
                if !quiet {
                    eprintln!("  {}: {}", unit, e);
                }
                BalanceMap::new()
            }
        };

        let result = reconcile_unit(unit, &report_side, &siafi_side, tolerance);
        if !quiet {
            eprintln!("  {}: {}", unit, result.status_label());
        }
        units.push(result);
    }

    let summary = summarize(&units, &pairing);
    let result = RunResult::new(RunMeta::now(tolerance), summary, units);

    report::render(&result.units, tolerance, &report_path).map_err(|e| CliError {
        code: EXIT_REPORT_WRITE,
        message: e,
        hint: None,
    })?;
    if !quiet {
        eprintln!("report written to {}", report_path.display());
    }

    let payload = serde_json::to_string_pretty(&result)
        .map_err(|e| CliError::io(format!("Failed to serialize result: {}", e)))?;
    if let Some(output) = &output {
        fs::write(output, format!("{}\n", payload))
            .map_err(|e| CliError::io(format!("Failed to write {}: {}", output.display(), e)))?;
        if !quiet {
            eprintln!("result written to {}", output.display());
        }
    }
    if json {
        println!("{}", payload);
    } else {
        print_summary_table(&result);
    }

    if result.summary.divergent > 0 {
        // Nonzero exit with nothing on stderr; the output already says it.
        return Err(CliError {
            code: EXIT_DIVERGENCES,
            message: String::new(),
            hint: None,
        });
    }
    Ok(())
}

/// Expand the argument list: files pass through as given, directories are
/// scanned one level for recognizable inputs, in sorted order.
fn collect_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>, CliError> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let entries = fs::read_dir(path)
                .map_err(|e| CliError::io(format!("Failed to read {}: {}", path.display(), e)))?;
            let mut found = Vec::new();
            for entry in entries {
                let entry = entry.map_err(|e| {
                    CliError::io(format!("Failed to read {}: {}", path.display(), e))
                })?;
                let entry_path = entry.path();
                if entry_path.is_file() && classify(&entry_path).is_some() {
                    found.push(entry_path);
                }
            }
            found.sort();
            files.extend(found);
        } else if path.is_file() {
            files.push(path.clone());
        } else {
            return Err(CliError::usage(format!(
                "no such file or directory: {}",
                path.display()
            )));
        }
    }
    Ok(files)
}

fn print_summary_table(result: &RunResult) {
    let mut unit_w = "Unidade".chars().count();
    let mut status_w = "Status".chars().count();
    for row in &result.table {
        unit_w = unit_w.max(row.unit.chars().count());
        status_w = status_w.max(row.status.chars().count());
    }

    println!(
        "{:<unit_w$}  {:<status_w$}  {}",
        "Unidade", "Status", "Diferença Total"
    );
    for row in &result.table {
        println!(
            "{:<unit_w$}  {:<status_w$}  {}",
            row.unit, row.status, row.total_diff
        );
    }
    println!();
    println!(
        "{} unit(s): {} reconciled, {} divergent",
        result.summary.units, result.summary.reconciled, result.summary.divergent
    );
}
