//! `concil prepare` — MATRIZ lookup and tab split for SIAFI workbooks.

use std::path::PathBuf;

use conciliador_io::prepare;

use crate::exit_codes::EXIT_PREPARE;
use crate::CliError;

fn prepare_err(msg: impl Into<String>) -> CliError {
    CliError {
        code: EXIT_PREPARE,
        message: msg.into(),
        hint: None,
    }
}

pub fn cmd_prepare(
    target: PathBuf,
    matriz: PathBuf,
    workbook: PathBuf,
    zip: PathBuf,
    quiet: bool,
) -> Result<(), CliError> {
    let outcome =
        prepare::prepare_workbook(&target, &matriz, &workbook, &zip).map_err(prepare_err)?;
    if outcome.sheets.is_empty() {
        return Err(prepare_err("no unit tabs to process")
            .with_hint("every tab in the target workbook is named MATRIZ"));
    }

    if !quiet {
        eprintln!(
            "prepared {} tab(s): {}",
            outcome.sheets.len(),
            outcome.sheets.join(", ")
        );
        eprintln!(
            "dropped {} row(s) of account 123110402, {} lookup miss(es)",
            outcome.rows_dropped, outcome.lookup_misses
        );
        eprintln!("workbook written to {}", outcome.consolidated.display());
        eprintln!("archive written to {}", outcome.archive.display());
    }
    Ok(())
}
