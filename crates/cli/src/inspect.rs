//! `concil inspect` — run a single extractor and print its balances.
//!
//! The debugging loop for marker/header contract issues: point it at one
//! file and see exactly which groups and amounts come out.

use std::path::PathBuf;

use conciliador_io::{pdf, sheet};
use conciliador_recon::ledger;
use conciliador_recon::model::BalanceMap;
use conciliador_recon::normalize::format_currency;
use conciliador_recon::{classify, SourceKind};

use crate::{load_config, CliError};

pub fn cmd_inspect(file: PathBuf, config: Option<PathBuf>, json: bool) -> Result<(), CliError> {
    let config = load_config(config.as_deref())?;
    let balances: BalanceMap = match classify(&file) {
        Some(SourceKind::Report) => pdf::report_balances(&file).map_err(CliError::io)?,
        Some(SourceKind::Ledger) => {
            let rows = sheet::read_rows(&file).map_err(CliError::io)?;
            ledger::balances(&rows, &config.ledger.header_label)
        }
        None => {
            return Err(
                CliError::usage(format!("unsupported file type: {}", file.display()))
                    .with_hint("expected .pdf (report), .xlsx or .csv (SIAFI sheet)"),
            );
        }
    };

    if json {
        let payload = serde_json::to_string_pretty(&balances)
            .map_err(|e| CliError::io(format!("Failed to serialize balances: {}", e)))?;
        println!("{}", payload);
        return Ok(());
    }

    if balances.is_empty() {
        println!("no group balances found");
        return Ok(());
    }
    let mut total = 0.0;
    for (group, balance) in &balances {
        println!("{:>5}  {:>18}", group, format_currency(*balance));
        total += balance;
    }
    println!("{:>5}  {:>18}", "total", format_currency(total));
    Ok(())
}
