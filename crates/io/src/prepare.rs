// Prepared SIAFI workbooks
//
// Automates the manual prep the sections run before reconciling: a lookup
// column resolved against the MATRIZ base, account codes coerced to
// numbers, the accumulated-depreciation account dropped, data sorted by
// the looked-up label, and a TOTAL row. Outputs are a consolidated
// workbook plus a zip with one single-sheet copy per tab.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use conciliador_recon::model::CellValue;
use rust_xlsxwriter::{Format, Formula, Workbook as XlsxWorkbook, Worksheet};

use crate::sheet;

/// File name of the consolidated processed workbook.
pub const CONSOLIDATED_FILE_NAME: &str = "Planilha_Completa_Atualizada.xlsx";
/// File name of the archive holding one workbook per processed tab.
pub const ARCHIVE_FILE_NAME: &str = "Abas_Separadas.zip";

// Accumulated-depreciation account; its rows leave every prepared sheet.
const DROPPED_CODE: &str = "123110402";
// Marker for account codes the MATRIZ base does not know.
const LOOKUP_MISS: &str = "#N/D";
// A tab with this name inside the target workbook is carried through as-is.
const MATRIX_SHEET: &str = "MATRIZ";

// 0-based rows: the column header line and the first data line below it.
const HEADER_ROW: usize = 7;
const DATA_ROW: usize = 8;

/// What a prepare run produced, for logging and the batch summary.
#[derive(Debug)]
pub struct PrepareOutcome {
    pub consolidated: PathBuf,
    pub archive: PathBuf,
    pub sheets: Vec<String>,
    pub rows_dropped: usize,
    pub lookup_misses: usize,
}

/// Read the MATRIZ lookup base from the first sheet of `path`: column A
/// keys to column B values, later duplicates overwriting earlier ones.
pub fn load_matrix(path: &Path) -> Result<BTreeMap<String, CellValue>, String> {
    let rows = sheet::read_rows(path)?;
    let mut matrix = BTreeMap::new();
    for row in rows {
        let key = match row.first() {
            Some(CellValue::Empty) | None => continue,
            Some(cell) => cell.to_text().trim().to_string(),
        };
        let value = row.get(1).cloned().unwrap_or(CellValue::Empty);
        matrix.insert(key, value);
    }
    Ok(matrix)
}

/// Process the target workbook at `target` against the MATRIZ base at
/// `matrix_path`. The consolidated workbook lands at `consolidated`, the
/// archive of single-sheet copies at `archive`.
pub fn prepare_workbook(
    target: &Path,
    matrix_path: &Path,
    consolidated: &Path,
    archive: &Path,
) -> Result<PrepareOutcome, String> {
    let matrix = load_matrix(matrix_path)?;
    let sheets = sheet::read_workbook_sheets(target)?;
    if sheets.is_empty() {
        return Err(format!("No sheets found in {}", target.display()));
    }

    let mut output: Vec<OutputSheet> = Vec::with_capacity(sheets.len());
    for (name, rows) in sheets {
        if name == MATRIX_SHEET {
            output.push(OutputSheet::Passthrough(name, rows));
        } else {
            let prepared = prepare_sheet(&rows, &matrix);
            output.push(OutputSheet::Prepared(name, prepared));
        }
    }

    let mut workbook = XlsxWorkbook::new();
    for sheet in &output {
        match sheet {
            OutputSheet::Prepared(name, prepared) => {
                let worksheet = workbook
                    .add_worksheet()
                    .set_name(name)
                    .map_err(|e| format!("Failed to name sheet '{}': {}", name, e))?;
                write_prepared(worksheet, prepared)?;
            }
            OutputSheet::Passthrough(name, rows) => {
                let worksheet = workbook
                    .add_worksheet()
                    .set_name(name)
                    .map_err(|e| format!("Failed to name sheet '{}': {}", name, e))?;
                for (idx, row) in rows.iter().enumerate() {
                    write_row(worksheet, idx as u32, row)?;
                }
            }
        }
    }
    workbook
        .save(consolidated)
        .map_err(|e| format!("Failed to save {}: {}", consolidated.display(), e))?;

    let file = File::create(archive)
        .map_err(|e| format!("Failed to create {}: {}", archive.display(), e))?;
    let mut writer = zip::ZipWriter::new(file);
    for sheet in &output {
        let (name, prepared) = match sheet {
            OutputSheet::Prepared(name, prepared) => (name, prepared),
            OutputSheet::Passthrough(..) => continue,
        };
        let mut single = XlsxWorkbook::new();
        let worksheet = single
            .add_worksheet()
            .set_name(name)
            .map_err(|e| format!("Failed to name sheet '{}': {}", name, e))?;
        write_prepared(worksheet, prepared)?;
        let bytes = single
            .save_to_buffer()
            .map_err(|e| format!("Failed to build workbook for '{}': {}", name, e))?;
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);
        writer
            .start_file(format!("{}.xlsx", name), options)
            .map_err(|e| format!("Failed to add '{}.xlsx' to archive: {}", name, e))?;
        writer
            .write_all(&bytes)
            .map_err(|e| format!("Failed to write '{}.xlsx' to archive: {}", name, e))?;
    }
    writer
        .finish()
        .map_err(|e| format!("Failed to finish {}: {}", archive.display(), e))?;

    let mut names = Vec::new();
    let mut rows_dropped = 0;
    let mut lookup_misses = 0;
    for sheet in &output {
        if let OutputSheet::Prepared(name, prepared) = sheet {
            names.push(name.clone());
            rows_dropped += prepared.dropped;
            lookup_misses += prepared.misses;
        }
    }
    Ok(PrepareOutcome {
        consolidated: consolidated.to_path_buf(),
        archive: archive.to_path_buf(),
        sheets: names,
        rows_dropped,
        lookup_misses,
    })
}

enum OutputSheet {
    Prepared(String, PreparedSheet),
    Passthrough(String, Vec<Vec<CellValue>>),
}

struct PreparedSheet {
    // Rows above the data region, lookup column already inserted.
    meta: Vec<Vec<CellValue>>,
    // Data rows sorted by the looked-up label.
    data: Vec<Vec<CellValue>>,
    dropped: usize,
    misses: usize,
}

/// The pure transform: insert the lookup column, drop the excluded
/// account, coerce code cells to numbers and sort the data region.
fn prepare_sheet(rows: &[Vec<CellValue>], matrix: &BTreeMap<String, CellValue>) -> PreparedSheet {
    let mut meta: Vec<Vec<CellValue>> = Vec::with_capacity(DATA_ROW);
    for idx in 0..DATA_ROW {
        let mut shifted = vec![CellValue::Empty];
        if let Some(row) = rows.get(idx) {
            shifted.extend(row.iter().cloned());
        }
        meta.push(shifted);
    }
    meta[HEADER_ROW][0] = CellValue::Text("Nat Desp".to_string());

    let mut data: Vec<Vec<CellValue>> = Vec::new();
    let mut dropped = 0;
    let mut misses = 0;
    for row in rows.iter().skip(DATA_ROW) {
        let code = match row.first() {
            Some(CellValue::Empty) | None => String::new(),
            Some(cell) => cell.to_text().trim().to_string(),
        };
        if code == DROPPED_CODE {
            dropped += 1;
            continue;
        }
        let lookup = match matrix.get(&code) {
            Some(value) => value.clone(),
            None => {
                misses += 1;
                CellValue::Text(LOOKUP_MISS.to_string())
            }
        };
        let mut shifted = Vec::with_capacity(row.len() + 1);
        shifted.push(lookup);
        for (idx, cell) in row.iter().enumerate() {
            if idx == 0 {
                shifted.push(coerce_code(cell, &code));
            } else {
                shifted.push(cell.clone());
            }
        }
        data.push(shifted);
    }
    data.sort_by_key(|row| row[0].to_text());

    PreparedSheet {
        meta,
        data,
        dropped,
        misses,
    }
}

// Code cells shaped like numbers become numeric. At most one decimal
// point is tolerated, anything else stays text.
fn coerce_code(cell: &CellValue, text: &str) -> CellValue {
    let stripped = text.replacen('.', "", 1);
    if !stripped.is_empty() && stripped.chars().all(|c| c.is_ascii_digit()) {
        if let Ok(value) = text.parse::<f64>() {
            return CellValue::Number(value);
        }
    }
    cell.clone()
}

fn write_prepared(worksheet: &mut Worksheet, prepared: &PreparedSheet) -> Result<(), String> {
    for (idx, row) in prepared.meta.iter().enumerate() {
        write_row(worksheet, idx as u32, row)?;
    }
    for (offset, row) in prepared.data.iter().enumerate() {
        write_row(worksheet, (DATA_ROW + offset) as u32, row)?;
    }

    // 1-based bounds for the SUM ranges, matching what a reader sees.
    let last_data = DATA_ROW + prepared.data.len();
    let total_row = last_data as u32;
    worksheet
        .write_string(total_row, 1, "TOTAL")
        .map_err(|e| format!("Failed to write total row: {}", e))?;
    let totals = Format::new().set_num_format("#,##0.00");
    for (col, letter) in [(2, 'C'), (3, 'D')] {
        let formula = Formula::new(format!("SUM({}9:{}{})", letter, letter, last_data));
        worksheet
            .write_formula_with_format(total_row, col, formula, &totals)
            .map_err(|e| format!("Failed to write total formula: {}", e))?;
    }
    Ok(())
}

fn write_row(worksheet: &mut Worksheet, row_idx: u32, cells: &[CellValue]) -> Result<(), String> {
    for (col, cell) in cells.iter().enumerate() {
        let col16 = col as u16;
        let result = match cell {
            CellValue::Empty => continue,
            CellValue::Number(v) => worksheet.write_number(row_idx, col16, *v).map(|_| ()),
            CellValue::Text(s) => worksheet.write_string(row_idx, col16, s).map(|_| ()),
        };
        result.map_err(|e| format!("Failed to write cell ({}, {}): {}", row_idx, col, e))?;
    }
    Ok(())
}
