// SIAFI ledger ingestion (CSV, xlsx, xls, ods)
//
// Exports come from several systems and the extension is not reliable: a
// ".csv" attachment is sometimes a renamed workbook. Dispatch is therefore
// by content magic first, extension second.

use std::io::Cursor;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Range, Reader, Sheets, Xls, Xlsx};
use conciliador_recon::model::CellValue;

const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];
const OLE_MAGIC: [u8; 4] = [0xD0, 0xCF, 0x11, 0xE0];

/// Read the rows a ledger file carries: the first worksheet of a workbook,
/// or every record of a CSV.
pub fn read_rows(path: &Path) -> Result<Vec<Vec<CellValue>>, String> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    if ext == "csv" {
        let bytes = std::fs::read(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        if bytes.starts_with(&ZIP_MAGIC) {
            let workbook = Xlsx::new(Cursor::new(bytes))
                .map_err(|e| format!("Failed to open workbook: {}", e))?;
            return first_sheet_rows(Sheets::Xlsx(workbook));
        }
        if bytes.starts_with(&OLE_MAGIC) {
            let workbook = Xls::new(Cursor::new(bytes))
                .map_err(|e| format!("Failed to open workbook: {}", e))?;
            return first_sheet_rows(Sheets::Xls(workbook));
        }
        return csv_rows(&bytes);
    }

    let workbook = open_workbook_auto(path)
        .map_err(|e| format!("Failed to open workbook {}: {}", path.display(), e))?;
    first_sheet_rows(workbook)
}

/// Read every worksheet of a workbook, in workbook order.
pub fn read_workbook_sheets(path: &Path) -> Result<Vec<(String, Vec<Vec<CellValue>>)>, String> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| format!("Failed to open workbook {}: {}", path.display(), e))?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    let mut sheets = Vec::with_capacity(sheet_names.len());
    for name in sheet_names {
        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| format!("Failed to read sheet '{}': {}", name, e))?;
        sheets.push((name, range_to_rows(&range)));
    }
    Ok(sheets)
}

fn first_sheet_rows<RS>(mut workbook: Sheets<RS>) -> Result<Vec<Vec<CellValue>>, String>
where
    RS: std::io::Read + std::io::Seek,
{
    let sheet_names = workbook.sheet_names().to_vec();
    let first = match sheet_names.first() {
        Some(name) => name.clone(),
        None => return Err("Workbook contains no sheets".to_string()),
    };
    let range = workbook
        .worksheet_range(&first)
        .map_err(|e| format!("Failed to read sheet '{}': {}", first, e))?;
    Ok(range_to_rows(&range))
}

fn range_to_rows(range: &Range<Data>) -> Vec<Vec<CellValue>> {
    range
        .rows()
        .map(|row| row.iter().map(cell_from_data).collect())
        .collect()
}

fn cell_from_data(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Text(b.to_string()),
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(e) => CellValue::Text(format!("{}", e)),
    }
}

fn csv_rows(bytes: &[u8]) -> Result<Vec<Vec<CellValue>>, String> {
    let content = decode_text(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| format!("Malformed CSV record: {}", e))?;
        rows.push(
            record
                .iter()
                .map(|field| {
                    if field.is_empty() {
                        CellValue::Empty
                    } else {
                        CellValue::Text(field.to_string())
                    }
                })
                .collect(),
        );
    }
    Ok(rows)
}

/// Decode bytes as UTF-8, falling back to Windows-1252 (the encoding SIAFI
/// CSV exports actually use).
fn decode_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            decoded.into_owned()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;
    use tempfile::tempdir;

    #[test]
    fn reads_utf8_csv() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("10_siafi.csv");
        std::fs::write(&path, "Nat Desp,Saldo\n333110404,\"1.234,56\"\n").unwrap();

        let rows = read_rows(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][0], CellValue::Text("Nat Desp".into()));
        assert_eq!(rows[1][1], CellValue::Text("1.234,56".into()));
    }

    #[test]
    fn reads_latin1_csv() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("10_siafi.csv");
        // "Depreciação" in Windows-1252: ç = 0xE7, ã = 0xE3.
        let mut bytes = b"Nat Desp,Deprecia".to_vec();
        bytes.extend([0xE7, 0xE3]);
        bytes.extend(b"o\n333110404,10\n");
        std::fs::write(&path, bytes).unwrap();

        let rows = read_rows(&path).unwrap();
        assert_eq!(rows[0][1], CellValue::Text("Depreciação".into()));
    }

    #[test]
    fn ragged_csv_rows_keep_their_own_width() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("r.csv");
        std::fs::write(&path, "a,b,c\nd\ne,f\n").unwrap();

        let rows = read_rows(&path).unwrap();
        assert_eq!(rows[0].len(), 3);
        assert_eq!(rows[1].len(), 1);
        assert_eq!(rows[2].len(), 2);
    }

    #[test]
    fn empty_csv_fields_become_empty_cells() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("e.csv");
        std::fs::write(&path, "a,,c\n").unwrap();

        let rows = read_rows(&path).unwrap();
        assert_eq!(rows[0][1], CellValue::Empty);
    }

    fn write_fixture_xlsx(path: &Path) {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "Nat Desp").unwrap();
        sheet.write_string(0, 1, "Saldo Atual").unwrap();
        sheet.write_number(1, 0, 333110404.0).unwrap();
        sheet.write_string(1, 1, "-1.000,00").unwrap();
        sheet.write_number(2, 0, 333110452.0).unwrap();
        sheet.write_number(2, 1, -250.5).unwrap();
        workbook.save(path).unwrap();
    }

    #[test]
    fn reads_first_sheet_of_xlsx() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("10_siafi.xlsx");
        write_fixture_xlsx(&path);

        let rows = read_rows(&path).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0][0], CellValue::Text("Nat Desp".into()));
        assert_eq!(rows[1][0], CellValue::Number(333110404.0));
        assert_eq!(rows[2][1], CellValue::Number(-250.5));
    }

    #[test]
    fn renamed_workbook_with_csv_extension_still_reads() {
        let dir = tempdir().unwrap();
        let xlsx = dir.path().join("real.xlsx");
        write_fixture_xlsx(&xlsx);
        let path = dir.path().join("10_siafi.csv");
        std::fs::copy(&xlsx, &path).unwrap();

        let rows = read_rows(&path).unwrap();
        assert_eq!(rows[0][0], CellValue::Text("Nat Desp".into()));
        assert_eq!(rows[1][0], CellValue::Number(333110404.0));
    }

    #[test]
    fn reads_all_sheets_in_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("base.xlsx");
        let mut workbook = Workbook::new();
        workbook.add_worksheet().set_name("160222").unwrap();
        let second = workbook.add_worksheet().set_name("160333").unwrap();
        second.write_string(0, 0, "x").unwrap();
        workbook.save(&path).unwrap();

        let sheets = read_workbook_sheets(&path).unwrap();
        let names: Vec<&str> = sheets.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["160222", "160333"]);
        assert!(sheets[0].1.is_empty());
        assert_eq!(sheets[1].1[0][0], CellValue::Text("x".into()));
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = read_rows(Path::new("/nonexistent/10_siafi.xlsx")).unwrap_err();
        assert!(err.contains("Failed to open workbook"));
    }
}
