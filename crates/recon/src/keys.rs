//! Join keys: the expense group code and the filename unit id.

use crate::model::CellValue;

/// Derive the two-digit expense group from a nature-of-expense cell.
///
/// Float-typed codes truncate to their integer part first (workbook readers
/// hand codes back as floats). Everything non-numeric is dropped, at least
/// five digits are required, and the last two form the group. `None` marks
/// the row unclassifiable — callers skip it rather than bucket it as 0.
pub fn group_code(cell: &CellValue) -> Option<u8> {
    match cell {
        CellValue::Empty => None,
        CellValue::Number(n) => {
            if !n.is_finite() {
                return None;
            }
            group_code_str(&format!("{}", n.trunc() as i64))
        }
        CellValue::Text(s) => group_code_str(s),
    }
}

/// Digits-only form of [`group_code`] for values already rendered as text.
pub fn group_code_str(value: &str) -> Option<u8> {
    let digits: String = value.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() < 5 {
        return None;
    }
    digits[digits.len() - 2..].parse().ok()
}

/// Leading digit run of a filename: the unit id used for pairing.
///
/// Returns `None` when the name does not start with a digit; such files are
/// silently excluded from pairing, not treated as errors.
pub fn unit_id(filename: &str) -> Option<&str> {
    let end = filename
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(filename.len());
    if end == 0 {
        None
    } else {
        Some(&filename[..end])
    }
}
