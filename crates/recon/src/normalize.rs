//! Locale-tolerant number handling.
//!
//! Source documents mix numeric-typed cells with Brazilian-formatted text
//! ("1.234,56", "R$ 10,00"). Every function here returns a value instead of
//! an error: one malformed cell must never abort a unit's reconciliation.

use crate::model::CellValue;

/// Parse a Brazilian-locale currency string into a signed value.
///
/// Strips an "R$" marker and all whitespace. When a decimal comma is
/// present, dots are thousands separators; without one the string is parsed
/// as-is (a bare "1.5" keeps its dot as the decimal point). Returns 0.0 on
/// anything unparsable.
pub fn parse_locale_currency(raw: &str) -> f64 {
    let mut s = raw.replace("R$", "");
    s.retain(|c| !c.is_whitespace());
    if s.is_empty() {
        return 0.0;
    }
    let normalized = if s.contains(',') {
        s.replace('.', "").replace(',', ".")
    } else {
        s
    };
    // f64's FromStr accepts "inf" and "nan"; neither is a balance.
    match normalized.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

/// Convert a raw cell into a monetary amount.
///
/// Numeric cells cast directly (NaN counts as missing), empty cells are
/// 0.0, text goes through [`parse_locale_currency`].
pub fn cell_amount(cell: &CellValue) -> f64 {
    match cell {
        CellValue::Empty => 0.0,
        CellValue::Number(n) => {
            if n.is_nan() {
                0.0
            } else {
                *n
            }
        }
        CellValue::Text(s) => parse_locale_currency(s),
    }
}

/// Format a value in Brazilian currency style: 1234.5 -> "1.234,50".
///
/// Inverse of [`parse_locale_currency`] for two-decimal values; used by the
/// report renderer and the summary table.
pub fn format_currency(value: f64) -> String {
    let base = format!("{:.2}", value);
    let (sign, digits) = match base.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", base.as_str()),
    };
    // Totals that cancel can land a hair below zero; "-0,00" reads wrong.
    let sign = if digits == "0.00" { "" } else { sign };
    let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    format!("{sign}{grouped},{frac_part}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_grouped_decimal_comma() {
        assert_eq!(parse_locale_currency("1.234,56"), 1234.56);
        assert_eq!(parse_locale_currency("12.345.678,90"), 12_345_678.90);
        assert_eq!(parse_locale_currency("0,10"), 0.10);
    }

    #[test]
    fn parses_currency_marker_and_spaces() {
        assert_eq!(parse_locale_currency("R$ 1.234,56"), 1234.56);
        assert_eq!(parse_locale_currency("  R$2,00  "), 2.00);
    }

    #[test]
    fn parses_negative_values() {
        assert_eq!(parse_locale_currency("-1.234,56"), -1234.56);
        assert_eq!(parse_locale_currency("-0,01"), -0.01);
    }

    #[test]
    fn without_comma_the_dot_is_decimal() {
        // Exports sometimes carry plain machine-formatted numbers; a dot is
        // only a thousands separator when a comma follows somewhere.
        assert_eq!(parse_locale_currency("1.5"), 1.5);
        assert_eq!(parse_locale_currency("1000"), 1000.0);
    }

    #[test]
    fn garbage_is_zero() {
        assert_eq!(parse_locale_currency(""), 0.0);
        assert_eq!(parse_locale_currency("n/a"), 0.0);
        assert_eq!(parse_locale_currency("12,34,56"), 0.0);
        assert_eq!(parse_locale_currency("R$"), 0.0);
        assert_eq!(parse_locale_currency("inf"), 0.0);
        assert_eq!(parse_locale_currency("NaN"), 0.0);
    }

    #[test]
    fn cell_amount_by_type() {
        assert_eq!(cell_amount(&CellValue::Number(15.5)), 15.5);
        assert_eq!(cell_amount(&CellValue::Number(f64::NAN)), 0.0);
        assert_eq!(cell_amount(&CellValue::Empty), 0.0);
        assert_eq!(cell_amount(&CellValue::Text("R$ 1.000,00".into())), 1000.0);
        assert_eq!(cell_amount(&CellValue::Text("oops".into())), 0.0);
    }

    #[test]
    fn formats_thousands_and_decimals() {
        assert_eq!(format_currency(1234.5), "1.234,50");
        assert_eq!(format_currency(1_000_000.0), "1.000.000,00");
        assert_eq!(format_currency(0.0), "0,00");
        assert_eq!(format_currency(999.999), "1.000,00");
    }

    #[test]
    fn formats_negatives() {
        assert_eq!(format_currency(-20.0), "-20,00");
        assert_eq!(format_currency(-1234.56), "-1.234,56");
    }

    #[test]
    fn negative_zero_drops_the_sign() {
        assert_eq!(format_currency(-0.0), "0,00");
        assert_eq!(format_currency(-0.004), "0,00");
        assert_eq!(format_currency(-3.0e-11), "0,00");
    }

    #[test]
    fn format_parse_round_trip() {
        for v in [0.0, 0.10, 1.0, 999.99, 1234.56, 1_000_000.25, -4_321.09] {
            assert_eq!(parse_locale_currency(&format_currency(v)), v);
        }
    }
}
