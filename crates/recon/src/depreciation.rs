//! Depreciation report parsing: PDF page text to per-group balances.
//!
//! The report is semi-structured text. Group blocks open with a header line
//! like "4- APARELHOS DE MEDICAO..."; somewhere inside the block a
//! "(*) SALDO ... ATUAL" line carries the accumulated balance. Both markers
//! survive text extraction with unpredictable spacing, so the patterns are
//! whitespace-tolerant.

use regex::Regex;

use crate::model::BalanceMap;
use crate::normalize::parse_locale_currency;

/// Parse the concatenated page text of one depreciation report.
///
/// Blocks span from one group header to the next (or end of text). A block
/// whose balance marker is missing contributes 0.0 for its group — the
/// group exists in the report, it just has nothing accumulated. Text with
/// no group headers at all yields an empty map.
pub fn balances_from_text(text: &str) -> BalanceMap {
    let header_re = Regex::new(r"(?m)^\s*(\d+)\s*-\s*[A-Z]").unwrap();
    let balance_re =
        Regex::new(r"\(\*\)\s*SALDO[\s\S]*?ATUAL[\s\S]*?((?:\d{1,3}(?:\.\d{3})*,\d{2}))").unwrap();

    let mut headers: Vec<(usize, u8)> = Vec::new();
    for cap in header_re.captures_iter(text) {
        let full = cap.get(0).map(|m| m.start());
        let group = cap.get(1).and_then(|m| m.as_str().parse::<u8>().ok());
        if let (Some(start), Some(group)) = (full, group) {
            headers.push((start, group));
        }
    }

    let mut balances = BalanceMap::new();
    for (i, &(start, group)) in headers.iter().enumerate() {
        let end = match headers.get(i + 1) {
            Some(&(next_start, _)) => next_start,
            None => text.len(),
        };
        let block = &text[start..end];

        let value = balance_re
            .captures(block)
            .and_then(|cap| cap.get(1))
            .map(|m| parse_locale_currency(m.as_str()))
            .unwrap_or(0.0);

        balances.insert(group, value);
    }
    balances
}
