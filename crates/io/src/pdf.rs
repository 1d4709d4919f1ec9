// Depreciation report ingestion (PDF text extraction)

use std::path::Path;

use conciliador_recon::depreciation::balances_from_text;
use conciliador_recon::model::BalanceMap;
use lopdf::Document;

/// Extract the text of every page, concatenated in page order.
///
/// A page whose content fails to decode is skipped rather than failing the
/// file: scanner-produced pages with no text layer are common and the
/// remaining pages still carry usable group blocks.
pub fn extract_report_text(path: &Path) -> Result<String, String> {
    let doc = Document::load(path)
        .map_err(|e| format!("Failed to open PDF {}: {}", path.display(), e))?;

    let mut text = String::new();
    for (page_num, _page_id) in doc.get_pages() {
        match doc.extract_text(&[page_num]) {
            Ok(page_text) => {
                text.push_str(&page_text);
                if !text.ends_with('\n') {
                    text.push('\n');
                }
            }
            Err(_) => continue,
        }
    }
    Ok(text)
}

/// Per-group balances of one depreciation report file.
pub fn report_balances(path: &Path) -> Result<BalanceMap, String> {
    let text = extract_report_text(path)?;
    Ok(balances_from_text(&text))
}
