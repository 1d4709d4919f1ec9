// Consolidated reconciliation report (PDF)
//
// Reproduces the layout the accounting sections already file: A4 portrait,
// a repeated page header and numbered footer, and one block per unit with
// a totals table, a status banner and, when needed, a divergence table.
// Geometry is kept in millimetres from the top-left corner and converted
// to PDF user space only when operations are emitted.

use std::path::Path;

use conciliador_recon::engine::total_exceeds;
use conciliador_recon::model::UnitResult;
use conciliador_recon::normalize::format_currency;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream, StringFormat};

/// File name the consolidated report is written under by default.
pub const REPORT_FILE_NAME: &str = "Relatorio_Depreciacao_Consolidado.pdf";

const REPORT_TITLE: &str = "Relatório de Conciliação - Depreciação Acumulada";

// A4, millimetres.
const PAGE_W: f64 = 210.0;
const PAGE_H: f64 = 297.0;
const MARGIN: f64 = 10.0;
const BOTTOM_MARGIN: f64 = 15.0;
// A unit block never starts below this line; it would split awkwardly.
const UNIT_BREAK_Y: f64 = 250.0;
// Horizontal padding inside a cell before left/right aligned text.
const CELL_PAD: f64 = 1.0;

// PDF user units per millimetre and points to millimetres.
const MM: f64 = 72.0 / 25.4;
const PT_TO_MM: f64 = 25.4 / 72.0;

const BLACK: Rgb = (0, 0, 0);
const RED: Rgb = (200, 0, 0);
const GREEN: Rgb = (0, 100, 0);

type Rgb = (u8, u8, u8);

/// Render the consolidated report for `units` into `path`.
///
/// `tolerance` only drives the color of the total-difference cell; the
/// divergence verdicts were already decided by the engine.
pub fn render(units: &[UnitResult], tolerance: f64, path: &Path) -> Result<(), String> {
    let mut doc = build_document(units, tolerance)?;
    doc.save(path)
        .map_err(|e| format!("Failed to save report {}: {}", path.display(), e))?;
    Ok(())
}

/// In-memory variant of [`render`].
pub fn render_to_bytes(units: &[UnitResult], tolerance: f64) -> Result<Vec<u8>, String> {
    let mut doc = build_document(units, tolerance)?;
    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| format!("Failed to serialize report: {}", e))?;
    Ok(bytes)
}

fn build_document(units: &[UnitResult], tolerance: f64) -> Result<Document, String> {
    let mut painter = Painter::new();
    painter.add_page();

    for unit in units {
        painter.unit_block(unit, tolerance);
    }
    let pages = painter.finish();

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let bold_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });
    let italic_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Oblique",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => regular_id,
            "F2" => bold_id,
            "F3" => italic_id,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    let count = pages.len() as i64;
    for content in pages {
        let encoded = content
            .encode()
            .map_err(|e| format!("Failed to encode page content: {}", e))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let pages_dict = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
        "Resources" => resources_id,
        "MediaBox" => vec![
            0.into(),
            0.into(),
            real(PAGE_W * MM),
            real(PAGE_H * MM),
        ],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();
    Ok(doc)
}

fn real(v: f64) -> Object {
    Object::Real(v as f32)
}

// ---------------------------------------------------------------------------
// Page painter
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Font {
    Regular,
    Bold,
    Italic,
}

impl Font {
    fn resource(self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
            Font::Italic => "F3",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Center,
    Right,
}

/// Cursor-based page builder. Millimetre coordinates, top-left origin,
/// cells that advance the cursor the way the report layout thinks.
struct Painter {
    pages: Vec<Content>,
    ops: Vec<Operation>,
    page_no: usize,
    x: f64,
    y: f64,
    font: Font,
    size: f64,
    fill: Rgb,
    text_color: Rgb,
}

impl Painter {
    fn new() -> Self {
        Painter {
            pages: Vec::new(),
            ops: Vec::new(),
            page_no: 0,
            x: MARGIN,
            y: MARGIN,
            font: Font::Regular,
            size: 9.0,
            fill: (255, 255, 255),
            text_color: BLACK,
        }
    }

    fn finish(mut self) -> Vec<Content> {
        if !self.ops.is_empty() {
            self.close_page();
        }
        self.pages
    }

    // -- page lifecycle ----------------------------------------------------

    fn add_page(&mut self) {
        if !self.ops.is_empty() {
            self.close_page();
        }
        self.page_no += 1;
        self.x = MARGIN;
        self.y = MARGIN;
        self.ops.push(Operation::new("w", vec![real(0.2 * MM)]));

        // The page header redraws with its own font; the ambient state is
        // restored afterwards so a mid-table page break keeps its style.
        let (font, size, fill, text_color) = (self.font, self.size, self.fill, self.text_color);
        self.set_font(Font::Bold, 12.0);
        self.cell(0.0, 10.0, REPORT_TITLE, false, false, Align::Center, true);
        self.ln(5.0);
        self.font = font;
        self.size = size;
        self.fill = fill;
        self.text_color = text_color;
    }

    fn close_page(&mut self) {
        let label = format!("Página {}", self.page_no);
        let tw = text_width(&label, 8.0);
        self.set_rg(BLACK);
        self.text_op(
            Font::Italic,
            8.0,
            MARGIN + (PAGE_W - 2.0 * MARGIN - tw) / 2.0,
            PAGE_H - BOTTOM_MARGIN + 5.0 + 0.3 * 8.0 * PT_TO_MM,
            &label,
        );
        let ops = std::mem::take(&mut self.ops);
        self.pages.push(Content { operations: ops });
    }

    // -- state -------------------------------------------------------------

    fn set_font(&mut self, font: Font, size: f64) {
        self.font = font;
        self.size = size;
    }

    fn set_fill(&mut self, fill: Rgb) {
        self.fill = fill;
    }

    fn set_text_color(&mut self, color: Rgb) {
        self.text_color = color;
    }

    fn ln(&mut self, h: f64) {
        self.x = MARGIN;
        self.y += h;
    }

    // -- drawing -----------------------------------------------------------

    /// One table cell: optional fill, optional full border, aligned text.
    /// `w == 0.0` extends to the right margin. `advance` moves the cursor to
    /// the next line, otherwise to the right edge of the cell.
    fn cell(
        &mut self,
        w: f64,
        h: f64,
        text: &str,
        border: bool,
        fill: bool,
        align: Align,
        advance: bool,
    ) {
        if self.y + h > PAGE_H - BOTTOM_MARGIN {
            self.add_page();
        }
        let w = if w == 0.0 { PAGE_W - MARGIN - self.x } else { w };

        if fill || border {
            if fill {
                self.set_rg(self.fill);
            }
            self.ops.push(Operation::new(
                "re",
                vec![
                    real(self.x * MM),
                    real((PAGE_H - self.y - h) * MM),
                    real(w * MM),
                    real(h * MM),
                ],
            ));
            let paint = match (fill, border) {
                (true, true) => "B",
                (true, false) => "f",
                _ => "S",
            };
            self.ops.push(Operation::new(paint, vec![]));
        }

        if !text.is_empty() {
            let tw = text_width(text, self.size);
            let tx = match align {
                Align::Left => self.x + CELL_PAD,
                Align::Center => self.x + (w - tw) / 2.0,
                Align::Right => self.x + w - CELL_PAD - tw,
            };
            let baseline = self.y + 0.5 * h + 0.3 * self.size * PT_TO_MM;
            self.set_rg(self.text_color);
            self.text_op(self.font, self.size, tx, baseline, text);
        }

        if advance {
            self.x = MARGIN;
            self.y += h;
        } else {
            self.x += w;
        }
    }

    /// Horizontal rule across the content width at the current line.
    fn divider(&mut self) {
        let y = (PAGE_H - self.y) * MM;
        self.ops
            .push(Operation::new("m", vec![real(MARGIN * MM), real(y)]));
        self.ops
            .push(Operation::new("l", vec![real((PAGE_W - MARGIN) * MM), real(y)]));
        self.ops.push(Operation::new("S", vec![]));
    }

    fn set_rg(&mut self, (r, g, b): Rgb) {
        self.ops.push(Operation::new(
            "rg",
            vec![
                real(r as f64 / 255.0),
                real(g as f64 / 255.0),
                real(b as f64 / 255.0),
            ],
        ));
    }

    fn text_op(&mut self, font: Font, size: f64, x_mm: f64, baseline_mm: f64, text: &str) {
        let (encoded, _, _) = encoding_rs::WINDOWS_1252.encode(text);
        self.ops.push(Operation::new("BT", vec![]));
        self.ops.push(Operation::new(
            "Tf",
            vec![font.resource().into(), real(size)],
        ));
        self.ops.push(Operation::new(
            "Td",
            vec![real(x_mm * MM), real((PAGE_H - baseline_mm) * MM)],
        ));
        self.ops.push(Operation::new(
            "Tj",
            vec![Object::String(encoded.into_owned(), StringFormat::Literal)],
        ));
        self.ops.push(Operation::new("ET", vec![]));
    }

    // -- report blocks -----------------------------------------------------

    fn unit_block(&mut self, unit: &UnitResult, tolerance: f64) {
        if self.y > UNIT_BREAK_Y {
            self.add_page();
        }

        self.set_font(Font::Bold, 11.0);
        self.set_fill((240, 240, 240));
        let title = format!("Unidade Gestora: {}", unit.unit);
        self.cell(0.0, 8.0, &title, true, true, Align::Left, true);
        self.ln(2.0);

        self.set_font(Font::Bold, 9.0);
        self.set_fill((220, 230, 241));
        self.cell(63.0, 7.0, "Total Relatório", true, true, Align::Left, false);
        self.cell(63.0, 7.0, "Total SIAFI", true, true, Align::Left, false);
        self.cell(63.0, 7.0, "Diferença", true, true, Align::Left, true);

        self.set_font(Font::Regular, 9.0);
        let report_total = format!("R$ {}", format_currency(unit.report_total));
        let siafi_total = format!("R$ {}", format_currency(unit.siafi_total));
        let total_diff = format!("R$ {}", format_currency(unit.total_diff));
        self.cell(63.0, 7.0, &report_total, true, false, Align::Left, false);
        self.cell(63.0, 7.0, &siafi_total, true, false, Align::Left, false);
        if total_exceeds(unit, tolerance) {
            self.set_text_color(RED);
        } else {
            self.set_text_color(GREEN);
        }
        self.cell(63.0, 7.0, &total_diff, true, false, Align::Left, true);
        self.set_text_color(BLACK);
        self.ln(3.0);

        if unit.reconciled {
            self.set_fill((220, 255, 220));
            self.set_font(Font::Bold, 9.0);
            self.cell(0.0, 8.0, "CONCILIADO", true, true, Align::Center, true);
        } else {
            self.set_fill((255, 220, 220));
            self.set_font(Font::Bold, 9.0);
            self.cell(
                0.0,
                8.0,
                "DIVERGÊNCIAS ENCONTRADAS:",
                true,
                true,
                Align::Left,
                true,
            );

            self.set_fill((250, 250, 250));
            self.set_font(Font::Bold, 8.0);
            self.cell(20.0, 6.0, "Grupo", true, true, Align::Center, false);
            self.cell(56.0, 6.0, "Saldo Relat.", true, true, Align::Center, false);
            self.cell(56.0, 6.0, "Saldo SIAFI", true, true, Align::Center, false);
            self.cell(57.0, 6.0, "Diferença", true, true, Align::Center, true);

            self.set_font(Font::Regular, 8.0);
            for div in &unit.divergences {
                self.cell(
                    20.0,
                    6.0,
                    &div.group.to_string(),
                    true,
                    false,
                    Align::Center,
                    false,
                );
                self.cell(
                    56.0,
                    6.0,
                    &format_currency(div.report_value),
                    true,
                    false,
                    Align::Right,
                    false,
                );
                self.cell(
                    56.0,
                    6.0,
                    &format_currency(div.siafi_value),
                    true,
                    false,
                    Align::Right,
                    false,
                );
                self.set_text_color(RED);
                self.cell(
                    57.0,
                    6.0,
                    &format_currency(div.diff),
                    true,
                    false,
                    Align::Right,
                    true,
                );
                self.set_text_color(BLACK);
            }
        }

        self.ln(5.0);
        self.divider();
        self.ln(5.0);
    }
}

// ---------------------------------------------------------------------------
// Text metrics
// ---------------------------------------------------------------------------

/// Advance width of `text` in millimetres at `size` points, using Helvetica
/// metrics. A single regular-weight table keeps this simple; the bold
/// variants differ by at most a few percent, which the cell padding absorbs.
fn text_width(text: &str, size: f64) -> f64 {
    let milli: u32 = text.chars().map(char_width_milli).sum();
    milli as f64 / 1000.0 * size * PT_TO_MM
}

fn char_width_milli(c: char) -> u32 {
    match c {
        'i' | 'j' | 'l' => 222,
        ' ' | ',' | '.' | ':' | '/' | 'f' | 't' | 'I' | 'í' | '!' => 278,
        '(' | ')' | '-' | 'r' => 333,
        '*' => 389,
        'c' | 'k' | 's' | 'v' | 'x' | 'y' | 'z' | 'ç' | 'J' => 500,
        'F' | 'T' | 'Z' => 611,
        'A' | 'B' | 'E' | 'K' | 'P' | 'S' | 'V' | 'X' | 'Y' | 'Á' | 'É' | 'Ê' => 667,
        'C' | 'D' | 'H' | 'N' | 'R' | 'U' | 'Ç' | 'w' => 722,
        'G' | 'O' | 'Q' | 'Ó' => 778,
        'm' | 'M' => 833,
        'W' => 944,
        _ => 556,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conciliador_recon::model::{Divergence, UnitStatus};
    use tempfile::tempdir;

    fn clean_unit(unit: &str) -> UnitResult {
        UnitResult {
            unit: unit.to_string(),
            report_total: 994_426.0,
            siafi_total: 994_426.0,
            total_diff: 0.0,
            status: UnitStatus::Reconciled,
            reconciled: true,
            divergences: vec![],
        }
    }

    fn divergent_unit(unit: &str) -> UnitResult {
        UnitResult {
            unit: unit.to_string(),
            report_total: 1000.0,
            siafi_total: 750.0,
            total_diff: 250.0,
            status: UnitStatus::Divergent,
            reconciled: false,
            divergences: vec![Divergence {
                group: 52,
                report_value: 1000.0,
                siafi_value: 750.0,
                diff: 250.0,
            }],
        }
    }

    fn extract_all_text(doc: &Document) -> String {
        let pages: Vec<u32> = doc.get_pages().keys().copied().collect();
        doc.extract_text(&pages).unwrap()
    }

    #[test]
    fn report_carries_title_units_and_banners() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(REPORT_FILE_NAME);
        let units = vec![clean_unit("10"), divergent_unit("20")];
        render(&units, 0.10, &path).unwrap();

        let doc = Document::load(&path).unwrap();
        assert_eq!(doc.get_pages().len(), 1);

        let text = extract_all_text(&doc);
        assert!(text.contains("Relatório de Conciliação - Depreciação Acumulada"));
        assert!(text.contains("Unidade Gestora: 10"));
        assert!(text.contains("CONCILIADO"));
        assert!(text.contains("Unidade Gestora: 20"));
        assert!(text.contains("DIVERGÊNCIAS ENCONTRADAS:"));
        assert!(text.contains("Página 1"));
    }

    #[test]
    fn totals_and_divergence_rows_are_rendered() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("r.pdf");
        render(&[divergent_unit("20")], 0.10, &path).unwrap();

        let text = extract_all_text(&Document::load(&path).unwrap());
        assert!(text.contains("R$ 1.000,00"));
        assert!(text.contains("R$ 750,00"));
        assert!(text.contains("R$ 250,00"));
        // Divergence table rows carry bare values, no currency marker.
        assert!(text.contains("1.000,00"));
        assert!(text.contains("Saldo Relat."));
        assert!(text.contains("52"));
    }

    #[test]
    fn long_batches_paginate_with_repeated_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("r.pdf");
        let units: Vec<UnitResult> = (0..12)
            .map(|i| clean_unit(&format!("16{:04}", i)))
            .collect();
        render(&units, 0.10, &path).unwrap();

        let doc = Document::load(&path).unwrap();
        let page_count = doc.get_pages().len();
        assert!(page_count > 1, "12 unit blocks must not fit one page");

        let text = extract_all_text(&doc);
        assert!(text.contains("Página 2"));
        // The page header repeats on every page.
        let titles = text
            .matches("Relatório de Conciliação - Depreciação Acumulada")
            .count();
        assert_eq!(titles, page_count);
    }

    #[test]
    fn empty_batch_still_produces_one_page() {
        let bytes = render_to_bytes(&[], 0.10).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);

        let text = extract_all_text(&doc);
        assert!(text.contains("Relatório de Conciliação"));
    }

    #[test]
    fn render_to_bytes_matches_file_output_shape() {
        let units = vec![clean_unit("10")];
        let bytes = render_to_bytes(&units, 0.10).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));

        let doc = Document::load_mem(&bytes).unwrap();
        let text = extract_all_text(&doc);
        assert!(text.contains("Unidade Gestora: 10"));
        assert!(text.contains("Total SIAFI"));
    }
}
