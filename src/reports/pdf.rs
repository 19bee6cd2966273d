//! Paginated document encoder: summary page, detail table pages, and a
//! "Page X of Y" footer on every page, returned as an in-memory `.pdf`
//! buffer.

use std::io::BufWriter;

use chrono::{DateTime, Utc};
use printpdf::path::PaintMode;
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Mm, PdfDocument, PdfLayerReference, Rect, Rgb,
};

use crate::errors::ServiceError;
use crate::reports::{
    colors, severity_counts, status_counts, CrashReportRow, SHORT_DATE_FORMAT, TIMESTAMP_FORMAT,
};

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const TOP_MARGIN_Y: f32 = 277.0;
const FOOTER_Y: f32 = 10.0;
const CONTENT_FLOOR: f32 = 20.0;

const SUMMARY_ROW_HEIGHT: f32 = 8.0;
const SUMMARY_WIDTHS: [f32; 2] = [60.0, 40.0];

const DETAIL_ROW_HEIGHT: f32 = 7.0;
const DETAIL_WIDTHS: [f32; 6] = [25.0, 45.0, 25.0, 25.0, 35.0, 25.0];
const DETAIL_LEFT: f32 = 15.0;
const DETAIL_HEADERS: [&str; 6] = [
    "Train Code",
    "Train Name",
    "Severity",
    "Status",
    "Technician",
    "Date",
];

// Helvetica metrics approximation: average glyph advance is about half the
// point size.
const PT_TO_MM: f32 = 0.352_778;

fn mm(value: f32) -> Mm {
    Mm(value as _)
}

fn text_width_mm(text: &str, font_size: f32) -> f32 {
    text.chars().count() as f32 * font_size * 0.5 * PT_TO_MM
}

fn fit_text(text: &str, width_mm: f32, font_size: f32) -> String {
    let glyph = font_size * 0.5 * PT_TO_MM;
    let max_chars = (((width_mm - 3.0) / glyph).max(1.0)) as usize;
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", kept)
}

fn set_fill_hex(layer: &PdfLayerReference, hex: u32) {
    let (r, g, b) = colors::rgb_components(hex);
    layer.set_fill_color(Color::Rgb(Rgb::new(r.into(), g.into(), b.into(), None)));
}

fn text_centered(layer: &PdfLayerReference, font: &IndirectFontRef, text: &str, size: f32, y: f32) {
    let x = (PAGE_WIDTH - text_width_mm(text, size)) / 2.0;
    layer.use_text(text, size as _, mm(x), mm(y), font);
}

struct TableCell {
    text: String,
    fill: Option<u32>,
}

impl TableCell {
    fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            fill: None,
        }
    }

    fn tagged(text: impl Into<String>, fill: Option<u32>) -> Self {
        Self {
            text: text.into(),
            fill,
        }
    }
}

fn draw_cell_outline(layer: &PdfLayerReference, x: f32, y_top: f32, width: f32, height: f32) {
    layer.set_outline_color(Color::Rgb(Rgb::new(0.7, 0.7, 0.7, None)));
    layer.set_outline_thickness(0.2);
    let rect = Rect::new(mm(x), mm(y_top - height), mm(x + width), mm(y_top))
        .with_mode(PaintMode::Stroke);
    layer.add_rect(rect);
}

fn draw_header_row(
    layer: &PdfLayerReference,
    font_bold: &IndirectFontRef,
    x: f32,
    y_top: f32,
    widths: &[f32],
    titles: &[&str],
    height: f32,
    size: f32,
) {
    let mut cx = x;
    for (title, width) in titles.iter().zip(widths) {
        set_fill_hex(layer, colors::HEADER_FILL);
        let rect = Rect::new(mm(cx), mm(y_top - height), mm(cx + width), mm(y_top))
            .with_mode(PaintMode::Fill);
        layer.add_rect(rect);
        draw_cell_outline(layer, cx, y_top, *width, height);

        set_fill_hex(layer, 0xFFFFFF);
        layer.use_text(
            fit_text(title, *width, size),
            size as _,
            mm(cx + 1.5),
            mm(y_top - height + 2.2),
            font_bold,
        );
        cx += width;
    }
}

fn draw_body_row(
    layer: &PdfLayerReference,
    font: &IndirectFontRef,
    x: f32,
    y_top: f32,
    widths: &[f32],
    cells: &[TableCell],
    height: f32,
    size: f32,
) {
    let mut cx = x;
    for (cell, width) in cells.iter().zip(widths) {
        if let Some(fill) = cell.fill {
            set_fill_hex(layer, fill);
            let rect = Rect::new(mm(cx), mm(y_top - height), mm(cx + width), mm(y_top))
                .with_mode(PaintMode::Fill);
            layer.add_rect(rect);
        }
        draw_cell_outline(layer, cx, y_top, *width, height);

        set_fill_hex(layer, if cell.fill.is_some() { 0xFFFFFF } else { 0x000000 });
        layer.use_text(
            fit_text(&cell.text, *width, size),
            size as _,
            mm(cx + 1.5),
            mm(y_top - height + 2.2),
            font,
        );
        cx += width;
    }
}

fn draw_count_table(
    layer: &PdfLayerReference,
    font: &IndirectFontRef,
    font_bold: &IndirectFontRef,
    label: &str,
    counts: &[(String, i64)],
    mut y: f32,
) -> f32 {
    draw_header_row(
        layer,
        font_bold,
        20.0,
        y,
        &SUMMARY_WIDTHS,
        &[label, "Count"],
        SUMMARY_ROW_HEIGHT,
        10.0,
    );
    y -= SUMMARY_ROW_HEIGHT;

    for (name, count) in counts {
        let cells = [TableCell::plain(name.clone()), TableCell::plain(count.to_string())];
        draw_body_row(
            layer,
            font,
            20.0,
            y,
            &SUMMARY_WIDTHS,
            &cells,
            SUMMARY_ROW_HEIGHT,
            10.0,
        );
        y -= SUMMARY_ROW_HEIGHT;
    }

    y
}

/// Render the filtered row set into the paginated document. An empty row
/// set is valid: the summary tables carry zero counts and the detail table
/// is just its header.
pub fn render_document(
    rows: &[CrashReportRow],
    generated_at: DateTime<Utc>,
) -> Result<Vec<u8>, ServiceError> {
    let (doc, first_page, first_layer) =
        PdfDocument::new("Crash Report Summary", mm(PAGE_WIDTH), mm(PAGE_HEIGHT), "Layer 1");
    let font = doc.add_builtin_font(BuiltinFont::Helvetica)?;
    let font_bold = doc.add_builtin_font(BuiltinFont::HelveticaBold)?;

    let mut pages = vec![(first_page, first_layer)];

    // Page 1: title and summary statistics.
    let layer = doc.get_page(first_page).get_layer(first_layer);
    set_fill_hex(&layer, 0x000000);
    text_centered(&layer, &font_bold, "Crash Report Summary", 18.0, TOP_MARGIN_Y);
    text_centered(
        &layer,
        &font,
        &format!("Generated: {}", generated_at.format(TIMESTAMP_FORMAT)),
        10.0,
        TOP_MARGIN_Y - 7.0,
    );

    let mut y = TOP_MARGIN_Y - 20.0;
    layer.use_text("Summary Statistics", 14.0, mm(20.0), mm(y), &font_bold);
    y -= 7.0;
    layer.use_text(format!("Total Reports: {}", rows.len()), 10.0, mm(20.0), mm(y), &font);
    y -= 10.0;

    layer.use_text("Severity Distribution:", 12.0, mm(20.0), mm(y), &font_bold);
    y -= 5.0;
    y = draw_count_table(&layer, &font, &font_bold, "Severity", &severity_counts(rows), y);
    y -= 10.0;

    layer.use_text("Status Distribution:", 12.0, mm(20.0), mm(y), &font_bold);
    y -= 5.0;
    draw_count_table(&layer, &font, &font_bold, "Status", &status_counts(rows), y);

    // Page 2+: the detail table, breaking onto new pages as rows overflow.
    let (page, page_layer) = doc.add_page(mm(PAGE_WIDTH), mm(PAGE_HEIGHT), "Layer 1");
    pages.push((page, page_layer));
    let mut layer = doc.get_page(page).get_layer(page_layer);

    set_fill_hex(&layer, 0x000000);
    layer.use_text("Detailed Reports", 14.0, mm(20.0), mm(TOP_MARGIN_Y), &font_bold);

    let mut y = TOP_MARGIN_Y - 7.0;
    draw_header_row(
        &layer,
        &font_bold,
        DETAIL_LEFT,
        y,
        &DETAIL_WIDTHS,
        &DETAIL_HEADERS,
        DETAIL_ROW_HEIGHT,
        8.0,
    );
    y -= DETAIL_ROW_HEIGHT;

    for row in rows {
        if y - DETAIL_ROW_HEIGHT < CONTENT_FLOOR {
            let (page, page_layer) = doc.add_page(mm(PAGE_WIDTH), mm(PAGE_HEIGHT), "Layer 1");
            pages.push((page, page_layer));
            layer = doc.get_page(page).get_layer(page_layer);

            y = TOP_MARGIN_Y;
            draw_header_row(
                &layer,
                &font_bold,
                DETAIL_LEFT,
                y,
                &DETAIL_WIDTHS,
                &DETAIL_HEADERS,
                DETAIL_ROW_HEIGHT,
                8.0,
            );
            y -= DETAIL_ROW_HEIGHT;
        }

        let cells = [
            TableCell::plain(row.train_code.clone().unwrap_or_else(|| "-".into())),
            TableCell::plain(row.train_name.clone().unwrap_or_else(|| "-".into())),
            TableCell::tagged(row.severity.clone(), colors::severity_fill(&row.severity)),
            TableCell::tagged(row.status.clone(), colors::status_fill(&row.status)),
            TableCell::plain(
                row.technician_name
                    .clone()
                    .unwrap_or_else(|| "Unassigned".into()),
            ),
            TableCell::plain(row.reported_date.format(SHORT_DATE_FORMAT).to_string()),
        ];
        draw_body_row(
            &layer,
            &font,
            DETAIL_LEFT,
            y,
            &DETAIL_WIDTHS,
            &cells,
            DETAIL_ROW_HEIGHT,
            8.0,
        );
        y -= DETAIL_ROW_HEIGHT;
    }

    // Every page gets a centered footer once the total is known.
    let total = pages.len();
    for (i, (page, page_layer)) in pages.iter().enumerate() {
        let layer = doc.get_page(*page).get_layer(*page_layer);
        set_fill_hex(&layer, 0x000000);
        text_centered(&layer, &font, &format!("Page {} of {}", i + 1, total), 8.0, FOOTER_Y);
    }

    let mut writer = BufWriter::new(Vec::new());
    doc.save(&mut writer)?;
    writer
        .into_inner()
        .map_err(|e| ServiceError::ExportError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn sample_row(severity: &str, status: &str) -> CrashReportRow {
        let ts = Utc.with_ymd_and_hms(2024, 3, 5, 14, 45, 30).unwrap();
        CrashReportRow {
            id: Uuid::new_v4(),
            train_code: Some("KRL-01".into()),
            train_name: Some("Commuter 01".into()),
            train_type: Some("KRL".into()),
            severity: severity.to_string(),
            status: status.to_string(),
            description: "Brake wear beyond tolerance".into(),
            technician_name: None,
            technician_expertise: None,
            reported_date: ts,
            created_at: ts,
        }
    }

    #[test]
    fn empty_input_produces_a_valid_document() {
        let generated = Utc.with_ymd_and_hms(2024, 3, 5, 9, 0, 0).unwrap();
        let bytes = render_document(&[], generated).unwrap();
        assert_eq!(&bytes[..5], b"%PDF-");
    }

    #[test]
    fn long_row_sets_break_onto_additional_pages() {
        let generated = Utc.with_ymd_and_hms(2024, 3, 5, 9, 0, 0).unwrap();
        let rows: Vec<CrashReportRow> =
            (0..80).map(|_| sample_row("High", "Open")).collect();
        let bytes = render_document(&rows, generated).unwrap();
        assert_eq!(&bytes[..5], b"%PDF-");
        // 80 rows at 7mm per row cannot fit on a single detail page.
        assert!(bytes.len() > 4_000);
    }

    #[test]
    fn unknown_values_render_without_fill() {
        let generated = Utc.with_ymd_and_hms(2024, 3, 5, 9, 0, 0).unwrap();
        let rows = vec![sample_row("Weird", "Archived")];
        assert!(render_document(&rows, generated).is_ok());
    }

    #[test]
    fn fit_text_truncates_to_cell_width() {
        let fitted = fit_text("An extremely long train name that cannot fit", 25.0, 8.0);
        assert!(fitted.ends_with("..."));
        assert!(fitted.chars().count() < 25);
    }
}
