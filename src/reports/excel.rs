//! Workbook encoder: a "Crash Reports" data sheet plus a "Summary" sheet,
//! returned as an in-memory `.xlsx` buffer.

use rust_xlsxwriter::{Color, Format, FormatAlign, Workbook};

use crate::errors::ServiceError;
use crate::reports::{colors, severity_counts, status_counts, CrashReportRow, TIMESTAMP_FORMAT};

const HEADERS: [&str; 11] = [
    "ID",
    "Train Code",
    "Train Name",
    "Train Type",
    "Severity",
    "Status",
    "Description",
    "Technician",
    "Expertise",
    "Reported Date",
    "Created At",
];

const SEVERITY_COL: u16 = 4;
const STATUS_COL: u16 = 5;
const MAX_COLUMN_WIDTH: f64 = 50.0;

fn header_format() -> Format {
    Format::new()
        .set_bold()
        .set_font_color(Color::White)
        .set_background_color(Color::RGB(colors::HEADER_FILL))
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter)
}

/// Bold white-on-color cell; unknown values fall back to a neutral white
/// fill rather than failing.
fn tag_format(fill: Option<u32>) -> Format {
    Format::new()
        .set_bold()
        .set_font_color(Color::White)
        .set_background_color(Color::RGB(fill.unwrap_or(0xFFFFFF)))
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter)
}

/// Render the filtered row set into a two-sheet workbook. An empty row set
/// is valid and produces a workbook with headers and zeroed summary counts.
pub fn render_workbook(rows: &[CrashReportRow]) -> Result<Vec<u8>, ServiceError> {
    let mut workbook = Workbook::new();

    // Sheet 1: one row per report.
    let sheet = workbook.add_worksheet();
    sheet.set_name("Crash Reports")?;

    let header_fmt = header_format();
    let mut widths: Vec<usize> = HEADERS.iter().map(|h| h.len()).collect();

    for (col, title) in HEADERS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *title, &header_fmt)?;
    }

    for (i, row) in rows.iter().enumerate() {
        let r = (i + 1) as u32;
        let cells: [String; 11] = [
            row.id.to_string(),
            row.train_code.clone().unwrap_or_else(|| "-".into()),
            row.train_name.clone().unwrap_or_else(|| "-".into()),
            row.train_type.clone().unwrap_or_else(|| "-".into()),
            row.severity.clone(),
            row.status.clone(),
            row.description.clone(),
            row.technician_name.clone().unwrap_or_else(|| "Unassigned".into()),
            row.technician_expertise.clone().unwrap_or_else(|| "-".into()),
            row.reported_date.format(TIMESTAMP_FORMAT).to_string(),
            row.created_at.format(TIMESTAMP_FORMAT).to_string(),
        ];

        for (col, value) in cells.iter().enumerate() {
            let width = if value.is_empty() { 10 } else { value.len() };
            if width > widths[col] {
                widths[col] = width;
            }

            let col = col as u16;
            match col {
                SEVERITY_COL => {
                    let fmt = tag_format(colors::severity_fill(value));
                    sheet.write_string_with_format(r, col, value, &fmt)?;
                }
                STATUS_COL => {
                    let fmt = tag_format(colors::status_fill(value));
                    sheet.write_string_with_format(r, col, value, &fmt)?;
                }
                _ => {
                    sheet.write_string(r, col, value)?;
                }
            }
        }
    }

    for (col, width) in widths.iter().enumerate() {
        let width = ((width + 2) as f64).min(MAX_COLUMN_WIDTH);
        sheet.set_column_width(col as u16, width)?;
    }

    // Sheet 2: totals and distributions; every known severity and status is
    // listed even when zero.
    let summary = workbook.add_worksheet();
    summary.set_name("Summary")?;

    let title_fmt = Format::new().set_bold().set_font_size(16);
    let section_fmt = Format::new().set_bold();

    summary.merge_range(0, 0, 0, 1, "Crash Report Summary", &title_fmt)?;
    summary.write_string(2, 0, "Total Reports")?;
    summary.write_number(2, 1, rows.len() as f64)?;

    let mut line: u32 = 4;
    summary.write_string_with_format(line, 0, "Severity Distribution", &section_fmt)?;
    for (name, count) in severity_counts(rows) {
        line += 1;
        summary.write_string(line, 0, &name)?;
        summary.write_number(line, 1, count as f64)?;
    }

    line += 2;
    summary.write_string_with_format(line, 0, "Status Distribution", &section_fmt)?;
    for (name, count) in status_counts(rows) {
        line += 1;
        summary.write_string(line, 0, &name)?;
        summary.write_number(line, 1, count as f64)?;
    }

    summary.set_column_width(0, 30.0)?;
    summary.set_column_width(1, 15.0)?;

    let buffer = workbook.save_to_buffer()?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
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
    fn empty_input_produces_a_valid_workbook() {
        let bytes = render_workbook(&[]).unwrap();
        // XLSX is a ZIP container.
        assert_eq!(&bytes[..4], b"PK\x03\x04");
    }

    #[test]
    fn rows_with_unknown_values_do_not_fail() {
        let rows = vec![sample_row("Critical", "Open"), sample_row("Weird", "Archived")];
        let bytes = render_workbook(&rows).unwrap();
        assert!(!bytes.is_empty());
    }
}
