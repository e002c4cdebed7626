use crate::table::{HEADERS, ScriptTable};
use docx_rs::{BreakType, Docx, Paragraph, Run};
use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Worksheet, Workbook, XlsxError};
use std::io::Cursor;
use thiserror::Error;

/// Line written between document sections
pub const DOCX_SEPARATOR: &str = "==========";

/// Worksheet name used by spreadsheet exports
pub const SHEET_NAME: &str = "Sheet1";

pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const CSV_MIME: &str = "text/csv; charset=utf-8";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("spreadsheet export failed: {0}")]
    Xlsx(#[from] XlsxError),

    #[error("document export failed: {0}")]
    Docx(String),
}

/// Export formats offered for download
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Xlsx,
    Docx,
    Csv,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Docx => "docx",
            ExportFormat::Csv => "csv",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "xlsx" => Some(ExportFormat::Xlsx),
            "docx" => Some(ExportFormat::Docx),
            "csv" => Some(ExportFormat::Csv),
            _ => None,
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            ExportFormat::Xlsx => XLSX_MIME,
            ExportFormat::Docx => DOCX_MIME,
            ExportFormat::Csv => CSV_MIME,
        }
    }

    /// Serialize the table in this format
    pub fn render(self, table: &ScriptTable) -> Result<Vec<u8>, ExportError> {
        match self {
            ExportFormat::Xlsx => to_xlsx(table),
            ExportFormat::Docx => to_docx(table),
            ExportFormat::Csv => Ok(to_csv(table).into_bytes()),
        }
    }
}

/// Build the download file name for a course
///
/// Produces `{course}_script.{ext}`. A blank course name falls back to
/// `fallback`; path separators are replaced so the name stays a single path
/// component.
///
/// # Examples
/// ```
/// use script_board::downloader::{ExportFormat, export_file_name};
///
/// assert_eq!(export_file_name("Rust 101", ExportFormat::Xlsx, "course"), "Rust 101_script.xlsx");
/// assert_eq!(export_file_name("  ", ExportFormat::Docx, "course"), "course_script.docx");
/// ```
pub fn export_file_name(course_name: &str, format: ExportFormat, fallback: &str) -> String {
    let course = match course_name.trim() {
        "" => fallback.trim(),
        name => name,
    };
    let course: String = course
        .chars()
        .map(|c| if c == '/' || c == '\\' || c.is_control() { '_' } else { c })
        .collect();
    format!("{}_script.{}", course, format.extension())
}

/// Convert the script table to CSV
///
/// The first line holds the column headers. Fields containing commas,
/// quotes, or line breaks are quoted, with inner quotes doubled.
pub fn to_csv(table: &ScriptTable) -> String {
    let mut csv_content = String::new();
    push_csv_line(&mut csv_content, HEADERS.iter().copied());

    for row in table.rows() {
        let cells = row.cells();
        push_csv_line(&mut csv_content, cells.iter().map(String::as_str));
    }

    csv_content
}

fn push_csv_line<'a>(out: &mut String, fields: impl Iterator<Item = &'a str>) {
    for (i, value) in fields.enumerate() {
        if i > 0 {
            out.push(',');
        }
        if value.contains([',', '"', '\n', '\r']) {
            out.push('"');
            out.push_str(&value.replace('"', "\"\""));
            out.push('"');
        } else {
            out.push_str(value);
        }
    }
    out.push('\n');
}

/// Convert the script table to XLSX
///
/// Writes a single worksheet named `Sheet1`: a bold, frozen header row
/// followed by one spreadsheet row per script row. Page numbers are stored
/// as numbers; blank values leave the cell empty.
///
/// # Returns
/// * `Result<Vec<u8>, ExportError>` - XLSX file content as bytes or an error
pub fn to_xlsx(table: &ScriptTable) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let mut worksheet = Worksheet::new();
    worksheet.set_name(SHEET_NAME)?;

    let header_format = Format::new().set_bold().set_border(FormatBorder::Thin);
    let wrap_format = Format::new().set_text_wrap().set_align(FormatAlign::Top);

    for (col, header) in HEADERS.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *header, &header_format)?;
    }

    worksheet.set_column_width(0, 12)?; // Page
    worksheet.set_column_width(1, 30)?; // Targets
    worksheet.set_column_width(2, 30)?; // Effect
    worksheet.set_column_width(3, 80)?; // Script

    for (idx, row) in table.rows().iter().enumerate() {
        let r = (idx + 1) as u32;

        if let Some(page) = row.page_number {
            worksheet.write_number(r, 0, page as f64)?;
        }

        let targets = row.targets_text();
        if !targets.is_empty() {
            worksheet.write_string(r, 1, targets.as_str())?;
        }
        if !row.effect_description.is_empty() {
            worksheet.write_string_with_format(r, 2, row.effect_description.as_str(), &wrap_format)?;
        }
        if !row.script.is_empty() {
            worksheet.write_string_with_format(r, 3, row.script.as_str(), &wrap_format)?;
        }
    }

    worksheet.set_freeze_panes(1, 0)?;
    workbook.push_worksheet(worksheet);

    let buffer = workbook.save_to_buffer()?;
    Ok(buffer)
}

/// Convert the script table to DOCX
///
/// The document starts with the headers (one per line) and a separator
/// paragraph, then each row's four values (one per line) followed by a
/// separator paragraph.
pub fn to_docx(table: &ScriptTable) -> Result<Vec<u8>, ExportError> {
    let mut doc = Docx::new()
        .add_paragraph(lines_paragraph(HEADERS.iter().copied()))
        .add_paragraph(separator());

    for row in table.rows() {
        let cells = row.cells();
        doc = doc
            .add_paragraph(lines_paragraph(cells.iter().map(String::as_str)))
            .add_paragraph(separator());
    }

    let mut buffer = Cursor::new(Vec::new());
    doc.build()
        .pack(&mut buffer)
        .map_err(|e| ExportError::Docx(e.to_string()))?;

    Ok(buffer.into_inner())
}

fn separator() -> Paragraph {
    Paragraph::new().add_run(Run::new().add_text(DOCX_SEPARATOR))
}

// One run per paragraph; every value and every embedded newline becomes a line break.
fn lines_paragraph<'a>(values: impl Iterator<Item = &'a str>) -> Paragraph {
    let mut run = Run::new();
    let mut first = true;

    for value in values {
        for line in value.split('\n') {
            if !first {
                run = run.add_break(BreakType::TextWrapping);
            }
            run = run.add_text(line.trim_end_matches('\r'));
            first = false;
        }
    }

    Paragraph::new().add_run(run)
}
