//! Download artifacts: XLSX workbooks (via `rust_xlsxwriter`) and CSV
//! documents. Pure transformations from rows + columns + metadata to bytes;
//! nothing here performs IO beyond in-memory buffers.

use crate::core::format::CellFormatter;
use crate::domain::model::{CanonicalRow, ColumnDescriptor, ExportArtifact, ExportRequest};
use crate::domain::schema::ReportSchema;
use crate::utils::error::{ReportError, Result};
use chrono::NaiveDateTime;
use rust_xlsxwriter::{Workbook, Worksheet};

pub const CDR_EXPORT_LABEL: &str = "CDR Report";
pub const DEVICE_EXPORT_LABEL: &str = "[GDMS] VOIP Device status";
pub const SIP_EXPORT_LABEL: &str = "[GDMS] SIP account list";
pub const DEFAULT_COLUMN_WIDTH: u16 = 18;

const NOT_SET: &str = "(not set)";
const MAX_CELL_CHARS: usize = 32_767;

/// `DD-MM-YYYY HH.MM.SS`
pub fn file_timestamp(at: NaiveDateTime) -> String {
    at.format("%d-%m-%Y %H.%M.%S").to_string()
}

/// `<label> DD-MM-YYYY HH.MM.SS.<ext>`
pub fn export_filename(label: &str, extension: &str, at: NaiveDateTime) -> String {
    format!("{} {}.{}", label, file_timestamp(at), extension)
}

#[derive(Debug, Clone, PartialEq)]
pub enum SheetCell {
    Text(String),
    Number(f64),
}

impl From<String> for SheetCell {
    fn from(value: String) -> Self {
        SheetCell::Text(value)
    }
}

impl From<&str> for SheetCell {
    fn from(value: &str) -> Self {
        SheetCell::Text(value.to_string())
    }
}

/// One worksheet's content before it is handed to the workbook writer.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<SheetCell>>,
    pub column_width: Option<u16>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
            column_width: None,
        }
    }

    pub fn with_column_width(mut self, width: u16) -> Self {
        self.column_width = Some(width);
        self
    }

    pub fn push_row<I, C>(&mut self, cells: I)
    where
        I: IntoIterator<Item = C>,
        C: Into<SheetCell>,
    {
        self.rows.push(cells.into_iter().map(Into::into).collect());
    }

    fn column_count(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    fn write_to(&self, worksheet: &mut Worksheet) -> Result<()> {
        worksheet.set_name(&self.name)?;

        if let Some(width) = self.column_width {
            for col in 0..self.column_count() {
                worksheet.set_column_width(grid_index::<u16>(col)?, width)?;
            }
        }

        for (r, row) in self.rows.iter().enumerate() {
            let r = grid_index::<u32>(r)?;
            for (c, cell) in row.iter().enumerate() {
                let c = grid_index::<u16>(c)?;
                match cell {
                    SheetCell::Text(text) => worksheet.write_string(r, c, sheet_text(text))?,
                    SheetCell::Number(n) => worksheet.write_number(r, c, *n)?,
                };
            }
        }
        Ok(())
    }
}

fn grid_index<T: TryFrom<usize>>(index: usize) -> Result<T> {
    T::try_from(index).map_err(|_| ReportError::ValidationError {
        message: format!("Report too large for a worksheet (index {})", index),
    })
}

/// XML 1.0 不接受的字元（控制字元、U+FFFE/U+FFFF）先濾掉；超過儲存格上限則截斷
fn sheet_text(text: &str) -> String {
    text.chars()
        .filter(|c| is_xml_char(*c))
        .take(MAX_CELL_CHARS)
        .collect()
}

fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}'
    )
}

/// Encodes the sheets, in order, into an `.xlsx` buffer.
pub fn workbook_bytes(sheets: &[Sheet]) -> Result<Vec<u8>> {
    if sheets.is_empty() {
        return Err(ReportError::ValidationError {
            message: "A workbook needs at least one sheet".to_string(),
        });
    }

    let mut workbook = Workbook::new();
    for sheet in sheets {
        sheet.write_to(workbook.add_worksheet())?;
    }
    Ok(workbook.save_to_buffer()?)
}

/// Turns rows + active columns into display tables.
#[derive(Debug, Clone, Copy)]
pub struct ReportExporter {
    formatter: CellFormatter,
    column_width: u16,
}

impl ReportExporter {
    pub fn new(formatter: CellFormatter, column_width: u16) -> Self {
        Self {
            formatter,
            column_width,
        }
    }

    pub fn formatter(&self) -> &CellFormatter {
        &self.formatter
    }

    pub fn header(columns: &[ColumnDescriptor]) -> Vec<String> {
        columns.iter().map(|c| c.label.clone()).collect()
    }

    /// 每一格都是 formatter 的輸出，與畫面上看到的一致
    pub fn formatted_rows(
        &self,
        schema: &ReportSchema,
        rows: &[CanonicalRow],
        columns: &[ColumnDescriptor],
    ) -> Vec<Vec<String>> {
        rows.iter()
            .map(|row| {
                columns
                    .iter()
                    .map(|c| self.formatter.format_column(schema, row, &c.key))
                    .collect()
            })
            .collect()
    }

    fn table_sheet(
        &self,
        name: &str,
        schema: &ReportSchema,
        rows: &[CanonicalRow],
        columns: &[ColumnDescriptor],
    ) -> Sheet {
        let mut sheet = Sheet::new(name).with_column_width(self.column_width);
        sheet.push_row(Self::header(columns));
        for row in self.formatted_rows(schema, rows, columns) {
            sheet.push_row(row);
        }
        sheet
    }

    /// CDR workbook: the report sheet plus an "Info" sheet describing it.
    pub fn cdr_workbook(
        &self,
        schema: &ReportSchema,
        rows: &[CanonicalRow],
        columns: &[ColumnDescriptor],
        request: &ExportRequest,
    ) -> Result<ExportArtifact> {
        ensure_rows(rows)?;

        let mut info = Sheet::new("Info");
        info.push_row([
            SheetCell::from("Generated At (Local)"),
            SheetCell::Text(file_timestamp(request.generated_at)),
        ]);
        info.push_row([
            SheetCell::from("Record Count"),
            SheetCell::Number(rows.len() as f64),
        ]);
        info.push_row([
            SheetCell::from("From"),
            SheetCell::Text(or_not_set(request.range.from_param())),
        ]);
        info.push_row([
            SheetCell::from("To"),
            SheetCell::Text(or_not_set(request.range.to_param())),
        ]);
        let selected = if request.selected_columns.is_empty() {
            "All".to_string()
        } else {
            request.selected_columns.join(", ")
        };
        info.push_row([SheetCell::from("Selected Columns"), SheetCell::Text(selected)]);

        let report = self.table_sheet(CDR_EXPORT_LABEL, schema, rows, columns);

        Ok(ExportArtifact {
            filename: export_filename(CDR_EXPORT_LABEL, "xlsx", request.generated_at),
            bytes: workbook_bytes(&[report, info])?,
        })
    }

    pub fn device_workbook(
        &self,
        schema: &ReportSchema,
        rows: &[CanonicalRow],
        columns: &[ColumnDescriptor],
        request: &ExportRequest,
    ) -> Result<ExportArtifact> {
        ensure_rows(rows)?;
        let report = self.table_sheet("MAC Report", schema, rows, columns);

        Ok(ExportArtifact {
            filename: export_filename(DEVICE_EXPORT_LABEL, "xlsx", request.generated_at),
            bytes: workbook_bytes(&[report])?,
        })
    }

    pub fn csv_document(
        &self,
        label: &str,
        schema: &ReportSchema,
        rows: &[CanonicalRow],
        columns: &[ColumnDescriptor],
        request: &ExportRequest,
    ) -> Result<ExportArtifact> {
        ensure_rows(rows)?;

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(Self::header(columns))?;
        for row in self.formatted_rows(schema, rows, columns) {
            writer.write_record(&row)?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| ReportError::IoError(e.into_error()))?;

        Ok(ExportArtifact {
            filename: export_filename(label, "csv", request.generated_at),
            bytes,
        })
    }
}

fn or_not_set(value: String) -> String {
    if value.is_empty() {
        NOT_SET.to_string()
    } else {
        value
    }
}

/// 沒有資料時不提供下載
fn ensure_rows(rows: &[CanonicalRow]) -> Result<()> {
    if rows.is_empty() {
        return Err(ReportError::ValidationError {
            message: "Nothing to export: the report has no rows".to_string(),
        });
    }
    Ok(())
}
