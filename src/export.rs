//! Spreadsheet exports of tabular data. Rows are first turned into a `WorkbookPlan`, which is
//! then written either as an XLSX workbook or as delimited text.

use serde::{Deserialize, Serialize};

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use time::format_description::well_known::Rfc3339;
use time::{Date, OffsetDateTime};

use crate::error::ContextError;
use crate::table::{CellValue, Row, TableSpec};
use crate::templates::strip_extension;

pub const DATA_SHEET_NAME: &str = "Report Data";
pub const INFO_SHEET_NAME: &str = "Report Info";
/// The narrowest a column is made, in character units.
pub const MINIMUM_COLUMN_WIDTH: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Xlsx,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Csv => "csv",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            ExportFormat::Csv => "text/csv",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ContextError;

    fn from_str(format: &str) -> Result<Self, Self::Err> {
        match format.to_ascii_lowercase().as_str() {
            "xlsx" => Ok(ExportFormat::Xlsx),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(ContextError::with_context(format!(
                "Unknown export format {:?}, expected \"xlsx\" or \"csv\"",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// The timestamp written into the information sheet.
    pub generated_at: OffsetDateTime,
    /// Waited before the export starts, for exercising loading states. None by default.
    pub latency: Option<Duration>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        ExportOptions {
            generated_at: OffsetDateTime::now_utc(),
            latency: None,
        }
    }
}

/// An exported file and the name it is meant to be saved under.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl ExportedFile {
    /// Writes the file into the directory under its own file name and returns the path written to.
    pub fn save_in<P: AsRef<Path>>(&self, directory: P) -> Result<PathBuf, ContextError> {
        let path = directory.as_ref().join(&self.filename);
        std::fs::write(&path, &self.bytes).map_err(|error| {
            ContextError::with_error(format!("Unable to write the export to {:?}", path), &error)
        })?;

        Ok(path)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SheetPlan {
    pub name: String,
    pub headers: Vec<String>,
    /// The cells of every row in header order, `None` where the row has no value.
    pub rows: Vec<Vec<Option<CellValue>>>,
    /// Width of every column in character units.
    pub column_widths: Vec<f64>,
}

impl SheetPlan {
    fn new(name: &str, headers: Vec<String>, rows: Vec<Vec<Option<CellValue>>>) -> Self {
        let column_widths = headers
            .iter()
            .map(|header| (header.chars().count() + 2).max(MINIMUM_COLUMN_WIDTH) as f64)
            .collect();
        SheetPlan {
            name: name.into(),
            headers,
            rows,
            column_widths,
        }
    }
}

/// What an export writes: the rows as they were given and a sheet describing them.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkbookPlan {
    pub data_sheet: SheetPlan,
    pub info_sheet: SheetPlan,
}

/// Lays the rows out into sheets. The columns are the keys of the first row, in their order:
/// keys only found in later rows are left out, and keys missing from a row give empty cells.
pub fn plan_workbook(
    rows: &[Row],
    report_name: &str,
    generated_at: OffsetDateTime,
) -> Result<WorkbookPlan, ContextError> {
    let headers: Vec<String> = rows
        .first()
        .map(|row| row.keys().map(str::to_string).collect())
        .unwrap_or_default();
    let data_rows = rows
        .iter()
        .map(|row| {
            headers
                .iter()
                .map(|header| row.get(header).cloned())
                .collect()
        })
        .collect();

    let timestamp = generated_at.format(&Rfc3339).map_err(|error| {
        ContextError::with_error("Unable to format the generation timestamp", &error)
    })?;
    let info_rows = vec![
        vec![Some("Report Name".into()), Some(report_name.into())],
        vec![Some("Generated At".into()), Some(timestamp.into())],
        vec![
            Some("Total Records".into()),
            Some(CellValue::Number(rows.len() as f64)),
        ],
        vec![
            Some("Column Count".into()),
            Some(CellValue::Number(headers.len() as f64)),
        ],
    ];

    Ok(WorkbookPlan {
        data_sheet: SheetPlan::new(DATA_SHEET_NAME, headers, data_rows),
        info_sheet: SheetPlan::new(
            INFO_SHEET_NAME,
            vec!["Field".into(), "Value".into()],
            info_rows,
        ),
    })
}

/// Exports the rows into `<filename_base>.xlsx`, holding a data and an information sheet, or
/// into `<filename_base>.csv`, holding the data sheet only.
pub fn export_rows(
    rows: &[Row],
    filename_base: &str,
    format: ExportFormat,
    options: &ExportOptions,
) -> Result<ExportedFile, ContextError> {
    if let Some(latency) = options.latency {
        log::debug!("Waiting {:?} before exporting {:?}", latency, filename_base);
        std::thread::sleep(latency);
    }
    if rows.is_empty() {
        log::warn!("Exporting {:?} without any row", filename_base);
    }

    let plan = plan_workbook(rows, filename_base, options.generated_at)?;
    let bytes = match format {
        ExportFormat::Xlsx => write_xlsx(&plan)?,
        ExportFormat::Csv => write_csv(&plan.data_sheet)?,
    };
    let stem = match strip_extension(filename_base, format.extension()) {
        "" => "export",
        stem => stem,
    };
    let filename = format!("{}.{}", stem, format.extension());
    log::debug!(
        "Exported {} rows of {} columns into {:?}",
        rows.len(),
        plan.data_sheet.headers.len(),
        filename
    );

    Ok(ExportedFile { filename, bytes })
}

fn write_xlsx(plan: &WorkbookPlan) -> Result<Vec<u8>, ContextError> {
    let mut workbook = rust_xlsxwriter::Workbook::new();
    for sheet in [&plan.data_sheet, &plan.info_sheet] {
        let worksheet = xlsx_worksheet(sheet).map_err(|error| {
            ContextError::with_error(format!("Unable to write the sheet {:?}", sheet.name), &error)
        })?;
        workbook.push_worksheet(worksheet);
    }

    workbook
        .save_to_buffer()
        .map_err(|error| ContextError::with_error("Unable to save the workbook", &error))
}

fn xlsx_worksheet(
    sheet: &SheetPlan,
) -> Result<rust_xlsxwriter::Worksheet, rust_xlsxwriter::XlsxError> {
    let mut worksheet = rust_xlsxwriter::Worksheet::new();
    worksheet.set_name(&sheet.name)?;
    let header_format = rust_xlsxwriter::Format::new().set_bold();

    for (column, (header, width)) in sheet.headers.iter().zip(&sheet.column_widths).enumerate() {
        let column = column as u16;
        worksheet.write_string_with_format(0, column, header, &header_format)?;
        worksheet.set_column_width(column, *width)?;
    }
    for (index, cells) in sheet.rows.iter().enumerate() {
        let row = index as u32 + 1;
        for (column, cell) in cells.iter().enumerate() {
            let column = column as u16;
            match cell {
                Some(CellValue::Number(number)) => {
                    worksheet.write_number(row, column, *number)?;
                }
                Some(CellValue::Text(text)) => {
                    worksheet.write_string(row, column, text)?;
                }
                None => {}
            }
        }
    }

    Ok(worksheet)
}

fn write_csv(sheet: &SheetPlan) -> Result<Vec<u8>, ContextError> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(Vec::new());
    writer
        .write_record(&sheet.headers)
        .map_err(|error| ContextError::with_error("Unable to write the CSV header", &error))?;
    for cells in sheet.rows.iter() {
        let record = cells.iter().map(|cell| {
            cell.as_ref()
                .map(ToString::to_string)
                .unwrap_or_default()
        });
        writer
            .write_record(record)
            .map_err(|error| ContextError::with_error("Unable to write a CSV row", &error))?;
    }

    writer
        .into_inner()
        .map_err(|error| ContextError::with_error("Unable to flush the CSV export", &error))
}

/// Dumps a table as it is shown: a header row of the column labels followed by the cells of
/// every row, all quoted, one row per line. The file is named `<context>_<YYYY-MM-DD>.csv`.
pub fn export_table_csv(
    table: &TableSpec,
    context: &str,
    date: Date,
) -> Result<ExportedFile, ContextError> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer
        .write_record(table.headers())
        .map_err(|error| ContextError::with_error("Unable to write the CSV header", &error))?;
    for texts in table.row_texts() {
        writer
            .write_record(&texts)
            .map_err(|error| ContextError::with_error("Unable to write a CSV row", &error))?;
    }
    let mut bytes = writer
        .into_inner()
        .map_err(|error| ContextError::with_error("Unable to flush the CSV export", &error))?;
    // Rows are joined by newlines, the last one is not terminated
    if bytes.last() == Some(&b'\n') {
        bytes.pop();
    }

    let context = context.split_whitespace().collect::<Vec<_>>().join("_");
    let filename = format!(
        "{}_{:04}-{:02}-{:02}.csv",
        context,
        date.year(),
        u8::from(date.month()),
        date.day()
    );

    Ok(ExportedFile { filename, bytes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::TableColumn;
    use time::macros::{date, datetime};

    fn options() -> ExportOptions {
        ExportOptions {
            generated_at: datetime!(2026-01-31 17:05 UTC),
            latency: None,
        }
    }

    #[test]
    fn columns_follow_the_first_row() {
        let rows = vec![
            Row::new().with("Reference", "FX-1").with("Amount", 1200.5),
            Row::new().with("Amount", 300.0).with("Desk", "Money Markets"),
        ];
        let plan = plan_workbook(&rows, "Deals", datetime!(2026-01-31 17:05 UTC)).unwrap();

        assert_eq!(plan.data_sheet.headers, vec!["Reference", "Amount"]);
        assert_eq!(
            plan.data_sheet.rows[1],
            vec![None, Some(CellValue::Number(300.0))]
        );
        assert_eq!(plan.data_sheet.column_widths, vec![15.0, 15.0]);
        assert_eq!(plan.info_sheet.name, INFO_SHEET_NAME);
        assert_eq!(
            plan.info_sheet.rows[1][1],
            Some(CellValue::from("2026-01-31T17:05:00Z"))
        );
        assert_eq!(plan.info_sheet.rows[2][1], Some(CellValue::Number(2.0)));
        assert_eq!(plan.info_sheet.rows[3][1], Some(CellValue::Number(2.0)));
    }

    #[test]
    fn long_headers_widen_their_column() {
        let rows = vec![Row::new().with("Settlement Account Number", "0123456789")];
        let plan = plan_workbook(&rows, "Accounts", datetime!(2026-01-31 17:05 UTC)).unwrap();
        assert_eq!(plan.data_sheet.column_widths, vec![27.0]);
    }

    #[test]
    fn csv_round_trip_with_an_embedded_comma() {
        let rows = vec![Row::new().with("Reference", "REF1").with("Amount", "1,200")];
        let exported = export_rows(&rows, "Deals", ExportFormat::Csv, &options()).unwrap();
        assert_eq!(exported.filename, "Deals.csv");

        let mut reader = csv::Reader::from_reader(exported.bytes.as_slice());
        let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(headers, vec!["Reference", "Amount"]);
        let records: Vec<Vec<String>> = reader
            .records()
            .map(|record| record.unwrap().iter().map(String::from).collect())
            .collect();
        assert_eq!(records, vec![vec!["REF1".to_string(), "1,200".to_string()]]);
    }

    #[test]
    fn xlsx_workbook() {
        let rows = vec![Row::new().with("Reference", "REF1").with("Amount", 1200.0)];
        let mut options = options();
        options.latency = Some(Duration::from_millis(1));
        let exported = export_rows(&rows, "Deals.xlsx", ExportFormat::Xlsx, &options).unwrap();

        assert_eq!(exported.filename, "Deals.xlsx");
        assert!(exported.bytes.starts_with(b"PK"));
    }

    #[test]
    fn bare_extension_gets_a_default_name() {
        let rows = vec![Row::new().with("Reference", "REF1")];
        let exported = export_rows(&rows, ".csv", ExportFormat::Csv, &options()).unwrap();
        assert_eq!(exported.filename, "export.csv");
    }

    #[test]
    fn table_dump_quotes_every_cell() {
        let table = TableSpec::new(
            vec![
                TableColumn::new("A", "a"),
                TableColumn::new("B", "b"),
                TableColumn::new("C", "c"),
            ],
            vec![
                Row::new().with("c", 3.0).with("b", "x, y").with("a", "1"),
                Row::new().with("a", "2"),
            ],
        );
        let exported = export_table_csv(&table, "FX Deals", date!(2026 - 01 - 31)).unwrap();

        assert_eq!(exported.filename, "FX_Deals_2026-01-31.csv");
        similar_asserts::assert_eq!(
            String::from_utf8(exported.bytes).unwrap(),
            "\"A\",\"B\",\"C\"\n\"1\",\"x, y\",\"3\"\n\"2\",\"\",\"\""
        );
    }

    #[test]
    fn formats() {
        assert_eq!("XLSX".parse::<ExportFormat>().unwrap(), ExportFormat::Xlsx);
        assert_eq!("csv".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert!("ods".parse::<ExportFormat>().is_err());
        assert_eq!(ExportFormat::Csv.mime_type(), "text/csv");
    }
}
