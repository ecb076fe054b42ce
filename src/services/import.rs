//! Spreadsheet import of card rows (.xlsx, .xls, .csv)
//!
//! Only the first worksheet is read; its first row holds the column names.
//! Every data row becomes an [`ImportRow`], which is turned into a validated
//! [`CardInput`] or rejected with a reason.

use std::collections::HashMap;
use std::io::Cursor;
use std::str::FromStr;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use rust_decimal::Decimal;
use serde::Serialize;
use time::{macros::date, macros::format_description, Date, Duration};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::models::{CardInput, CardStatus, GradingCompany, MAIN_COLLECTION_ID};

const DEFAULT_NAME: &str = "Unknown";
const DEFAULT_CATEGORY: &str = "Other";

/// Day zero of spreadsheet serial dates
const SERIAL_DATE_EPOCH: Date = date!(1899 - 12 - 30);
/// Serial of 9999-12-31, the last date spreadsheets can represent
const MAX_SERIAL_DATE: f64 = 2_958_465.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpreadsheetFormat {
    Xlsx,
    Xls,
    Csv,
}

impl SpreadsheetFormat {
    /// Detect the format from a file name's extension
    pub fn from_filename(filename: &str) -> Option<Self> {
        let (_, extension) = filename.rsplit_once('.')?;
        match extension.to_ascii_lowercase().as_str() {
            "xlsx" => Some(Self::Xlsx),
            "xls" => Some(Self::Xls),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("Only .xlsx, .xls and .csv files are supported")]
    UnsupportedFormat,

    #[error("Could not read spreadsheet: {0}")]
    Unreadable(String),

    #[error("Spreadsheet is empty")]
    Empty,
}

impl From<ImportError> for AppError {
    fn from(err: ImportError) -> Self {
        AppError::Validation(err.to_string())
    }
}

/// A rejected row and the reason it was skipped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct RowError {
    /// Row number as shown by a spreadsheet application (header is row 1)
    pub row: usize,
    pub reason: String,
}

/// One data row, keyed by normalized column name
#[derive(Debug, Clone, PartialEq)]
pub struct ImportRow {
    pub row: usize,
    fields: HashMap<String, String>,
}

impl ImportRow {
    fn new(row: usize, headers: &[String], cells: impl IntoIterator<Item = Option<String>>) -> Self {
        let fields = headers
            .iter()
            .zip(cells)
            .filter_map(|(header, cell)| {
                let value = cell?.trim().to_string();
                (!header.is_empty() && !value.is_empty()).then(|| (header.clone(), value))
            })
            .collect();
        Self { row, fields }
    }

    pub fn is_blank(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }

    /// Build a validated card from this row; missing columns fall back to
    /// the import defaults and cards go to the Main Collection.
    pub fn to_input(&self, today: Date) -> Result<CardInput, String> {
        let price = self
            .get("price")
            .ok_or_else(|| "Price is required".to_string())
            .and_then(|value| parse_decimal("price", value))?;

        let status = match self.get("status") {
            None => CardStatus::Bought,
            Some(value) => match value.to_ascii_lowercase().as_str() {
                "bought" => CardStatus::Bought,
                "sold" => CardStatus::Sold,
                _ => return Err(format!("Invalid status '{}'", value)),
            },
        };

        let grading_company = match self.get("grading_company") {
            None => None,
            Some(value) => match value.to_ascii_uppercase().as_str() {
                "PSA" => Some(GradingCompany::Psa),
                "BGS" => Some(GradingCompany::Bgs),
                _ => return Err(format!("Invalid grading company '{}'", value)),
            },
        };

        let input = CardInput {
            name: self.get("name").unwrap_or(DEFAULT_NAME).to_string(),
            description: self.get("description").map(str::to_string),
            price,
            sold_price: self
                .get("sold_price")
                .map(|value| parse_decimal("sold_price", value))
                .transpose()?,
            status,
            bought_date: self
                .get("bought_date")
                .map(|value| parse_date("bought_date", value))
                .transpose()?
                .unwrap_or(today),
            sold_date: self
                .get("sold_date")
                .map(|value| parse_date("sold_date", value))
                .transpose()?,
            category: Some(self.get("category").unwrap_or(DEFAULT_CATEGORY).to_string()),
            collection_id: MAIN_COLLECTION_ID,
            image_url: self.get("image_url").map(str::to_string),
            graded: self.get("graded").map(parse_flag).unwrap_or(false),
            grading_company,
            grading_value: self
                .get("grading_value")
                .map(|value| parse_decimal("grading_value", value))
                .transpose()?,
        };

        input.validate().map_err(|e| e.to_string())
    }
}

/// Read the data rows of an uploaded spreadsheet. Blank rows are dropped;
/// a sheet with no data rows left is [`ImportError::Empty`].
pub fn read_rows(bytes: Vec<u8>, format: SpreadsheetFormat) -> Result<Vec<ImportRow>, ImportError> {
    let rows = match format {
        SpreadsheetFormat::Csv => read_csv(&bytes)?,
        SpreadsheetFormat::Xlsx | SpreadsheetFormat::Xls => read_workbook(bytes)?,
    };
    let rows: Vec<ImportRow> = rows.into_iter().filter(|row| !row.is_blank()).collect();
    if rows.is_empty() {
        return Err(ImportError::Empty);
    }
    Ok(rows)
}

fn read_csv(bytes: &[u8]) -> Result<Vec<ImportRow>, ImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| ImportError::Unreadable(e.to_string()))?
        .iter()
        .map(normalize_header)
        .collect();
    if headers.iter().all(String::is_empty) {
        return Err(ImportError::Empty);
    }

    reader
        .records()
        .enumerate()
        .map(|(index, record)| -> Result<ImportRow, ImportError> {
            let record = record.map_err(|e| ImportError::Unreadable(e.to_string()))?;
            let cells = record.iter().map(|cell| Some(cell.to_string()));
            Ok(ImportRow::new(index + 2, &headers, cells))
        })
        .collect()
}

fn read_workbook(bytes: Vec<u8>) -> Result<Vec<ImportRow>, ImportError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| ImportError::Unreadable(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(ImportError::Empty)?
        .map_err(|e| ImportError::Unreadable(e.to_string()))?;

    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .ok_or(ImportError::Empty)?
        .iter()
        .map(|cell| cell_text(cell).map(|h| normalize_header(&h)).unwrap_or_default())
        .collect();

    Ok(rows
        .enumerate()
        .map(|(index, cells)| ImportRow::new(index + 2, &headers, cells.iter().map(cell_text)))
        .collect())
}

fn normalize_header(header: &str) -> String {
    header
        .trim()
        .to_ascii_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::String(s) | Data::DateTimeIso(s) => Some(s.clone()),
        Data::Int(i) => Some(i.to_string()),
        Data::Float(f) => Some(f.to_string()),
        Data::Bool(b) => Some(b.to_string()),
        Data::DateTime(dt) => serial_to_date(dt.as_f64()).map(|d| d.to_string()),
        _ => None,
    }
}

fn serial_to_date(serial: f64) -> Option<Date> {
    if !(1.0..=MAX_SERIAL_DATE).contains(&serial) {
        return None;
    }
    SERIAL_DATE_EPOCH.checked_add(Duration::days(serial.floor() as i64))
}

fn parse_decimal(column: &str, value: &str) -> Result<Decimal, String> {
    let cleaned: String = value
        .chars()
        .filter(|c| !matches!(c, '$' | ','))
        .collect();
    Decimal::from_str(cleaned.trim()).map_err(|_| format!("Invalid {} '{}'", column, value))
}

/// Accepts `YYYY-MM-DD`, an ISO timestamp or a spreadsheet serial number
fn parse_date(column: &str, value: &str) -> Result<Date, String> {
    let iso = format_description!("[year]-[month]-[day]");
    let value = value.trim();

    value
        .get(..10)
        .and_then(|prefix| Date::parse(prefix, iso).ok())
        .or_else(|| value.parse::<f64>().ok().and_then(serial_to_date))
        .ok_or_else(|| format!("Invalid {} '{}'", column, value))
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "true" | "yes" | "y" | "1"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const TODAY: Date = date!(2024 - 06 - 15);

    fn csv_rows(text: &str) -> Vec<ImportRow> {
        read_rows(text.as_bytes().to_vec(), SpreadsheetFormat::Csv).unwrap()
    }

    #[test]
    fn test_format_from_filename() {
        assert_eq!(
            SpreadsheetFormat::from_filename("cards.XLSX"),
            Some(SpreadsheetFormat::Xlsx)
        );
        assert_eq!(
            SpreadsheetFormat::from_filename("old.xls"),
            Some(SpreadsheetFormat::Xls)
        );
        assert_eq!(
            SpreadsheetFormat::from_filename("export.csv"),
            Some(SpreadsheetFormat::Csv)
        );
        assert_eq!(SpreadsheetFormat::from_filename("notes.txt"), None);
        assert_eq!(SpreadsheetFormat::from_filename("noextension"), None);
    }

    #[test]
    fn test_full_row() {
        let rows = csv_rows(
            "Name,Price,Status,Category,Bought Date,Sold Date,Sold Price,Graded,Grading Company,Grading Value\n\
             Mickey Mantle,150.50,sold,Baseball,2024-01-10,2024-03-01,\"$1,200\",yes,psa,9\n",
        );

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].row, 2);
        let card = rows[0].to_input(TODAY).unwrap();
        assert_eq!(card.name, "Mickey Mantle");
        assert_eq!(card.price, Decimal::new(15050, 2));
        assert_eq!(card.status, CardStatus::Sold);
        assert_eq!(card.bought_date, date!(2024 - 01 - 10));
        assert_eq!(card.sold_date, Some(date!(2024 - 03 - 01)));
        assert_eq!(card.sold_price, Some(Decimal::from(1200)));
        assert_eq!(card.grading_company, Some(GradingCompany::Psa));
        assert_eq!(card.grading_value, Some(Decimal::from(9)));
        assert_eq!(card.collection_id, MAIN_COLLECTION_ID);
    }

    #[test]
    fn test_defaults_for_missing_columns() {
        let rows = csv_rows("price\n12\n");

        let card = rows[0].to_input(TODAY).unwrap();
        assert_eq!(card.name, "Unknown");
        assert_eq!(card.status, CardStatus::Bought);
        assert_eq!(card.category.as_deref(), Some("Other"));
        assert_eq!(card.bought_date, TODAY);
        assert_eq!(card.image_url.as_deref(), Some("/default-card.jpg"));
        assert!(!card.graded);
    }

    #[test]
    fn test_invalid_rows_report_reason() {
        let rows = csv_rows(
            "name,price,bought_date,status,sold_date,sold_price\n\
             No Price,,2024-01-01,bought,,\n\
             Bad Date,10,01/02/2024,bought,,\n\
             Bad Price,abc,2024-01-01,bought,,\n\
             Time Traveller,10,2024-02-01,sold,2024-01-01,20\n",
        );

        let errors: Vec<(usize, String)> = rows
            .iter()
            .filter_map(|row| row.to_input(TODAY).err().map(|e| (row.row, e)))
            .collect();

        assert_eq!(errors.len(), 4);
        assert_eq!(errors[0], (2, "Price is required".to_string()));
        assert_eq!(errors[1].0, 3);
        assert!(errors[1].1.contains("bought_date"));
        assert!(errors[2].1.contains("price"));
        assert_eq!(errors[3].1, "Sold date cannot be earlier than bought date");
    }

    #[test]
    fn test_blank_rows_are_dropped() {
        let rows = csv_rows("name,price\nA,1\n,\nB,2\n");

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].row, 2);
        assert_eq!(rows[1].row, 4);
    }

    #[test]
    fn test_header_only_is_empty() {
        let result = read_rows(b"name,price\n,\n".to_vec(), SpreadsheetFormat::Csv);
        assert!(matches!(result, Err(ImportError::Empty)));
    }

    #[test]
    fn test_serial_dates() {
        assert_eq!(serial_to_date(45292.0), Some(date!(2024 - 01 - 01)));
        assert_eq!(
            parse_date("bought_date", "45292"),
            Ok(date!(2024 - 01 - 01))
        );
        assert_eq!(
            parse_date("bought_date", "2024-01-01T00:00:00"),
            Ok(date!(2024 - 01 - 01))
        );
        assert_eq!(serial_to_date(0.0), None);
    }

    #[test]
    fn test_out_of_range_serial_dates() {
        assert_eq!(serial_to_date(MAX_SERIAL_DATE), Some(date!(9999 - 12 - 31)));
        assert_eq!(serial_to_date(MAX_SERIAL_DATE + 1.0), None);
        assert_eq!(serial_to_date(f64::NAN), None);
        assert!(parse_date("bought_date", "1e15").is_err());

        let rows = csv_rows("name,price,bought_date\nFuture,10,1e15\n");
        let reason = rows[0].to_input(TODAY).unwrap_err();
        assert!(reason.contains("bought_date"));
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        let rows = csv_rows("name,price,status\nCard,5,traded\n");

        assert_eq!(
            rows[0].to_input(TODAY).unwrap_err(),
            "Invalid status 'traded'"
        );
    }

    #[test]
    fn test_garbage_workbook_is_unreadable() {
        let result = read_rows(b"not a workbook".to_vec(), SpreadsheetFormat::Xlsx);

        assert!(matches!(result, Err(ImportError::Unreadable(_))));
    }
}
