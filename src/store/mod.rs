//! Row storage backends.
//!
//! The spreadsheet is the single source of truth. Everything above this
//! module sees it as a set of named sheets made of string rows, read as a
//! range and written one cell run at a time.
//!
//! Addresses are 1-based rows and 0-based columns. Row 1 of every sheet is
//! the header, so the record at index `i` lives on row `i + 2`.

pub mod csv;
pub mod memory;
pub mod sheets;

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

pub use self::csv::CsvStore;
pub use memory::MemoryStore;
pub use sheets::{SheetsCredentials, SheetsStore};

/// Rows above the first record in every sheet.
pub const HEADER_ROWS: u32 = 1;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("spreadsheet API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unknown sheet '{0}'")]
    UnknownSheet(String),

    #[error("invalid column '{0}'")]
    InvalidColumn(String),

    #[error("store lock poisoned")]
    Poisoned,

    #[error("token refresh failed: {0}")]
    Token(String),
}

/// Converts a 0-based column index into its A1 letters (`0 -> A`, `26 -> AA`).
pub fn column_letters(mut index: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// Parses A1 column letters into a 0-based index.
pub fn column_index(letters: &str) -> Result<usize> {
    if letters.is_empty() {
        return Err(StoreError::InvalidColumn(letters.to_string()));
    }

    let invalid = || StoreError::InvalidColumn(letters.to_string());

    let mut index = 0usize;
    for ch in letters.chars() {
        if !ch.is_ascii_alphabetic() {
            return Err(invalid());
        }
        let digit = ch.to_ascii_uppercase() as usize - 'A' as usize + 1;
        index = index
            .checked_mul(26)
            .and_then(|shifted| shifted.checked_add(digit))
            .ok_or_else(invalid)?;
    }

    Ok(index - 1)
}

fn quote_sheet(sheet: &str) -> String {
    format!("'{}'", sheet.replace('\'', "''"))
}

/// An open-ended block of rows: `'Sheet'!A2:U`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowRange {
    pub sheet: String,
    pub first_row: u32,
    pub first_column: usize,
    pub last_column: usize,
}

impl RowRange {
    /// All records of a sheet, from the row after the header up to `last_column`.
    pub fn records(sheet: impl Into<String>, last_column: usize) -> Self {
        Self {
            sheet: sheet.into(),
            first_row: HEADER_ROWS + 1,
            first_column: 0,
            last_column,
        }
    }

    pub fn width(&self) -> usize {
        self.last_column - self.first_column + 1
    }
}

impl fmt::Display for RowRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}!{}{}:{}",
            quote_sheet(&self.sheet),
            column_letters(self.first_column),
            self.first_row,
            column_letters(self.last_column)
        )
    }
}

/// A single cell, or the first cell of a horizontal run being written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellAddress {
    pub sheet: String,
    pub column: usize,
    pub row: u32,
}

impl CellAddress {
    /// The cell in `column` of the record at `record_index`.
    pub fn for_record(sheet: impl Into<String>, column: usize, record_index: usize) -> Self {
        Self {
            sheet: sheet.into(),
            column,
            row: record_index as u32 + HEADER_ROWS + 1,
        }
    }

    /// A1 notation covering `width` cells starting here.
    pub fn span(&self, width: usize) -> String {
        let start = format!("{}{}", column_letters(self.column), self.row);
        if width <= 1 {
            return format!("{}!{}", quote_sheet(&self.sheet), start);
        }

        format!(
            "{}!{}:{}{}",
            quote_sheet(&self.sheet),
            start,
            column_letters(self.column + width - 1),
            self.row
        )
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.span(1))
    }
}

/// Narrow repository interface over the spreadsheet.
#[async_trait]
pub trait RowStore: Send + Sync {
    /// Reads every row inside `range`. Trailing blank cells may be omitted.
    async fn get_rows(&self, range: &RowRange) -> Result<Vec<Vec<String>>>;

    /// Writes `values` into consecutive cells starting at `start`.
    async fn update_cells(&self, start: &CellAddress, values: Vec<String>) -> Result<()>;

    async fn update_cell(&self, address: &CellAddress, value: String) -> Result<()> {
        self.update_cells(address, vec![value]).await
    }
}

/// Cuts `range` out of a full sheet grid whose first element is row 1.
pub(crate) fn slice_grid(grid: &[Vec<String>], range: &RowRange) -> Vec<Vec<String>> {
    grid.iter()
        .skip(range.first_row.saturating_sub(1) as usize)
        .map(|row| {
            let mut cells: Vec<String> = row
                .iter()
                .skip(range.first_column)
                .take(range.width())
                .cloned()
                .collect();
            while cells.last().is_some_and(|cell| cell.is_empty()) {
                cells.pop();
            }
            cells
        })
        .collect()
}

/// Writes a run of values into a full sheet grid, growing it as needed.
pub(crate) fn write_grid(grid: &mut Vec<Vec<String>>, start: &CellAddress, values: Vec<String>) {
    let row_index = start.row.saturating_sub(1) as usize;
    if grid.len() <= row_index {
        grid.resize_with(row_index + 1, Vec::new);
    }

    let row = &mut grid[row_index];
    let end = start.column + values.len();
    if row.len() < end {
        row.resize(end, String::new());
    }

    for (offset, value) in values.into_iter().enumerate() {
        row[start.column + offset] = value;
    }
}
