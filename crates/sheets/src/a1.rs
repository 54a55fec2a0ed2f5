//! A1-notation helpers.

use pipeline::{CellRange, RowIndex, WorksheetName};

/// Quotes a worksheet title for use in an A1 range (`Basic` → `'Basic'`,
/// `Bob's` → `'Bob''s'`).
pub fn quote_worksheet(worksheet: &WorksheetName) -> String {
    format!("'{}'", worksheet.as_str().replace('\'', "''"))
}

/// The whole worksheet.
pub fn whole_sheet(worksheet: &WorksheetName) -> String {
    quote_worksheet(worksheet)
}

/// Every cell of one row (`'Basic'!5:5`).
pub fn full_row(worksheet: &WorksheetName, row: RowIndex) -> String {
    format!("{}!{row}:{row}", quote_worksheet(worksheet))
}

/// A cell span on the worksheet (`'Basic'!C5:J5`).
pub fn span(worksheet: &WorksheetName, range: &CellRange) -> String {
    format!("{}!{range}", quote_worksheet(worksheet))
}
