//! Row source adapter: decides which rows one trigger looks at.

use tracing::debug;

use crate::{Row, RowIndex, SheetError, Worksheet};

/// How the rows for one trigger are selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowSelection {
    /// Every data row, read as header-keyed records.
    Scan,
    /// Exactly one row, read by column position.
    Targeted(RowIndex),
}

impl RowSelection {
    /// Loads the selected rows, paired with their worksheet row numbers, in
    /// worksheet order.
    pub async fn load<W>(&self, sheet: &W) -> Result<Vec<(RowIndex, Row)>, SheetError>
    where
        W: Worksheet + ?Sized,
    {
        match *self {
            Self::Scan => {
                let records = sheet.records().await?;
                debug!(count = records.len(), "loaded worksheet records");
                records
                    .iter()
                    .enumerate()
                    .map(|(offset, record)| -> Result<(RowIndex, Row), SheetError> {
                        let index = RowIndex::from_record_offset(offset).ok_or_else(|| {
                            SheetError::MalformedResponse {
                                message: format!("record offset {offset} exceeds row range"),
                            }
                        })?;
                        Ok((index, Row::from_record(record)))
                    })
                    .collect()
            }
            Self::Targeted(index) => {
                let values = sheet.row_values(index).await?;
                Ok(vec![(index, Row::from_positional(&values))])
            }
        }
    }
}
