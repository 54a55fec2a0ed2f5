//! Newtype domain identifiers.
//!
//! Row numbers, spreadsheet names, and request identifiers are all "just" an
//! integer or a string underneath. Wrapping each in its own type keeps a
//! worksheet title from being passed where a spreadsheet name is expected, and
//! lets [`RowIndex`] carry the "data rows start at 2" invariant.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::InvalidRowIndex;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is blank.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.trim().is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Row addressing
// ---------------------------------------------------------------------------

/// 1-based index of a data row in the worksheet.
///
/// Row 1 holds the column headers, so the smallest valid value is
/// [`RowIndex::FIRST_DATA`]. Values are only obtainable through
/// [`RowIndex::new`], which enforces that bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RowIndex(u32);

impl RowIndex {
    /// The first row below the header row.
    pub const FIRST_DATA: RowIndex = RowIndex(2);

    /// Validates a raw row number taken from a trigger payload or a scan.
    ///
    /// Zero, negative numbers, the header row, and values beyond the `u32`
    /// range are all rejected.
    pub fn new(value: i64) -> Result<Self, InvalidRowIndex> {
        if value < i64::from(Self::FIRST_DATA.0) {
            return Err(InvalidRowIndex { value });
        }
        u32::try_from(value)
            .map(Self)
            .map_err(|_| InvalidRowIndex { value })
    }

    /// Returns the row index for the `offset`-th record of a full-sheet scan
    /// (offset 0 is the first record, directly below the header).
    pub fn from_record_offset(offset: usize) -> Option<Self> {
        let offset = u32::try_from(offset).ok()?;
        Self::FIRST_DATA.0.checked_add(offset).map(Self)
    }

    /// Returns the underlying 1-based row number.
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for RowIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Identifiers: UUID-backed (internally generated)
// ---------------------------------------------------------------------------

/// Identifies one trigger of the generation workflow (one HTTP request).
///
/// Generated fresh per request and attached to the request span so every
/// generation call and sheet write from that request can be correlated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(Uuid);

impl RunId {
    /// Generates a new random run identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Identifiers: String-backed (configuration names)
// ---------------------------------------------------------------------------

string_id! {
    /// Human-visible name of the spreadsheet document (e.g. `"Automate Blog Posts"`).
    SpreadsheetName
}

string_id! {
    /// Title of the worksheet tab inside the spreadsheet (e.g. `"Basic"`).
    WorksheetName
}
