//! Type definitions for parsed CSV data

use crate::error::CsvError;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// One parsed CSV record
///
/// Rows are immutable once created. The `id` is only a display key and has no
/// bearing on parsing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Row {
    id: Uuid,
    fields: Vec<String>,
}

impl Row {
    /// Create a row with a fresh identifier
    pub fn new(fields: Vec<String>) -> Self {
        Row {
            id: Uuid::new_v4(),
            fields,
        }
    }

    /// Stable unique identifier of this row
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Field values in order
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Get field by index
    pub fn get(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(String::as_str)
    }

    /// Number of fields in this row
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the row has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate over field values
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(String::as_str)
    }

    /// Consume the row, returning its field values
    pub fn into_fields(self) -> Vec<String> {
        self.fields
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fields.join(", "))
    }
}

/// Rows produced from processing one chunk
#[derive(Debug, Clone, Default)]
pub struct Page {
    /// Complete rows, in file order
    pub rows: Vec<Row>,
    /// True once the source reported end of stream
    pub end_of_stream: bool,
    /// Set when a line failed to decode; `rows` stops just before it
    pub decode_failure: Option<DecodeFailure>,
}

/// Location of a line that is not valid UTF-8
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeFailure {
    /// 1-based line number
    pub line: u64,
    /// Byte offset of the line start
    pub position: u64,
}

impl From<DecodeFailure> for CsvError {
    fn from(failure: DecodeFailure) -> Self {
        CsvError::Decode {
            line: failure.line,
            position: failure.position,
        }
    }
}

impl Page {
    /// Number of rows on this page
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the page produced no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// How bytes that are not valid UTF-8 are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodePolicy {
    /// Surface a decode error and stop paging
    #[default]
    Strict,
    /// Replace invalid sequences with U+FFFD and keep going
    Lossy,
}

/// Point-in-time view of a load session
///
/// Taken under a single lock, so a snapshot never contains half a page.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct LoadSnapshot {
    /// All rows appended so far
    pub rows: Arc<Vec<Row>>,
    /// Field count of the first row (0 when no rows)
    pub column_count: usize,
    /// A page read is in flight
    pub is_loading: bool,
    /// The source has been fully consumed
    pub end_of_stream: bool,
    /// Description of the most recent failure
    pub last_error: Option<String>,
}

/// Field count of the first row
///
/// Later rows may have more or fewer fields. This is a known limitation of
/// the reported column count, not an error.
pub(crate) fn column_count(rows: &[Row]) -> usize {
    rows.first().map(Row::len).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(fields: &[&str]) -> Row {
        Row::new(fields.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_row_accessors() {
        let r = row(&["Alice", "30"]);
        assert_eq!(r.len(), 2);
        assert_eq!(r.get(0), Some("Alice"));
        assert_eq!(r.get(2), None);
        assert_eq!(r.iter().collect::<Vec<_>>(), vec!["Alice", "30"]);
        assert_eq!(r.to_string(), "Alice, 30");
    }

    #[test]
    fn test_row_ids_are_unique() {
        let a = row(&["x"]);
        let b = row(&["x"]);
        assert_ne!(a.id(), b.id());
        assert_ne!(a, b);
        assert_eq!(a.clone().id(), a.id());
    }

    #[test]
    fn test_column_count_uses_first_row() {
        assert_eq!(column_count(&[]), 0);
        let rows = vec![row(&["a", "b"]), row(&["c", "d", "e"]), row(&["f"])];
        assert_eq!(column_count(&rows), 2);
    }
}
