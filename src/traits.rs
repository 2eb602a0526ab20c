//! Capabilities exposed to display collaborators

use crate::loader::PageRequest;
use crate::types::Row;

/// Can fetch the next page of a paginated source
pub trait Paginate {
    /// Start loading the next page
    ///
    /// Must return immediately. A call made while a page is in flight, or
    /// after the source is exhausted, is a no-op.
    fn load_next_page(&self) -> PageRequest;
}

/// Can parse raw text into rows
pub trait ParseRows {
    /// Parse every line of `content`, including a final line without newline
    fn parse_rows(&self, content: &str) -> Vec<Row>;
}
