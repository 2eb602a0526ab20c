//! CSV utilities for line splitting and field parsing

mod lines;
mod parser;

pub(crate) use lines::split_lines;
pub use lines::LineBuffer;
pub use parser::{CsvParser, DEFAULT_DELIMITER, DEFAULT_QUOTE};
