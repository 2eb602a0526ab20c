//! Quote-aware CSV line parsing, tolerant of malformed content

use crate::traits::ParseRows;
use crate::types::Row;

/// Default field delimiter
pub const DEFAULT_DELIMITER: u8 = b',';

/// Default quote character
pub const DEFAULT_QUOTE: u8 = b'"';

/// CSV parser for splitting complete lines into fields
///
/// Never fails: unbalanced quotes degrade to best-effort extraction, and
/// lines that produce no fields are skipped.
#[derive(Debug, Clone, Copy)]
pub struct CsvParser {
    delimiter: u8,
    quote_char: u8,
    trim_fields: bool,
}

impl Default for CsvParser {
    fn default() -> Self {
        Self::new(DEFAULT_DELIMITER, DEFAULT_QUOTE)
    }
}

impl CsvParser {
    /// Create a new CSV parser with custom delimiter and quote character
    pub fn new(delimiter: u8, quote_char: u8) -> Self {
        Self {
            delimiter,
            quote_char,
            trim_fields: false,
        }
    }

    /// Trim surrounding whitespace from every field (builder pattern)
    pub fn trim_fields(mut self, trim: bool) -> Self {
        self.trim_fields = trim;
        self
    }

    /// Parse CSV line into fields
    ///
    /// A quote opens a quoted span only at the start of a field; anywhere
    /// else it is a literal character. A quoted span protects delimiters,
    /// its quotes are stripped and a doubled quote inside it yields one
    /// literal quote. A span that is never closed swallows the rest of the
    /// line into the open field.
    pub fn parse_line(&self, line: &str) -> Vec<String> {
        let mut fields = Vec::new();
        let mut current_field = String::new();
        let mut in_quotes = false;
        let mut field_started = false;
        let mut chars = line.chars().peekable();
        let quote = self.quote_char as char;
        let delimiter = self.delimiter as char;

        while let Some(ch) = chars.next() {
            if ch == quote {
                if in_quotes {
                    // Escaped quote ("")
                    if chars.peek() == Some(&quote) {
                        current_field.push(quote);
                        chars.next();
                    } else {
                        in_quotes = false;
                    }
                } else if field_started {
                    current_field.push(ch);
                } else {
                    in_quotes = true;
                    field_started = true;
                }
            } else if ch == delimiter && !in_quotes {
                fields.push(self.finish_field(&mut current_field));
                field_started = false;
            } else {
                current_field.push(ch);
                field_started = true;
            }
        }

        fields.push(self.finish_field(&mut current_field));
        fields
    }

    /// Parse one logical line into a row's fields
    ///
    /// Strips a trailing carriage return. Returns `None` for lines that carry
    /// no record (empty lines).
    pub fn parse_record(&self, line: &str) -> Option<Vec<String>> {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.is_empty() {
            return None;
        }

        Some(self.parse_line(line))
    }

    /// Parse every line of `content` into rows, including the last line
    pub fn parse(&self, content: &str) -> Vec<Row> {
        content
            .split('\n')
            .filter_map(|line| self.parse_record(line))
            .map(Row::new)
            .collect()
    }

    fn finish_field(&self, field: &mut String) -> String {
        let value = std::mem::take(field);
        if self.trim_fields {
            value.trim().to_string()
        } else {
            value
        }
    }
}

impl ParseRows for CsvParser {
    fn parse_rows(&self, content: &str) -> Vec<Row> {
        self.parse(content)
    }
}
