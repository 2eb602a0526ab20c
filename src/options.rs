//! Load configuration

use crate::chunk_reader::{DEFAULT_CHUNK_SIZE, MAX_CHUNK_SIZE};
use crate::csv::{CsvParser, DEFAULT_DELIMITER, DEFAULT_QUOTE};
use crate::types::DecodePolicy;

/// Options for a load session
///
/// # Examples
///
/// ```
/// use csvpager::{DecodePolicy, LoadOptions};
///
/// let options = LoadOptions::default()
///     .chunk_size(256 * 1024)
///     .delimiter(b';')
///     .trim_fields(true)
///     .decode_policy(DecodePolicy::Lossy);
/// assert_eq!(options.get_chunk_size(), 256 * 1024);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    chunk_size: usize,
    delimiter: u8,
    quote_char: u8,
    trim_fields: bool,
    decode_policy: DecodePolicy,
}

impl Default for LoadOptions {
    fn default() -> Self {
        LoadOptions {
            chunk_size: DEFAULT_CHUNK_SIZE,
            delimiter: DEFAULT_DELIMITER,
            quote_char: DEFAULT_QUOTE,
            trim_fields: false,
            decode_policy: DecodePolicy::Strict,
        }
    }
}

impl LoadOptions {
    /// Set the number of bytes read per page (builder pattern)
    ///
    /// Clamped into `1..=MAX_CHUNK_SIZE`.
    pub fn chunk_size(mut self, bytes: usize) -> Self {
        self.chunk_size = bytes.clamp(1, MAX_CHUNK_SIZE);
        self
    }

    /// Set custom delimiter (builder pattern)
    pub fn delimiter(mut self, delim: u8) -> Self {
        self.delimiter = delim;
        self
    }

    /// Set custom quote character (builder pattern)
    pub fn quote_char(mut self, quote: u8) -> Self {
        self.quote_char = quote;
        self
    }

    /// Trim surrounding whitespace from every field (builder pattern)
    pub fn trim_fields(mut self, trim: bool) -> Self {
        self.trim_fields = trim;
        self
    }

    /// Choose how invalid UTF-8 is handled (builder pattern)
    pub fn decode_policy(mut self, policy: DecodePolicy) -> Self {
        self.decode_policy = policy;
        self
    }

    pub fn get_chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn get_decode_policy(&self) -> DecodePolicy {
        self.decode_policy
    }

    /// Line parser configured from these options
    pub fn parser(&self) -> CsvParser {
        CsvParser::new(self.delimiter, self.quote_char).trim_fields(self.trim_fields)
    }
}
