//! Incremental CSV parsing over bounded chunks
//!
//! Turns a sequence of raw byte chunks into rows without holding the whole
//! file in memory:
//!
//! 1. Read at most `chunk_size` bytes from the [`ChunkReader`]
//! 2. Prefix them with the leftover of the previous chunk
//! 3. Everything up to the last `\n` is split into lines, decoded and parsed
//! 4. The final segment becomes the new leftover, complete-looking or not
//!
//! When the source is exhausted the leftover is flushed as the last record,
//! so a file without a trailing newline loses nothing.
//!
//! Peak memory per page is one chunk plus the longest line straddling it.

use crate::chunk_reader::ChunkReader;
use crate::csv::{split_lines, CsvParser, LineBuffer};
use crate::error::{CsvError, Result};
use crate::options::LoadOptions;
use crate::traits::ParseRows;
use crate::types::{DecodeFailure, DecodePolicy, Page, Row};
use std::borrow::Cow;
use std::path::Path;

/// Pull-driven, forward-only CSV parser
///
/// # Examples
///
/// ```no_run
/// use csvpager::{IncrementalCsvParser, LoadOptions};
///
/// let mut parser = IncrementalCsvParser::open("data.csv", &LoadOptions::default())?;
/// loop {
///     let page = parser.next_page()?;
///     for row in &page.rows {
///         println!("{}", row);
///     }
///     if page.end_of_stream {
///         break;
///     }
/// }
/// # Ok::<(), csvpager::CsvError>(())
/// ```
#[derive(Debug)]
pub struct IncrementalCsvParser {
    reader: ChunkReader,
    lines: LineBuffer,
    parser: CsvParser,
    chunk_size: usize,
    decode_policy: DecodePolicy,

    // Position of the next unparsed line
    line_number: u64,
    line_offset: u64,

    end_of_stream: bool,
    failed: Option<DecodeFailure>,
}

impl IncrementalCsvParser {
    /// Create a parser over an already opened reader
    pub fn new(reader: ChunkReader, options: &LoadOptions) -> Self {
        IncrementalCsvParser {
            reader,
            lines: LineBuffer::new(),
            parser: options.parser(),
            chunk_size: options.get_chunk_size(),
            decode_policy: options.get_decode_policy(),
            line_number: 0,
            line_offset: 0,
            end_of_stream: false,
            failed: None,
        }
    }

    /// Open a file and create a parser over it
    pub fn open<P: AsRef<Path>>(path: P, options: &LoadOptions) -> Result<Self> {
        let reader = ChunkReader::open(path)?;
        Ok(Self::new(reader, options))
    }

    /// Read one chunk and parse every line it completes
    ///
    /// An empty read marks end of stream and flushes the leftover as the
    /// final record. After that, every call returns an empty page with
    /// `end_of_stream` set and touches the reader no more.
    ///
    /// A read failure leaves the leftover untouched, so calling again
    /// retries from the same place. Under [`DecodePolicy::Strict`] a line
    /// that is not valid UTF-8 ends the page early with
    /// [`Page::decode_failure`] set; every later call fails with
    /// [`CsvError::Decode`].
    pub fn next_page(&mut self) -> Result<Page> {
        if let Some(failure) = self.failed {
            return Err(failure.into());
        }
        if self.end_of_stream {
            return Ok(Page {
                end_of_stream: true,
                ..Page::default()
            });
        }

        let chunk = self.reader.read_chunk(self.chunk_size)?;

        let page = if chunk.is_empty() {
            self.end_of_stream = true;
            let tail = self.lines.finish();
            let mut page = self.parse_region(tail.as_deref().unwrap_or_default());
            page.end_of_stream = true;
            page
        } else {
            match self.lines.push(&chunk) {
                Some(region) => self.parse_region(&region),
                None => Page::default(),
            }
        };

        tracing::debug!(
            "parsed page: {} rows from {} bytes, {} bytes pending, eof={}",
            page.rows.len(),
            chunk.len(),
            self.lines.pending(),
            page.end_of_stream
        );

        Ok(page)
    }

    /// Parse an in-memory string with this parser's settings
    pub fn parse(&self, content: &str) -> Vec<Row> {
        self.parser.parse(content)
    }

    /// Whether the source has been fully consumed
    pub fn is_end_of_stream(&self) -> bool {
        self.end_of_stream
    }

    /// Bytes held back waiting for the rest of their line
    pub fn pending_bytes(&self) -> usize {
        self.lines.pending()
    }

    /// Bytes read from the source so far
    pub fn bytes_read(&self) -> u64 {
        self.reader.position()
    }

    fn parse_region(&mut self, region: &[u8]) -> Page {
        let mut page = Page::default();
        if region.is_empty() {
            return page;
        }

        for line in split_lines(region) {
            let Some(text) = self.decode(line) else {
                let failure = DecodeFailure {
                    line: self.line_number + 1,
                    position: self.line_offset,
                };
                tracing::warn!(
                    "Invalid UTF-8 in line {} (byte {}), halting",
                    failure.line,
                    failure.position
                );
                self.failed = Some(failure);
                page.decode_failure = Some(failure);
                break;
            };

            if let Some(fields) = self.parser.parse_record(&text) {
                page.rows.push(Row::new(fields));
            }

            self.line_number += 1;
            self.line_offset += line.len() as u64 + 1;
        }

        page
    }

    fn decode<'a>(&self, line: &'a [u8]) -> Option<Cow<'a, str>> {
        match self.decode_policy {
            DecodePolicy::Strict => std::str::from_utf8(line).ok().map(Cow::Borrowed),
            DecodePolicy::Lossy => Some(String::from_utf8_lossy(line)),
        }
    }
}

impl ParseRows for IncrementalCsvParser {
    fn parse_rows(&self, content: &str) -> Vec<Row> {
        self.parse(content)
    }
}

/// Drain `parser` into a single vector of rows
///
/// Convenience for small files and tests; pagination consumers should call
/// [`IncrementalCsvParser::next_page`] themselves.
pub fn read_all(parser: &mut IncrementalCsvParser) -> Result<Vec<Row>> {
    let mut rows = Vec::new();
    loop {
        let page = parser.next_page()?;
        rows.extend(page.rows);
        if let Some(failure) = page.decode_failure {
            return Err(CsvError::from(failure));
        }
        if page.end_of_stream {
            return Ok(rows);
        }
    }
}
