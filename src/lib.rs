//! # csvpager
//!
//! Incremental, chunked CSV ingestion for paginated viewers.
//!
//! Files are read in bounded chunks (1 MiB by default). Records cut by a chunk
//! boundary are carried over and completed by the next chunk, so memory stays
//! bounded no matter how large the file is. Malformed rows never fail a load:
//! short rows are kept as they are, and unbalanced quotes degrade to
//! best-effort field extraction.
//!
//! ## Components
//!
//! - [`ChunkReader`] - bounded sequential reads, end-of-stream detection
//! - [`IncrementalCsvParser`] - leftover handling, line and field splitting
//! - [`CsvLoader`] - load session with single-flight background paging,
//!   snapshots and change events for a display layer
//!
//! ## Quick Start
//!
//! ```no_run
//! use csvpager::{CsvLoader, LoadEvent};
//!
//! let loader = CsvLoader::default();
//! let events = loader.subscribe();
//! loader.begin_load("data.csv")?;
//!
//! // Ask for the first page; the call returns immediately
//! loader.load_next_page();
//!
//! for event in events {
//!     match event {
//!         LoadEvent::PageLoaded { total, .. } => {
//!             println!("{} rows so far", total);
//!             loader.load_next_page();
//!         }
//!         LoadEvent::EndOfStream => break,
//!         LoadEvent::Failed(message) => {
//!             eprintln!("{}", message);
//!             break;
//!         }
//!     }
//! }
//! # Ok::<(), csvpager::CsvError>(())
//! ```
//!
//! ## Limitations
//!
//! - Lines are split on `\n` before fields are parsed, so a quoted field
//!   containing a newline is split into two records
//! - [`LoadSnapshot::column_count`] is the field count of the first row only
//! - UTF-8 is the only supported encoding; see [`DecodePolicy`]

pub mod chunk_reader;
pub mod csv;
pub mod error;
pub mod incremental_parser;
pub mod loader;
pub mod options;
pub mod traits;
pub mod types;

pub use chunk_reader::{ChunkReader, DEFAULT_CHUNK_SIZE, MAX_CHUNK_SIZE};
pub use csv::CsvParser;
pub use error::{CsvError, Result};
pub use incremental_parser::{read_all, IncrementalCsvParser};
pub use loader::{CsvLoader, LoadEvent, PageHandle, PageRequest, SkipReason};
pub use options::LoadOptions;
pub use traits::{Paginate, ParseRows};
pub use types::{DecodeFailure, DecodePolicy, LoadSnapshot, Page, Row};
