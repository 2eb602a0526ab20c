//! Bounded-size sequential reads over a file or any byte source

use crate::error::{CsvError, Result};
use std::fmt;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

/// Default chunk size: 1 MiB
///
/// Large enough to amortize syscalls, small enough to bound peak memory on
/// multi-gigabyte files.
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

/// Largest chunk a single read will allocate: 64 MiB
pub const MAX_CHUNK_SIZE: usize = 64 * 1024 * 1024;

/// Sequential, forward-only chunk reader
///
/// Each call to [`read_chunk`](ChunkReader::read_chunk) returns the next
/// up-to-`max_bytes` bytes. An empty chunk means the source is exhausted.
/// There is no seeking, and the reader is never shared: every read takes
/// `&mut self`.
///
/// # Examples
///
/// ```no_run
/// use csvpager::ChunkReader;
///
/// let mut reader = ChunkReader::open("data.csv")?;
/// loop {
///     let chunk = reader.read_chunk(64 * 1024)?;
///     if chunk.is_empty() {
///         break;
///     }
///     println!("read {} bytes", chunk.len());
/// }
/// # Ok::<(), csvpager::CsvError>(())
/// ```
pub struct ChunkReader {
    inner: Box<dyn Read + Send>,
    position: u64,
    exhausted: bool,
}

impl ChunkReader {
    /// Open a file for sequential reading
    ///
    /// Fails with [`CsvError::SourceNotFound`] if the file cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| CsvError::SourceNotFound {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!("opened {}", path.display());
        Ok(Self::from_reader(file))
    }

    /// Wrap an arbitrary byte source
    pub fn from_reader<R: Read + Send + 'static>(reader: R) -> Self {
        ChunkReader {
            inner: Box::new(reader),
            position: 0,
            exhausted: false,
        }
    }

    /// Read the next chunk of at most `max_bytes` bytes
    ///
    /// The chunk is filled completely unless the end of the source is reached.
    /// Returns an empty chunk once the source is exhausted; no read is
    /// attempted after that.
    ///
    /// If the underlying read fails part-way through a chunk, the bytes read
    /// so far are returned and the failure surfaces on the next call, so no
    /// data is dropped.
    pub fn read_chunk(&mut self, max_bytes: usize) -> Result<Vec<u8>> {
        if self.exhausted || max_bytes == 0 {
            return Ok(Vec::new());
        }
        let max_bytes = max_bytes.min(MAX_CHUNK_SIZE);

        let mut chunk = vec![0u8; max_bytes];
        let mut filled = 0;

        while filled < max_bytes {
            match self.inner.read(&mut chunk[filled..]) {
                Ok(0) => {
                    self.exhausted = true;
                    break;
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(source) => {
                    if filled > 0 {
                        break;
                    }
                    return Err(CsvError::SourceUnreadable {
                        position: self.position,
                        source,
                    });
                }
            }
        }

        chunk.truncate(filled);
        self.position += filled as u64;
        Ok(chunk)
    }

    /// Number of bytes consumed so far
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Whether an end-of-stream read has been observed
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}

impl fmt::Debug for ChunkReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChunkReader")
            .field("position", &self.position)
            .field("exhausted", &self.exhausted)
            .finish_non_exhaustive()
    }
}
