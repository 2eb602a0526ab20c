//! Load sessions with background page reads
//!
//! [`CsvLoader`] is the one authoritative holder of session state. Display
//! layers read it through [`CsvLoader::snapshot`] or react to [`LoadEvent`]s
//! from [`CsvLoader::subscribe`]; they never keep their own copy.
//!
//! **Threading:**
//! - Each page is read on its own worker thread
//! - The parser, and with it the file handle, moves into the worker and comes
//!   back on publish, so two reads of one handle can never overlap
//! - `load_next_page` is fail-fast: while a page is in flight it returns
//!   [`PageRequest::Skipped`] instead of queueing
//! - Rows, flags and the error are published in one critical section
//!
//! Starting a new load (or closing) bumps the session generation. A worker
//! still running for the old session has its result dropped on arrival.

use crate::chunk_reader::ChunkReader;
use crate::error::{CsvError, Result};
use crate::incremental_parser::IncrementalCsvParser;
use crate::options::LoadOptions;
use crate::traits::{Paginate, ParseRows};
use crate::types::{column_count, LoadSnapshot, Page, Row};
use parking_lot::Mutex;
use std::io::Read;
use std::path::Path;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Notification sent to subscribers after state changes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadEvent {
    /// A page was appended
    PageLoaded { added: usize, total: usize },
    /// The source is fully consumed
    EndOfStream,
    /// A load or page read failed; the message is also in `last_error`
    Failed(String),
}

/// Why a page request did nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Another page read is in flight
    InFlight,
    /// The source is exhausted
    EndOfStream,
    /// The session stopped after a decode error
    Halted,
    /// No source is loaded
    NoSession,
}

/// Outcome of [`CsvLoader::load_next_page`]
#[derive(Debug)]
pub enum PageRequest {
    /// A worker is reading the next page
    Started(PageHandle),
    /// Nothing was started
    Skipped(SkipReason),
}

impl PageRequest {
    pub fn is_started(&self) -> bool {
        matches!(self, PageRequest::Started(_))
    }

    /// Block until the page (if any) has been published
    ///
    /// Returns `true` if a page read was started.
    pub fn wait(self) -> bool {
        match self {
            PageRequest::Started(handle) => {
                handle.wait();
                true
            }
            PageRequest::Skipped(_) => false,
        }
    }
}

/// Handle to an in-flight page read
#[derive(Debug)]
pub struct PageHandle {
    handle: JoinHandle<()>,
}

impl PageHandle {
    /// Block until the worker has published its page
    pub fn wait(self) {
        if self.handle.join().is_err() {
            tracing::error!("page worker panicked");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

#[derive(Default)]
struct SessionState {
    generation: u64,
    // None while a worker holds it, or when no session is open
    parser: Option<IncrementalCsvParser>,
    source: Option<String>,
    rows: Arc<Vec<Row>>,
    loading: bool,
    end_of_stream: bool,
    halted: bool,
    last_error: Option<String>,
}

impl SessionState {
    /// Start a fresh session, dropping any parser of the old one
    fn reset(&mut self) {
        self.generation += 1;
        self.parser = None;
        self.source = None;
        self.rows = Arc::new(Vec::new());
        self.loading = false;
        self.end_of_stream = false;
        self.halted = false;
        self.last_error = None;
    }
}

struct Shared {
    state: Mutex<SessionState>,
    subscribers: Mutex<Vec<Sender<LoadEvent>>>,
}

impl Shared {
    fn notify(&self, events: Vec<LoadEvent>) {
        if events.is_empty() {
            return;
        }
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|tx| events.iter().all(|event| tx.send(event.clone()).is_ok()));
    }

    /// Apply a finished page to the session it was started for
    ///
    /// Events go out before the state lock is released, so no later page
    /// can overtake them.
    fn publish(&self, generation: u64, parser: IncrementalCsvParser, result: Result<Page>) {
        let mut events = Vec::new();
        let mut state = self.state.lock();
        if state.generation != generation {
            tracing::debug!(
                "Skipping stale page: session {} != request {}",
                state.generation,
                generation
            );
            return;
        }
        state.loading = false;

        match result {
            Ok(page) => {
                let added = page.rows.len();
                if added > 0 {
                    Arc::make_mut(&mut state.rows).extend(page.rows);
                }
                events.push(LoadEvent::PageLoaded {
                    added,
                    total: state.rows.len(),
                });

                if let Some(failure) = page.decode_failure {
                    let message = CsvError::from(failure).to_string();
                    state.halted = true;
                    state.last_error = Some(message.clone());
                    events.push(LoadEvent::Failed(message));
                } else if page.end_of_stream {
                    state.end_of_stream = true;
                    events.push(LoadEvent::EndOfStream);
                    tracing::info!(
                        "Finished loading {}: {} rows, {} bytes",
                        state.source.as_deref().unwrap_or("<reader>"),
                        state.rows.len(),
                        parser.bytes_read()
                    );
                } else {
                    state.parser = Some(parser);
                }
            }
            Err(e) => {
                tracing::warn!("page read failed: {}", e);
                let message = e.to_string();
                if e.is_retryable() {
                    state.parser = Some(parser);
                } else {
                    state.halted = true;
                }
                state.last_error = Some(message.clone());
                events.push(LoadEvent::Failed(message));
            }
        }
        self.notify(events);
    }

    /// Release a session whose worker died without publishing
    fn abandon(&self, generation: u64) {
        let mut state = self.state.lock();
        if state.generation != generation || !state.loading {
            return;
        }
        let message = CsvError::WorkerLost.to_string();
        tracing::error!("{}", message);
        state.loading = false;
        state.halted = true;
        state.last_error = Some(message.clone());
        self.notify(vec![LoadEvent::Failed(message)]);
    }
}

/// Clears the loading flag if the worker unwinds before publishing
struct InFlight {
    shared: Arc<Shared>,
    generation: u64,
    published: bool,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if !self.published {
            self.shared.abandon(self.generation);
        }
    }
}

/// Paginated CSV load session
///
/// Cheap to clone; clones share the same session.
///
/// # Examples
///
/// ```no_run
/// use csvpager::{CsvLoader, LoadOptions};
///
/// let loader = CsvLoader::new(LoadOptions::default());
/// loader.begin_load("data.csv")?;
///
/// // Fetch pages until the file is exhausted
/// while !loader.is_end_of_stream() && loader.last_error().is_none() {
///     loader.load_next_page().wait();
/// }
///
/// let snapshot = loader.snapshot();
/// println!("{} rows x {} columns", snapshot.rows.len(), snapshot.column_count);
/// # Ok::<(), csvpager::CsvError>(())
/// ```
#[derive(Clone)]
pub struct CsvLoader {
    shared: Arc<Shared>,
    options: LoadOptions,
}

impl Default for CsvLoader {
    fn default() -> Self {
        Self::new(LoadOptions::default())
    }
}

impl CsvLoader {
    pub fn new(options: LoadOptions) -> Self {
        CsvLoader {
            shared: Arc::new(Shared {
                state: Mutex::new(SessionState::default()),
                subscribers: Mutex::new(Vec::new()),
            }),
            options,
        }
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    /// Start a new session on the file at `path`
    ///
    /// All previous state is discarded. On failure the error is also stored
    /// in [`last_error`](CsvLoader::last_error) and the session holds no rows.
    /// No data is read until [`load_next_page`](CsvLoader::load_next_page).
    pub fn begin_load<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let opened = ChunkReader::open(path);
        self.begin(opened, path.display().to_string())
    }

    /// Start a new session on an arbitrary byte source
    pub fn begin_load_reader<R: Read + Send + 'static>(&self, reader: R) -> Result<()> {
        self.begin(Ok(ChunkReader::from_reader(reader)), "<reader>".to_string())
    }

    fn begin(&self, opened: Result<ChunkReader>, source: String) -> Result<()> {
        let mut state = self.shared.state.lock();
        state.reset();

        match opened {
            Ok(reader) => {
                tracing::info!("loading {}", source);
                state.parser = Some(IncrementalCsvParser::new(reader, &self.options));
                state.source = Some(source);
                Ok(())
            }
            Err(e) => {
                tracing::warn!("{}", e);
                let message = e.to_string();
                state.last_error = Some(message.clone());
                self.shared.notify(vec![LoadEvent::Failed(message)]);
                Err(e)
            }
        }
    }

    /// Start reading the next page on a worker thread
    ///
    /// Returns immediately. Does nothing while a page is in flight, once the
    /// source is exhausted, after a decode error, or without a session. After
    /// a failed read, calling again retries.
    pub fn load_next_page(&self) -> PageRequest {
        let mut state = self.shared.state.lock();
        if state.loading {
            return PageRequest::Skipped(SkipReason::InFlight);
        }
        if state.end_of_stream {
            return PageRequest::Skipped(SkipReason::EndOfStream);
        }
        if state.halted {
            return PageRequest::Skipped(SkipReason::Halted);
        }
        let Some(mut parser) = state.parser.take() else {
            return PageRequest::Skipped(SkipReason::NoSession);
        };

        state.loading = true;
        let generation = state.generation;
        drop(state);

        let in_flight = InFlight {
            shared: Arc::clone(&self.shared),
            generation,
            published: false,
        };
        let handle = thread::spawn(move || {
            let mut in_flight = in_flight;
            let result = parser.next_page();
            in_flight.shared.publish(generation, parser, result);
            in_flight.published = true;
        });

        PageRequest::Started(PageHandle { handle })
    }

    /// Load the next page and wait for it to be published
    ///
    /// Returns `Ok(true)` if a page was read (its failure, if any, is in
    /// `last_error`), `Ok(false)` if the request was skipped, and
    /// [`CsvError::NoSession`] if nothing is loaded.
    pub fn load_next_page_blocking(&self) -> Result<bool> {
        match self.load_next_page() {
            PageRequest::Skipped(SkipReason::NoSession) => Err(CsvError::NoSession),
            request => Ok(request.wait()),
        }
    }

    /// End the current session
    ///
    /// Rows stay readable; the file is released and an in-flight page is
    /// discarded when it arrives.
    pub fn close(&self) {
        let mut state = self.shared.state.lock();
        state.generation += 1;
        state.parser = None;
        state.loading = false;
    }

    /// Receive events for every later state change
    pub fn subscribe(&self) -> Receiver<LoadEvent> {
        let (tx, rx) = mpsc::channel();
        self.shared.subscribers.lock().push(tx);
        rx
    }

    /// Consistent view of the whole session
    pub fn snapshot(&self) -> LoadSnapshot {
        let state = self.shared.state.lock();
        LoadSnapshot {
            rows: Arc::clone(&state.rows),
            column_count: column_count(&state.rows),
            is_loading: state.loading,
            end_of_stream: state.end_of_stream,
            last_error: state.last_error.clone(),
        }
    }

    /// Rows appended so far
    pub fn rows(&self) -> Arc<Vec<Row>> {
        Arc::clone(&self.shared.state.lock().rows)
    }

    /// Field count of the first row
    ///
    /// Later rows may differ; see [`LoadSnapshot::column_count`].
    pub fn column_count(&self) -> usize {
        column_count(&self.shared.state.lock().rows)
    }

    pub fn is_loading(&self) -> bool {
        self.shared.state.lock().loading
    }

    pub fn is_end_of_stream(&self) -> bool {
        self.shared.state.lock().end_of_stream
    }

    pub fn last_error(&self) -> Option<String> {
        self.shared.state.lock().last_error.clone()
    }

    /// Display name of the loaded source
    pub fn source(&self) -> Option<String> {
        self.shared.state.lock().source.clone()
    }
}

impl Paginate for CsvLoader {
    fn load_next_page(&self) -> PageRequest {
        CsvLoader::load_next_page(self)
    }
}

impl ParseRows for CsvLoader {
    fn parse_rows(&self, content: &str) -> Vec<Row> {
        self.options.parser().parse(content)
    }
}
