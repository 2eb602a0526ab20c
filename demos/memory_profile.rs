//! Heap profile of a full paged load
//!
//! Usage: cargo run --release --example memory_profile --features dhat-heap -- <file.csv>
//!
//! Writes `dhat-heap.json`; open it in the dhat viewer. Peak heap should track
//! the chunk size plus the rows kept, not the file size.

use csvpager::{read_all, IncrementalCsvParser, LoadOptions};
use std::error::Error;

#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

fn main() -> Result<(), Box<dyn Error>> {
    let path = std::env::args()
        .nth(1)
        .ok_or("usage: memory_profile <file.csv>")?;

    let _profiler = dhat::Profiler::new_heap();

    // Count rows page by page, dropping each page
    let options = LoadOptions::default();
    let mut parser = IncrementalCsvParser::open(&path, &options)?;
    let mut rows = 0usize;
    loop {
        let page = parser.next_page()?;
        rows += page.len();
        if page.end_of_stream {
            break;
        }
    }
    println!("streamed {} rows ({} bytes)", rows, parser.bytes_read());

    let stats = dhat::HeapStats::get();
    println!(
        "peak heap while streaming: {:.2} MB",
        stats.max_bytes as f64 / (1024.0 * 1024.0)
    );

    // Same file, keeping every row
    let mut parser = IncrementalCsvParser::open(&path, &options)?;
    let kept = read_all(&mut parser)?;
    let stats = dhat::HeapStats::get();
    println!(
        "peak heap keeping {} rows: {:.2} MB",
        kept.len(),
        stats.max_bytes as f64 / (1024.0 * 1024.0)
    );

    Ok(())
}
