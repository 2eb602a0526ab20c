//! Page through a CSV file the way a grid view would
//!
//! Usage: cargo run --example page_through -- <file.csv> [chunk_kib]
//!
//! Set `RUST_LOG=csvpager=debug` to see per-page parse logs.

use csvpager::{CsvLoader, LoadEvent, LoadOptions};
use std::error::Error;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let mut args = std::env::args().skip(1);
    let path = args.next().ok_or("usage: page_through <file.csv> [chunk_kib]")?;
    let chunk_kib: usize = match args.next() {
        Some(kib) => kib.parse()?,
        None => 1024,
    };

    let loader = CsvLoader::new(LoadOptions::default().chunk_size(chunk_kib * 1024));
    let events = loader.subscribe();

    println!("=== Paging {} ({} KiB chunks) ===\n", path, chunk_kib);
    let start = Instant::now();

    loader.begin_load(&path)?;
    loader.load_next_page();

    // Act like a view: redraw on each event, ask for more until done
    for event in events {
        match event {
            LoadEvent::PageLoaded { added, total } => {
                if added > 0 {
                    let snapshot = loader.snapshot();
                    println!(
                        "   +{:>6} rows  (total {:>8}, {} columns)",
                        added, total, snapshot.column_count
                    );
                }
                loader.load_next_page();
            }
            LoadEvent::EndOfStream => break,
            LoadEvent::Failed(message) => {
                eprintln!("   error: {}", message);
                break;
            }
        }
    }

    let snapshot = loader.snapshot();
    println!("\nLoaded {} rows in {:?}", snapshot.rows.len(), start.elapsed());
    for row in snapshot.rows.iter().take(5) {
        println!("   {}  {}", row.id(), row);
    }

    Ok(())
}
