//! Integration tests for csvpager

use csvpager::{
    read_all, CsvLoader, DecodePolicy, IncrementalCsvParser, LoadEvent, LoadOptions, Paginate,
    ParseRows, PageRequest, Row, SkipReason,
};
use std::io::Write;
use tempfile::NamedTempFile;

fn write_csv(content: &[u8]) -> NamedTempFile {
    let mut temp = NamedTempFile::new().unwrap();
    temp.write_all(content).unwrap();
    temp.flush().unwrap();
    temp
}

fn fields(rows: &[Row]) -> Vec<Vec<&str>> {
    rows.iter().map(|r| r.iter().collect()).collect()
}

fn drain(loader: &CsvLoader) {
    while loader.load_next_page().wait() {}
}

#[test]
fn test_load_file_in_pages() {
    let temp = write_csv(b"A,B,5,1990-02-10\nC,D,10,1990-02-25");
    let loader = CsvLoader::new(LoadOptions::default().chunk_size(11));
    loader.begin_load(temp.path()).unwrap();
    assert_eq!(
        loader.source().as_deref(),
        Some(temp.path().display().to_string().as_str())
    );

    drain(&loader);

    let snapshot = loader.snapshot();
    assert_eq!(
        fields(&snapshot.rows),
        vec![vec!["A", "B", "5", "1990-02-10"], vec!["C", "D", "10", "1990-02-25"]]
    );
    assert_eq!(snapshot.column_count, 4);
    assert!(snapshot.end_of_stream);
    assert_eq!(snapshot.last_error, None);
}

#[test]
fn test_malformed_rows_are_tolerated() {
    let temp = write_csv(b"A,B\nC\n\"unterminated,x\n\n\"A,1\",B\n");
    let loader = CsvLoader::default();
    loader.begin_load(temp.path()).unwrap();
    drain(&loader);

    let rows = loader.rows();
    assert_eq!(
        fields(&rows),
        vec![vec!["A", "B"], vec!["C"], vec!["unterminated,x"], vec!["A,1", "B"]]
    );
    // Only the first row decides the column count
    assert_eq!(loader.column_count(), 2);
    assert_eq!(loader.last_error(), None);
}

#[test]
fn test_crlf_file_with_trimming() {
    let temp = write_csv(b"\"Alex \", Yehorov\r\nAnna ,Yehorova\r\n");
    let loader = CsvLoader::new(LoadOptions::default().trim_fields(true));
    loader.begin_load(temp.path()).unwrap();
    drain(&loader);
    assert_eq!(
        fields(&loader.rows()),
        vec![vec!["Alex", "Yehorov"], vec!["Anna", "Yehorova"]]
    );
}

#[test]
fn test_nonexistent_path() {
    let loader = CsvLoader::default();
    let events = loader.subscribe();

    assert!(loader.begin_load("/no/such/file").is_err());
    assert!(loader.last_error().is_some());
    assert!(loader.rows().is_empty());
    assert!(matches!(
        events.try_recv(),
        Ok(LoadEvent::Failed(message)) if message.contains("/no/such/file")
    ));
}

#[test]
fn test_large_file_many_pages() {
    let num_rows = 10_000;
    let mut content = String::new();
    for i in 0..num_rows {
        content.push_str(&format!("{},\"name, {}\",{}\n", i, i, i * 2));
    }
    let temp = write_csv(content.as_bytes());

    let loader = CsvLoader::new(LoadOptions::default().chunk_size(4096));
    let events = loader.subscribe();
    loader.begin_load(temp.path()).unwrap();
    drain(&loader);

    let rows = loader.rows();
    assert_eq!(rows.len(), num_rows);
    for (i, row) in rows.iter().enumerate() {
        assert_eq!(row.get(0), Some(i.to_string().as_str()));
        assert_eq!(row.get(1), Some(format!("name, {}", i).as_str()));
    }

    let pages = events
        .try_iter()
        .filter(|e| matches!(e, LoadEvent::PageLoaded { .. }))
        .count();
    assert!(pages > content.len() / 4096);
}

#[test]
fn test_concurrent_requests_never_duplicate_rows() {
    let mut content = String::new();
    for i in 0..2_000 {
        content.push_str(&format!("{},x\n", i));
    }
    let temp = write_csv(content.as_bytes());

    let loader = CsvLoader::new(LoadOptions::default().chunk_size(512));
    loader.begin_load(temp.path()).unwrap();

    // Hammer the gate from several threads; skipped requests are fine
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let loader = loader.clone();
            std::thread::spawn(move || {
                while !loader.is_end_of_stream() {
                    match loader.load_next_page() {
                        PageRequest::Started(handle) => handle.wait(),
                        PageRequest::Skipped(SkipReason::InFlight) => std::thread::yield_now(),
                        PageRequest::Skipped(_) => break,
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let rows = loader.rows();
    assert_eq!(rows.len(), 2_000);
    for (i, row) in rows.iter().enumerate() {
        assert_eq!(row.get(0), Some(i.to_string().as_str()));
    }
}

#[test]
fn test_invalid_utf8_strict_and_lossy() {
    let temp = write_csv(b"a,b\nc,\xff\nd,e\n");

    let strict = CsvLoader::default();
    strict.begin_load(temp.path()).unwrap();
    drain(&strict);
    assert_eq!(fields(&strict.rows()), vec![vec!["a", "b"]]);
    assert!(strict.last_error().unwrap().contains("Invalid UTF-8"));

    let lossy = CsvLoader::new(LoadOptions::default().decode_policy(DecodePolicy::Lossy));
    lossy.begin_load(temp.path()).unwrap();
    drain(&lossy);
    assert_eq!(
        fields(&lossy.rows()),
        vec![vec!["a", "b"], vec!["c", "\u{FFFD}"], vec!["d", "e"]]
    );
    assert_eq!(lossy.last_error(), None);
}

#[test]
fn test_parser_without_loader() {
    let temp = write_csv("id,city\n1,Kraków\n2,\"São Paulo, BR\"".as_bytes());
    let options = LoadOptions::default().chunk_size(3);
    let mut parser = IncrementalCsvParser::open(temp.path(), &options).unwrap();

    let rows = read_all(&mut parser).unwrap();
    assert_eq!(
        fields(&rows),
        vec![vec!["id", "city"], vec!["1", "Kraków"], vec!["2", "São Paulo, BR"]]
    );
    assert!(parser.is_end_of_stream());
    assert_eq!(parser.bytes_read(), temp.as_file().metadata().unwrap().len());
}

#[test]
fn test_capabilities_through_traits() {
    fn first_page(source: &dyn Paginate) -> bool {
        source.load_next_page().wait()
    }
    fn parse(parser: &dyn ParseRows, content: &str) -> usize {
        parser.parse_rows(content).len()
    }

    let temp = write_csv(b"a\nb\n");
    let loader = CsvLoader::default();
    loader.begin_load(temp.path()).unwrap();

    assert!(first_page(&loader));
    assert_eq!(loader.rows().len(), 2);
    assert_eq!(parse(&loader, "A,B,5,1990-02-10\nC,D,10,1990-02-25"), 2);
}
