//! Reassembly of lines split across chunk boundaries

/// Carries the trailing incomplete line from one chunk to the next
///
/// Splitting happens on raw bytes. `\n` never occurs inside a multibyte UTF-8
/// sequence, so a character cut in half by a chunk boundary always lands in
/// the leftover and is completed by the next chunk.
#[derive(Debug, Default)]
pub struct LineBuffer {
    leftover: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and take every complete line out of the buffer
    ///
    /// Returns the bytes up to and including the last `\n`, or `None` when
    /// the chunk did not finish a line. The final segment is never assumed
    /// complete: it stays behind even if it looks like a whole record.
    pub fn push(&mut self, chunk: &[u8]) -> Option<Vec<u8>> {
        let start = self.leftover.len();
        self.leftover.extend_from_slice(chunk);

        // Only the new bytes can hold a newline
        let cut = start + chunk.iter().rposition(|&b| b == b'\n')?;
        let tail = self.leftover.split_off(cut + 1);
        Some(std::mem::replace(&mut self.leftover, tail))
    }

    /// Take whatever is left once the source is exhausted
    pub fn finish(&mut self) -> Option<Vec<u8>> {
        if self.leftover.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.leftover))
        }
    }

    /// Number of bytes waiting for the rest of their line
    pub fn pending(&self) -> usize {
        self.leftover.len()
    }

    pub fn clear(&mut self) {
        self.leftover.clear();
    }
}

/// Split a region produced by [`LineBuffer::push`] into its lines
///
/// The trailing `\n` terminates the last line rather than starting an empty one.
pub fn split_lines(region: &[u8]) -> impl Iterator<Item = &[u8]> {
    let body = region.strip_suffix(b"\n").unwrap_or(region);
    body.split(|&b| b == b'\n')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(region: &[u8]) -> Vec<&[u8]> {
        split_lines(region).collect()
    }

    #[test]
    fn test_last_line_is_retained() {
        let mut buf = LineBuffer::new();
        let complete = buf.push(b"a,b\nc,d").unwrap();
        assert_eq!(complete, b"a,b\n");
        assert_eq!(buf.pending(), 3);
    }

    #[test]
    fn test_leftover_prefixes_next_chunk() {
        let mut buf = LineBuffer::new();
        assert!(buf.push(b"A,B,5,1990-").is_none());
        let complete = buf.push(b"02-10\nC,D").unwrap();
        assert_eq!(complete, b"A,B,5,1990-02-10\n");
        assert_eq!(buf.finish().unwrap(), b"C,D");
        assert!(buf.finish().is_none());
    }

    #[test]
    fn test_chunk_ending_on_newline_leaves_nothing() {
        let mut buf = LineBuffer::new();
        assert_eq!(buf.push(b"x\ny\n").unwrap(), b"x\ny\n");
        assert_eq!(buf.pending(), 0);
        assert!(buf.finish().is_none());
    }

    #[test]
    fn test_split_multibyte_character() {
        let text = "é,ü\n".as_bytes();
        let mut buf = LineBuffer::new();
        assert!(buf.push(&text[..1]).is_none());
        let complete = buf.push(&text[1..]).unwrap();
        assert_eq!(std::str::from_utf8(&complete).unwrap(), "é,ü\n");
    }

    #[test]
    fn test_split_lines() {
        assert_eq!(lines(b"a\nb\n"), vec![&b"a"[..], &b"b"[..]]);
        assert_eq!(lines(b"a\n\nb\n"), vec![&b"a"[..], &b""[..], &b"b"[..]]);
        assert_eq!(lines(b"tail"), vec![&b"tail"[..]]);
    }
}
