//! Incremental `text/event-stream` reassembly.
//!
//! HTTP chunk boundaries fall anywhere — mid-line, mid-UTF-8-sequence — so
//! bytes are buffered until a full line is available and only `data:` fields
//! are surfaced. Comment lines, `event:` fields, and blank event separators
//! are dropped.

/// Splits raw byte chunks into SSE `data:` payloads.
#[derive(Debug, Default)]
pub struct SseLineBuffer {
    buf: Vec<u8>,
}

impl SseLineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk, returning the `data:` payloads of every line it
    /// completed. Partial trailing lines stay buffered for the next chunk.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);

        let mut payloads = Vec::new();
        while let Some(newline) = self.buf.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=newline).collect();
            let line = String::from_utf8_lossy(&line);
            let line = line.trim_end_matches(['\n', '\r']);
            if let Some(data) = line.strip_prefix("data:") {
                payloads.push(data.trim_start().to_string());
            }
        }
        payloads
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_event_in_one_chunk() {
        let mut buf = SseLineBuffer::new();
        assert_eq!(
            buf.push(b"data: {\"x\":1}\n\n"),
            vec!["{\"x\":1}".to_string()]
        );
    }

    #[test]
    fn line_split_across_chunks() {
        let mut buf = SseLineBuffer::new();
        assert!(buf.push(b"data: {\"x\"").is_empty());
        assert_eq!(buf.push(b":1}\n"), vec!["{\"x\":1}".to_string()]);
    }

    #[test]
    fn multiple_events_per_chunk() {
        let mut buf = SseLineBuffer::new();
        assert_eq!(
            buf.push(b"data: a\n\ndata: b\n\n"),
            vec!["a".to_string(), "b".to_string()]
        );
    }

    #[test]
    fn non_data_lines_dropped() {
        let mut buf = SseLineBuffer::new();
        assert!(buf
            .push(b": keep-alive\nevent: message\nid: 3\n\n")
            .is_empty());
    }

    #[test]
    fn crlf_terminated_lines() {
        let mut buf = SseLineBuffer::new();
        assert_eq!(buf.push(b"data: hello\r\n"), vec!["hello".to_string()]);
    }

    #[test]
    fn utf8_sequence_split_across_chunks() {
        let mut buf = SseLineBuffer::new();
        let line = "data: 你好\n".as_bytes();
        // Split inside the first multi-byte character.
        assert!(buf.push(&line[..8]).is_empty());
        assert_eq!(buf.push(&line[8..]), vec!["你好".to_string()]);
    }

    #[test]
    fn done_marker_passes_through() {
        let mut buf = SseLineBuffer::new();
        assert_eq!(buf.push(b"data: [DONE]\n\n"), vec!["[DONE]".to_string()]);
    }
}
