//! Line-oriented decoder for streamed chat completions
//!
//! Wire convention: each event is one line `data: <json>`, the stream ends
//! with `data: [DONE]`. Models that inline their reasoning wrap it in
//! `<think>` / `</think>`, each sent as its own content fragment.

use crate::types::openai::{ChatCompletionChunk, DeltaFragments};
use log::{error, trace};
use mason_core_types::StreamEvent;

pub const DATA_PREFIX: &str = "data: ";
pub const DONE_SENTINEL: &str = "[DONE]";
pub const THINK_OPEN_MARKER: &str = "<think>";
pub const THINK_CLOSE_MARKER: &str = "</think>";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DecodeStats {
    /// Complete lines taken off the buffer
    pub lines: usize,
    pub events: usize,
    /// `data: ` lines whose payload was not valid JSON
    pub malformed: usize,
}

/// Incremental decoder state for one response.
///
/// Chunks may split a line (or a UTF-8 sequence) anywhere; bytes after the
/// last newline are carried over to the next `feed`.
#[derive(Debug, Default)]
pub struct StreamDecoder {
    buffer: Vec<u8>,
    in_reasoning_block: bool,
    stats: DecodeStats,
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_reasoning_block(&self) -> bool {
        self.in_reasoning_block
    }

    pub fn stats(&self) -> DecodeStats {
        self.stats
    }

    /// Appends a chunk and decodes every line it completes.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        self.buffer.extend_from_slice(chunk);

        let Some(last_newline) = self.buffer.iter().rposition(|byte| *byte == b'\n') else {
            return Vec::new();
        };
        let carry_over = self.buffer.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.buffer, carry_over);

        // `complete` ends with '\n', so the final split piece is empty and skipped.
        let mut events = Vec::new();
        for line in complete[..last_newline].split(|byte| *byte == b'\n') {
            self.stats.lines += 1;
            if let Some(event) = self.decode_line(line) {
                self.stats.events += 1;
                events.push(event);
            }
        }
        events
    }

    /// Ends the response. A trailing line without newline is dropped.
    pub fn finish(&mut self) -> DecodeStats {
        if !self.buffer.is_empty() {
            trace!(
                "Discarding unterminated stream line: {:?}",
                String::from_utf8_lossy(&self.buffer)
            );
            self.buffer.clear();
        }
        self.stats
    }

    fn decode_line(&mut self, raw: &[u8]) -> Option<StreamEvent> {
        let line = String::from_utf8_lossy(raw);
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            return None;
        }

        let payload = line.strip_prefix(DATA_PREFIX)?;
        if payload.trim() == DONE_SENTINEL {
            return None;
        }

        trace!("Chat SSE: {:?}", payload);
        let chunk: ChatCompletionChunk = match serde_json::from_str(payload) {
            Ok(chunk) => chunk,
            Err(e) => {
                error!("Skipping malformed stream line: {}, data: {}", e, payload);
                self.stats.malformed += 1;
                return None;
            }
        };

        self.classify(chunk.into_fragments())
    }

    /// Applies the marker convention to one fragment pair.
    ///
    /// A content fragment holding a marker is dropped whole, including any
    /// text sharing the fragment with it.
    pub fn classify(&mut self, fragments: DeltaFragments) -> Option<StreamEvent> {
        let DeltaFragments { content, reasoning } = fragments;

        if content.contains(THINK_OPEN_MARKER) {
            self.in_reasoning_block = true;
            return None;
        }
        if content.contains(THINK_CLOSE_MARKER) {
            self.in_reasoning_block = false;
            return None;
        }

        let is_reasoning = self.in_reasoning_block || !reasoning.is_empty();
        let text = if content.is_empty() { reasoning } else { content };
        if text.is_empty() {
            return None;
        }

        Some(StreamEvent { text, is_reasoning })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content_line(text: &str) -> String {
        format!(
            "data: {}\n",
            serde_json::json!({ "choices": [{ "delta": { "content": text } }] })
        )
    }

    fn fold(events: &[StreamEvent]) -> (String, String) {
        let mut answer = String::new();
        let mut reasoning = String::new();
        for event in events {
            if event.is_reasoning {
                reasoning.push_str(&event.text);
            } else {
                answer.push_str(&event.text);
            }
        }
        (answer, reasoning)
    }

    fn sample_stream() -> String {
        [
            content_line("<think>"),
            content_line("hmm"),
            content_line("</think>"),
            content_line("Hello"),
            "data: [DONE]\n".to_string(),
        ]
        .concat()
    }

    #[test]
    fn separates_think_block_from_answer() {
        let mut decoder = StreamDecoder::new();
        let events = decoder.feed(sample_stream().as_bytes());

        assert_eq!(
            events,
            vec![StreamEvent::reasoning("hmm"), StreamEvent::answer("Hello")]
        );
        assert_eq!(
            fold(&events),
            ("Hello".to_string(), "hmm".to_string())
        );
        assert!(!decoder.in_reasoning_block());
    }

    #[test]
    fn marker_lines_emit_nothing_and_flip_mode() {
        let mut decoder = StreamDecoder::new();

        assert!(decoder.feed(content_line("<think>").as_bytes()).is_empty());
        assert!(decoder.in_reasoning_block());

        assert_eq!(
            decoder.feed(content_line("step one").as_bytes()),
            vec![StreamEvent::reasoning("step one")]
        );

        assert!(decoder.feed(content_line("</think>").as_bytes()).is_empty());
        assert!(!decoder.in_reasoning_block());
    }

    #[test]
    fn result_is_independent_of_chunk_boundaries() {
        let stream = sample_stream();
        let bytes = stream.as_bytes();
        let expected = fold(&StreamDecoder::new().feed(bytes));

        for split in 0..=bytes.len() {
            let mut decoder = StreamDecoder::new();
            let mut events = decoder.feed(&bytes[..split]);
            events.extend(decoder.feed(&bytes[split..]));
            decoder.finish();
            assert_eq!(fold(&events), expected, "split at {split}");
        }

        let mut decoder = StreamDecoder::new();
        let events: Vec<_> = bytes
            .iter()
            .flat_map(|byte| decoder.feed(std::slice::from_ref(byte)))
            .collect();
        assert_eq!(fold(&events), expected);
    }

    #[test]
    fn reassembles_utf8_split_across_chunks() {
        let line = content_line("你好");
        let bytes = line.as_bytes();
        let split = line.find('你').expect("char present") + 1;

        let mut decoder = StreamDecoder::new();
        assert!(decoder.feed(&bytes[..split]).is_empty());
        assert_eq!(
            decoder.feed(&bytes[split..]),
            vec![StreamEvent::answer("你好")]
        );
    }

    #[test]
    fn malformed_line_does_not_interrupt_stream() {
        let stream = [
            content_line("one "),
            "data: {\"choices\": [\n".to_string(),
            content_line("two"),
        ]
        .concat();

        let mut decoder = StreamDecoder::new();
        let events = decoder.feed(stream.as_bytes());

        assert_eq!(fold(&events).0, "one two");
        assert_eq!(decoder.stats().malformed, 1);
        assert_eq!(decoder.stats().events, 2);
    }

    #[test]
    fn ignores_blank_unprefixed_and_sentinel_lines() {
        let stream = "\n   \r\n: keep-alive\nevent: ping\ndata: [DONE]\r\n";
        let mut decoder = StreamDecoder::new();

        assert!(decoder.feed(stream.as_bytes()).is_empty());
        assert_eq!(decoder.stats().malformed, 0);
        assert_eq!(decoder.stats().lines, 5);
    }

    #[test]
    fn null_choice_is_an_empty_delta_not_a_malformed_line() {
        let mut decoder = StreamDecoder::new();

        assert!(decoder.feed(b"data: {\"choices\":[null]}\n").is_empty());
        assert_eq!(decoder.stats().lines, 1);
        assert_eq!(decoder.stats().malformed, 0);
    }

    #[test]
    fn accepts_crlf_line_endings() {
        let line = content_line("hi").replace('\n', "\r\n");
        let mut decoder = StreamDecoder::new();
        assert_eq!(decoder.feed(line.as_bytes()), vec![StreamEvent::answer("hi")]);
    }

    #[test]
    fn reasoning_delta_is_tagged_as_reasoning() {
        let line = format!(
            "data: {}\n",
            serde_json::json!({ "choices": [{ "delta": { "reasoning_content": "ponder" } }] })
        );
        let mut decoder = StreamDecoder::new();

        assert_eq!(
            decoder.feed(line.as_bytes()),
            vec![StreamEvent::reasoning("ponder")]
        );
        assert!(!decoder.in_reasoning_block());
    }

    #[test]
    fn content_wins_over_reasoning_delta_but_is_tagged_reasoning() {
        let mut decoder = StreamDecoder::new();
        let event = decoder.classify(DeltaFragments {
            content: "both".to_string(),
            reasoning: "side".to_string(),
        });
        assert_eq!(event, Some(StreamEvent::reasoning("both")));
    }

    #[test]
    fn marker_sharing_a_fragment_with_text_drops_the_text() {
        let mut decoder = StreamDecoder::new();
        let event = decoder.classify(DeltaFragments {
            content: "<think>partial".to_string(),
            reasoning: String::new(),
        });
        assert!(event.is_none());
        assert!(decoder.in_reasoning_block());
    }

    #[test]
    fn empty_fragments_are_not_emitted() {
        let mut decoder = StreamDecoder::new();
        assert!(decoder.classify(DeltaFragments::default()).is_none());
        assert_eq!(decoder.feed(content_line("").as_bytes()), Vec::new());
    }

    #[test]
    fn finish_discards_unterminated_line() {
        let line = content_line("tail");
        let mut decoder = StreamDecoder::new();

        assert!(decoder.feed(line.trim_end().as_bytes()).is_empty());
        let stats = decoder.finish();
        assert_eq!(stats.events, 0);
        assert!(decoder.feed(b"\n").is_empty());
    }
}
