use serde::Deserialize;
use serde_json::Value;

use crate::constants::GENERATION_FAILED_MESSAGE;
use crate::models::StreamEvent;

/// Wire shape of a `data:` payload. Anything that deserializes into this
/// becomes a [`StreamEvent`]; valid JSON of any other shape is dropped,
/// matching how the server interleaves status frames the client never acts on.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WirePayload {
    Chunk {
        #[serde(default)]
        content: Option<String>,
    },
    Error {
        #[serde(default)]
        message: Option<String>,
        #[serde(default)]
        code: Option<String>,
    },
    Done,
}

/// Incremental decoder for the newline-delimited `event:`/`data:` framing
/// used by the generation endpoint.
///
/// Fragments may split lines and multi-byte UTF-8 sequences at arbitrary
/// byte boundaries; incomplete trailing bytes are carried over until the
/// next `feed` (or `close`) completes the line. After a terminal event
/// (`Error` or `Done`) the decoder latches and discards everything else,
/// so a stream never yields more than one terminal event.
#[derive(Debug, Default)]
pub struct SseDecoder {
    carry: Vec<u8>,
    finished: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A terminal event has been produced; later input is meaningless
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Buffer `fragment` and decode every line completed by it
    pub fn feed(&mut self, fragment: &[u8]) -> Vec<StreamEvent> {
        if self.finished {
            return Vec::new();
        }

        self.carry.extend_from_slice(fragment);

        let mut events = Vec::new();
        while let Some(pos) = self.carry.iter().position(|&b| b == b'\n') {
            let line_bytes: Vec<u8> = self.carry.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line_bytes[..line_bytes.len() - 1]);

            if let Some(event) = self.decode_line(&line) {
                self.finished = event.is_terminal();
                events.push(event);
                if self.finished {
                    self.carry.clear();
                    break;
                }
            }
        }
        events
    }

    /// Flush the residual carry-over as a final line; the stream is not
    /// required to end with a newline.
    pub fn close(&mut self) -> Vec<StreamEvent> {
        if self.finished || self.carry.is_empty() {
            self.carry.clear();
            return Vec::new();
        }

        let tail = std::mem::take(&mut self.carry);
        let line = String::from_utf8_lossy(&tail);
        match self.decode_line(&line) {
            Some(event) => {
                self.finished = event.is_terminal();
                vec![event]
            }
            None => Vec::new(),
        }
    }

    fn decode_line(&self, line: &str) -> Option<StreamEvent> {
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            return None;
        }

        // Event-type framing is reserved; it never reaches consumers
        if line.starts_with("event:") {
            return None;
        }

        let payload = line.strip_prefix("data:")?.trim();

        match serde_json::from_str::<Value>(payload) {
            Ok(value) => Self::classify(value),
            // Not JSON at all: degrade to plain text instead of failing,
            // some backends stream unframed lines
            Err(_) => {
                if payload.is_empty() {
                    None
                } else {
                    Some(StreamEvent::RawText {
                        content: payload.to_string(),
                    })
                }
            }
        }
    }

    fn classify(value: Value) -> Option<StreamEvent> {
        match serde_json::from_value::<WirePayload>(value) {
            // A chunk must carry text; empty chunks would produce spurious appends
            Ok(WirePayload::Chunk { content }) => content
                .filter(|content| !content.is_empty())
                .map(|content| StreamEvent::Chunk { content }),
            Ok(WirePayload::Error { message, code }) => Some(StreamEvent::Error {
                message: message
                    .filter(|message| !message.is_empty())
                    .unwrap_or_else(|| GENERATION_FAILED_MESSAGE.to_string()),
                code,
            }),
            Ok(WirePayload::Done) => Some(StreamEvent::Done),
            Err(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn reassembles_lines_split_across_fragments() {
        let mut decoder = SseDecoder::new();

        let first = decoder.feed(b"data: {\"typ");
        assert_eq!(first, vec![]);

        let second = decoder.feed(b"e\":\"chunk\",\"content\":\"ab\"}\n");
        assert_eq!(
            second,
            vec![StreamEvent::Chunk {
                content: "ab".to_string()
            }]
        );
    }

    #[test]
    fn reassembles_multibyte_utf8_split_mid_character() {
        let line = "data: {\"type\":\"chunk\",\"content\":\"안녕\"}\n";
        let bytes = line.as_bytes();
        // Split one byte into the first multi-byte character
        let split = line.find('안').unwrap() + 1;

        let mut decoder = SseDecoder::new();
        assert_eq!(decoder.feed(&bytes[..split]), vec![]);
        assert_eq!(
            decoder.feed(&bytes[split..]),
            vec![StreamEvent::Chunk {
                content: "안녕".to_string()
            }]
        );
    }

    #[test]
    fn falls_back_to_raw_text_for_invalid_json() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(b"data: not-json\n");
        assert_eq!(
            events,
            vec![StreamEvent::RawText {
                content: "not-json".to_string()
            }]
        );
        // Raw text appends exactly like a chunk would
        assert_eq!(events[0].text(), Some("not-json"));
        assert!(!events[0].is_terminal());
    }

    #[test]
    fn ignores_event_type_lines() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(b"event: custom\ndata: {\"type\":\"done\"}\n");
        assert_eq!(events, vec![StreamEvent::Done]);
    }

    #[test]
    fn suppresses_chunks_without_content() {
        let mut decoder = SseDecoder::new();
        assert_eq!(decoder.feed(b"data: {\"type\":\"chunk\"}\n"), vec![]);
        assert_eq!(
            decoder.feed(b"data: {\"type\":\"chunk\",\"content\":\"\"}\n"),
            vec![]
        );
    }

    #[test]
    fn ignores_valid_json_of_unknown_shape() {
        let mut decoder = SseDecoder::new();
        assert_eq!(
            decoder.feed(b"data: {\"step\":\"saving_history\",\"message\":\"...\"}\n"),
            vec![]
        );
        assert_eq!(decoder.feed(b"data: {\"type\":\"status\"}\n"), vec![]);
        assert_eq!(decoder.feed(b"data: \"quoted\"\n"), vec![]);
    }

    #[test]
    fn ignores_blank_and_unframed_lines() {
        let mut decoder = SseDecoder::new();
        assert_eq!(decoder.feed(b"\n\nretry: 100\n: comment\n"), vec![]);
    }

    #[test]
    fn emits_at_most_one_terminal_event() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(
            b"data: {\"type\":\"done\"}\ndata: {\"type\":\"chunk\",\"content\":\"late\"}\ndata: {\"type\":\"done\"}\n",
        );
        assert_eq!(events, vec![StreamEvent::Done]);
        assert!(decoder.is_finished());

        // Later fragments from the same logical stream are discarded
        assert_eq!(
            decoder.feed(b"data: {\"type\":\"chunk\",\"content\":\"x\"}\n"),
            vec![]
        );
        assert_eq!(decoder.close(), vec![]);
    }

    #[test]
    fn error_event_carries_message_and_code() {
        let mut decoder = SseDecoder::new();
        let events = decoder
            .feed(b"data: {\"type\":\"error\",\"message\":\"quota exceeded\",\"code\":\"INSUFFICIENT_BALANCE\"}\n");
        assert_eq!(
            events,
            vec![StreamEvent::Error {
                message: "quota exceeded".to_string(),
                code: Some("INSUFFICIENT_BALANCE".to_string()),
            }]
        );
        assert!(decoder.is_finished());
    }

    #[test]
    fn error_event_without_message_uses_fallback() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(b"data: {\"type\":\"error\"}\n");
        assert_eq!(
            events,
            vec![StreamEvent::Error {
                message: GENERATION_FAILED_MESSAGE.to_string(),
                code: None,
            }]
        );
    }

    #[test]
    fn close_flushes_residual_line_without_newline() {
        let mut decoder = SseDecoder::new();
        assert_eq!(
            decoder.feed(b"data: {\"type\":\"chunk\",\"content\":\"tail\"}"),
            vec![]
        );
        assert_eq!(
            decoder.close(),
            vec![StreamEvent::Chunk {
                content: "tail".to_string()
            }]
        );
    }

    #[test]
    fn handles_crlf_line_endings() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(b"data: {\"type\":\"chunk\",\"content\":\"a\"}\r\n");
        assert_eq!(
            events,
            vec![StreamEvent::Chunk {
                content: "a".to_string()
            }]
        );
    }

    #[test]
    fn decodes_interleaved_frames_in_order() {
        let mut decoder = SseDecoder::new();
        let mut events = decoder.feed(b"data: {\"type\":\"chunk\",\"content\":\"def \"}\n");
        events.extend(decoder.feed(b"event: status\ndata: {\"step\":\"saving_history\"}\n"));
        events.extend(decoder.feed(b"data: {\"type\":\"chunk\",\"content\":\"f(): pass\"}\n"));
        events.extend(decoder.feed(b"data: {\"type\":\"done\"}\n"));

        assert_eq!(
            events,
            vec![
                StreamEvent::Chunk {
                    content: "def ".to_string()
                },
                StreamEvent::Chunk {
                    content: "f(): pass".to_string()
                },
                StreamEvent::Done,
            ]
        );
    }
}
