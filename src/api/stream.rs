use super::logging::emit_sse_parse_error;
use crate::types::{ChatCompletionChunk, StreamEvent};
use anyhow::Result;

const DONE_SENTINEL: &str = "[DONE]";

/// Incremental decoder for a chat-completions SSE byte stream.
///
/// Frames may be split across network chunks in any position, including
/// inside a multi-byte character; bytes are held until a full frame arrives.
#[derive(Default)]
pub struct StreamParser {
    pending: Vec<u8>,
    buffer: String,
    done: bool,
}

impl StreamParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn process(&mut self, chunk: &[u8]) -> Result<Vec<StreamEvent>> {
        self.pending.extend_from_slice(chunk);
        let decoded = self.decode_pending();
        // Raw carriage returns only occur as line terminators; JSON escapes them.
        self.buffer.push_str(&decoded.replace('\r', ""));

        let mut events = Vec::new();
        let mut start = 0;

        while let Some(end) = self.buffer[start..].find("\n\n") {
            let frame_end = start + end + 2;
            let frame = self.buffer[start..frame_end].to_string();
            self.decode_frame(&frame, &mut events);
            start = frame_end;
        }

        if start > 0 {
            self.buffer.drain(..start);
        }

        Ok(events)
    }

    /// Take every decodable byte out of `pending`. Invalid sequences become
    /// U+FFFD one at a time; an incomplete character at the end stays
    /// pending for the next chunk.
    fn decode_pending(&mut self) -> String {
        let mut decoded = String::new();
        let mut pos = 0;
        while pos < self.pending.len() {
            match std::str::from_utf8(&self.pending[pos..]) {
                Ok(text) => {
                    decoded.push_str(text);
                    pos = self.pending.len();
                }
                Err(err) => {
                    let valid_end = pos + err.valid_up_to();
                    decoded.push_str(&String::from_utf8_lossy(&self.pending[pos..valid_end]));
                    match err.error_len() {
                        Some(len) => {
                            decoded.push(char::REPLACEMENT_CHARACTER);
                            pos = valid_end + len;
                        }
                        None => {
                            pos = valid_end;
                            break;
                        }
                    }
                }
            }
        }
        self.pending.drain(..pos);
        decoded
    }

    /// Decode whatever is left once the transport closes. Gateways do not
    /// always terminate the last frame with a blank line.
    pub fn flush(&mut self) -> Vec<StreamEvent> {
        let mut rest = std::mem::take(&mut self.buffer);
        if !self.pending.is_empty() {
            rest.push_str(&String::from_utf8_lossy(&std::mem::take(&mut self.pending)));
        }
        let mut events = Vec::new();
        if !rest.trim().is_empty() {
            self.decode_frame(&rest, &mut events);
        }
        events
    }

    fn decode_frame(&mut self, frame: &str, events: &mut Vec<StreamEvent>) {
        let data_lines: Vec<&str> = frame
            .lines()
            .filter(|line| !line.starts_with(':'))
            .filter_map(|line| line.strip_prefix("data:"))
            .map(|rest| rest.strip_prefix(' ').unwrap_or(rest))
            .collect();
        if data_lines.is_empty() {
            return;
        }

        let data = data_lines.join("\n");
        let data = data.trim();
        if data == DONE_SENTINEL {
            if !self.done {
                self.done = true;
                events.push(StreamEvent::Done);
            }
            return;
        }

        match serde_json::from_str::<ChatCompletionChunk>(data) {
            Ok(chunk) => {
                for choice in chunk.choices {
                    if let Some(text) = choice.delta.content.filter(|text| !text.is_empty()) {
                        events.push(StreamEvent::Delta(text));
                    }
                }
            }
            Err(err) => emit_sse_parse_error(data, &err),
        }
    }
}
