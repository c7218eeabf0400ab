//! Incremental SSE decoding for OpenAI-compatible streams
//!
//! Upstream providers emit newline-delimited `data: <json>` records
//! terminated by a `data: [DONE]` sentinel. This module turns raw
//! network chunks into content fragments:
//! - bytes are buffered and only complete lines are decoded, so a
//!   multi-byte UTF-8 character or the sentinel split across two reads
//!   is handled correctly
//! - non-`data:` lines (comments, heartbeats, event names) are ignored
//! - a line that fails to parse, or parses but carries no content
//!   fragment, is skipped without aborting the stream

use serde_json::Value;

/// One normalized content fragment
///
/// Concatenating `text` in emission order yields the full response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenDelta {
    pub text: String,
}

/// Encode a delta in the normalized wire envelope the relay exposes
/// to its callers: `data: {"content": "<fragment>"}\n\n`.
pub fn encode_envelope(delta: &TokenDelta) -> String {
    format!("data: {}\n\n", serde_json::json!({ "content": delta.text }))
}

/// Stateful decoder for one upstream SSE stream
#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: Vec<u8>,
    done: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the `[DONE]` sentinel has been seen
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Feed one network chunk, returning the deltas it completed
    ///
    /// Chunks may split lines, multi-byte characters, or the sentinel
    /// at arbitrary byte positions.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<TokenDelta> {
        let mut deltas = Vec::new();
        if self.done {
            return deltas;
        }
        self.buf.extend_from_slice(chunk);

        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            if self.done {
                continue;
            }
            if let Some(delta) = self.decode_line(&line) {
                deltas.push(delta);
            }
        }

        deltas
    }

    /// Flush any trailing unterminated line at end of stream
    pub fn finish(&mut self) -> Vec<TokenDelta> {
        let mut deltas = Vec::new();
        if self.done || self.buf.is_empty() {
            self.buf.clear();
            return deltas;
        }
        let line: Vec<u8> = std::mem::take(&mut self.buf);
        if let Some(delta) = self.decode_line(&line) {
            deltas.push(delta);
        }
        deltas
    }

    fn decode_line(&mut self, line: &[u8]) -> Option<TokenDelta> {
        // A newline byte is never part of a multi-byte UTF-8 sequence,
        // so complete lines decode independently. Invalid bytes make
        // this one malformed line get skipped, nothing more.
        let line = std::str::from_utf8(line).ok()?;
        // SSE frames the field as "data:" with one optional leading
        // space before the value; some gateways omit the space.
        let data = line.strip_prefix("data:")?;
        let data = data
            .strip_prefix(' ')
            .unwrap_or(data)
            .trim_end_matches(['\r', '\n']);

        if data == "[DONE]" {
            self.done = true;
            return None;
        }

        let value: Value = serde_json::from_str(data).ok()?;
        extract_content(&value)
            .filter(|text| !text.is_empty())
            .map(|text| TokenDelta { text })
    }
}

/// Extract the content fragment from an OpenAI-shaped streaming record
///
/// Chunks look like:
/// ```json
/// {"id":"chatcmpl-123","choices":[{"index":0,"delta":{"content":"Hello"}}]}
/// ```
fn extract_content(value: &Value) -> Option<String> {
    value
        .get("choices")?
        .get(0)?
        .get("delta")?
        .get("content")?
        .as_str()
        .map(|s| s.to_string())
}
