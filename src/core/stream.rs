//! Incremental reader for JSON array bodies delivered in chunks.
//!
//! Chunks are appended to a buffer and a full parse is attempted whenever the
//! buffer could be a complete array. Only a successful array parse replaces
//! the visible rows; partial buffers are expected and simply keep buffering.

use crate::utils::error::{ReportError, Result};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Buffering,
    CompleteArray,
    /// 語法錯誤或非陣列文件，之後的 chunk 一律忽略
    Failed,
}

#[derive(Debug)]
pub struct StreamingArrayParser {
    buffer: Vec<u8>,
    state: StreamState,
    latest: Option<Vec<Value>>,
    error: Option<String>,
}

impl Default for StreamingArrayParser {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamingArrayParser {
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            state: StreamState::Buffering,
            latest: None,
            error: None,
        }
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    pub fn latest(&self) -> Option<&[Value]> {
        self.latest.as_deref()
    }

    pub fn buffered_bytes(&self) -> usize {
        self.buffer.len()
    }

    /// Appends a chunk. Returns the freshly parsed array when this chunk
    /// completed one, `None` otherwise.
    pub fn push(&mut self, chunk: &[u8]) -> Option<&[Value]> {
        if self.state == StreamState::Failed || chunk.is_empty() {
            return None;
        }
        self.buffer.extend_from_slice(chunk);

        // 結尾不是 ']' 就不可能是完整陣列，省掉一次完整解析
        let ends_with_bracket = self
            .buffer
            .iter()
            .rev()
            .find(|b| !b.is_ascii_whitespace())
            == Some(&b']');
        if !ends_with_bracket {
            self.state = StreamState::Buffering;
            return None;
        }

        match serde_json::from_slice::<Value>(&self.buffer) {
            Ok(Value::Array(items)) => {
                tracing::trace!("📦 parsed {} items from {} bytes", items.len(), self.buffer.len());
                self.state = StreamState::CompleteArray;
                self.latest = Some(items);
                self.latest.as_deref()
            }
            Ok(_) => {
                self.fail("payload is not a JSON array".to_string());
                None
            }
            Err(e) if e.is_eof() => {
                self.state = StreamState::Buffering;
                None
            }
            Err(e) => {
                self.fail(e.to_string());
                None
            }
        }
    }

    /// Consumes the parser at end of stream. The last complete array wins;
    /// a stream that never produced one is an error.
    pub fn finish(mut self) -> Result<Vec<Value>> {
        if self.state == StreamState::Buffering && !self.buffer.is_empty() {
            // 結尾剩空白以外的東西時再試一次，給出比較精確的錯誤
            if let Err(e) = serde_json::from_slice::<Value>(&self.buffer) {
                self.error.get_or_insert_with(|| e.to_string());
            }
        }

        match self.latest {
            Some(items) => Ok(items),
            None => Err(ReportError::MalformedStream {
                message: self
                    .error
                    .unwrap_or_else(|| "stream ended before a complete array was received".to_string()),
            }),
        }
    }

    fn fail(&mut self, message: String) {
        tracing::warn!("⚠️ Streamed payload can no longer be parsed: {}", message);
        self.state = StreamState::Failed;
        self.error = Some(message);
    }
}
