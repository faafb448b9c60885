//! Incremental `text/event-stream` decoder.
//!
//! Follows the EventSource processing model: a blank line dispatches the
//! buffered event, `data:` lines accumulate joined by `\n`, lines starting
//! with `:` are comments (server pings), and LF, CR or CRLF end a line.
//! Chunks may split lines and UTF-8 sequences anywhere.

use std::time::Duration;

/// Event type assigned when no `event:` field was sent.
pub const DEFAULT_EVENT: &str = "message";

/// Longest line kept; longer lines are discarded up to their terminator.
pub const MAX_LINE: usize = 1 << 20;

const BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    pub event: String,
    pub data: String,
    /// Last event id seen on the stream at dispatch time.
    pub id: Option<String>,
}

#[derive(Debug, Default)]
pub struct SseDecoder {
    line: Vec<u8>,
    after_cr: bool,
    /// Current line exceeded [`MAX_LINE`] and is being skipped.
    oversized: bool,
    /// First line of the stream has been seen (BOM already handled).
    started: bool,
    data: String,
    event: Option<String>,
    last_event_id: Option<String>,
    retry: Option<Duration>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes; returns every event completed by this chunk.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        let mut out = Vec::new();
        for &b in chunk {
            if self.after_cr {
                self.after_cr = false;
                if b == b'\n' {
                    continue;
                }
            }
            match b {
                b'\n' => self.finish_line(&mut out),
                b'\r' => {
                    self.finish_line(&mut out);
                    self.after_cr = true;
                }
                _ if self.oversized => {}
                _ if self.line.len() >= MAX_LINE => {
                    tracing::warn!(limit = MAX_LINE, "event stream line too long; discarding");
                    self.line.clear();
                    self.oversized = true;
                }
                _ => self.line.push(b),
            }
        }
        out
    }

    pub fn last_event_id(&self) -> Option<&str> {
        self.last_event_id.as_deref()
    }

    /// Reconnection delay requested by the server, if it sent one since the last call.
    pub fn take_retry(&mut self) -> Option<Duration> {
        self.retry.take()
    }

    /// Forget any half-received event. The last event id survives reconnects.
    pub fn reset(&mut self) {
        self.line.clear();
        self.after_cr = false;
        self.oversized = false;
        self.started = false;
        self.data.clear();
        self.event = None;
    }

    fn finish_line(&mut self, out: &mut Vec<SseEvent>) {
        if std::mem::take(&mut self.oversized) {
            return;
        }
        let mut bytes = self.line.as_slice();
        if !std::mem::replace(&mut self.started, true) {
            bytes = bytes.strip_prefix(BOM).unwrap_or(bytes);
        }
        let line = String::from_utf8_lossy(bytes).into_owned();
        self.line.clear();

        if line.is_empty() {
            self.dispatch(out);
            return;
        }
        if line.starts_with(':') {
            return;
        }

        let (field, value) = match line.find(':') {
            Some(i) => {
                let value = &line[i + 1..];
                (&line[..i], value.strip_prefix(' ').unwrap_or(value))
            }
            None => (line.as_str(), ""),
        };

        match field {
            "data" => {
                self.data.push_str(value);
                self.data.push('\n');
            }
            "event" => self.event = Some(value.to_string()),
            "id" if !value.contains('\0') => self.last_event_id = Some(value.to_string()),
            "retry" => {
                if let Ok(ms) = value.parse::<u64>() {
                    self.retry = Some(Duration::from_millis(ms));
                }
            }
            _ => {}
        }
    }

    fn dispatch(&mut self, out: &mut Vec<SseEvent>) {
        let event = self.event.take();
        if self.data.is_empty() {
            return;
        }
        let mut data = std::mem::take(&mut self.data);
        data.pop();
        out.push(SseEvent {
            event: event
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| DEFAULT_EVENT.to_string()),
            data,
            id: self.last_event_id.clone(),
        });
    }
}
