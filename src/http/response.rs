//! Synthetic outbound HTTP message: a write-capturing response sink.
//!
//! Real HTTP stacks serialize a status line and header block onto the wire
//! before any body bytes. This sink has no wire, so every write funnels
//! through one low-level interception point that parses the header/body
//! boundary back out of the byte stream, while the structured header store
//! stays the source of truth for header values. The raw text is only ever
//! used to locate the boundary.

use crate::http::headers::{HeaderMap, HeaderValue};
use bytes::Bytes;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;

/// Canonical header/body separator in serialized HTTP.
const HEADER_END: &[u8] = b"\r\n\r\n";

/// Completion channels a handler may signal through. Different handler
/// implementations finish through different channels; the completion
/// bridge treats the first of any of them as authoritative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionSignal {
    End,
    Finish,
    Error(String),
}

#[derive(Debug)]
struct ResponseState {
    status: u16,
    request_method: String,
    /// Structured store for headers set before the header block is sent.
    headers: HeaderMap,
    /// Headers set after the block is considered sent. Kept separate so
    /// late mutations stay visible to the response mapper.
    late_headers: HeaderMap,
    body: Vec<Bytes>,
    header_sent: bool,
    /// Raw header material accumulating toward the separator. `None` until
    /// header serialization has begun; raw writes before that are body.
    header_buf: Option<Vec<u8>>,
    ended: bool,
    settled: Option<CompletionSignal>,
}

impl ResponseState {
    /// The single low-level write funnel.
    ///
    /// Once the header block has been located, or while no header block is
    /// being serialized at all, data is body content. Otherwise it is
    /// header material: accumulate and search for the separator; anything
    /// after the separator in the same chunk is body. The search is
    /// byte-level so arbitrary chunk splits and binary remainders survive
    /// losslessly.
    fn raw_write(&mut self, data: Bytes) {
        match self.header_buf {
            Some(ref mut buf) if !self.header_sent => {
                buf.extend_from_slice(&data);
                if let Some(index) = find_header_end(buf) {
                    let remainder = buf.split_off(index + HEADER_END.len());
                    if !remainder.is_empty() {
                        self.body.push(Bytes::from(remainder));
                    }
                    // Header text is discarded; the structured store is
                    // the source of truth for header values.
                    buf.clear();
                    self.header_sent = true;
                }
            }
            _ => self.body.push(data),
        }
    }

    /// Serialize the status line and structured headers through the raw
    /// funnel, emulating the transport sending the header block. No-op
    /// once the block has been located.
    fn flush_header_block(&mut self) {
        if self.header_sent {
            return;
        }
        let block = self.serialize_header_block();
        self.header_buf.get_or_insert_with(Vec::new);
        self.raw_write(Bytes::from(block));
    }

    fn serialize_header_block(&self) -> Vec<u8> {
        let mut block = format!("HTTP/1.1 {}\r\n", self.status).into_bytes();
        for (name, value) in &self.headers {
            for v in value.values() {
                block.extend_from_slice(format!("{name}: {v}\r\n").as_bytes());
            }
        }
        block.extend_from_slice(b"\r\n");
        block
    }

    fn set_header(&mut self, name: String, value: HeaderValue) {
        let name = name.to_ascii_lowercase();
        if self.header_sent {
            self.late_headers.insert(name, value);
        } else {
            self.headers.insert(name, value);
        }
    }
}

fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(HEADER_END.len()).position(|w| w == HEADER_END)
}

/// Write-capturing response sink handed to the handler.
///
/// Cloneable handle over shared state: the handler receives one clone, the
/// adapter keeps another for finalization. Owned exclusively by a single
/// invocation; never reused.
#[derive(Debug, Clone)]
pub struct VergeResponse {
    state: Arc<Mutex<ResponseState>>,
    signals: broadcast::Sender<CompletionSignal>,
}

impl VergeResponse {
    /// Create a fresh sink bound to the request method it answers.
    pub fn new(request_method: impl Into<String>) -> Self {
        let (signals, _) = broadcast::channel(8);
        Self {
            state: Arc::new(Mutex::new(ResponseState {
                status: 200,
                request_method: request_method.into(),
                headers: HeaderMap::new(),
                late_headers: HeaderMap::new(),
                body: Vec::new(),
                header_sent: false,
                header_buf: None,
                ended: false,
                settled: None,
            })),
            signals,
        }
    }

    fn lock(&self) -> MutexGuard<'_, ResponseState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Method of the request this response answers.
    pub fn request_method(&self) -> String {
        self.lock().request_method.clone()
    }

    /// Current status code (200 until explicitly set).
    pub fn status(&self) -> u16 {
        self.lock().status
    }

    /// Assign the status code.
    pub fn set_status(&self, status: u16) {
        self.lock().status = status;
    }

    /// Whether the header block has been located in the write stream.
    pub fn header_sent(&self) -> bool {
        self.lock().header_sent
    }

    /// Whether the handler has signaled the end of the response.
    pub fn is_ended(&self) -> bool {
        self.lock().ended
    }

    /// Set a header. Before the header block is sent this goes to the
    /// structured store; afterwards it goes to the late store, so headers
    /// set after sending began are still visible in the final mapping.
    pub fn set_header(&self, name: impl Into<String>, value: impl Into<HeaderValue>) {
        self.lock().set_header(name.into(), value.into());
    }

    /// Look up a header case-insensitively. Late values win.
    pub fn get_header(&self, name: &str) -> Option<HeaderValue> {
        let name = name.to_ascii_lowercase();
        let state = self.lock();
        state
            .late_headers
            .get(&name)
            .or_else(|| state.headers.get(&name))
            .cloned()
    }

    /// Remove a header from both stores.
    pub fn remove_header(&self, name: &str) {
        let name = name.to_ascii_lowercase();
        let mut state = self.lock();
        state.headers.remove(&name);
        state.late_headers.remove(&name);
    }

    /// Snapshot of the structured header store.
    pub fn headers(&self) -> HeaderMap {
        self.lock().headers.clone()
    }

    /// Structured store overlaid with late-set headers; what the response
    /// mapper reads.
    pub fn merged_headers(&self) -> HeaderMap {
        let state = self.lock();
        let mut merged = state.headers.clone();
        for (name, value) in &state.late_headers {
            merged.insert(name.clone(), value.clone());
        }
        merged
    }

    /// Set the status and apply headers, then mark header serialization as
    /// begun. Accepts the `(status, headers)` call shape; the block itself
    /// is flushed by the first write or by `end`.
    pub fn write_head<N, V, I>(&self, status: u16, headers: I)
    where
        N: Into<String>,
        V: Into<HeaderValue>,
        I: IntoIterator<Item = (N, V)>,
    {
        let mut state = self.lock();
        for (name, value) in headers {
            state.set_header(name.into(), value.into());
        }
        state.status = status;
        state.header_buf.get_or_insert_with(Vec::new);
    }

    /// The `(status, reason, headers)` call shape. The reason phrase never
    /// reaches a wire in this buffered emulation and is dropped.
    pub fn write_head_with_reason<N, V, I>(&self, status: u16, _reason: &str, headers: I)
    where
        N: Into<String>,
        V: Into<HeaderValue>,
        I: IntoIterator<Item = (N, V)>,
    {
        self.write_head(status, headers);
    }

    /// Handler-facing body write. Serializes the header block through the
    /// raw funnel first if it has not gone out yet.
    pub fn write(&self, data: impl Into<Bytes>) {
        let mut state = self.lock();
        state.flush_header_block();
        state.raw_write(data.into());
    }

    /// The low-level sink write, as a transport serializer would call it.
    /// Writes land as body or header material depending on the state
    /// machine; writes after the response ended still append and never
    /// error.
    pub fn write_raw(&self, data: impl Into<Bytes>) {
        self.lock().raw_write(data.into());
    }

    /// Signal the end of the response. A second call is a no-op.
    pub fn end(&self) {
        self.finish(None);
    }

    /// Write a final chunk, then signal the end of the response.
    pub fn end_with(&self, data: impl Into<Bytes>) {
        self.finish(Some(data.into()));
    }

    fn finish(&self, data: Option<Bytes>) {
        let first_end = {
            let mut state = self.lock();
            state.flush_header_block();
            if let Some(data) = data {
                state.raw_write(data);
            }
            let first = !state.ended;
            state.ended = true;
            first
        };
        if first_end {
            self.emit(CompletionSignal::Finish);
        }
    }

    /// Publish a completion signal. The first signal is also recorded for
    /// subscribers that arrive after it fired.
    pub fn emit(&self, signal: CompletionSignal) {
        {
            let mut state = self.lock();
            if state.settled.is_none() {
                state.settled = Some(signal.clone());
            }
        }
        // No receivers is fine; the recorded signal covers late arrivals.
        let _ = self.signals.send(signal);
    }

    /// Signal an error on the completion channel.
    pub fn emit_error(&self, message: impl Into<String>) {
        self.emit(CompletionSignal::Error(message.into()));
    }

    /// Subscribe to completion signals.
    pub fn subscribe(&self) -> broadcast::Receiver<CompletionSignal> {
        self.signals.subscribe()
    }

    /// The first completion signal that fired, if any.
    pub fn settled(&self) -> Option<CompletionSignal> {
        self.lock().settled.clone()
    }

    /// Concatenation of every body chunk in arrival order.
    pub fn body(&self) -> Bytes {
        let state = self.lock();
        let mut buf = Vec::with_capacity(state.body.iter().map(Bytes::len).sum());
        for chunk in &state.body {
            buf.extend_from_slice(chunk);
        }
        Bytes::from(buf)
    }
}
