//! Synthetic inbound HTTP message built from an invocation event.
//!
//! There is no transport behind this type: the whole message, body
//! included, exists before the handler ever sees it. The read side still
//! follows the pull contract a socket-backed request would, so handler
//! code that reads in a loop terminates after at most one delivery.

use bytes::Bytes;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// The caller always represents the connection as secured, so the stubbed
/// local address reports the HTTPS port.
pub const HTTPS_PORT: u16 = 443;

/// Stub address returned by [`VergeRequest::address`]. No socket exists;
/// only the port is meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeerAddress {
    pub port: u16,
}

#[derive(Debug)]
enum BodyState {
    Pending(Option<Bytes>),
    Drained,
}

/// Read-once synthetic request handed to the handler.
///
/// Constructed fully-formed by the event mapper and never mutated
/// afterwards; the body is delivered exactly once, immediately followed by
/// end-of-stream.
#[derive(Debug)]
pub struct VergeRequest {
    method: String,
    url: String,
    headers: HashMap<String, String>,
    remote_addr: String,
    body: Mutex<BodyState>,
}

impl VergeRequest {
    /// Create a new synthetic request.
    ///
    /// `url` is the fully-qualified request path (path plus query string);
    /// `headers` is the flattened single-value mapping.
    pub fn new(
        method: impl Into<String>,
        url: impl Into<String>,
        headers: HashMap<String, String>,
        body: Option<Bytes>,
        remote_addr: impl Into<String>,
    ) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            headers,
            remote_addr: remote_addr.into(),
            body: Mutex::new(BodyState::Pending(body)),
        }
    }

    /// HTTP method, as the event delivered it.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Request path including the query string when present.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Flattened headers (name -> comma-joined values).
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Look up a single header, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Protocol version is fixed; there is no negotiation without a socket.
    pub fn http_version(&self) -> &'static str {
        "1.1"
    }

    /// Always true: the entire message is available up front.
    pub fn is_complete(&self) -> bool {
        true
    }

    /// The caller's network address from the invocation event.
    pub fn remote_addr(&self) -> &str {
        &self.remote_addr
    }

    /// Stubbed local address on the HTTPS port.
    pub fn address(&self) -> PeerAddress {
        PeerAddress { port: HTTPS_PORT }
    }

    /// Pull the next body chunk.
    ///
    /// The first call yields the entire body (or `None` when the event
    /// carried no body); every later call yields `None`, the end-of-stream
    /// marker.
    pub fn read_chunk(&self) -> Option<Bytes> {
        let mut state = self.body.lock().unwrap_or_else(PoisonError::into_inner);
        match std::mem::replace(&mut *state, BodyState::Drained) {
            BodyState::Pending(body) => body,
            BodyState::Drained => None,
        }
    }

    /// Tolerated no-op: handlers may close the socket defensively.
    pub fn end(&self) {}

    /// Tolerated no-op: handlers may destroy the socket defensively.
    pub fn destroy(&self) {}
}
