//! Handler seam and adapter error type.
//!
//! The handler boundary is a two-argument call over the synthetic
//! request/response pair, the generic stream-style contract this whole
//! layer exists to emulate. It is a trait rather than a concrete platform
//! type so any framework front-end can satisfy it.

use crate::http::{VergeRequest, VergeResponse};
use async_trait::async_trait;
use std::future::Future;

/// A stream-style HTTP handler.
///
/// The handler owns deciding when it is done: it may return before writing
/// finishes and signal completion through the response sink instead.
#[async_trait]
pub trait VergeHandler: Send + Sync {
    async fn handle(
        &self,
        request: VergeRequest,
        response: VergeResponse,
    ) -> Result<(), VergeError>;
}

#[async_trait]
impl<F, Fut> VergeHandler for F
where
    F: Fn(VergeRequest, VergeResponse) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), VergeError>> + Send,
{
    async fn handle(
        &self,
        request: VergeRequest,
        response: VergeResponse,
    ) -> Result<(), VergeError> {
        (self)(request, response).await
    }
}

/// Adapter error type.
///
/// Every failure is a single-shot propagation to the invoking runtime;
/// this layer adds no context and performs no retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VergeError {
    /// The invocation event violated the caller contract (e.g. an
    /// undecodable base64 body).
    Event(String),
    /// The completion channel reported an error.
    Completion(String),
    /// The invoked handler raised an error.
    Handler(String),
}

impl VergeError {
    /// Create a handler error.
    pub fn handler(message: impl Into<String>) -> Self {
        VergeError::Handler(message.into())
    }

    /// Create an event contract error.
    pub fn event(message: impl Into<String>) -> Self {
        VergeError::Event(message.into())
    }

    /// Create a completion error.
    pub fn completion(message: impl Into<String>) -> Self {
        VergeError::Completion(message.into())
    }
}

impl std::fmt::Display for VergeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VergeError::Event(message) => write!(f, "invalid invocation event: {message}"),
            VergeError::Completion(message) => write!(f, "completion error: {message}"),
            VergeError::Handler(message) => write!(f, "handler error: {message}"),
        }
    }
}

impl std::error::Error for VergeError {}
