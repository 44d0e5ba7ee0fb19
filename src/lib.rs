//! # Verge - Edge-Function Adapter for Stream-Style HTTP Handlers
//!
//! Verge lets request-handler code written against a synchronous,
//! stream-based HTTP request/response contract run unmodified inside a
//! queue-invoked edge-compute function: one JSON invocation event in, one
//! JSON response envelope out, with no live socket anywhere.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         Edge Runtime (CDN)                          │
//! │            one invocation event per inbound HTTP request            │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                   │ EdgeEvent
//!                                   ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                            EdgeAdapter                              │
//! │   ┌──────────────┐    ┌───────────────┐    ┌───────────────────┐   │
//! │   │ Event Mapper │───▶│    Handler    │───▶│ Completion Bridge │   │
//! │   └──────────────┘    │ (VergeRequest,│    └───────────────────┘   │
//! │                       │ VergeResponse)│              │             │
//! │   ┌──────────────────┐└───────────────┘              │             │
//! │   │ Response Mapper  │◀─────────────────────────────-┘             │
//! │   └──────────────────┘                                             │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                   │ EdgeEnvelope
//!                                   ▼
//!                       back to the edge runtime
//! ```
//!
//! The synthetic pair emulates enough of the live-socket contract —
//! headers-then-body framing, chunked writes, finished signaling, binary
//! vs. text payload negotiation — to stay transparent to arbitrary
//! handler code, while everything stays fully buffered in memory.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use verge::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), VergeError> {
//!     let adapter = adapt(|request: VergeRequest, response: VergeResponse| async move {
//!         response.set_header("content-type", "text/plain");
//!         response.write("ok");
//!         response.end();
//!         let _ = request;
//!         Ok(())
//!     });
//!
//!     let event = EdgeEvent::new("GET", "/").client_ip("1.2.3.4");
//!     let envelope = adapter.invoke(event).await?;
//!     assert_eq!(envelope.status, 200);
//!     Ok(())
//! }
//! ```
//!
//! ## Guarantees
//!
//! - One event produces exactly one isolated request/response pair; no
//!   state is shared across invocations.
//! - Body chunks reach the envelope strictly in the order the handler
//!   wrote them.
//! - The response is always fully buffered before the envelope is built;
//!   true streaming is out of scope.
//! - `content-length` never appears in the envelope headers; the hosting
//!   runtime recomputes it.

pub mod adapter;
pub mod edge;
pub mod http;
pub mod runtime;

/// Re-export commonly used types.
pub mod prelude {
    pub use crate::adapter::{adapt, await_completion, EdgeAdapter, VergeError, VergeHandler};
    pub use crate::edge::{BodyEncoding, EdgeEnvelope, EdgeEvent, EdgeRecords, HeaderEntry};
    pub use crate::http::{HeaderValue, VergeRequest, VergeResponse};
    pub use crate::runtime::{DevConfig, DevServer};
    pub use async_trait::async_trait;
}

// Re-export for convenience
pub use adapter::{adapt, EdgeAdapter, VergeError, VergeHandler};
pub use edge::{EdgeEnvelope, EdgeEvent};
pub use http::{VergeRequest, VergeResponse};
pub use runtime::{DevConfig, DevServer};
