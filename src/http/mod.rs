//! Synthetic HTTP surface: the request/response pair the handler sees.

pub mod binary;
pub mod headers;
mod request;
mod response;

pub use binary::{is_binary, BinaryDecision, BinarySettings};
pub use headers::{HeaderMap, HeaderValue};
pub use request::{PeerAddress, VergeRequest, HTTPS_PORT};
pub use response::{CompletionSignal, VergeResponse};
