//! Response envelope: the JSON description of one outbound response.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::edge::event::HeaderEntry;

/// How the envelope body string is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyEncoding {
    Text,
    Base64,
}

/// The envelope an edge-compute function returns to its hosting runtime.
///
/// `content-length` is never present in `headers`: the hosting runtime
/// recomputes it and rejects responses declaring a conflicting one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeEnvelope {
    pub status: u16,
    /// Lowercase header name -> ordered `{key, value}` entries.
    pub headers: HashMap<String, Vec<HeaderEntry>>,
    pub body: String,
    #[serde(rename = "bodyEncoding")]
    pub body_encoding: BodyEncoding,
}

impl EdgeEnvelope {
    /// The ordered entries for a header, looked up by lowercase name.
    pub fn header(&self, name: &str) -> Option<&[HeaderEntry]> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(Vec::as_slice)
    }

    /// Decode the body per its encoding tag.
    pub fn body_bytes(&self) -> Result<Vec<u8>, base64::DecodeError> {
        match self.body_encoding {
            BodyEncoding::Text => Ok(self.body.clone().into_bytes()),
            BodyEncoding::Base64 => BASE64.decode(&self.body),
        }
    }
}
