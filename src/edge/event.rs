//! Invocation event: the JSON description of one inbound request.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One `{key, value}` pair inside an ordered header list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderEntry {
    pub key: String,
    pub value: String,
}

impl HeaderEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Optional request body descriptor carried by the event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeEventBody {
    pub data: String,
    /// `"base64"` or absent (meaning UTF-8 text).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub encoding: Option<String>,
}

impl EdgeEventBody {
    /// Whether the body data is base64-encoded. Any encoding tag other
    /// than `"base64"` means text.
    pub fn is_base64(&self) -> bool {
        self.encoding.as_deref() == Some("base64")
    }
}

/// The invocation event delivered to an edge-compute function, one per
/// inbound request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeEvent {
    pub method: String,
    pub uri: String,
    #[serde(default)]
    pub querystring: String,
    /// Lowercase header name -> ordered raw values.
    #[serde(default)]
    pub headers: HashMap<String, Vec<HeaderEntry>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub body: Option<EdgeEventBody>,
    #[serde(rename = "clientIp")]
    pub client_ip: String,
}

impl EdgeEvent {
    /// Create an event with no query string, headers, or body.
    pub fn new(method: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            uri: uri.into(),
            querystring: String::new(),
            headers: HashMap::new(),
            body: None,
            client_ip: String::new(),
        }
    }

    /// Set the query string.
    pub fn querystring(mut self, querystring: impl Into<String>) -> Self {
        self.querystring = querystring.into();
        self
    }

    /// Append a header value under its lowercase name.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        self.headers
            .entry(key.to_ascii_lowercase())
            .or_default()
            .push(HeaderEntry::new(key, value));
        self
    }

    /// Attach a UTF-8 text body.
    pub fn body_text(mut self, data: impl Into<String>) -> Self {
        self.body = Some(EdgeEventBody {
            data: data.into(),
            encoding: None,
        });
        self
    }

    /// Attach a base64-encoded body.
    pub fn body_base64(mut self, data: impl Into<String>) -> Self {
        self.body = Some(EdgeEventBody {
            data: data.into(),
            encoding: Some("base64".to_string()),
        });
        self
    }

    /// Set the caller's network address.
    pub fn client_ip(mut self, client_ip: impl Into<String>) -> Self {
        self.client_ip = client_ip.into();
        self
    }
}

/// The `Records`-wrapped delivery shape the CDN actually sends: the event
/// sits at `Records[0].cf.request`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeRecords {
    #[serde(rename = "Records")]
    pub records: Vec<EdgeRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub cf: EdgeRecordPayload,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeRecordPayload {
    pub request: EdgeEvent,
}

impl EdgeRecords {
    /// Extract the first record's request, if any.
    pub fn into_event(mut self) -> Option<EdgeEvent> {
        if self.records.is_empty() {
            return None;
        }
        Some(self.records.swap_remove(0).cf.request)
    }
}
