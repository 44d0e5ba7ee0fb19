//! Header collections shared by the synthetic request and response types.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A response header value: a single string or an ordered list of strings.
///
/// The emulated contract allows handlers to set either shape; multi-valued
/// headers keep their order all the way into the response envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HeaderValue {
    Single(String),
    Multi(Vec<String>),
}

impl HeaderValue {
    /// The value as a single string, if it is one.
    pub fn as_single(&self) -> Option<&str> {
        match self {
            HeaderValue::Single(value) => Some(value),
            HeaderValue::Multi(_) => None,
        }
    }

    /// All values in order, regardless of variant.
    pub fn values(&self) -> Vec<&str> {
        match self {
            HeaderValue::Single(value) => vec![value.as_str()],
            HeaderValue::Multi(values) => values.iter().map(String::as_str).collect(),
        }
    }
}

impl From<&str> for HeaderValue {
    fn from(value: &str) -> Self {
        HeaderValue::Single(value.to_string())
    }
}

impl From<String> for HeaderValue {
    fn from(value: String) -> Self {
        HeaderValue::Single(value)
    }
}

impl From<Vec<String>> for HeaderValue {
    fn from(values: Vec<String>) -> Self {
        HeaderValue::Multi(values)
    }
}

impl From<Vec<&str>> for HeaderValue {
    fn from(values: Vec<&str>) -> Self {
        HeaderValue::Multi(values.into_iter().map(str::to_string).collect())
    }
}

/// Header mapping used by the response sink: name -> string or string list.
pub type HeaderMap = HashMap<String, HeaderValue>;
