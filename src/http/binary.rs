//! Binary-content classification for response payloads.
//!
//! The envelope format carries the body as a string, so compressed or
//! image payloads must ride as base64. This classifier decides, from the
//! response headers alone, which encoding the payload needs.

use crate::http::headers::HeaderMap;
use regex::Regex;

/// Content encodings that force base64 treatment when no override is set.
pub const DEFAULT_BINARY_ENCODINGS: &[&str] = &["gzip", "deflate", "br"];

/// Content-type glob patterns that force base64 treatment when no override
/// is set. `*` matches any substring.
pub const DEFAULT_BINARY_CONTENT_TYPES: &[&str] = &["image/*"];

/// Caller-supplied override for the classification decision.
pub enum BinaryDecision {
    /// The payload is never binary, regardless of headers.
    Never,
    /// Delegate the decision to a custom predicate over the headers.
    Custom(Box<dyn Fn(&HeaderMap) -> bool + Send + Sync>),
}

/// Classifier configuration. The defaults apply only for fields the caller
/// leaves unset.
#[derive(Default)]
pub struct BinarySettings {
    /// Overrides the heuristics entirely when present.
    pub decision: Option<BinaryDecision>,
    /// Content-encoding tokens treated as binary.
    pub content_encodings: Option<Vec<String>>,
    /// Content-type glob patterns treated as binary.
    pub content_types: Option<Vec<String>>,
}

/// Decide whether a payload with these headers must be base64-encoded.
///
/// Pure and stateless. Absent or multi-valued headers never error; they
/// simply fail the corresponding heuristic.
pub fn is_binary(headers: &HeaderMap, settings: &BinarySettings) -> bool {
    match &settings.decision {
        Some(BinaryDecision::Never) => return false,
        Some(BinaryDecision::Custom(predicate)) => return predicate(headers),
        None => {}
    }

    let encodings: Vec<&str> = match &settings.content_encodings {
        Some(list) => list.iter().map(String::as_str).collect(),
        None => DEFAULT_BINARY_ENCODINGS.to_vec(),
    };
    let content_types: Vec<&str> = match &settings.content_types {
        Some(list) => list.iter().map(String::as_str).collect(),
        None => DEFAULT_BINARY_CONTENT_TYPES.to_vec(),
    };

    is_content_encoding_binary(headers, &encodings) || is_content_type_binary(headers, &content_types)
}

/// True if any comma-separated `content-encoding` token contains one of the
/// configured binary encodings.
fn is_content_encoding_binary(headers: &HeaderMap, encodings: &[&str]) -> bool {
    let content_encoding = match headers.get("content-encoding").and_then(|v| v.as_single()) {
        Some(value) => value,
        None => return false,
    };

    content_encoding
        .split(',')
        .any(|token| encodings.iter().any(|encoding| token.contains(encoding)))
}

/// The mime type portion of `content-type`, with any `; charset=...` part
/// stripped.
fn content_type(headers: &HeaderMap) -> &str {
    headers
        .get("content-type")
        .and_then(|v| v.as_single())
        .unwrap_or("")
        .split(';')
        .next()
        .unwrap_or("")
}

/// True if the mime type matches any configured glob pattern.
fn is_content_type_binary(headers: &HeaderMap, patterns: &[&str]) -> bool {
    let mime = content_type(headers);
    if mime.is_empty() {
        return false;
    }

    patterns
        .iter()
        .filter_map(|pattern| glob_regex(pattern))
        .any(|regex| regex.is_match(mime))
}

/// Compile a glob pattern (`*` matches any substring) into an anchored regex.
fn glob_regex(pattern: &str) -> Option<Regex> {
    let escaped = regex::escape(pattern).replace("\\*", ".*");
    Regex::new(&format!("^{escaped}$")).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::headers::HeaderValue;

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        pairs
            .iter()
            .map(|(name, value)| (name.to_string(), HeaderValue::from(*value)))
            .collect()
    }

    #[test]
    fn test_content_encoding_gzip_is_binary() {
        let headers = headers(&[("content-encoding", "gzip"), ("content-type", "text/plain")]);
        assert!(is_binary(&headers, &BinarySettings::default()));
    }

    #[test]
    fn test_content_encoding_combined_tokens() {
        let headers = headers(&[("content-encoding", "identity, br")]);
        assert!(is_binary(&headers, &BinarySettings::default()));
    }

    #[test]
    fn test_content_encoding_deflate() {
        let headers = headers(&[("content-encoding", "deflate")]);
        assert!(is_binary(&headers, &BinarySettings::default()));
    }

    #[test]
    fn test_image_content_type_is_binary() {
        let headers = headers(&[("content-type", "image/png")]);
        assert!(is_binary(&headers, &BinarySettings::default()));
    }

    #[test]
    fn test_image_content_type_with_charset() {
        let headers = headers(&[("content-type", "image/svg+xml; charset=utf-8")]);
        assert!(is_binary(&headers, &BinarySettings::default()));
    }

    #[test]
    fn test_text_content_type_is_not_binary() {
        let headers = headers(&[("content-type", "text/plain")]);
        assert!(!is_binary(&headers, &BinarySettings::default()));
    }

    #[test]
    fn test_empty_headers_are_not_binary() {
        assert!(!is_binary(&HeaderMap::new(), &BinarySettings::default()));
    }

    #[test]
    fn test_multi_valued_header_fails_heuristic() {
        let mut map = HeaderMap::new();
        map.insert(
            "content-encoding".to_string(),
            HeaderValue::from(vec!["gzip", "br"]),
        );
        assert!(!is_binary(&map, &BinarySettings::default()));
    }

    #[test]
    fn test_never_override_wins() {
        let headers = headers(&[("content-encoding", "gzip")]);
        let settings = BinarySettings {
            decision: Some(BinaryDecision::Never),
            ..Default::default()
        };
        assert!(!is_binary(&headers, &settings));
    }

    #[test]
    fn test_custom_predicate_delegates() {
        let headers = headers(&[("content-type", "text/plain")]);
        let settings = BinarySettings {
            decision: Some(BinaryDecision::Custom(Box::new(|h| {
                h.contains_key("content-type")
            }))),
            ..Default::default()
        };
        assert!(is_binary(&headers, &settings));
    }

    #[test]
    fn test_custom_encoding_list() {
        let headers = headers(&[("content-encoding", "zstd")]);
        let settings = BinarySettings {
            content_encodings: Some(vec!["zstd".to_string()]),
            ..Default::default()
        };
        assert!(is_binary(&headers, &settings));

        let defaults = BinarySettings::default();
        assert!(!is_binary(&headers, &defaults));
    }

    #[test]
    fn test_custom_content_type_patterns() {
        let headers = headers(&[("content-type", "application/pdf")]);
        let settings = BinarySettings {
            content_types: Some(vec!["application/pdf".to_string(), "font/*".to_string()]),
            ..Default::default()
        };
        assert!(is_binary(&headers, &settings));
    }
}
