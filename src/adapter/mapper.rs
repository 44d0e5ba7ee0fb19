//! Conversions between the edge wire shapes and the synthetic HTTP pair.
//!
//! The event mapper turns one invocation event into a request/response
//! pair; the response mapper reads the finished sink back into the
//! envelope the edge runtime expects. Everything here is synchronous
//! transformation over already-resident buffers.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use bytes::Bytes;
use std::collections::HashMap;

use crate::adapter::handler::VergeError;
use crate::edge::{BodyEncoding, EdgeEnvelope, EdgeEvent, HeaderEntry};
use crate::http::{is_binary, BinarySettings, VergeRequest, VergeResponse};

/// Headers the hosting runtime rejects or recomputes; never emitted in the
/// envelope.
const RESPONSE_HEADER_DENY_LIST: &[&str] = &["content-length"];

/// Build a synthetic request and a fresh response sink from one event.
///
/// The only failure is an undecodable base64 body; missing required fields
/// are a caller contract violation and are not handled defensively here.
pub fn map_event(event: &EdgeEvent) -> Result<(VergeRequest, VergeResponse), VergeError> {
    let mut headers: HashMap<String, String> = event
        .headers
        .iter()
        .map(|(name, entries)| {
            let joined = entries
                .iter()
                .map(|entry| entry.value.as_str())
                .collect::<Vec<_>>()
                .join(",");
            (name.clone(), joined)
        })
        .collect();

    let body = match &event.body {
        Some(descriptor) => {
            let bytes: Bytes = if descriptor.is_base64() {
                BASE64
                    .decode(&descriptor.data)
                    .map_err(|err| VergeError::event(format!("body is not valid base64: {err}")))?
                    .into()
            } else {
                Bytes::from(descriptor.data.clone().into_bytes())
            };
            headers.insert("content-length".to_string(), bytes.len().to_string());
            Some(bytes)
        }
        None => None,
    };

    let url = if event.querystring.is_empty() {
        event.uri.clone()
    } else {
        format!("{}?{}", event.uri, event.querystring)
    };

    let request = VergeRequest::new(
        event.method.as_str(),
        url,
        headers,
        body,
        event.client_ip.as_str(),
    );
    let response = VergeResponse::new(request.method());
    Ok((request, response))
}

/// Read the finished sink into the response envelope.
///
/// Call only after the completion bridge has settled; no further writes
/// are expected by this point.
pub fn map_response(response: &VergeResponse) -> EdgeEnvelope {
    let status = response.status();
    let headers = response.merged_headers();
    let binary = is_binary(&headers, &BinarySettings::default());

    let body_bytes = response.body();
    let (body, body_encoding) = if binary {
        (BASE64.encode(&body_bytes), BodyEncoding::Base64)
    } else {
        (
            String::from_utf8_lossy(&body_bytes).into_owned(),
            BodyEncoding::Text,
        )
    };

    let mut envelope_headers: HashMap<String, Vec<HeaderEntry>> = HashMap::new();
    for (name, value) in &headers {
        let name = name.to_ascii_lowercase();
        if RESPONSE_HEADER_DENY_LIST.contains(&name.as_str()) {
            continue;
        }
        let entries = envelope_headers.entry(name.clone()).or_default();
        for v in value.values() {
            entries.push(HeaderEntry::new(name.clone(), v));
        }
    }

    EdgeEnvelope {
        status,
        headers: envelope_headers,
        body,
        body_encoding,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_headers_are_flattened_with_commas() {
        let event = EdgeEvent::new("GET", "/")
            .header("accept", "text/html")
            .header("accept", "image/png")
            .client_ip("1.2.3.4");
        let (request, _) = map_event(&event).expect("well-formed event");
        assert_eq!(request.header("accept"), Some("text/html,image/png"));
    }

    #[test]
    fn test_base64_body_round_trips() {
        let original: Vec<u8> = (0u8..64).collect();
        let event = EdgeEvent::new("POST", "/upload")
            .body_base64(BASE64.encode(&original))
            .client_ip("1.2.3.4");

        let (request, _) = map_event(&event).expect("well-formed event");
        assert_eq!(request.header("content-length"), Some("64"));
        let body = request.read_chunk().expect("body present");
        assert_eq!(body.as_ref(), original.as_slice());
        assert_eq!(request.read_chunk(), None);
    }

    #[test]
    fn test_text_body_and_content_length() {
        let event = EdgeEvent::new("POST", "/echo")
            .body_text("héllo")
            .client_ip("1.2.3.4");
        let (request, _) = map_event(&event).expect("well-formed event");
        // Byte length, not character count.
        assert_eq!(request.header("content-length"), Some("6"));
        assert_eq!(
            request.read_chunk(),
            Some(Bytes::copy_from_slice("héllo".as_bytes()))
        );
    }

    #[test]
    fn test_invalid_base64_body_is_an_event_error() {
        let event = EdgeEvent::new("POST", "/")
            .body_base64("!!not base64!!")
            .client_ip("1.2.3.4");
        match map_event(&event) {
            Err(VergeError::Event(_)) => {}
            other => panic!("expected event error, got {other:?}"),
        }
    }

    #[test]
    fn test_querystring_composes_into_url() {
        let event = EdgeEvent::new("GET", "/search")
            .querystring("q=rust")
            .client_ip("1.2.3.4");
        let (request, _) = map_event(&event).expect("well-formed event");
        assert_eq!(request.url(), "/search?q=rust");

        let bare = EdgeEvent::new("GET", "/search").client_ip("1.2.3.4");
        let (request, _) = map_event(&bare).expect("well-formed event");
        assert_eq!(request.url(), "/search");
    }

    #[test]
    fn test_response_maps_text_body() {
        let response = VergeResponse::new("GET");
        response.set_header("content-type", "text/plain");
        response.end_with("ok");

        let envelope = map_response(&response);
        assert_eq!(envelope.status, 200);
        assert_eq!(envelope.body, "ok");
        assert_eq!(envelope.body_encoding, BodyEncoding::Text);
        assert_eq!(
            envelope.header("content-type"),
            Some(&[HeaderEntry::new("content-type", "text/plain")][..])
        );
    }

    #[test]
    fn test_response_maps_binary_body_as_base64() {
        let payload = [0x89u8, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a];
        let response = VergeResponse::new("GET");
        response.set_header("content-type", "image/png");
        response.write(payload.to_vec());
        response.end();

        let envelope = map_response(&response);
        assert_eq!(envelope.body_encoding, BodyEncoding::Base64);
        assert_eq!(envelope.body_bytes().expect("decodes"), payload.to_vec());
    }

    #[test]
    fn test_content_length_never_emitted() {
        let response = VergeResponse::new("GET");
        response.set_header("content-length", "999");
        response.write("ok");
        // Late content-length must be dropped as well.
        response.set_header("Content-Length", "1000");
        response.end();

        let envelope = map_response(&response);
        assert_eq!(envelope.header("content-length"), None);
    }

    #[test]
    fn test_multi_value_headers_expand_to_entries() {
        let response = VergeResponse::new("GET");
        response.set_header("Set-Cookie", vec!["a=1", "b=2"]);
        response.end_with("done");

        let envelope = map_response(&response);
        let entries = envelope.header("set-cookie").expect("present");
        let values: Vec<&str> = entries.iter().map(|e| e.value.as_str()).collect();
        assert_eq!(values, vec!["a=1", "b=2"]);
        assert!(entries.iter().all(|e| e.key == "set-cookie"));
    }

    #[test]
    fn test_late_headers_reach_the_envelope() {
        let response = VergeResponse::new("GET");
        response.write("body");
        response.set_header("x-late", "yes");
        response.end();

        let envelope = map_response(&response);
        assert_eq!(
            envelope.header("x-late"),
            Some(&[HeaderEntry::new("x-late", "yes")][..])
        );
    }
}
