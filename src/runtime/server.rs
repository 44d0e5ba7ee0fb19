//! Local HTTP front-end for edge handlers.
//!
//! Performs the same round trip the edge runtime performs: each real HTTP
//! request is converted into an invocation event, pushed through the
//! adapter, and the resulting envelope is converted back into an HTTP
//! response. Useful for exercising a handler with curl before deploying.

use crate::adapter::{EdgeAdapter, VergeHandler};
use crate::edge::{BodyEncoding, EdgeEnvelope, EdgeEvent, EdgeEventBody, HeaderEntry};
use crate::runtime::DevConfig;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

/// Local dev server wrapping an [`EdgeAdapter`].
pub struct DevServer<H> {
    config: DevConfig,
    adapter: Arc<EdgeAdapter<H>>,
}

impl<H: VergeHandler + 'static> DevServer<H> {
    /// Create a new dev server for a handler.
    pub fn new(config: DevConfig, handler: H) -> Self {
        Self {
            config,
            adapter: Arc::new(EdgeAdapter::new(handler)),
        }
    }

    /// Create a dev server with default configuration.
    pub fn with_defaults(handler: H) -> Self {
        Self::new(DevConfig::default(), handler)
    }

    /// Start the HTTP accept loop.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let addr: SocketAddr = self.config.bind_addr().parse()?;
        let listener = TcpListener::bind(addr).await?;

        info!("verge dev server listening on {}", addr);

        loop {
            let (stream, remote_addr) = listener.accept().await?;
            let io = TokioIo::new(stream);

            let adapter = self.adapter.clone();
            let config = self.config.clone();

            tokio::task::spawn(async move {
                let service = service_fn(move |req| {
                    let adapter = adapter.clone();
                    let config = config.clone();
                    async move { handle_request(req, adapter, config, remote_addr).await }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    error!("Error serving connection: {:?}", err);
                }
            });
        }
    }
}

enum ConvertError {
    BodyTooLarge,
    Http(String),
}

/// Handle one incoming HTTP request end to end.
async fn handle_request<H: VergeHandler>(
    req: Request<Incoming>,
    adapter: Arc<EdgeAdapter<H>>,
    config: DevConfig,
    remote_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    let path = req.uri().path().to_string();
    let method = req.method().clone();

    debug!("handling request: {} {} from {}", method, path, remote_addr);

    if config.enable_health && path == "/_health" {
        return Ok(text_response(200, "OK"));
    }

    let event = match convert_request(req, remote_addr, config.max_body_size).await {
        Ok(event) => event,
        Err(ConvertError::BodyTooLarge) => {
            warn!("request body exceeds {} bytes", config.max_body_size);
            return Ok(text_response(413, "request body too large"));
        }
        Err(ConvertError::Http(message)) => {
            warn!("failed to read request: {}", message);
            return Ok(text_response(400, &message));
        }
    };

    match adapter.invoke(event).await {
        Ok(envelope) => Ok(build_response(envelope)),
        Err(err) => {
            error!("handler invocation failed: {}", err);
            Ok(text_response(500, &err.to_string()))
        }
    }
}

/// Convert a hyper request into an invocation event.
///
/// The body always rides as a base64 descriptor so binary uploads survive
/// the string-shaped event.
async fn convert_request(
    req: Request<Incoming>,
    remote_addr: SocketAddr,
    max_body_size: usize,
) -> Result<EdgeEvent, ConvertError> {
    let method = req.method().as_str().to_string();
    let uri = req.uri().path().to_string();
    let querystring = req.uri().query().unwrap_or("").to_string();

    let mut headers: HashMap<String, Vec<HeaderEntry>> = HashMap::new();
    for (name, value) in req.headers() {
        if let Ok(value) = value.to_str() {
            headers
                .entry(name.as_str().to_ascii_lowercase())
                .or_default()
                .push(HeaderEntry::new(name.as_str(), value));
        }
    }

    let body_bytes = req
        .collect()
        .await
        .map_err(|err| ConvertError::Http(err.to_string()))?
        .to_bytes();
    if body_bytes.len() > max_body_size {
        return Err(ConvertError::BodyTooLarge);
    }

    let body = if body_bytes.is_empty() {
        None
    } else {
        Some(EdgeEventBody {
            data: BASE64.encode(&body_bytes),
            encoding: Some("base64".to_string()),
        })
    };

    Ok(EdgeEvent {
        method,
        uri,
        querystring,
        headers,
        body,
        client_ip: remote_addr.ip().to_string(),
    })
}

/// Convert a response envelope back into a hyper response.
fn build_response(envelope: EdgeEnvelope) -> Response<Full<Bytes>> {
    let status = hyper::StatusCode::from_u16(envelope.status).unwrap_or_else(|_| {
        warn!(
            "invalid status code {}, falling back to 500 Internal Server Error",
            envelope.status
        );
        hyper::StatusCode::INTERNAL_SERVER_ERROR
    });

    let mut builder = Response::builder().status(status);
    for entries in envelope.headers.values() {
        for entry in entries {
            builder = builder.header(entry.key.as_str(), entry.value.as_str());
        }
    }

    let body = match envelope.body_encoding {
        BodyEncoding::Text => Bytes::from(envelope.body.into_bytes()),
        BodyEncoding::Base64 => match BASE64.decode(&envelope.body) {
            Ok(bytes) => Bytes::from(bytes),
            Err(err) => {
                warn!("envelope body is not valid base64: {}", err);
                return text_response(500, "invalid response body");
            }
        },
    };

    match builder.body(Full::new(body)) {
        Ok(response) => response,
        Err(err) => {
            error!("envelope carried unrepresentable headers: {}", err);
            text_response(500, "invalid response headers")
        }
    }
}

fn text_response(status: u16, message: &str) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(message.to_string())));
    *response.status_mut() =
        hyper::StatusCode::from_u16(status).unwrap_or(hyper::StatusCode::INTERNAL_SERVER_ERROR);
    response
}
