//! Verge - Example Dev Server
//!
//! This example serves a sample stream-style handler through the local
//! dev server, exercising the same event/envelope round trip the edge
//! runtime performs.

use verge::prelude::*;
use tracing_subscriber::EnvFilter;

/// Sample handler demonstrating the emulated contract: read the
/// single-shot body, set headers, write, end.
async fn demo_handler(request: VergeRequest, response: VergeResponse) -> Result<(), VergeError> {
    match request.url() {
        url if url.starts_with("/echo") => {
            let body = request.read_chunk().unwrap_or_default();
            response.set_header("content-type", "application/octet-stream");
            response.write(body);
            response.end();
        }
        url if url.starts_with("/headers") => {
            let listing = serde_json::json!({
                "method": request.method(),
                "url": request.url(),
                "remote": request.remote_addr(),
                "headers": request.headers(),
            });
            response.write_head(200, [("content-type", "application/json")]);
            response.end_with(listing.to_string());
        }
        _ => {
            response.set_header("content-type", "text/plain");
            response.write("Hello from verge!");
            response.end();
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Starting verge dev server...");

    let config = DevConfig::new().host("0.0.0.0").port(8080);
    let server = DevServer::new(config, demo_handler);

    tracing::info!("Try: curl http://localhost:8080/");
    tracing::info!("Try: curl -X POST -d 'test' http://localhost:8080/echo");
    tracing::info!("Try: curl http://localhost:8080/headers");
    tracing::info!("Health check: curl http://localhost:8080/_health");

    server.run().await
}
