//! Adapter entry point: one invocation event in, one envelope out.

pub mod completion;
pub mod handler;
pub mod mapper;

pub use completion::await_completion;
pub use handler::{VergeError, VergeHandler};
pub use mapper::{map_event, map_response};

use crate::edge::{EdgeEnvelope, EdgeEvent, EdgeRecords};
use tracing::debug;

/// Runs a stream-style handler against invocation events.
///
/// Each call to [`invoke`](EdgeAdapter::invoke) maps the event into a
/// synthetic request/response pair, runs the handler, awaits the sink's
/// completion, and maps the buffered response into an envelope. Handler
/// exceptions and completion errors propagate unchanged; the invoking
/// runtime owns user-visible failure presentation.
pub struct EdgeAdapter<H> {
    handler: H,
}

impl<H: VergeHandler> EdgeAdapter<H> {
    /// Wrap a handler.
    pub fn new(handler: H) -> Self {
        Self { handler }
    }

    /// Process one invocation event into a response envelope.
    pub async fn invoke(&self, event: EdgeEvent) -> Result<EdgeEnvelope, VergeError> {
        let (request, response) = map_event(&event)?;

        debug!(
            "invoking handler: {} {} from {}",
            request.method(),
            request.url(),
            request.remote_addr()
        );

        self.handler.handle(request, response.clone()).await?;
        await_completion(&response).await?;

        Ok(map_response(&response))
    }

    /// Process a `Records`-wrapped event as the CDN delivers it.
    pub async fn invoke_records(&self, records: EdgeRecords) -> Result<EdgeEnvelope, VergeError> {
        let event = records
            .into_event()
            .ok_or_else(|| VergeError::event("no request record in event"))?;
        self.invoke(event).await
    }
}

/// Free-function spelling: wrap a handler into an adapter.
pub fn adapt<H: VergeHandler>(handler: H) -> EdgeAdapter<H> {
    EdgeAdapter::new(handler)
}
