//! Edge-side wire types: the invocation event and the response envelope.

mod envelope;
mod event;

pub use envelope::{BodyEncoding, EdgeEnvelope};
pub use event::{EdgeEvent, EdgeEventBody, EdgeRecord, EdgeRecordPayload, EdgeRecords, HeaderEntry};
