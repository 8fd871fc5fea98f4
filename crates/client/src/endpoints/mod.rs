//! Remote endpoint calls.

mod event_spec;
pub mod request;
mod track;

pub use event_spec::get_event_spec;
pub use request::{RequestLabels, RetryPolicy, send_request_with_retry};
pub use track::post_events;
