//! # Transport Module
//!
//! The raw request/response pair a server hands to a [`Context`](crate::chain::Context)
//! for one exchange.
//!
//! - [`IncomingRequest`] is the request half: an `http::Request` whose body has
//!   already been read into memory by the server loop.
//! - [`ResponseSink`] is the response half. It follows the usual wire ordering:
//!   headers are staged first, the status line commits them, payload bytes follow.
//! - [`ResponseRecorder`] is an in-memory sink used by tests and by servers that
//!   buffer the whole response before flushing it.

mod recorder;
mod sink;

pub use recorder::ResponseRecorder;
pub use sink::{IncomingRequest, ResponseSink};
