//! Ready-made handlers for the concerns most chains share.
//!
//! Each constructor returns a [`HandlerFunc`](crate::chain::HandlerFunc) meant to
//! sit in front of route handlers, usually via
//! [`HandlerChain::combine`](crate::chain::HandlerChain::combine).

mod auth;
mod logger;
mod request_id;

pub use auth::require_token;
pub use logger::logger;
pub use request_id::request_id;
