//! # Chain Module
//!
//! Onion-style execution of an ordered handler sequence over one shared
//! [`Context`].
//!
//! ## Overview
//!
//! A router resolves a request to a [`HandlerChain`] (global middleware plus the
//! route's handlers), builds one [`Context`] around the transport pair and calls
//! [`Context::execute`]. From there the handlers drive the chain themselves:
//!
//! - [`Context::next`] runs every handler after the current one, then returns,
//!   so a middleware can act both before and after the rest of the chain
//! - returning without `next()` short-circuits the rest of the chain (see
//!   [`Continuation`](crate::config::Continuation) for the alternative policy)
//! - [`Context::fail`] stops the chain and writes a JSON error body
//!
//! ## Example
//!
//! ```rust
//! use chainctx::chain::{handler, Context, HandlerChain};
//! use chainctx::state::ParamVec;
//! use chainctx::transport::ResponseRecorder;
//!
//! let chain = HandlerChain::new(vec![
//!     handler(|ctx| {
//!         ctx.set_header("x-powered-by", "chainctx");
//!         ctx.next();
//!     }),
//!     handler(|ctx| {
//!         let name = ctx.query_value("name");
//!         ctx.write_text(200, format_args!("hello {}", name));
//!     }),
//! ]);
//!
//! let mut recorder = ResponseRecorder::new();
//! let request = http::Request::get("/greet?name=ada").body(Vec::new()).unwrap();
//! Context::new(&mut recorder, request, ParamVec::new(), chain)
//!     .execute()
//!     .unwrap();
//!
//! assert_eq!(recorder.header("x-powered-by"), Some("chainctx"));
//! assert_eq!(recorder.body_str(), "hello ada");
//! ```
//!
//! ## Concurrency
//!
//! A context belongs to exactly one request and is driven synchronously by the
//! task that built it. Handlers are `Send + Sync` so one chain can be shared by
//! every connection task; contexts themselves are never shared.

mod core;

pub use self::core::{handler, Context, HandlerChain, HandlerFunc};
