//! # chainctx
//!
//! **chainctx** is the request-handling core of a minimal HTTP server toolkit: a
//! per-request [`Context`](chain::Context) that carries request and response state
//! through an ordered chain of handlers, and a `next()` primitive that lets any
//! handler run code before and after everything positioned after it.
//!
//! ## Architecture
//!
//! - **[`transport`]** - The raw request/response pair a server hands over per exchange
//! - **[`state`]** - [`RequestState`](state::RequestState): method, path, params, query and
//!   form values, headers, status and body writers
//! - **[`chain`]** - [`Context`](chain::Context), [`HandlerChain`](chain::HandlerChain),
//!   `next()` and `fail()`
//! - **[`config`]** - Continuation and response-guard policies
//! - **[`middleware`]** - Logging, request id and token check handlers
//! - **[`error`]** - Faults recorded while shaping a response
//!
//! ### Request Handling Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Server as Server loop
//!     participant Router as Router
//!     participant Ctx as Context
//!     participant MW as Middleware
//!     participant EP as Endpoint
//!
//!     Server->>Router: resolve(method, path)
//!     Router-->>Server: HandlerChain + ParamVec
//!     Server->>Ctx: Context::new(sink, request, params, chain)
//!     Server->>Ctx: execute()
//!     Ctx->>MW: handler 0
//!     MW->>MW: before
//!     MW->>Ctx: next()
//!     Ctx->>EP: handler 1
//!     EP->>Ctx: write_json(200, body)
//!     EP-->>Ctx: return
//!     Ctx-->>MW: next() returns
//!     MW->>MW: after
//!     MW-->>Ctx: return
//!     Ctx-->>Server: Ok(()) or first fault
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use chainctx::chain::{handler, Context, HandlerChain};
//! use chainctx::middleware::{logger, require_token};
//! use chainctx::state::ParamVec;
//! use chainctx::transport::ResponseRecorder;
//! use std::sync::Arc;
//!
//! let global = HandlerChain::new(vec![logger(), require_token("Bearer s3cret")]);
//! let route = HandlerChain::new(vec![handler(|ctx| {
//!     let id = ctx.param("id").to_string();
//!     ctx.write_json(200, &serde_json::json!({ "id": id }));
//! })]);
//! let chain = HandlerChain::combine(&global, &route);
//!
//! let mut params = ParamVec::new();
//! params.push((Arc::from("id"), "42".to_string()));
//! let request = http::Request::get("/pets/42")
//!     .header("authorization", "Bearer s3cret")
//!     .body(Vec::new())
//!     .unwrap();
//!
//! let mut recorder = ResponseRecorder::new();
//! Context::new(&mut recorder, request, params, chain).execute().unwrap();
//! assert_eq!(recorder.body_str(), r#"{"id":"42"}"#);
//! ```
//!
//! ## Runtime Considerations
//!
//! The chain runs synchronously on whatever task the server assigned to the
//! request. A blocking handler blocks that request only. Nothing is shared between
//! contexts; timeouts and cancellation belong to the server.

pub mod chain;
pub mod config;
pub mod error;
pub mod ids;
pub mod middleware;
pub mod state;
pub mod transport;

pub use chain::{handler, Context, HandlerChain, HandlerFunc};
pub use config::{ContextConfig, Continuation, ResponseGuard};
pub use error::ResponseError;
pub use state::{ParamVec, RequestState};
pub use transport::{IncomingRequest, ResponseRecorder, ResponseSink};
