//! # Request State Module
//!
//! [`RequestState`] is the read/write surface handlers use during one exchange:
//!
//! - **Request side**: method, path, route parameters, query and form values,
//!   request headers
//! - **Response side**: response headers, the status line and the body writers
//!   (`write_text`, `write_json`, `write_bytes`, `write_html`)
//!
//! ## Write ordering
//!
//! Headers must be set before the status line goes out. Every body writer sets its
//! content type, commits the status and then streams the payload, so a handler
//! that needs extra headers sets them first:
//!
//! ```rust
//! use chainctx::state::{ParamVec, RequestState};
//! use chainctx::transport::ResponseRecorder;
//!
//! let mut recorder = ResponseRecorder::new();
//! let request = http::Request::get("/pets/7").body(Vec::new()).unwrap();
//! let mut state = RequestState::new(&mut recorder, request, ParamVec::new(), Default::default());
//!
//! state.set_header("cache-control", "no-store");
//! state.write_text(200, "ok");
//! drop(state);
//!
//! assert_eq!(recorder.header("cache-control"), Some("no-store"));
//! assert_eq!(recorder.body_str(), "ok");
//! ```
//!
//! ## Misuse
//!
//! Writing the status twice or setting headers after it is not rejected under
//! [`ResponseGuard::Permissive`](crate::config::ResponseGuard::Permissive): the
//! transport keeps what it already sent. Under
//! [`ResponseGuard::Strict`](crate::config::ResponseGuard::Strict) the write is
//! skipped and recorded in [`RequestState::faults`].

mod core;

pub use self::core::{ParamVec, RequestState, MAX_INLINE_PARAMS};
