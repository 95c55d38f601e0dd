use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use tracing::{debug, info_span, trace};

use crate::config::{ContextConfig, Continuation};
use crate::error::ResponseError;
use crate::state::{ParamVec, RequestState};
use crate::transport::{IncomingRequest, ResponseSink};

/// A middleware or endpoint.
///
/// Receives the context of the current request and may call [`Context::next`]
/// or [`Context::fail`]. Must not keep the context past the call.
pub type HandlerFunc = Arc<dyn Fn(&mut Context<'_>) + Send + Sync>;

/// Wrap a closure or function as a [`HandlerFunc`].
#[must_use]
pub fn handler<F>(f: F) -> HandlerFunc
where
    F: Fn(&mut Context<'_>) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Ordered, immutable handler sequence for one matched route.
///
/// Cheap to clone; a router builds one per route at startup and hands a clone
/// to every request.
#[derive(Clone)]
pub struct HandlerChain {
    handlers: Arc<[HandlerFunc]>,
}

impl HandlerChain {
    #[must_use]
    pub fn new(handlers: Vec<HandlerFunc>) -> Self {
        Self {
            handlers: handlers.into(),
        }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Global middleware first, then the route's own handlers.
    #[must_use]
    pub fn combine(global: &HandlerChain, route: &HandlerChain) -> Self {
        let handlers: Vec<HandlerFunc> = global
            .handlers
            .iter()
            .chain(route.handlers.iter())
            .map(Arc::clone)
            .collect();
        Self::new(handlers)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    fn get(&self, index: isize) -> Option<HandlerFunc> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.handlers.get(i))
            .map(Arc::clone)
    }
}

impl Default for HandlerChain {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Vec<HandlerFunc>> for HandlerChain {
    fn from(handlers: Vec<HandlerFunc>) -> Self {
        Self::new(handlers)
    }
}

impl fmt::Debug for HandlerChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerChain")
            .field("len", &self.handlers.len())
            .finish()
    }
}

/// Per-request execution context: the request state plus the handler chain
/// and its cursor.
///
/// Dereferences to [`RequestState`], so handlers call `ctx.param("id")` or
/// `ctx.write_json(..)` directly.
///
/// # Cursor
///
/// Starts one before the first handler (`-1`) and only moves forward: `next()`
/// advances it, `fail()` pushes it to the end of the chain. No handler runs twice.
pub struct Context<'w> {
    state: RequestState<'w>,
    handlers: HandlerChain,
    cursor: isize,
    continuation: Continuation,
    aborted: bool,
}

impl<'w> Context<'w> {
    /// Build a context with the default configuration.
    pub fn new(
        sink: &'w mut dyn ResponseSink,
        request: IncomingRequest,
        params: ParamVec,
        handlers: HandlerChain,
    ) -> Self {
        Self::with_config(sink, request, params, handlers, &ContextConfig::default())
    }

    pub fn with_config(
        sink: &'w mut dyn ResponseSink,
        request: IncomingRequest,
        params: ParamVec,
        handlers: HandlerChain,
        config: &ContextConfig,
    ) -> Self {
        Self {
            state: RequestState::new(sink, request, params, config.response_guard),
            handlers,
            cursor: -1,
            continuation: config.continuation,
            aborted: false,
        }
    }

    /// Run the rest of the chain, then return to the caller.
    ///
    /// Called from inside handler *i*, this drives handlers *i+1..* to completion
    /// before returning, so code placed after the call runs once everything
    /// downstream has finished. Calling it again once the chain is exhausted does
    /// nothing.
    pub fn next(&mut self) {
        self.cursor = self.cursor.saturating_add(1);
        while let Some(handler) = self.handlers.get(self.cursor) {
            let entered = self.cursor;
            trace!(
                request_id = %self.state.request_id(),
                index = entered,
                "Invoking handler"
            );
            handler(self);
            if self.cursor == entered && self.continuation == Continuation::Explicit {
                // returned without next(): the suffix is skipped
                self.cursor = self.end();
            }
            self.cursor = self.cursor.saturating_add(1);
        }
    }

    /// Stop the chain and respond with `{"message": message}` under `code`.
    ///
    /// Handlers after the current one never run. The current handler itself keeps
    /// going after this call returns, so callers should return right away:
    ///
    /// ```rust
    /// # use chainctx::chain::Context;
    /// fn guard(ctx: &mut Context<'_>) {
    ///     if ctx.get_header("authorization").is_empty() {
    ///         ctx.fail(401, "Unauthorized");
    ///         return;
    ///     }
    ///     ctx.next();
    /// }
    /// ```
    pub fn fail(&mut self, code: u16, message: &str) {
        self.cursor = self.cursor.max(self.end());
        self.aborted = true;
        debug!(
            request_id = %self.state.request_id(),
            status = code,
            message,
            "Handler chain aborted"
        );
        self.state
            .write_json(code, &serde_json::json!({ "message": message }));
    }

    /// Whether [`fail`](Self::fail) was called on this context
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    #[must_use]
    pub fn cursor(&self) -> isize {
        self.cursor
    }

    #[must_use]
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Drive the whole chain once and report the first response fault, if any.
    ///
    /// This is the entry point a server loop uses: one call per request, after
    /// which the context and its borrow of the sink are gone.
    pub fn execute(mut self) -> Result<(), ResponseError> {
        let span = info_span!(
            "chain",
            request_id = %self.state.request_id(),
            method = %self.state.method(),
            path = %self.state.path(),
            handlers = self.handlers.len()
        );
        let _enter = span.enter();

        self.next();

        let faults = self.state.take_faults();
        debug!(
            status = ?self.state.status_code(),
            aborted = self.aborted,
            faults = faults.len(),
            "Handler chain finished"
        );
        match faults.into_iter().next() {
            Some(fault) => Err(fault),
            None => Ok(()),
        }
    }

    fn end(&self) -> isize {
        isize::try_from(self.handlers.len()).unwrap_or(isize::MAX)
    }
}

impl<'w> Deref for Context<'w> {
    type Target = RequestState<'w>;

    fn deref(&self) -> &Self::Target {
        &self.state
    }
}

impl<'w> DerefMut for Context<'w> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.state
    }
}
