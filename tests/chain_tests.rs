//! Tests for handler chain execution
//!
//! # Test Coverage
//!
//! - Every handler runs once, in order, from a single top-level `next()`
//! - A handler that skips `next()` stops the rest of the chain
//! - Extra `next()` calls after the chain is exhausted do nothing
//! - Before/after ordering across nested middleware
//! - `fail()` responses and what still runs after them
//! - Empty chains and missing route parameters

use std::sync::Arc;

use chainctx::chain::{handler, Context, HandlerChain, HandlerFunc};
use chainctx::config::{ContextConfig, Continuation, ResponseGuard};
use chainctx::error::ResponseError;
use chainctx::state::ParamVec;
use chainctx::transport::ResponseRecorder;
use parking_lot::Mutex;

use tracing_util::TestTracing;

type Trace = Arc<Mutex<Vec<String>>>;

fn new_trace() -> Trace {
    Arc::new(Mutex::new(Vec::new()))
}

fn get(uri: &str) -> http::Request<Vec<u8>> {
    http::Request::get(uri).body(Vec::new()).unwrap()
}

/// Appends `before`, calls `next()`, appends `after`.
fn wrap(trace: &Trace, before: &'static str, after: &'static str) -> HandlerFunc {
    let trace = Arc::clone(trace);
    handler(move |ctx| {
        trace.lock().push(before.to_string());
        ctx.next();
        trace.lock().push(after.to_string());
    })
}

/// Appends `tag` and returns without calling `next()`.
fn leaf(trace: &Trace, tag: &'static str) -> HandlerFunc {
    let trace = Arc::clone(trace);
    handler(move |_ctx| {
        trace.lock().push(tag.to_string());
    })
}

/// Appends `tag` and passes control on.
fn pass(trace: &Trace, tag: &'static str) -> HandlerFunc {
    let trace = Arc::clone(trace);
    handler(move |ctx| {
        trace.lock().push(tag.to_string());
        ctx.next();
    })
}

fn snapshot(trace: &Trace) -> Vec<String> {
    trace.lock().clone()
}

#[test]
fn test_each_handler_runs_once_in_order() {
    let _tracing = TestTracing::init();
    for len in 1..=6 {
        let trace = new_trace();
        let mut handlers: Vec<HandlerFunc> = (0..len - 1)
            .map(|i| {
                let trace = Arc::clone(&trace);
                handler(move |ctx| {
                    trace.lock().push(format!("h{i}"));
                    ctx.next();
                })
            })
            .collect();
        handlers.push(leaf(&trace, "endpoint"));

        let mut rec = ResponseRecorder::new();
        let mut ctx = Context::new(&mut rec, get("/"), ParamVec::new(), handlers.into());
        ctx.next();

        let mut expected: Vec<String> = (0..len - 1).map(|i| format!("h{i}")).collect();
        expected.push("endpoint".to_string());
        assert_eq!(snapshot(&trace), expected, "chain of length {len}");
    }
}

#[test]
fn test_implicit_mode_runs_every_handler_once() {
    let trace = new_trace();
    let chain = HandlerChain::new(vec![
        leaf(&trace, "a"),
        pass(&trace, "b"),
        leaf(&trace, "c"),
        leaf(&trace, "d"),
    ]);
    let config = ContextConfig {
        continuation: Continuation::Implicit,
        ..ContextConfig::default()
    };

    let mut rec = ResponseRecorder::new();
    let mut ctx = Context::with_config(&mut rec, get("/"), ParamVec::new(), chain, &config);
    ctx.next();
    assert_eq!(snapshot(&trace), vec!["a", "b", "c", "d"]);
}

#[test]
fn test_handler_without_next_short_circuits() {
    let trace = new_trace();
    let chain = HandlerChain::new(vec![
        pass(&trace, "mw1"),
        leaf(&trace, "mw2"),
        leaf(&trace, "endpoint"),
    ]);

    let mut rec = ResponseRecorder::new();
    let mut ctx = Context::new(&mut rec, get("/"), ParamVec::new(), chain);
    ctx.next();
    assert_eq!(snapshot(&trace), vec!["mw1", "mw2"]);
}

#[test]
fn test_first_handler_without_next_short_circuits() {
    let trace = new_trace();
    let chain = HandlerChain::new(vec![leaf(&trace, "gate"), leaf(&trace, "endpoint")]);

    let mut rec = ResponseRecorder::new();
    let mut ctx = Context::new(&mut rec, get("/"), ParamVec::new(), chain);
    ctx.next();
    assert_eq!(snapshot(&trace), vec!["gate"]);
}

#[test]
fn test_next_after_exhaustion_is_noop() {
    let trace = new_trace();
    let chain = HandlerChain::new(vec![pass(&trace, "mw"), leaf(&trace, "endpoint")]);

    let mut rec = ResponseRecorder::new();
    let mut ctx = Context::new(&mut rec, get("/"), ParamVec::new(), chain);
    ctx.next();
    let cursor = ctx.cursor();
    ctx.next();
    ctx.next();
    assert!(ctx.cursor() >= cursor);
    assert_eq!(snapshot(&trace), vec!["mw", "endpoint"]);
}

#[test]
fn test_onion_ordering() {
    let trace = new_trace();
    let chain = HandlerChain::new(vec![
        wrap(&trace, "a1", "a2"),
        wrap(&trace, "b1", "b2"),
        leaf(&trace, "c1"),
    ]);

    let mut rec = ResponseRecorder::new();
    let mut ctx = Context::new(&mut rec, get("/"), ParamVec::new(), chain);
    ctx.next();
    assert_eq!(snapshot(&trace), vec!["a1", "b1", "c1", "b2", "a2"]);
}

#[test]
fn test_stopping_handler_unwinds_outer_after_code() {
    // A and C call next(), B does not: C never runs, A's after-code still does
    let trace = new_trace();
    let chain = HandlerChain::new(vec![
        wrap(&trace, "A-before", "A-after"),
        leaf(&trace, "B-action"),
        wrap(&trace, "C-before", "C-after"),
    ]);

    let mut rec = ResponseRecorder::new();
    let mut ctx = Context::new(&mut rec, get("/"), ParamVec::new(), chain);
    ctx.next();
    assert_eq!(snapshot(&trace), vec!["A-before", "B-action", "A-after"]);
}

#[test]
fn test_fail_aborts_chain_and_writes_json() {
    let _tracing = TestTracing::init();
    let trace = new_trace();
    let mw2 = {
        let trace = Arc::clone(&trace);
        handler(move |ctx| {
            trace.lock().push("b1".to_string());
            ctx.fail(403, "forbidden");
        })
    };
    let chain = HandlerChain::new(vec![wrap(&trace, "a1", "a2"), mw2, leaf(&trace, "c1")]);

    let mut rec = ResponseRecorder::new();
    let ctx = Context::new(&mut rec, get("/admin"), ParamVec::new(), chain);
    ctx.execute().unwrap();

    // mw1's code after next() still runs once mw2 has failed
    assert_eq!(snapshot(&trace), vec!["a1", "b1", "a2"]);
    assert_eq!(rec.status(), 403);
    assert_eq!(rec.header("content-type"), Some("application/json"));
    assert_eq!(rec.body_str(), r#"{"message":"forbidden"}"#);
}

#[test]
fn test_code_after_fail_in_same_handler_still_runs() {
    let trace = new_trace();
    let failing = {
        let trace = Arc::clone(&trace);
        handler(move |ctx| {
            ctx.fail(400, "bad input");
            trace.lock().push("after-fail".to_string());
        })
    };
    let chain = HandlerChain::new(vec![failing, leaf(&trace, "endpoint")]);

    let mut rec = ResponseRecorder::new();
    let mut ctx = Context::new(&mut rec, get("/"), ParamVec::new(), chain);
    ctx.next();
    assert!(ctx.is_aborted());
    assert_eq!(snapshot(&trace), vec!["after-fail"]);
}

#[test]
fn test_body_after_fail_is_fault_when_strict() {
    let chain = HandlerChain::new(vec![handler(|ctx| {
        ctx.fail(403, "forbidden");
        ctx.write_text(200, "oops");
    })]);
    let config = ContextConfig {
        response_guard: ResponseGuard::Strict,
        ..ContextConfig::default()
    };

    let mut rec = ResponseRecorder::new();
    let ctx = Context::with_config(&mut rec, get("/"), ParamVec::new(), chain, &config);
    let err = ctx.execute().unwrap_err();
    assert!(matches!(
        err,
        ResponseError::AlreadyFinalized {
            operation: "write_text"
        }
    ));
    assert_eq!(rec.status(), 403);
    assert_eq!(rec.body_str(), r#"{"message":"forbidden"}"#);
}

#[test]
fn test_body_after_fail_appends_when_permissive() {
    let chain = HandlerChain::new(vec![handler(|ctx| {
        ctx.fail(403, "forbidden");
        ctx.write_text(200, "oops");
    })]);

    let mut rec = ResponseRecorder::new();
    let ctx = Context::new(&mut rec, get("/"), ParamVec::new(), chain);
    ctx.execute().unwrap();
    assert_eq!(rec.status(), 403);
    assert_eq!(rec.body_str(), r#"{"message":"forbidden"}oops"#);
}

#[test]
fn test_missing_param_is_empty_string() {
    let seen = Arc::new(Mutex::new(None));
    let endpoint = {
        let seen = Arc::clone(&seen);
        handler(move |ctx| {
            *seen.lock() = Some(ctx.param("missing").to_string());
        })
    };

    let mut params = ParamVec::new();
    params.push((Arc::from("id"), "7".to_string()));
    let mut rec = ResponseRecorder::new();
    let ctx = Context::new(&mut rec, get("/pets/7"), params, HandlerChain::new(vec![endpoint]));
    ctx.execute().unwrap();
    assert_eq!(seen.lock().as_deref(), Some(""));
}

#[test]
fn test_empty_chain_is_noop() {
    let mut rec = ResponseRecorder::new();
    let mut ctx = Context::new(&mut rec, get("/"), ParamVec::new(), HandlerChain::empty());
    ctx.next();
    assert!(!ctx.is_aborted());
    assert_eq!(ctx.status_code(), None);
    assert!(ctx.execute().is_ok());
    assert!(!rec.is_committed());
    assert!(rec.body().is_empty());
}

#[test]
fn test_chain_is_reusable_across_requests() {
    let trace = new_trace();
    let chain = HandlerChain::new(vec![wrap(&trace, "in", "out"), leaf(&trace, "endpoint")]);

    for _ in 0..3 {
        let mut rec = ResponseRecorder::new();
        Context::new(&mut rec, get("/"), ParamVec::new(), chain.clone())
            .execute()
            .unwrap();
    }
    assert_eq!(snapshot(&trace).len(), 9);
}

#[test]
fn test_chain_shared_between_threads() {
    let chain = HandlerChain::new(vec![handler(|ctx| {
        let n = ctx.query_value("n");
        ctx.write_text(200, n);
    })]);

    let workers: Vec<_> = (0..4)
        .map(|i| {
            let chain = chain.clone();
            std::thread::spawn(move || {
                let mut rec = ResponseRecorder::new();
                Context::new(&mut rec, get(&format!("/?n={i}")), ParamVec::new(), chain)
                    .execute()
                    .unwrap();
                rec.body_str()
            })
        })
        .collect();

    let mut bodies: Vec<String> = workers.into_iter().map(|w| w.join().unwrap()).collect();
    bodies.sort();
    assert_eq!(bodies, vec!["0", "1", "2", "3"]);
}
