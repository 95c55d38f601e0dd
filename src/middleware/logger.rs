use std::time::Instant;

use tracing::info;

use crate::chain::{handler, HandlerFunc};

/// Log one line per request once everything downstream has finished.
pub fn logger() -> HandlerFunc {
    handler(|ctx| {
        let start = Instant::now();
        ctx.next();
        let latency = start.elapsed();
        info!(
            request_id = %ctx.request_id(),
            method = %ctx.method(),
            path = %ctx.path(),
            status = ctx.status_code().unwrap_or(200),
            aborted = ctx.is_aborted(),
            latency_us = u64::try_from(latency.as_micros()).unwrap_or(u64::MAX),
            "Request completed"
        );
    })
}
