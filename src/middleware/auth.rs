use http::header::AUTHORIZATION;
use tracing::warn;

use crate::chain::{handler, HandlerFunc};

/// Reject requests whose `Authorization` header differs from `expected`.
///
/// Responds `401 {"message":"Unauthorized"}` and stops the chain on mismatch.
pub fn require_token(expected: impl Into<String>) -> HandlerFunc {
    let expected: String = expected.into();
    handler(move |ctx| {
        if ctx.get_header(AUTHORIZATION.as_str()) != expected {
            warn!(
                request_id = %ctx.request_id(),
                path = %ctx.path(),
                "Rejecting request with missing or invalid credentials"
            );
            ctx.fail(401, "Unauthorized");
            return;
        }
        ctx.next();
    })
}
