use crate::chain::{handler, HandlerFunc};
use crate::ids::REQUEST_ID_HEADER;

/// Echo the request id back in `X-Request-Id` so clients can quote it.
pub fn request_id() -> HandlerFunc {
    handler(|ctx| {
        let id = ctx.request_id().to_string();
        ctx.set_header(REQUEST_ID_HEADER, &id);
        ctx.next();
    })
}
