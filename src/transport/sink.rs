use std::io;

use http::HeaderMap;

/// Request half of the transport pair.
pub type IncomingRequest = http::Request<Vec<u8>>;

/// Response half of the transport pair.
///
/// Implementations must honour header-then-status-then-body ordering:
///
/// 1. [`headers_mut`](ResponseSink::headers_mut) stages headers
/// 2. [`write_status`](ResponseSink::write_status) commits the status line together
///    with the staged headers; headers staged afterwards are not sent
/// 3. [`write_body`](ResponseSink::write_body) streams payload bytes, committing
///    `200` first if no status was written
///
/// A second `write_status` is superfluous and must be ignored, not sent.
pub trait ResponseSink {
    fn headers_mut(&mut self) -> &mut HeaderMap;

    fn write_status(&mut self, status: u16);

    fn write_body(&mut self, chunk: &[u8]) -> io::Result<()>;
}
