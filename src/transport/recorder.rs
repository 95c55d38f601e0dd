use std::io;

use http::HeaderMap;
use tracing::warn;

use super::ResponseSink;

/// In-memory [`ResponseSink`].
///
/// Mirrors what a real connection would put on the wire: the headers visible
/// through [`header`](ResponseRecorder::header) are the ones committed with the
/// status line, not whatever was staged later.
#[derive(Debug, Default)]
pub struct ResponseRecorder {
    staged: HeaderMap,
    committed: Option<(u16, HeaderMap)>,
    body: Vec<u8>,
}

impl ResponseRecorder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Committed status, `200` if nothing was written yet.
    #[must_use]
    pub fn status(&self) -> u16 {
        self.committed.as_ref().map_or(200, |(status, _)| *status)
    }

    #[must_use]
    pub fn is_committed(&self) -> bool {
        self.committed.is_some()
    }

    /// Committed header value, `None` when absent or staged after the status line.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.committed
            .as_ref()
            .and_then(|(_, headers)| headers.get(name))
            .and_then(|v| v.to_str().ok())
    }

    #[must_use]
    pub fn committed_headers(&self) -> Option<&HeaderMap> {
        self.committed.as_ref().map(|(_, headers)| headers)
    }

    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    #[must_use]
    pub fn body_str(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

impl ResponseSink for ResponseRecorder {
    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.staged
    }

    fn write_status(&mut self, status: u16) {
        if let Some((committed, _)) = &self.committed {
            warn!(
                committed = *committed,
                attempted = status,
                "Superfluous status write ignored"
            );
            return;
        }
        self.committed = Some((status, self.staged.clone()));
    }

    fn write_body(&mut self, chunk: &[u8]) -> io::Result<()> {
        if self.committed.is_none() {
            self.write_status(200);
        }
        self.body.extend_from_slice(chunk);
        Ok(())
    }
}
