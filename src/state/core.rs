use std::fmt;
use std::sync::Arc;

use http::header::{CONTENT_TYPE, X_CONTENT_TYPE_OPTIONS};
use http::{HeaderName, HeaderValue, Method};
use once_cell::unsync::OnceCell;
use serde::Serialize;
use smallvec::SmallVec;
use tracing::{debug, warn};

use crate::config::ResponseGuard;
use crate::error::ResponseError;
use crate::ids::{RequestId, REQUEST_ID_HEADER};
use crate::transport::{IncomingRequest, ResponseSink};

/// Maximum number of route parameters stored inline before spilling to the heap.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Route parameters extracted by the router, in path order.
///
/// Names are `Arc<str>` because they come from the route table and are shared
/// across requests; values are per-request.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const TEXT_PLAIN: &str = "text/plain";
const TEXT_HTML: &str = "text/html";
const APPLICATION_JSON: &str = "application/json";
const OCTET_STREAM: &str = "application/octet-stream";
const ERROR_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Mutable per-request data shared by every handler of one chain.
///
/// Owns the request for the whole exchange and borrows the response sink
/// exclusively; nothing else may write to the sink while the state is alive.
pub struct RequestState<'w> {
    request_id: RequestId,
    method: Method,
    path: String,
    params: ParamVec,
    status_code: Option<u16>,
    request: IncomingRequest,
    form: OnceCell<Vec<(String, String)>>,
    sink: &'w mut dyn ResponseSink,
    guard: ResponseGuard,
    faults: Vec<ResponseError>,
}

impl<'w> RequestState<'w> {
    /// Snapshot method, path and request id from `request` and take ownership of it.
    ///
    /// `params` must already hold every route parameter; the state never adds any.
    pub fn new(
        sink: &'w mut dyn ResponseSink,
        request: IncomingRequest,
        params: ParamVec,
        guard: ResponseGuard,
    ) -> Self {
        let request_id = RequestId::from_header_or_new(
            request
                .headers()
                .get(REQUEST_ID_HEADER)
                .and_then(|v| v.to_str().ok()),
        );
        let method = request.method().clone();
        let path = request.uri().path().to_string();

        debug!(
            request_id = %request_id,
            method = %method,
            path = %path,
            param_count = params.len(),
            "Request state created"
        );

        Self {
            request_id,
            method,
            path,
            params,
            status_code: None,
            request,
            form: OnceCell::new(),
            sink,
            guard,
            faults: Vec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    #[inline]
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Request path without the query string
    #[inline]
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[inline]
    #[must_use]
    pub fn params(&self) -> &ParamVec {
        &self.params
    }

    /// The underlying request, for anything the accessors below do not cover
    #[inline]
    #[must_use]
    pub fn request(&self) -> &IncomingRequest {
        &self.request
    }

    /// Last status passed to [`set_status`](Self::set_status), `None` before any
    #[inline]
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        self.status_code
    }

    /// Whether the status line has been written to the transport
    #[inline]
    #[must_use]
    pub fn is_finalized(&self) -> bool {
        self.status_code.is_some()
    }

    #[must_use]
    pub fn guard(&self) -> ResponseGuard {
        self.guard
    }

    /// Faults recorded so far, in the order they happened
    #[must_use]
    pub fn faults(&self) -> &[ResponseError] {
        &self.faults
    }

    pub(crate) fn take_faults(&mut self) -> Vec<ResponseError> {
        std::mem::take(&mut self.faults)
    }

    /// Route parameter by name, `""` when absent.
    ///
    /// Last write wins if the route repeats a parameter name at different depths.
    #[inline]
    #[must_use]
    pub fn param(&self, key: &str) -> &str {
        self.params
            .iter()
            .rfind(|(k, _)| k.as_ref() == key)
            .map_or("", |(_, v)| v.as_str())
    }

    /// Decoded query-string value, `""` when absent. The first occurrence wins.
    #[must_use]
    pub fn query_value(&self, key: &str) -> String {
        self.request
            .uri()
            .query()
            .and_then(|query| {
                url::form_urlencoded::parse(query.as_bytes())
                    .find(|(k, _)| k == key)
                    .map(|(_, v)| v.into_owned())
            })
            .unwrap_or_default()
    }

    /// Decoded form-body value, `""` when absent or when the body is not form-encoded.
    ///
    /// The body is parsed on first use and the result is reused afterwards.
    #[must_use]
    pub fn form_value(&self, key: &str) -> String {
        self.form_fields()
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
            .unwrap_or_default()
    }

    fn form_fields(&self) -> &[(String, String)] {
        self.form.get_or_init(|| {
            let fields = parse_form(&self.request);
            debug!(
                request_id = %self.request_id,
                field_count = fields.len(),
                "Form body parsed"
            );
            fields
        })
    }

    /// Request header value, `""` when absent. Non-UTF-8 bytes are replaced.
    #[must_use]
    pub fn get_header(&self, key: &str) -> String {
        self.request
            .headers()
            .get(key)
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
            .unwrap_or_default()
    }

    /// Stage a response header, replacing any previous value.
    ///
    /// Only takes effect when called before the status line is written.
    pub fn set_header(&mut self, key: &str, value: &str) {
        if self.reject_after_finalize("set_header") {
            return;
        }
        match (
            HeaderName::from_bytes(key.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.sink.headers_mut().insert(name, value);
            }
            _ => {
                warn!(
                    request_id = %self.request_id,
                    header = %key,
                    "Dropping invalid response header"
                );
                if self.guard == ResponseGuard::Strict {
                    self.faults.push(ResponseError::InvalidHeader {
                        name: key.to_string(),
                    });
                }
            }
        }
    }

    /// Record `code` and write the status line.
    ///
    /// Call once per response. The status line cannot be taken back; a second call
    /// is forwarded and ignored by the transport, or rejected under
    /// [`ResponseGuard::Strict`].
    pub fn set_status(&mut self, code: u16) {
        self.commit_status("set_status", code);
    }

    /// Plain-text response.
    pub fn write_text(&mut self, code: u16, text: impl fmt::Display) {
        if self.begin_response("write_text", code, Some(HeaderValue::from_static(TEXT_PLAIN))) {
            self.write_payload(text.to_string().as_bytes());
        }
    }

    /// JSON response.
    ///
    /// The value is encoded before anything is written, so an encoding failure
    /// still produces a well-formed `500` carrying the encoder's message.
    pub fn write_json<T: Serialize + ?Sized>(&mut self, code: u16, value: &T) {
        match serde_json::to_vec(value) {
            Ok(bytes) => {
                let content_type = HeaderValue::from_static(APPLICATION_JSON);
                if self.begin_response("write_json", code, Some(content_type)) {
                    self.write_payload(&bytes);
                }
            }
            Err(err) => {
                warn!(
                    request_id = %self.request_id,
                    status = code,
                    error = %err,
                    "JSON encoding failed"
                );
                self.write_error(500, &err.to_string());
            }
        }
    }

    /// Raw bytes. Defaults the content type to `application/octet-stream` unless
    /// the handler already set one.
    pub fn write_bytes(&mut self, code: u16, data: &[u8]) {
        let content_type = if self.sink.headers_mut().contains_key(CONTENT_TYPE) {
            None
        } else {
            Some(HeaderValue::from_static(OCTET_STREAM))
        };
        if self.begin_response("write_bytes", code, content_type) {
            self.write_payload(data);
        }
    }

    /// HTML response.
    pub fn write_html(&mut self, code: u16, html: impl AsRef<str>) {
        if self.begin_response("write_html", code, Some(HeaderValue::from_static(TEXT_HTML))) {
            self.write_payload(html.as_ref().as_bytes());
        }
    }

    /// Plain-text error in the shape net/http servers emit: `nosniff`, UTF-8
    /// text and a trailing newline.
    pub fn write_error(&mut self, code: u16, message: &str) {
        if self.reject_after_finalize("write_error") {
            return;
        }
        let headers = self.sink.headers_mut();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(ERROR_CONTENT_TYPE));
        headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
        if self.commit_status("write_error", code) {
            let mut body = String::with_capacity(message.len() + 1);
            body.push_str(message);
            body.push('\n');
            self.write_payload(body.as_bytes());
        }
    }

    fn begin_response(
        &mut self,
        operation: &'static str,
        code: u16,
        content_type: Option<HeaderValue>,
    ) -> bool {
        if self.reject_after_finalize(operation) {
            return false;
        }
        if let Some(content_type) = content_type {
            self.sink.headers_mut().insert(CONTENT_TYPE, content_type);
        }
        self.commit_status(operation, code)
    }

    fn commit_status(&mut self, operation: &'static str, code: u16) -> bool {
        if !(100..=999).contains(&code) {
            warn!(
                request_id = %self.request_id,
                status = code,
                operation,
                "Rejecting invalid status code"
            );
            self.faults.push(ResponseError::InvalidStatus { code });
            return false;
        }
        if self.reject_after_finalize(operation) {
            return false;
        }
        if let Some(previous) = self.status_code {
            debug!(
                request_id = %self.request_id,
                previous,
                status = code,
                operation,
                "Status written again; the transport keeps the first one"
            );
        }
        self.status_code = Some(code);
        self.sink.write_status(code);
        true
    }

    fn reject_after_finalize(&mut self, operation: &'static str) -> bool {
        if self.guard != ResponseGuard::Strict || self.status_code.is_none() {
            return false;
        }
        warn!(
            request_id = %self.request_id,
            status = ?self.status_code,
            operation,
            "Response already finalized"
        );
        self.faults
            .push(ResponseError::AlreadyFinalized { operation });
        true
    }

    fn write_payload(&mut self, bytes: &[u8]) {
        if let Err(err) = self.sink.write_body(bytes) {
            warn!(
                request_id = %self.request_id,
                error = %err,
                bytes = bytes.len(),
                "Response body write failed"
            );
            self.faults.push(ResponseError::Transport(err));
        }
    }
}

fn parse_form(request: &IncomingRequest) -> Vec<(String, String)> {
    if ![Method::POST, Method::PUT, Method::PATCH].contains(request.method()) {
        return Vec::new();
    }
    let is_form = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|ct| ct.split(';').next())
        .is_some_and(|essence| essence.trim().eq_ignore_ascii_case(FORM_CONTENT_TYPE));
    if !is_form {
        return Vec::new();
    }
    url::form_urlencoded::parse(request.body())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}
