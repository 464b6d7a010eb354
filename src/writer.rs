use http::{header, HeaderMap, HeaderValue, Response, StatusCode};

use crate::util::Body;

/// Destination of a single HTTP response.
///
/// Handlers write the status, headers and body through this trait instead of returning a
/// finished `Response`, so that decorators such as `StatusOverride` can sit in between.
pub trait ResponseWriter {
    /// Mutable access to the response headers.
    fn headers_mut(&mut self) -> &mut HeaderMap;

    /// Set the response status.
    fn write_status(&mut self, status: StatusCode);

    /// Set the response body.
    fn write_body(&mut self, body: Body);
}

impl<W: ResponseWriter + ?Sized> ResponseWriter for &mut W {
    fn headers_mut(&mut self) -> &mut HeaderMap {
        (**self).headers_mut()
    }

    fn write_status(&mut self, status: StatusCode) {
        (**self).write_status(status);
    }

    fn write_body(&mut self, body: Body) {
        (**self).write_body(body);
    }
}

/// A `ResponseWriter` that collects everything into a `hyper::Response`.
#[derive(Default)]
pub struct ResponseBuffer {
    /// Status written so far. Defaults to `200 OK`.
    pub status: StatusCode,
    /// Headers written so far.
    pub headers: HeaderMap,
    /// Body written so far. Defaults to empty.
    pub body: Body,
}

impl ResponseBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Turn the collected parts into a response.
    pub fn into_response(self) -> Response<Body> {
        let mut res = Response::new(self.body);
        *res.status_mut() = self.status;
        *res.headers_mut() = self.headers;
        res
    }
}

impl ResponseWriter for ResponseBuffer {
    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn write_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    fn write_body(&mut self, body: Body) {
        self.body = body;
    }
}

/// Decorator pinning the status of the wrapped writer.
///
/// Every `write_status` call is forwarded with the pinned status instead of the requested
/// one. Headers and body pass through untouched.
#[derive(Debug)]
pub struct StatusOverride<W> {
    inner: W,
    status: StatusCode,
}

impl<W: ResponseWriter> StatusOverride<W> {
    /// Wrap `inner`, pinning its status to `status`.
    pub fn new(inner: W, status: StatusCode) -> Self {
        Self { inner, status }
    }

    /// Unwrap the decorated writer.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: ResponseWriter> ResponseWriter for StatusOverride<W> {
    fn headers_mut(&mut self) -> &mut HeaderMap {
        self.inner.headers_mut()
    }

    fn write_status(&mut self, _status: StatusCode) {
        self.inner.write_status(self.status);
    }

    fn write_body(&mut self, body: Body) {
        self.inner.write_body(body);
    }
}

/// Write a plain-text error response.
pub(crate) fn write_error<W>(writer: &mut W, status: StatusCode, message: &'static str)
where
    W: ResponseWriter + ?Sized,
{
    let headers = writer.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(message.len() + 1));
    writer.write_status(status);
    writer.write_body(Body::text(format!("{message}\n")));
}
