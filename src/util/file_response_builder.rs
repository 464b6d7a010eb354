use std::{
    fs::Metadata,
    time::{SystemTime, UNIX_EPOCH},
};

use http::{header, HeaderMap, HeaderValue, Method, Request, StatusCode};
use http_range::HttpRange;
use mime_guess::Mime;
use tokio::fs::File;

use crate::util::{Body, FileBytesStream};
use crate::writer::{write_error, ResponseWriter};

/// Outcome of looking at the `Range` and `If-Range` request headers.
enum RangeRequest {
    /// Serve the complete file.
    Full,
    /// Serve exactly this part of the file.
    Single(HttpRange),
    /// The range header could not be satisfied.
    Unsatisfiable,
}

/// Utility to write responses serving an open `tokio::fs::File`.
///
/// This struct allows direct access to its fields, but these fields are typically initialized
/// from a request with `from_request`. The fields are basically a bunch of settings that
/// determine the response details.
#[derive(Clone, Debug, Default)]
pub struct FileResponseBuilder {
    /// Whether this is a `HEAD` request, with no response body.
    pub is_head: bool,
    /// Whether conditional headers apply, which is only the case for `GET` and `HEAD`.
    pub is_conditional: bool,
    /// The parsed value of the `If-Modified-Since` request header.
    pub if_modified_since: Option<SystemTime>,
    /// The raw `If-None-Match` request header.
    pub if_none_match: Option<String>,
    /// The raw `Range` request header.
    pub range: Option<String>,
    /// The raw `If-Range` request header.
    pub if_range: Option<String>,
}

impl FileResponseBuilder {
    /// Create a new builder with a default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new builder for the given request.
    pub fn from_request<B>(req: &Request<B>) -> Self {
        let mut builder = Self::new();
        builder.method(req.method());
        builder.request_headers(req.headers());
        builder
    }

    /// Build responses for the given request method.
    pub fn method(&mut self, value: &Method) -> &mut Self {
        self.is_head = *value == Method::HEAD;
        self.is_conditional = *value == Method::GET || *value == Method::HEAD;
        self
    }

    /// Pick up the conditional and range headers of a request.
    pub fn request_headers(&mut self, headers: &HeaderMap) -> &mut Self {
        let text = |name| {
            headers
                .get(name)
                .and_then(|v: &HeaderValue| v.to_str().ok())
                .map(str::to_owned)
        };
        self.if_modified_since = text(header::IF_MODIFIED_SINCE)
            .and_then(|v| httpdate::parse_http_date(&v).ok());
        self.if_none_match = text(header::IF_NONE_MATCH);
        self.range = text(header::RANGE);
        self.if_range = text(header::IF_RANGE);
        self
    }

    /// Write a response for the given file, its metadata and content type.
    pub fn build<W>(&self, writer: &mut W, file: File, metadata: &Metadata, mime: &Mime)
    where
        W: ResponseWriter + ?Sized,
    {
        let len = metadata.len();
        // Truncated to whole seconds, matching what `Last-Modified` can express.
        let modified = metadata.modified().ok().map(truncate_to_secs);
        let etag = metadata.modified().ok().map(|m| weak_etag(len, m));

        let headers = writer.headers_mut();
        if let Some(modified) = modified {
            insert_header(headers, header::LAST_MODIFIED, &httpdate::fmt_http_date(modified));
        }
        if let Some(ref etag) = etag {
            insert_header(headers, header::ETAG, etag);
        }

        if self.is_not_modified(etag.as_deref(), modified) {
            writer.write_status(StatusCode::NOT_MODIFIED);
            return;
        }

        let headers = writer.headers_mut();
        headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
        insert_header(headers, header::CONTENT_TYPE, mime.as_ref());

        match self.range_request(len, etag.as_deref(), modified) {
            RangeRequest::Full => {
                insert_header(headers, header::CONTENT_LENGTH, &len.to_string());
                writer.write_status(StatusCode::OK);
                if !self.is_head {
                    writer.write_body(Body::File(FileBytesStream::new(file)));
                }
            }
            RangeRequest::Single(range) => {
                let end = range.start + range.length - 1;
                insert_header(
                    headers,
                    header::CONTENT_RANGE,
                    &format!("bytes {}-{}/{}", range.start, end, len),
                );
                insert_header(headers, header::CONTENT_LENGTH, &range.length.to_string());
                writer.write_status(StatusCode::PARTIAL_CONTENT);
                if !self.is_head {
                    writer.write_body(Body::File(FileBytesStream::new_range(file, range)));
                }
            }
            RangeRequest::Unsatisfiable => {
                tracing::trace!(range = ?self.range, len, "unsatisfiable range");
                headers.remove(header::ACCEPT_RANGES);
                insert_header(headers, header::CONTENT_RANGE, &format!("bytes */{len}"));
                write_error(writer, StatusCode::RANGE_NOT_SATISFIABLE, "invalid range");
            }
        }
    }

    fn is_not_modified(&self, etag: Option<&str>, modified: Option<SystemTime>) -> bool {
        if !self.is_conditional {
            return false;
        }

        // `If-None-Match` takes precedence when present.
        if let Some(ref if_none_match) = self.if_none_match {
            return etag.map_or(false, |etag| etag_list_matches(if_none_match, etag));
        }

        match (self.if_modified_since, modified) {
            (Some(since), Some(modified)) => modified <= since,
            _ => false,
        }
    }

    fn range_request(
        &self,
        len: u64,
        etag: Option<&str>,
        modified: Option<SystemTime>,
    ) -> RangeRequest {
        let Some(ref range) = self.range else {
            return RangeRequest::Full;
        };

        if let Some(ref if_range) = self.if_range {
            if !if_range_matches(if_range, etag, modified) {
                return RangeRequest::Full;
            }
        }

        match HttpRange::parse(range, len) {
            Ok(ranges) => match ranges.as_slice() {
                [single] => RangeRequest::Single(*single),
                // Multipart byteranges are not produced; the full body satisfies the request.
                _ => RangeRequest::Full,
            },
            Err(_) => RangeRequest::Unsatisfiable,
        }
    }
}

fn insert_header(headers: &mut HeaderMap, name: header::HeaderName, value: &str) {
    if let Ok(value) = HeaderValue::from_str(value) {
        headers.insert(name, value);
    }
}

fn truncate_to_secs(time: SystemTime) -> SystemTime {
    match time.duration_since(UNIX_EPOCH) {
        Ok(since_epoch) => UNIX_EPOCH + std::time::Duration::from_secs(since_epoch.as_secs()),
        Err(_) => time,
    }
}

fn weak_etag(len: u64, modified: SystemTime) -> String {
    let since_epoch = modified.duration_since(UNIX_EPOCH).unwrap_or_default();
    format!(
        "W/\"{0:x}-{1:x}.{2:x}\"",
        len,
        since_epoch.as_secs(),
        since_epoch.subsec_nanos()
    )
}

fn is_weak(tag: &str) -> bool {
    tag.starts_with("W/")
}

fn opaque_tag(tag: &str) -> &str {
    tag.trim().trim_start_matches("W/")
}

/// Weak comparison of an `If-None-Match` list against our tag.
fn etag_list_matches(list: &str, etag: &str) -> bool {
    list.split(',').any(|candidate| {
        let candidate = candidate.trim();
        candidate == "*" || opaque_tag(candidate) == opaque_tag(etag)
    })
}

/// `If-Range` needs a strong validator match, which our weak tags never give, or an exact
/// date match.
fn if_range_matches(if_range: &str, etag: Option<&str>, modified: Option<SystemTime>) -> bool {
    let if_range = if_range.trim();
    if if_range.starts_with('"') || if_range.starts_with("W/") {
        return match etag {
            Some(etag) => !is_weak(etag) && !is_weak(if_range) && if_range == etag,
            None => false,
        };
    }
    match (httpdate::parse_http_date(if_range), modified) {
        (Ok(date), Some(modified)) => date == modified,
        _ => false,
    }
}
