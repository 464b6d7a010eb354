use std::io::Error as IoError;
use std::path::Path;

use http::{header, HeaderValue, Request, StatusCode};

use crate::options::DEFAULT_INDEX_FILE_NAME;
use crate::resolve::{resolve_file, ResolveResult};
use crate::util::FileResponseBuilder;
use crate::writer::{write_error, ResponseWriter};

/// Utility to write the default response for a resolved file.
#[derive(Clone, Debug, Default)]
pub struct ResponseBuilder<'a> {
    /// The request path. Its last segment is the target of directory redirects.
    pub path: &'a str,
    /// The request query string, kept intact by directory redirects.
    pub query: Option<&'a str>,
    /// Inner builder for file responses.
    pub file_response_builder: FileResponseBuilder,
}

impl<'a> ResponseBuilder<'a> {
    /// Create a new response builder with a default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply parameters based on a request.
    pub fn request<B>(&mut self, req: &'a Request<B>) -> &mut Self {
        self.path = req.uri().path();
        self.query = req.uri().query();
        self.file_response_builder = FileResponseBuilder::from_request(req);
        self
    }

    /// Write a response for the given `resolve_file` result.
    pub fn build<W>(&self, result: Result<ResolveResult, IoError>, writer: &mut W)
    where
        W: ResponseWriter + ?Sized,
    {
        match result {
            Ok(ResolveResult::NotFound) => {
                write_error(writer, StatusCode::NOT_FOUND, "404 page not found");
            }
            Ok(ResolveResult::PermissionDenied) => {
                write_error(writer, StatusCode::FORBIDDEN, "403 Forbidden");
            }
            Ok(ResolveResult::IsDirectory) => {
                // Relative to the current URL, so a path like `//host` can't redirect offsite.
                let last_segment = match self.path.rsplit('/').next() {
                    Some(segment) if !segment.is_empty() => segment,
                    _ => ".",
                };
                let mut target = format!("./{last_segment}/");
                if let Some(query) = self.query {
                    target.push('?');
                    target.push_str(query);
                }

                match HeaderValue::from_str(&target) {
                    Ok(location) => {
                        writer.headers_mut().insert(header::LOCATION, location);
                        writer.write_status(StatusCode::MOVED_PERMANENTLY);
                    }
                    Err(_) => {
                        write_error(writer, StatusCode::NOT_FOUND, "404 page not found");
                    }
                }
            }
            Ok(ResolveResult::Found(file, metadata, mime)) => {
                self.file_response_builder
                    .build(writer, file, &metadata, &mime);
            }
            Err(err) => {
                tracing::debug!(error = %err, path = self.path, "failed to open file");
                write_error(
                    writer,
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "500 Internal Server Error",
                );
            }
        }
    }
}

/// Serve the file at `path` in response to `req`.
///
/// This is the file-serving primitive the handlers build on. It takes care of content type,
/// conditional and range requests, and turns filesystem errors into plain-text `404`, `403` or
/// `500` responses. Directories redirect to their slash-terminated URL, and are then served
/// through their `index.html`.
pub async fn serve_file<B, W>(req: &Request<B>, path: &Path, writer: &mut W)
where
    W: ResponseWriter + ?Sized,
{
    serve_file_with_index(req, path, DEFAULT_INDEX_FILE_NAME, writer).await;
}

/// Like `serve_file`, with a different directory index name.
pub async fn serve_file_with_index<B, W>(
    req: &Request<B>,
    path: &Path,
    index_file_name: &str,
    writer: &mut W,
) where
    W: ResponseWriter + ?Sized,
{
    let is_dir_request = req.uri().path().ends_with('/');
    let result = resolve_file(path, is_dir_request, index_file_name).await;
    if let Ok(ref resolved) = result {
        tracing::trace!(path = %path.display(), result = ?resolved, "resolved file");
    }
    ResponseBuilder::new().request(req).build(result, writer);
}
