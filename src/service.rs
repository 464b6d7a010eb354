use std::convert::Infallible;
use std::future::Future;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use http::{Request, Response, StatusCode};
use tokio::fs;

use crate::options::SpaOptions;
use crate::response_builder::{serve_file, serve_file_with_index};
use crate::util::{decode_percents, Body, RequestedPath};
use crate::writer::{write_error, ResponseBuffer, ResponseWriter, StatusOverride};

/// Something that answers one HTTP request by writing one HTTP response.
///
/// All handlers in this crate implement this trait, and also `hyper::service::Service` for
/// direct use with a hyper connection. Implementing it yourself allows plugging custom logic
/// into `SpaFileServer` as its not-found handler.
pub trait Handler: Send + Sync {
    /// Handle a request, writing the response to `writer`.
    fn serve<B, W>(&self, req: &Request<B>, writer: &mut W) -> impl Future<Output = ()> + Send
    where
        B: Sync,
        W: ResponseWriter + Send + ?Sized;

    /// Handle a request, collecting the response in a `hyper::Response`.
    fn respond<B>(&self, req: &Request<B>) -> impl Future<Output = Response<Body>> + Send
    where
        B: Sync,
    {
        async move {
            let mut buffer = ResponseBuffer::new();
            self.serve(req, &mut buffer).await;
            buffer.into_response()
        }
    }
}

/// Future returned by the `hyper::service::Service` implementations.
pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<Response<Body>, Infallible>> + Send>>;

fn call_handler<H, B>(handler: &H, request: Request<B>) -> HandlerFuture
where
    H: Handler + Clone + 'static,
{
    let handler = handler.clone();
    // Files never look at the request body.
    let request = request.map(|_| ());
    Box::pin(async move { Ok(handler.respond(&request).await) })
}

/// Serves the SPA entry page, whatever path was requested.
///
/// Useful as the handler for the application's entry route. Errors opening the page are
/// reported by the file-serving primitive as usual (`404`, `403` or `500`).
#[derive(Clone, Debug)]
pub struct IndexFileServer {
    index_file_path: PathBuf,
}

impl IndexFileServer {
    /// Serve `index.html` from the given root.
    ///
    /// If `Path::new("")` is given, the file is served from the current directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_options(root, &SpaOptions::default())
    }

    /// Serve `options.index_file_name` from the given root.
    pub fn with_options(root: impl Into<PathBuf>, options: &SpaOptions) -> Self {
        Self {
            index_file_path: root.into().join(&options.index_file_name),
        }
    }

    /// The file this handler serves.
    pub fn index_file_path(&self) -> &Path {
        &self.index_file_path
    }
}

impl Handler for IndexFileServer {
    async fn serve<B, W>(&self, req: &Request<B>, writer: &mut W)
    where
        B: Sync,
        W: ResponseWriter + Send + ?Sized,
    {
        serve_file(req, &self.index_file_path, writer).await;
    }
}

impl<B> hyper::service::Service<Request<B>> for IndexFileServer {
    type Response = Response<Body>;
    type Error = Infallible;
    type Future = HandlerFuture;

    fn call(&self, request: Request<B>) -> Self::Future {
        call_handler(self, request)
    }
}

/// Serves one fixed file, always with the same status.
///
/// Whatever status the file-serving primitive writes, be it `200`, `206`, `304` or one of its
/// error codes, reaches the client as the configured status. Headers and body are left alone.
#[derive(Clone, Debug)]
pub struct FileServerWithStatus {
    path: PathBuf,
    status: StatusCode,
}

impl FileServerWithStatus {
    /// Serve the file at `path` with `status`.
    pub fn new(path: impl Into<PathBuf>, status: StatusCode) -> Self {
        Self {
            path: path.into(),
            status,
        }
    }

    /// The file this handler serves.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The status every response carries.
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl Handler for FileServerWithStatus {
    async fn serve<B, W>(&self, req: &Request<B>, writer: &mut W)
    where
        B: Sync,
        W: ResponseWriter + Send + ?Sized,
    {
        serve_file_with_status(req, &self.path, self.status, writer).await;
    }
}

impl<B> hyper::service::Service<Request<B>> for FileServerWithStatus {
    type Response = Response<Body>;
    type Error = Infallible;
    type Future = HandlerFuture;

    fn call(&self, request: Request<B>) -> Self::Future {
        call_handler(self, request)
    }
}

/// Serve the file at `path`, forcing `status` onto the response.
pub async fn serve_file_with_status<B, W>(
    req: &Request<B>,
    path: &Path,
    status: StatusCode,
    writer: &mut W,
) where
    W: ResponseWriter + ?Sized,
{
    let mut writer = StatusOverride::new(writer, status);
    serve_file(req, path, &mut writer).await;
}

/// Serves the files of a single-page application.
///
/// The request path is mapped onto the root directory. Paths containing a `..` segment are
/// refused with a plain `404 Not Found` before anything else happens, even when they would
/// clean up to something harmless. Paths that do not exist are handed to the not-found
/// handler, which by default serves `404.html` from the root with status `404`. Everything
/// else, including paths whose lookup failed for other reasons, goes to the file-serving
/// primitive, which reports its own errors.
#[derive(Clone, Debug)]
pub struct SpaFileServer<N = FileServerWithStatus> {
    root: PathBuf,
    index_file_name: String,
    not_found: N,
}

impl SpaFileServer<FileServerWithStatus> {
    /// Serve files from the given root, using `404.html` for unknown paths.
    ///
    /// If `Path::new("")` is given, files are served from the current directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_options(root, &SpaOptions::default())
    }

    /// Serve files from the given root, using the file names from `options`.
    pub fn with_options(root: impl Into<PathBuf>, options: &SpaOptions) -> Self {
        let root = root.into();
        let not_found = FileServerWithStatus::new(
            root.join(&options.not_found_file_name),
            StatusCode::NOT_FOUND,
        );
        Self::with_not_found(root, options, not_found)
    }
}

impl<N> SpaFileServer<N> {
    /// Serve files from the given root, passing unknown paths to `not_found`.
    pub fn with_not_found(root: impl Into<PathBuf>, options: &SpaOptions, not_found: N) -> Self {
        Self {
            root: root.into(),
            index_file_name: options.index_file_name.clone(),
            not_found,
        }
    }

    /// The root directory files are served from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The handler for paths that do not exist.
    pub fn not_found(&self) -> &N {
        &self.not_found
    }
}

impl<N: Handler> Handler for SpaFileServer<N> {
    async fn serve<B, W>(&self, req: &Request<B>, writer: &mut W)
    where
        B: Sync,
        W: ResponseWriter + Send + ?Sized,
    {
        let request_path = decode_percents(req.uri().path());
        let Some(RequestedPath { full_path }) = RequestedPath::resolve(&self.root, &request_path)
        else {
            tracing::debug!(path = %request_path, "refusing path traversal");
            write_error(writer, StatusCode::NOT_FOUND, "Not Found");
            return;
        };

        // Only a missing file triggers the fallback; other lookup errors are left for the
        // file-serving primitive to report.
        match fs::metadata(&full_path).await {
            Err(err) if err.kind() == IoErrorKind::NotFound => {
                tracing::debug!(path = %full_path.display(), "not found, serving fallback");
                self.not_found.serve(req, writer).await;
                return;
            }
            Err(err) => {
                tracing::trace!(path = %full_path.display(), error = %err, "lookup failed");
            }
            Ok(_) => {}
        }

        serve_file_with_index(req, &full_path, &self.index_file_name, writer).await;
    }
}

impl<N, B> hyper::service::Service<Request<B>> for SpaFileServer<N>
where
    N: Handler + Clone + 'static,
{
    type Response = Response<Body>;
    type Error = Infallible;
    type Future = HandlerFuture;

    fn call(&self, request: Request<B>) -> Self::Future {
        call_handler(self, request)
    }
}
