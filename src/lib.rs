#![crate_name = "hyper_spafile"]
#![deny(missing_docs)]

//! Single-page application file-serving for [Hyper 1.0](https://github.com/hyperium/hyper).
//!
//! A single-page application (SPA) ships a handful of static files, and leaves most navigation
//! to a client-side router. This library exports three handlers to serve such an application:
//!
//! - `IndexFileServer` always serves the entry page (`index.html`), whatever the path.
//! - `SpaFileServer` maps request paths onto a root directory, and serves `404.html` with
//!   status `404` for paths that don't exist.
//! - `FileServerWithStatus` serves a fixed file with a fixed status.
//!
//! ## Basic usage
//!
//! Handlers are configured once, and are cheap to clone. Each implements the `hyper::Service`
//! trait, and can be handed to a hyper connection directly:
//!
//! ```rust
//! // Instance of `SpaFileServer` serving from the application build directory.
//! let spa = hyper_spafile::SpaFileServer::new("my/app/dist/");
//!
//! // A dummy request, but normally obtained from Hyper.
//! let request = http::Request::get("/assets/app.js")
//!     .body(())
//!     .unwrap();
//!
//! // Serve the request. Returns a future for a `hyper::Response`.
//! use hyper_spafile::Handler;
//! let response_future = spa.respond(&request);
//! ```
//!
//! ## Advanced usage
//!
//! Handlers write through the `ResponseWriter` trait, and `respond` is just `serve` writing into
//! a `ResponseBuffer`. Writers can be decorated; `FileServerWithStatus` wraps its writer in a
//! `StatusOverride`, which replaces every status written with a fixed one.
//!
//! The not-found handler of `SpaFileServer` is any `Handler`, so custom fallbacks are a matter of
//! implementing that trait and passing it to `SpaFileServer::with_not_found`. File names are
//! configured through `SpaOptions`.
//!
//! Underneath, `serve_file` is the file-serving primitive: `resolve_file` finds and opens the
//! file, and `ResponseBuilder` turns the `ResolveResult` into a response. Found files are
//! written by `FileResponseBuilder`, which handles content type, conditional requests and byte
//! ranges, streaming the file through `FileBytesStream`.
//!
//! Decisions such as refusing a traversal attempt or falling back to the not-found page are
//! reported as `tracing` events at debug and trace level.

mod options;
mod resolve;
mod response_builder;
mod service;
mod util;
mod writer;

pub use crate::options::*;
pub use crate::resolve::*;
pub use crate::response_builder::*;
pub use crate::service::*;
pub use crate::util::{Body, FileBytesStream, FileResponseBuilder};
pub use crate::writer::{ResponseBuffer, ResponseWriter, StatusOverride};
