use std::{
    io::Error as IoError,
    pin::Pin,
    task::{ready, Context, Poll},
};

use futures_util::stream::Stream;
use hyper::body::{Bytes, Frame, SizeHint};

use crate::util::FileBytesStream;

/// Hyper Body implementation for the responses produced while serving an SPA.
#[derive(Default)]
pub enum Body {
    /// No response body.
    #[default]
    Empty,
    /// Stream (part of) a file.
    File(FileBytesStream),
    /// A short in-memory body, such as a plain-text error message.
    Text(Option<Bytes>),
}

impl Body {
    /// Create a body from an in-memory message.
    pub fn text(message: impl Into<Bytes>) -> Self {
        Body::Text(Some(message.into()))
    }
}

impl hyper::body::Body for Body {
    type Data = Bytes;
    type Error = IoError;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Bytes>, IoError>>> {
        match *self {
            Body::Empty => Poll::Ready(None),
            Body::Text(ref mut bytes) => Poll::Ready(bytes.take().map(|b| Ok(Frame::data(b)))),
            Body::File(ref mut stream) => {
                let opt = ready!(Pin::new(stream).poll_next(cx));
                Poll::Ready(opt.map(|res| res.map(Frame::data)))
            }
        }
    }

    fn is_end_stream(&self) -> bool {
        matches!(*self, Body::Empty | Body::Text(None))
    }

    fn size_hint(&self) -> SizeHint {
        match *self {
            Body::Empty | Body::Text(None) => SizeHint::with_exact(0),
            Body::Text(Some(ref bytes)) => SizeHint::with_exact(bytes.len() as u64),
            Body::File(_) => SizeHint::default(),
        }
    }
}
