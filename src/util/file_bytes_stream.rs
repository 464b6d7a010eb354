use std::{
    cmp::min,
    io::{Error as IoError, SeekFrom},
    mem::MaybeUninit,
    pin::Pin,
    task::{ready, Context, Poll},
};

use futures_util::stream::Stream;
use http_range::HttpRange;
use hyper::body::Bytes;
use tokio::{
    fs::File,
    io::{AsyncRead, AsyncSeek, ReadBuf},
};

const BUF_SIZE: usize = 8 * 1024;

#[derive(Clone, Copy, PartialEq, Eq)]
enum SeekState {
    /// Seek to this offset before the first read.
    Pending(u64),
    /// `start_seek` was issued, waiting on `poll_complete`.
    Seeking,
    Reading,
}

/// Wraps a tokio `File`, and implements a stream of `Bytes`s.
///
/// The stream either covers the whole file, or a single byte range of it.
pub struct FileBytesStream {
    file: File,
    buf: Box<[MaybeUninit<u8>; BUF_SIZE]>,
    remaining: u64,
    seek: SeekState,
}

impl FileBytesStream {
    /// Create a new stream reading the file from its current position until EOF.
    pub fn new(file: File) -> Self {
        Self {
            file,
            buf: Box::new([MaybeUninit::uninit(); BUF_SIZE]),
            remaining: u64::MAX,
            seek: SeekState::Reading,
        }
    }

    /// Create a new stream reading only the bytes covered by `range`.
    pub fn new_range(file: File, range: HttpRange) -> Self {
        Self {
            file,
            buf: Box::new([MaybeUninit::uninit(); BUF_SIZE]),
            remaining: range.length,
            seek: SeekState::Pending(range.start),
        }
    }
}

impl Stream for FileBytesStream {
    type Item = Result<Bytes, IoError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context) -> Poll<Option<Self::Item>> {
        let Self {
            ref mut file,
            ref mut buf,
            ref mut remaining,
            ref mut seek,
        } = *self;

        if let SeekState::Pending(offset) = *seek {
            if let Err(e) = Pin::new(&mut *file).start_seek(SeekFrom::Start(offset)) {
                return Poll::Ready(Some(Err(e)));
            }
            *seek = SeekState::Seeking;
        }
        if *seek == SeekState::Seeking {
            if let Err(e) = ready!(Pin::new(&mut *file).poll_complete(cx)) {
                return Poll::Ready(Some(Err(e)));
            }
            *seek = SeekState::Reading;
        }

        if *remaining == 0 {
            return Poll::Ready(None);
        }

        let max_read_length = min(*remaining, buf.len() as u64) as usize;
        let mut read_buf = ReadBuf::uninit(&mut buf[..max_read_length]);
        match ready!(Pin::new(file).poll_read(cx, &mut read_buf)) {
            Ok(()) => {
                let filled = read_buf.filled();
                if filled.is_empty() {
                    Poll::Ready(None)
                } else {
                    *remaining -= filled.len() as u64;
                    Poll::Ready(Some(Ok(Bytes::copy_from_slice(filled))))
                }
            }
            Err(e) => Poll::Ready(Some(Err(e))),
        }
    }
}
