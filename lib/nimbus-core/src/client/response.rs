use bytes::Bytes;
use http::{HeaderMap, StatusCode};

use super::error::Error;

/// Normalized result of a successful API call: response headers plus either a
/// buffered payload or a live stream, never both.
#[derive(Debug)]
pub struct ApiResponse {
    pub(crate) status: StatusCode,
    pub(crate) headers: HeaderMap,
    pub(crate) body: ResponseBody,
}

impl ApiResponse {
    /// HTTP status of the call. Always in the 2xx range; non-2xx statuses are
    /// reported as [`Error::Api`] instead of a response.
    ///
    /// [`Error::Api`]: super::Error::Api
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The response body, buffered or streaming per the request descriptor.
    pub fn body(&self) -> &ResponseBody {
        &self.body
    }

    /// The buffered payload, when the call was not executed in streaming
    /// mode.
    pub fn bytes(&self) -> Option<&Bytes> {
        match &self.body {
            ResponseBody::Buffered(bytes) => Some(bytes),
            ResponseBody::Stream(_) => None,
        }
    }

    /// Consumes the response, handing the open stream to the caller.
    ///
    /// Returns `None` when the body was buffered. See [`ByteStream`] for the
    /// caller's close obligation.
    pub fn into_stream(self) -> Option<ByteStream> {
        match self.body {
            ResponseBody::Stream(stream) => Some(stream),
            ResponseBody::Buffered(_) => None,
        }
    }
}

/// Exactly one of a buffered payload or an open stream.
///
/// Which one is populated follows from the request descriptor: a descriptor
/// that asked for streaming gets `Stream` on success, everything else gets
/// `Buffered`. Error responses never reach this type; their bodies are always
/// buffered into the structured API error, so a stream here is guaranteed to
/// carry a success payload.
#[derive(Debug)]
pub enum ResponseBody {
    /// Fully buffered payload; the underlying connection is already released.
    Buffered(Bytes),
    /// Open stream whose close obligation now rests with the caller.
    Stream(ByteStream),
}

/// A live response body stream.
///
/// Holds the underlying connection open until dropped. The caller owns the
/// release: drop the stream (or drain it with [`collect`](Self::collect)) as
/// soon as it is no longer needed, otherwise the connection leaks.
#[derive(Debug)]
pub struct ByteStream {
    inner: reqwest::Response,
}

impl ByteStream {
    pub(crate) fn new(inner: reqwest::Response) -> Self {
        Self { inner }
    }

    /// Yields the next chunk of the body, or `None` once the body is
    /// exhausted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] when the connection fails mid-body.
    pub async fn chunk(&mut self) -> Result<Option<Bytes>, Error> {
        self.inner.chunk().await.map_err(Error::Transport)
    }

    /// Drains the remaining body into memory, releasing the connection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] when the connection fails mid-body.
    pub async fn collect(self) -> Result<Bytes, Error> {
        self.inner.bytes().await.map_err(Error::Transport)
    }
}
