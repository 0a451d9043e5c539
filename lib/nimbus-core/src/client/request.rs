use bytes::Bytes;
use http::HeaderMap;
use serde::Serialize;
use url::Url;

use super::endpoint::Endpoint;
use super::error::Error;

/// Per-call description of one API request.
///
/// Implemented by the per-resource operation types (launch instance, put
/// object, ...) that sit above this crate. The trait captures the four
/// capabilities the request pipeline consumes: marshal a URL, marshal a body,
/// marshal headers, and declare how the successful response should be
/// consumed. Implementations are pure; one value is used per call and
/// discarded afterwards.
pub trait ApiRequest {
    /// Resolves the request URL against the bound endpoint.
    ///
    /// Typically delegates to [`Endpoint::url`] with the operation's path
    /// segments and query pairs.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedRequest`] when required path parameters are
    /// absent or the URL cannot be built.
    fn url(&self, endpoint: &Endpoint) -> Result<Url, Error>;

    /// Marshals the request body.
    ///
    /// Never invoked for GET or DELETE calls.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedRequest`] when the payload cannot be
    /// serialized.
    fn body(&self) -> Result<RequestBody, Error> {
        Ok(RequestBody::Empty)
    }

    /// Additional headers to attach before signing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedRequest`] when a header cannot be built.
    fn headers(&self) -> Result<HeaderMap, Error> {
        Ok(HeaderMap::new())
    }

    /// Whether a successful response should be handed back as a live stream
    /// instead of a buffered payload.
    ///
    /// Streaming is a success-path-only contract: error responses are always
    /// buffered into the error value regardless of this flag.
    fn response_as_stream(&self) -> bool {
        false
    }
}

/// The body of an outbound request: exactly one of empty, buffered bytes, or
/// a caller-provided stream.
///
/// The three-way split is explicit so request construction can branch
/// exhaustively: a `Stream` is passed through to the transport unread (and is
/// therefore excluded from the body digest), `Bytes` are wrapped directly and
/// digest-signed, and `Empty` sends no payload.
#[derive(Debug, Default)]
pub enum RequestBody {
    /// No payload.
    #[default]
    Empty,
    /// Fully buffered payload; covered by the `x-content-sha256` digest.
    Bytes(Bytes),
    /// Caller-owned stream, passed through to the transport unread.
    Stream(reqwest::Body),
}

impl RequestBody {
    /// Serializes a value as a JSON payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedRequest`] when serialization fails.
    pub fn json<T: Serialize>(value: &T) -> Result<Self, Error> {
        let data = serde_json::to_vec(value).map_err(|error| Error::MalformedRequest {
            message: format!("body serialization failed: {error}"),
        })?;
        Ok(Self::Bytes(data.into()))
    }
}

impl From<Bytes> for RequestBody {
    fn from(bytes: Bytes) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<Vec<u8>> for RequestBody {
    fn from(data: Vec<u8>) -> Self {
        Self::Bytes(data.into())
    }
}
