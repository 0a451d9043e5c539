use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use serde::Deserialize;

use super::auth::AuthenticationError;

/// Errors that can occur while executing an API call.
///
/// Every failure is reported as a value to the immediate caller; nothing in
/// this layer panics or retries. A failed call yields no [`ApiResponse`] and
/// exactly one of the variants below.
///
/// [`ApiResponse`]: super::ApiResponse
#[derive(Debug, derive_more::Error, derive_more::Display, derive_more::From)]
pub enum Error {
    /// The request could not be constructed.
    ///
    /// Covers bad URL templates, missing path parameters, and body
    /// serialization failures. No network call is attempted.
    #[display("malformed request: {message}")]
    #[from(skip)]
    MalformedRequest {
        /// Description of what could not be built.
        message: String,
    },

    /// Identity material was missing or invalid, or signing failed.
    ///
    /// Raised before any network I/O takes place.
    Authentication(AuthenticationError),

    /// Connection, DNS, TLS, or body-read failure from the HTTP stack.
    ///
    /// Surfaced as-is; this layer performs a single attempt per call.
    Transport(reqwest::Error),

    /// The service answered with a non-2xx status.
    ///
    /// The response body has been fully buffered and parsed into the
    /// structured [`ApiError`], even when the caller asked for a streamed
    /// response.
    Api(ApiError),
}

impl From<url::ParseError> for Error {
    fn from(error: url::ParseError) -> Self {
        Self::MalformedRequest {
            message: error.to_string(),
        }
    }
}

/// Structured error returned by the service for non-2xx responses.
///
/// The service reports a machine-readable `code` and a human-readable
/// `message` in the response body; both are captured here together with the
/// HTTP status and the request identifier echoed by the service, when present.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
#[display("status {status}, code {code}: {message}")]
pub struct ApiError {
    /// HTTP status code of the failed call.
    pub status: StatusCode,
    /// Service-defined error code, or the status canonical reason when the
    /// body carried no parsable error payload.
    pub code: String,
    /// Service-provided error message.
    pub message: String,
    /// Value of the `opc-request-id` response header, if the service sent one.
    pub request_id: Option<String>,
}

impl std::error::Error for ApiError {}

/// Wire schema of the service error payload.
#[derive(Debug, Deserialize)]
struct ServiceErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

impl ApiError {
    /// Builds an [`ApiError`] from a fully buffered error response.
    ///
    /// Falls back to the status canonical reason and the raw body text when
    /// the payload is not the expected JSON error schema.
    pub(crate) fn from_response(status: StatusCode, headers: &HeaderMap, body: &Bytes) -> Self {
        let request_id = headers
            .get("opc-request-id")
            .and_then(|value| value.to_str().ok())
            .map(ToOwned::to_owned);

        match serde_json::from_slice::<ServiceErrorBody>(body) {
            Ok(parsed) if !parsed.code.is_empty() || !parsed.message.is_empty() => Self {
                status,
                code: parsed.code,
                message: parsed.message,
                request_id,
            },
            _ => Self {
                status,
                code: status
                    .canonical_reason()
                    .unwrap_or("UnknownError")
                    .to_string(),
                message: String::from_utf8_lossy(body).into_owned(),
                request_id,
            },
        }
    }
}
