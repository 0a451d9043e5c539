use std::sync::Arc;

use http::Method;
use reqwest::{Body, Request};
use tracing::{debug, warn};

use super::auth::Credentials;
use super::endpoint::Endpoint;
use super::error::{ApiError, Error};
use super::request::{ApiRequest, RequestBody};
use super::response::{ApiResponse, ByteStream, ResponseBody};
use super::sign;

/// Executes API calls against one service family in one region.
///
/// A requestor is handed out by [`Client`](super::Client) bound to a single
/// [`Service`](super::Service); it orchestrates the full lifecycle of each
/// call: resolve the URL, marshal the body, attach headers, sign, dispatch,
/// classify the response, and buffer or stream the result.
///
/// Requestors hold only read-only state and cheap handles, so one instance
/// may be shared across concurrent calls; every call's mutable state is
/// call-local. A single attempt is made per call: there is no retry loop, and
/// cancellation/timeouts are whatever the underlying `reqwest` client is
/// configured with.
#[derive(Debug, Clone)]
pub struct Requestor {
    pub(crate) http: reqwest::Client,
    pub(crate) endpoint: Endpoint,
    pub(crate) credentials: Arc<Credentials>,
    pub(crate) user_agent: String,
    pub(crate) debug_dump: bool,
}

impl Requestor {
    /// The endpoint this requestor resolves URLs against.
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Executes a GET call.
    ///
    /// # Errors
    ///
    /// See [`execute`](Self::execute).
    pub async fn get<R>(&self, request: &R) -> Result<ApiResponse, Error>
    where
        R: ApiRequest + ?Sized,
    {
        self.execute(Method::GET, request).await
    }

    /// Executes a DELETE call, discarding the (typically empty) response.
    ///
    /// # Errors
    ///
    /// See [`execute`](Self::execute).
    pub async fn delete<R>(&self, request: &R) -> Result<(), Error>
    where
        R: ApiRequest + ?Sized,
    {
        self.execute(Method::DELETE, request).await?;
        Ok(())
    }

    /// Executes one API call end to end.
    ///
    /// Builds the URL, marshals the body (skipped entirely for GET and
    /// DELETE), attaches the descriptor's headers, signs the request, and
    /// dispatches it once. Successful responses are buffered unless the
    /// descriptor asked for streaming; non-2xx responses are always fully
    /// buffered and translated into [`Error::Api`], so a streamed body is
    /// only ever a success payload.
    ///
    /// # Errors
    ///
    /// - [`Error::MalformedRequest`] when the URL or body cannot be built;
    ///   no network call is attempted.
    /// - [`Error::Authentication`] when signing fails; no network call is
    ///   attempted.
    /// - [`Error::Transport`] for connection or body-read failures; never
    ///   retried, never a partially populated response.
    /// - [`Error::Api`] for non-2xx statuses, carrying the parsed service
    ///   error payload.
    pub async fn execute<R>(&self, method: Method, request: &R) -> Result<ApiResponse, Error>
    where
        R: ApiRequest + ?Sized,
    {
        let url = request.url(&self.endpoint)?;

        let body = if method == Method::GET || method == Method::DELETE {
            RequestBody::Empty
        } else {
            request.body()?
        };

        let mut outbound = Request::new(method, url);
        *outbound.headers_mut() = request.headers()?;
        sign::sign_request(&mut outbound, &self.credentials, &self.user_agent, &body)?;
        match body {
            RequestBody::Empty => {}
            RequestBody::Bytes(bytes) => *outbound.body_mut() = Some(Body::from(bytes)),
            RequestBody::Stream(stream) => *outbound.body_mut() = Some(stream),
        }

        if self.debug_dump {
            debug!(
                method = %outbound.method(),
                url = %outbound.url(),
                headers = ?outbound.headers(),
                "outbound request"
            );
        }

        let response = match self.http.execute(outbound).await {
            Ok(response) => response,
            Err(error) => {
                warn!(%error, "transport failure");
                return Err(Error::Transport(error));
            }
        };

        if self.debug_dump {
            debug!(
                status = %response.status(),
                headers = ?response.headers(),
                "inbound response"
            );
        }

        let status = response.status();
        let is_error_response = !status.is_success();
        let stream_wanted = request.response_as_stream();

        // Buffer fully on error or when the caller did not ask for a stream;
        // draining the body releases the connection.
        if is_error_response || !stream_wanted {
            let headers = response.headers().clone();
            let bytes = match response.bytes().await {
                Ok(bytes) => bytes,
                Err(error) => {
                    warn!(%error, "failed to read response body");
                    return Err(Error::Transport(error));
                }
            };

            if is_error_response {
                return Err(Error::Api(ApiError::from_response(status, &headers, &bytes)));
            }
            return Ok(ApiResponse {
                status,
                headers,
                body: ResponseBody::Buffered(bytes),
            });
        }

        let headers = response.headers().clone();
        Ok(ApiResponse {
            status,
            headers,
            body: ResponseBody::Stream(ByteStream::new(response)),
        })
    }
}
