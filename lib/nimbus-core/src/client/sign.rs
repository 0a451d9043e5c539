//! Request signing.
//!
//! Computes the `Signature` authorization header binding method, path, key
//! headers, and body digest into an RSA-SHA256 signature, following the
//! draft-cavage HTTP signature scheme used by the service:
//!
//! ```text
//! Authorization: Signature version="1",headers="date (request-target) host",
//!     keyId="<tenancy>/<user>/<fingerprint>",algorithm="rsa-sha256",
//!     signature="<base64>"
//! ```
//!
//! Requests with a buffered body additionally sign `content-length`,
//! `content-type`, and an `x-content-sha256` digest of the body bytes.
//! Streamed bodies are passed through unread and only the generic headers are
//! signed.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Utc};
use http::header::{
    AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE, DATE, HOST, HeaderMap, HeaderName, HeaderValue,
    USER_AGENT,
};
use sha2::{Digest as _, Sha256};
use url::Url;

use super::auth::{AuthenticationError, Credentials};
use super::request::RequestBody;

pub(crate) const SIGNATURE_VERSION: &str = "1";
pub(crate) const SIGNING_ALGORITHM: &str = "rsa-sha256";

const X_CONTENT_SHA256: HeaderName = HeaderName::from_static("x-content-sha256");
const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// Signs an outbound request, attaching the authorization header and every
/// header bound into the signature.
///
/// The timestamp is generated fresh per call; the `date` header attached to
/// the request is exactly the value covered by the signature.
pub(crate) fn sign_request(
    request: &mut reqwest::Request,
    credentials: &Credentials,
    user_agent: &str,
    body: &RequestBody,
) -> Result<(), AuthenticationError> {
    sign_request_at(request, credentials, user_agent, body, Utc::now())
}

/// Signing with an explicit timestamp. Deterministic for identical inputs,
/// which is what makes golden-header tests possible.
pub(crate) fn sign_request_at(
    request: &mut reqwest::Request,
    credentials: &Credentials,
    user_agent: &str,
    body: &RequestBody,
    timestamp: DateTime<Utc>,
) -> Result<(), AuthenticationError> {
    let date = format_http_date(timestamp);
    let target = request_target(request.method().as_str(), request.url());
    let host = host_header(request.url())?;

    // Existing content type wins over the default; read before mutating.
    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or(DEFAULT_CONTENT_TYPE)
        .to_owned();

    let mut signed: Vec<(&str, String)> = vec![
        ("date", date),
        ("(request-target)", target),
        ("host", host),
    ];
    if let RequestBody::Bytes(bytes) = body {
        let digest = BASE64.encode(Sha256::digest(bytes));
        signed.push(("content-length", bytes.len().to_string()));
        signed.push(("content-type", content_type));
        signed.push(("x-content-sha256", digest));
    }

    let headers = request.headers_mut();
    for (name, value) in &signed {
        match *name {
            "date" => insert_header(headers, DATE, value)?,
            "host" => insert_header(headers, HOST, value)?,
            "content-length" => insert_header(headers, CONTENT_LENGTH, value)?,
            "content-type" => insert_header(headers, CONTENT_TYPE, value)?,
            "x-content-sha256" => insert_header(headers, X_CONTENT_SHA256, value)?,
            // (request-target) is signed but never sent as a header
            _ => {}
        }
    }
    insert_header(headers, USER_AGENT, user_agent)?;

    let signature = credentials
        .private_key()
        .try_sign(signing_string(&signed).as_bytes())?;
    let authorization = format!(
        "Signature version=\"{SIGNATURE_VERSION}\",headers=\"{}\",keyId=\"{}\",algorithm=\"{SIGNING_ALGORITHM}\",signature=\"{}\"",
        header_list(&signed),
        credentials.key_id(),
        BASE64.encode(signature),
    );
    insert_header(headers, AUTHORIZATION, &authorization)?;

    Ok(())
}

/// Space-separated list of signed header names, in signing order.
fn header_list(signed: &[(&str, String)]) -> String {
    signed
        .iter()
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join(" ")
}

/// The canonicalized string covered by the signature: one `name: value` line
/// per signed header, in order, joined by newlines.
fn signing_string(signed: &[(&str, String)]) -> String {
    signed
        .iter()
        .map(|(name, value)| format!("{name}: {value}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// `(request-target)` pseudo-header: lowercased method, path, and query.
fn request_target(method: &str, url: &Url) -> String {
    let mut target = format!("{} {}", method.to_lowercase(), url.path());
    if let Some(query) = url.query() {
        target.push('?');
        target.push_str(query);
    }
    target
}

/// Host header value, including the port when it is not the scheme default.
fn host_header(url: &Url) -> Result<String, AuthenticationError> {
    let host = url
        .host_str()
        .ok_or_else(|| AuthenticationError::UnsignableRequest {
            message: format!("request URL {url} has no host"),
        })?;
    Ok(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

/// IMF-fixdate, e.g. `Sat, 02 Jan 2021 03:04:05 GMT`.
fn format_http_date(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

fn insert_header(
    headers: &mut HeaderMap,
    name: HeaderName,
    value: &str,
) -> Result<(), AuthenticationError> {
    let value =
        HeaderValue::from_str(value).map_err(|error| AuthenticationError::InvalidHeaderValue {
            header: name.to_string(),
            message: error.to_string(),
        })?;
    headers.insert(name, value);
    Ok(())
}
