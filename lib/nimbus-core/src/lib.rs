//! # Nimbus Core
//!
//! Signed request execution for region-scoped cloud infrastructure APIs.
//!
//! This crate is the request/response pipeline underneath per-resource API
//! bindings (compute, object storage, database, identity, load balancer):
//! it resolves region-aware endpoint URLs from a template, signs every
//! request with the caller's RSA identity, dispatches it once over `reqwest`,
//! and normalizes the result into either a buffered payload, a caller-owned
//! stream, or a structured API error.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use nimbus_core::{ApiRequest, Client, Credentials, Endpoint, Error};
//! use url::Url;
//!
//! struct GetInstance {
//!     id: String,
//! }
//!
//! impl ApiRequest for GetInstance {
//!     fn url(&self, endpoint: &Endpoint) -> Result<Url, Error> {
//!         endpoint.url(&["instances", &self.id], &[])
//!     }
//! }
//!
//! # async fn example(key_pem: &str) -> Result<(), Error> {
//! let client = Client::builder()
//!     .with_region("us-phoenix-1")
//!     .with_credentials(Credentials::api_key(
//!         "ocid1.tenancy.oc1..aaaa",
//!         "ocid1.user.oc1..bbbb",
//!         "8c:bf:17:7b:5f:e0:7d:13",
//!         key_pem,
//!     )?)
//!     .build()?;
//!
//! let response = client
//!     .compute()
//!     .get(&GetInstance { id: "ocid1.instance.oc1..xyz".to_string() })
//!     .await?;
//! let payload = response.bytes().expect("buffered body");
//! # Ok(())
//! # }
//! ```
//!
//! ## Streaming responses
//!
//! A descriptor that returns `true` from
//! [`ApiRequest::response_as_stream`] receives the successful body as a
//! [`ByteStream`] instead of a buffered payload; ownership of the underlying
//! connection transfers with it, and dropping (or draining) the stream
//! releases the connection. Error responses are always buffered into the
//! structured [`ApiError`] regardless of the flag — streamed error bodies do
//! not exist.
//!
//! ## Configuration
//!
//! The [`config`] module holds the static configuration schema and its
//! validator, which reports every violation as a field-path-tagged list
//! rather than failing on the first problem.

pub mod client;
pub mod config;

pub use client::{
    ApiError, ApiRequest, ApiResponse, AuthenticationError, ByteStream, Client, ClientBuilder,
    Credentials, DEFAULT_URL_TEMPLATE, Endpoint, Error, PrivateKey, RequestBody, Requestor,
    ResponseBody, SecureString, Service,
};
