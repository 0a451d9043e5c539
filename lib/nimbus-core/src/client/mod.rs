//! The request/response pipeline: clients, requestors, signing, and the
//! response envelope.

use std::sync::Arc;

mod builder;
pub use self::builder::{ClientBuilder, DEFAULT_URL_TEMPLATE};

mod auth;
pub use self::auth::{AuthenticationError, Credentials, PrivateKey, SecureString};

mod sign;

mod endpoint;
pub use self::endpoint::{Endpoint, Service};

mod request;
pub use self::request::{ApiRequest, RequestBody};

mod requestor;
pub use self::requestor::Requestor;

mod response;
pub use self::response::{ApiResponse, ByteStream, ResponseBody};

mod error;
pub use self::error::{ApiError, Error};

#[cfg(test)]
mod integration_tests;

/// Immutable per-client configuration, shared read-only by every requestor
/// derived from one client.
#[derive(Debug)]
pub(crate) struct ClientOptions {
    pub(crate) url_template: String,
    pub(crate) region: String,
    pub(crate) user_agent: String,
    pub(crate) debug_dump: bool,
}

/// Entry point: holds the HTTP transport, caller identity, and client
/// options, and hands out [`Requestor`]s bound to one service family each.
///
/// Cloning is cheap (the transport and identity are shared handles), and all
/// shared state is read-only after construction, so a client and its
/// requestors may be used concurrently without additional locking.
///
/// # Example
///
/// ```rust,no_run
/// use nimbus_core::{Client, Credentials};
///
/// # fn example(key_pem: &str) -> Result<(), nimbus_core::Error> {
/// let client = Client::builder()
///     .with_region("us-phoenix-1")
///     .with_credentials(Credentials::api_key(
///         "ocid1.tenancy.oc1..aaaa",
///         "ocid1.user.oc1..bbbb",
///         "8c:bf:17:7b:5f:e0:7d:13",
///         key_pem,
///     )?)
///     .build()?;
///
/// let compute = client.compute();
/// let identity = client.identity();
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Client {
    pub(crate) http: reqwest::Client,
    pub(crate) credentials: Arc<Credentials>,
    pub(crate) options: Arc<ClientOptions>,
}

impl Client {
    /// Starts building a client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    fn requestor(&self, service: Service) -> Requestor {
        Requestor {
            http: self.http.clone(),
            endpoint: Endpoint::new(
                self.options.url_template.clone(),
                self.options.region.clone(),
                service,
            ),
            credentials: Arc::clone(&self.credentials),
            user_agent: self.options.user_agent.clone(),
            debug_dump: self.options.debug_dump,
        }
    }

    /// Requestor for the compute service.
    pub fn compute(&self) -> Requestor {
        self.requestor(Service::Compute)
    }

    /// Requestor for the object storage service.
    pub fn object_storage(&self) -> Requestor {
        self.requestor(Service::ObjectStorage)
    }

    /// Requestor for the database service.
    pub fn database(&self) -> Requestor {
        self.requestor(Service::Database)
    }

    /// Requestor for the identity service.
    pub fn identity(&self) -> Requestor {
        self.requestor(Service::Identity)
    }

    /// Requestor for the load balancer service.
    pub fn load_balancer(&self) -> Requestor {
        self.requestor(Service::LoadBalancer)
    }
}
