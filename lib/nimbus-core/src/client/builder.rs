use std::sync::Arc;

use super::auth::{AuthenticationError, Credentials};
use super::error::Error;
use super::{Client, ClientOptions};

/// Default endpoint URL template; `{service}` and `{region}` are substituted
/// per requestor.
pub const DEFAULT_URL_TEMPLATE: &str = "https://{service}.{region}.oraclecloud.com";

const DEFAULT_USER_AGENT: &str = concat!("nimbus-core/", env!("CARGO_PKG_VERSION"));

/// Builder for [`Client`] instances.
///
/// # Example
///
/// ```rust,no_run
/// use nimbus_core::{Client, Credentials};
///
/// # fn example(key_pem: &str) -> Result<(), nimbus_core::Error> {
/// let credentials = Credentials::api_key(
///     "ocid1.tenancy.oc1..aaaa",
///     "ocid1.user.oc1..bbbb",
///     "8c:bf:17:7b:5f:e0:7d:13",
///     key_pem,
/// )?;
/// let client = Client::builder()
///     .with_region("us-phoenix-1")
///     .with_credentials(credentials)
///     .build()?;
///
/// let compute = client.compute();
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ClientBuilder {
    http: Option<reqwest::Client>,
    region: Option<String>,
    url_template: Option<String>,
    user_agent: Option<String>,
    credentials: Option<Credentials>,
    debug_dump: bool,
}

impl ClientBuilder {
    /// Sets the region identifier, e.g. `us-phoenix-1`. Required.
    #[must_use]
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Overrides the endpoint URL template.
    ///
    /// Defaults to [`DEFAULT_URL_TEMPLATE`]; `{service}` and `{region}`
    /// placeholders are substituted when building URLs.
    #[must_use]
    pub fn with_url_template(mut self, template: impl Into<String>) -> Self {
        self.url_template = Some(template.into());
        self
    }

    /// Overrides the `user-agent` header value.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Sets the caller identity used to sign every request. Required.
    #[must_use]
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Supplies a pre-configured `reqwest::Client`.
    ///
    /// Timeouts, proxies, and connection pooling are configured there; this
    /// layer adds none of its own.
    #[must_use]
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = Some(http);
        self
    }

    /// Enables diagnostic dumps of outbound requests and inbound responses at
    /// `debug` level. Off by default; intended for troubleshooting, not as a
    /// machine-readable surface.
    #[must_use]
    pub fn with_debug_dump(mut self, enabled: bool) -> Self {
        self.debug_dump = enabled;
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedRequest`] when the region is missing and
    /// [`Error::Authentication`] when no credentials were supplied.
    pub fn build(self) -> Result<Client, Error> {
        let Self {
            http,
            region,
            url_template,
            user_agent,
            credentials,
            debug_dump,
        } = self;

        let region = region.ok_or_else(|| Error::MalformedRequest {
            message: "region is required".to_string(),
        })?;
        let credentials = credentials.ok_or(Error::Authentication(
            AuthenticationError::MissingField {
                field: "credentials".to_string(),
            },
        ))?;

        Ok(Client {
            http: http.unwrap_or_default(),
            credentials: Arc::new(credentials),
            options: Arc::new(ClientOptions {
                url_template: url_template
                    .unwrap_or_else(|| DEFAULT_URL_TEMPLATE.to_string()),
                region,
                user_agent: user_agent.unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
                debug_dump,
            }),
        })
    }
}
