use url::Url;

use super::error::Error;

/// Service families exposed by the API, a closed set.
///
/// Each variant knows the DNS label substituted into the endpoint URL
/// template and the API-version path segment its URLs are rooted at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    /// Compute instances, VNICs, volumes.
    Compute,
    /// Object storage namespaces, buckets, and objects.
    ObjectStorage,
    /// Database systems.
    Database,
    /// Identity: users, groups, policies, compartments.
    Identity,
    /// Load balancers.
    LoadBalancer,
}

impl Service {
    /// DNS label substituted for `{service}` in the URL template.
    pub fn dns_label(self) -> &'static str {
        match self {
            Self::Compute | Self::LoadBalancer => "iaas",
            Self::ObjectStorage => "objectstorage",
            Self::Database => "database",
            Self::Identity => "identity",
        }
    }

    /// API-version segment prefixed to every path, when the service has one.
    ///
    /// Object storage paths are rooted at the namespace (`/n/...`) and carry
    /// no version segment.
    pub fn api_version(self) -> Option<&'static str> {
        match self {
            Self::ObjectStorage => None,
            Self::Compute | Self::Database | Self::Identity | Self::LoadBalancer => {
                Some("20160918")
            }
        }
    }
}

/// Region-scoped endpoint of one service family.
///
/// Maps a URL template plus path information onto a fully qualified URL.
/// Pure and deterministic: building the same URL twice from identical inputs
/// yields the identical string, and no I/O is performed.
#[derive(Debug, Clone)]
pub struct Endpoint {
    template: String,
    region: String,
    service: Service,
}

impl Endpoint {
    pub(crate) fn new(
        template: impl Into<String>,
        region: impl Into<String>,
        service: Service,
    ) -> Self {
        Self {
            template: template.into(),
            region: region.into(),
            service,
        }
    }

    /// The service family this endpoint is bound to.
    pub fn service(&self) -> Service {
        self.service
    }

    /// The region identifier this endpoint is bound to.
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Builds the fully qualified URL for the given path segments and query
    /// pairs.
    ///
    /// `{service}` and `{region}` placeholders in the template are replaced,
    /// the service's API-version segment is prefixed, and each path segment
    /// is appended percent-encoded.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedRequest`] when a path segment is empty (a
    /// required path parameter was absent) or the substituted template does
    /// not parse as a URL.
    pub fn url(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<Url, Error> {
        let base = self
            .template
            .replace("{service}", self.service.dns_label())
            .replace("{region}", &self.region);
        let mut url = Url::parse(&base)?;

        {
            let mut path = url
                .path_segments_mut()
                .map_err(|()| Error::MalformedRequest {
                    message: format!("endpoint template {base:?} cannot carry a path"),
                })?;
            path.pop_if_empty();
            if let Some(version) = self.service.api_version() {
                path.push(version);
            }
            for segment in segments {
                if segment.is_empty() {
                    return Err(Error::MalformedRequest {
                        message: "missing required path parameter".to_string(),
                    });
                }
                path.push(segment);
            }
        }

        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }

        Ok(url)
    }
}
