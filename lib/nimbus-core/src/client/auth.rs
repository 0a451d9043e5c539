use std::fmt;

use rsa::RsaPrivateKey;
use rsa::pkcs1::DecodeRsaPrivateKey as _;
use rsa::pkcs1v15::SigningKey;
use rsa::pkcs8::DecodePrivateKey as _;
use rsa::signature::{SignatureEncoding as _, Signer as _};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Errors that can occur while preparing or applying request authentication.
///
/// All of these are raised before any network I/O takes place: a call that
/// fails authentication is never dispatched.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Error, derive_more::Display)]
pub enum AuthenticationError {
    /// A required identity field was empty.
    #[display("missing required identity field: {field}")]
    MissingField {
        /// Name of the missing field.
        field: String,
    },

    /// The signing key PEM could not be parsed as an RSA private key.
    #[display("invalid private key: {message}")]
    InvalidPrivateKey {
        /// Description of the parse failure.
        message: String,
    },

    /// The RSA signature computation failed.
    #[display("signing failed: {message}")]
    SigningFailed {
        /// Description of the signing failure.
        message: String,
    },

    /// A computed header value was rejected by the HTTP layer.
    #[display("invalid header value for {header}: {message}")]
    InvalidHeaderValue {
        /// Header that could not be attached.
        header: String,
        /// Description of why the value is invalid.
        message: String,
    },

    /// The outbound request is missing information needed for signing.
    #[display("request cannot be signed: {message}")]
    UnsignableRequest {
        /// Description of what is missing.
        message: String,
    },
}

/// Secure wrapper for sensitive string data that zeroes memory on drop.
///
/// Used for session tokens and any other secret carried by [`Credentials`].
/// `Debug` output is redacted and `Display` masks all but the outer
/// characters, so secrets never leak through logging.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SecureString(String);

impl SecureString {
    /// Creates a new secure string from the provided value.
    pub fn new(value: String) -> Self {
        Self(value)
    }

    /// Returns a reference to the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Masks sensitive data for display purposes.
    ///
    /// Counts characters rather than bytes so multi-byte values never split
    /// mid-character.
    fn mask_sensitive(value: &str) -> String {
        let count = value.chars().count();
        if count <= 8 {
            "***".to_string()
        } else {
            let lead: String = value.chars().take(4).collect();
            let tail: String = value.chars().skip(count - 4).collect();
            format!("{lead}...{tail}")
        }
    }
}

impl fmt::Debug for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecureString")
            .field("value", &"[REDACTED]")
            .finish()
    }
}

impl fmt::Display for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Self::mask_sensitive(&self.0))
    }
}

impl From<String> for SecureString {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for SecureString {
    fn from(value: &str) -> Self {
        Self::new(value.to_string())
    }
}

impl Serialize for SecureString {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SecureString {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        String::deserialize(deserializer).map(Self::new)
    }
}

/// RSA private key used to sign requests.
///
/// Parsed once at client construction from PKCS#8 or PKCS#1 PEM; the key
/// material is zeroized by the underlying RSA implementation on drop.
#[derive(Clone)]
pub struct PrivateKey {
    key: SigningKey<Sha256>,
}

impl PrivateKey {
    /// Parses an RSA private key from a PEM string.
    ///
    /// Accepts both PKCS#8 (`BEGIN PRIVATE KEY`) and PKCS#1
    /// (`BEGIN RSA PRIVATE KEY`) encodings.
    ///
    /// # Errors
    ///
    /// Returns [`AuthenticationError::InvalidPrivateKey`] when the PEM cannot
    /// be parsed under either encoding.
    pub fn from_pem(pem: &str) -> Result<Self, AuthenticationError> {
        let key = match RsaPrivateKey::from_pkcs8_pem(pem) {
            Ok(key) => key,
            Err(_) => RsaPrivateKey::from_pkcs1_pem(pem).map_err(|error| {
                AuthenticationError::InvalidPrivateKey {
                    message: error.to_string(),
                }
            })?,
        };
        Ok(Self {
            key: SigningKey::new(key),
        })
    }

    /// Signs a message with RSASSA-PKCS1-v1_5 over SHA-256.
    pub(crate) fn try_sign(&self, message: &[u8]) -> Result<Vec<u8>, AuthenticationError> {
        let signature =
            self.key
                .try_sign(message)
                .map_err(|error| AuthenticationError::SigningFailed {
                    message: error.to_string(),
                })?;
        Ok(signature.to_vec())
    }

    #[cfg(test)]
    pub(crate) fn verifying_key(&self) -> rsa::pkcs1v15::VerifyingKey<Sha256> {
        use rsa::signature::Keypair as _;
        self.key.verifying_key()
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Caller identity used to sign outbound requests.
///
/// Exactly two authentication strategies exist, modeled as a closed enum:
/// explicit API-key signing and delegated instance-principal identity. Both
/// produce the same `Signature` authorization header; they differ only in
/// the `keyId` and in where the signing key comes from.
///
/// Credentials are read-only after construction and may be shared freely
/// across requestors and concurrent calls.
#[derive(Debug, Clone)]
pub enum Credentials {
    /// Explicit key-pair signing with tenancy/user/fingerprint identity.
    ApiKey {
        /// Tenancy OCID.
        tenancy: String,
        /// User OCID.
        user: String,
        /// Fingerprint of the uploaded public key.
        fingerprint: String,
        /// RSA private key matching the fingerprint.
        key: PrivateKey,
    },

    /// Delegated identity backed by a session credential.
    ///
    /// The security token and session key are obtained from a separate trust
    /// boundary (the instance metadata endpoint) and supplied here ready-made;
    /// this layer only uses them for signing.
    InstancePrincipal {
        /// Short-lived security token identifying the instance.
        session_token: SecureString,
        /// Session RSA key paired with the token.
        session_key: PrivateKey,
    },
}

impl Credentials {
    /// Builds API-key credentials, validating that all identity fields are
    /// present and that the key PEM parses.
    ///
    /// # Errors
    ///
    /// Returns [`AuthenticationError::MissingField`] for the first empty
    /// identity field, or [`AuthenticationError::InvalidPrivateKey`] when the
    /// PEM is not an RSA private key.
    pub fn api_key(
        tenancy: impl Into<String>,
        user: impl Into<String>,
        fingerprint: impl Into<String>,
        private_key_pem: &str,
    ) -> Result<Self, AuthenticationError> {
        let tenancy = tenancy.into();
        let user = user.into();
        let fingerprint = fingerprint.into();

        for (field, value) in [
            ("tenancy", &tenancy),
            ("user", &user),
            ("fingerprint", &fingerprint),
        ] {
            if value.is_empty() {
                return Err(AuthenticationError::MissingField {
                    field: field.to_string(),
                });
            }
        }
        if private_key_pem.is_empty() {
            return Err(AuthenticationError::MissingField {
                field: "private_key".to_string(),
            });
        }

        let key = PrivateKey::from_pem(private_key_pem)?;
        Ok(Self::ApiKey {
            tenancy,
            user,
            fingerprint,
            key,
        })
    }

    /// Builds delegated instance-principal credentials from a session token
    /// and its paired session key.
    ///
    /// # Errors
    ///
    /// Returns [`AuthenticationError::MissingField`] when the token is empty,
    /// or [`AuthenticationError::InvalidPrivateKey`] for a bad session key.
    pub fn instance_principal(
        session_token: impl Into<SecureString>,
        session_key_pem: &str,
    ) -> Result<Self, AuthenticationError> {
        let session_token = session_token.into();
        if session_token.as_str().is_empty() {
            return Err(AuthenticationError::MissingField {
                field: "session_token".to_string(),
            });
        }
        let session_key = PrivateKey::from_pem(session_key_pem)?;
        Ok(Self::InstancePrincipal {
            session_token,
            session_key,
        })
    }

    /// The `keyId` value bound into the authorization header.
    pub(crate) fn key_id(&self) -> String {
        match self {
            Self::ApiKey {
                tenancy,
                user,
                fingerprint,
                ..
            } => format!("{tenancy}/{user}/{fingerprint}"),
            Self::InstancePrincipal { session_token, .. } => {
                format!("ST${}", session_token.as_str())
            }
        }
    }

    pub(crate) fn private_key(&self) -> &PrivateKey {
        match self {
            Self::ApiKey { key, .. } => key,
            Self::InstancePrincipal { session_key, .. } => session_key,
        }
    }
}
