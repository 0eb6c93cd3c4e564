//! Error types for the keystone client.

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, KeystoneError>;

/// Errors surfaced by token resolution and request dispatch.
#[derive(Debug, thiserror::Error)]
pub enum KeystoneError {
    /// The identity exchange failed: bad credentials, non-2xx status,
    /// malformed body or a transport failure while talking to the token endpoint.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The token's service catalog has no entry for the requested service.
    #[error("No catalog entry for service type '{service_type}' (name: {service_name:?})")]
    CatalogLookup {
        service_type: String,
        service_name: Option<String>,
    },

    /// No token is attached and the client has no resolver to obtain one.
    #[error("Client has no token and no token resolver")]
    MissingToken,

    /// Sending a request failed before a response was received.
    #[error("Transport error: {0}")]
    Transport(String),

    /// A header name or value could not be built.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The cache store failed. Absorbed by the token cache.
    #[error("Cache error: {0}")]
    Cache(String),
}

impl From<reqwest::Error> for KeystoneError {
    fn from(e: reqwest::Error) -> Self {
        KeystoneError::Transport(e.to_string())
    }
}

impl From<serde_json::Error> for KeystoneError {
    fn from(e: serde_json::Error) -> Self {
        KeystoneError::Serialization(e.to_string())
    }
}
