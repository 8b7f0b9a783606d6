use async_trait::async_trait;
use findor_core::api_key::{ApiKeyListItem, CreatedApiKey, StatusResponse};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ServiceError {
    /// The backend answered with a non-2xx status.
    #[error("HTTP error! status: {status}")]
    Http { status: u16 },

    /// The request never produced a response (connect, timeout, TLS).
    #[error("network error: {0}")]
    Network(String),

    #[error("decode error: {0}")]
    Decode(String),

    /// The caller broke the contract, e.g. no signed-in email.
    #[error("precondition failed: {0}")]
    Precondition(String),
}

impl ServiceError {
    /// Status code for HTTP failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            ServiceError::Http { status } => Some(*status),
            _ => None,
        }
    }

    pub fn is_network_or_http(&self) -> bool {
        matches!(self, ServiceError::Http { .. } | ServiceError::Network(_))
    }
}

/// The remote key service contract.
///
/// Every call is keyed by the signed-in user's email. `HttpKeyService`
/// talks to the real backend; the key manager and the CLI program
/// against this trait.
#[async_trait]
pub trait KeyService: Send + Sync {
    /// Register the user. Fails when the user already exists, so callers
    /// are expected to ignore the error.
    async fn create_user(&self, email: &str) -> Result<StatusResponse, ServiceError>;

    async fn create_api_key(&self, email: &str) -> Result<CreatedApiKey, ServiceError>;

    /// All keys owned by the user, in backend order.
    async fn list_api_keys(&self, email: &str) -> Result<Vec<ApiKeyListItem>, ServiceError>;

    /// Remove the key whose secret is exactly `key`.
    async fn delete_api_key(&self, email: &str, key: &str)
        -> Result<StatusResponse, ServiceError>;
}
