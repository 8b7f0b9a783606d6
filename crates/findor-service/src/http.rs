use std::time::Duration;

use async_trait::async_trait;
use findor_core::api_key::{
    ApiKeyListItem, CreatedApiKey, DeleteKeyRequest, EmailRequest, StatusResponse,
};
use reqwest::Client;
use tracing::{debug, warn};

use crate::{KeyService, ServiceError};

pub const DEFAULT_BASE_URL: &str = "https://findor.vercel.app";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Async HTTP client for the remote key service.
#[derive(Debug, Clone)]
pub struct HttpKeyService {
    base_url: String,
    client: Client,
}

impl HttpKeyService {
    pub fn new(base_url: &str) -> Self {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!("HTTP client setup failed, requests will have no timeout: {e}");
                Client::new()
            });
        Self { base_url, client }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post_json<B: serde::Serialize, T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ServiceError> {
        debug!("POST {}{path}", self.base_url);
        let resp = self
            .client
            .post(format!("{}{path}", self.base_url))
            .json(body)
            .send()
            .await
            .map_err(|e| ServiceError::Network(e.to_string()))?;
        handle_response(path, resp).await
    }
}

async fn handle_response<T: serde::de::DeserializeOwned>(
    path: &str,
    resp: reqwest::Response,
) -> Result<T, ServiceError> {
    let status = resp.status();
    if !status.is_success() {
        debug!("{path} failed with {status}");
        return Err(ServiceError::Http {
            status: status.as_u16(),
        });
    }
    let body = resp
        .bytes()
        .await
        .map_err(|e| ServiceError::Network(format!("read body: {e}")))?;
    serde_json::from_slice(&body).map_err(|e| ServiceError::Decode(format!("json decode: {e}")))
}

fn require_email(email: &str) -> Result<&str, ServiceError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(ServiceError::Precondition("no signed-in email".into()));
    }
    Ok(email)
}

#[async_trait]
impl KeyService for HttpKeyService {
    async fn create_user(&self, email: &str) -> Result<StatusResponse, ServiceError> {
        let email = require_email(email)?;
        self.post_json(
            "/user/create",
            &EmailRequest {
                email: email.to_string(),
            },
        )
        .await
    }

    async fn create_api_key(&self, email: &str) -> Result<CreatedApiKey, ServiceError> {
        let email = require_email(email)?;
        self.post_json(
            "/apikey/create",
            &EmailRequest {
                email: email.to_string(),
            },
        )
        .await
    }

    async fn list_api_keys(&self, email: &str) -> Result<Vec<ApiKeyListItem>, ServiceError> {
        let email = require_email(email)?;
        self.post_json(
            "/apikey/list",
            &EmailRequest {
                email: email.to_string(),
            },
        )
        .await
    }

    async fn delete_api_key(
        &self,
        email: &str,
        key: &str,
    ) -> Result<StatusResponse, ServiceError> {
        let email = require_email(email)?;
        self.post_json(
            "/apikey/delete",
            &DeleteKeyRequest {
                email: email.to_string(),
                key: key.to_string(),
            },
        )
        .await
    }
}
