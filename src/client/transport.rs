use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use crate::client::request::{KeystoneRequest, KeystoneResponse};
use crate::error::Result;

/// Sends requests and reads their responses in full.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &KeystoneRequest) -> Result<KeystoneResponse>;
}

/// `Transport` over a shared `reqwest::Client`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &KeystoneRequest) -> Result<KeystoneResponse> {
        let mut builder = self
            .client
            .request(request.method().clone(), request.url())
            .headers(request.headers().clone());
        if let Some(body) = request.body() {
            builder = builder.body(body.to_vec());
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();
        debug!("{} {} -> {}", request.method(), request.url(), status);

        Ok(KeystoneResponse::new(status, headers, body))
    }
}
