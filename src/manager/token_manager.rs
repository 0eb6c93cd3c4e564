use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::cache::store::CacheStore;
use crate::cache::token_cache::TokenCache;
use crate::client::authenticated::{AuthFailureHandler, AuthenticatedClient, KeystoneCredentials, TokenResolver};
use crate::client::request::{KeystoneRequest, KeystoneResponse};
use crate::client::transport::{ReqwestTransport, Transport};
use crate::error::Result;
use crate::manager::exchange::authenticate;
use crate::observability::metrics::get_metrics;
use crate::resilience::auth_retry::{self, AuthRetryDecision};
use crate::token::token::Token;
use crate::utils::constants::{DEFAULT_HTTP_TIMEOUT_MS, X_AUTH_RETRIES, X_AUTH_TOKEN};

/// Creates Keystone-authenticated clients and owns their token lifecycle:
/// lazy resolution through the cache, forced refresh, and the single
/// re-authenticated retry of requests refused with 401/403.
#[derive(Clone)]
pub struct TokenManager {
    cache: TokenCache,
    transport: Arc<dyn Transport>,
}

impl TokenManager {
    /// Manager over `store` with a `reqwest` transport and the default timeout.
    pub fn new(store: Arc<dyn CacheStore>) -> Result<Self> {
        let transport = ReqwestTransport::with_timeout(Duration::from_millis(DEFAULT_HTTP_TIMEOUT_MS))?;
        Ok(Self::with_transport(store, Arc::new(transport)))
    }

    pub fn with_transport(store: Arc<dyn CacheStore>, transport: Arc<dyn Transport>) -> Self {
        Self { cache: TokenCache::new(store), transport }
    }

    pub fn cache(&self) -> &TokenCache {
        &self.cache
    }

    /// Client for the first catalog service of `service_type` (or the one
    /// named `service_name`). No request is made until the client is used.
    pub fn create_client(
        &self,
        token_url: &str,
        username: &str,
        password: &str,
        service_type: &str,
        service_name: Option<&str>,
    ) -> Arc<AuthenticatedClient> {
        let mut builder = self.client_builder(token_url, username, password, service_type);
        if let Some(name) = service_name {
            builder = builder.service_name(name);
        }
        builder.build()
    }

    pub fn client_builder(&self, token_url: &str, username: &str, password: &str, service_type: &str) -> ClientBuilder {
        ClientBuilder {
            manager: self.clone(),
            credentials: KeystoneCredentials {
                token_url: token_url.to_owned(),
                username: username.to_owned(),
                password: password.to_owned(),
                tenant_name: None,
            },
            service_type: service_type.to_owned(),
            service_name: None,
        }
    }

    /// Token for `client`: a cached, unexpired one unless `force_new`,
    /// otherwise a freshly authenticated one which is written to the cache.
    pub async fn get_token(&self, client: &AuthenticatedClient, force_new: bool) -> Result<Token> {
        let token_url = client.token_url();

        if !force_new {
            if let Some(token) = self.cache.get_token(token_url).await {
                debug!("using cached token for '{}'", token_url);
                return Ok(token);
            }
        }

        let token = authenticate(self.transport.as_ref(), client.credentials()).await?;
        self.cache.put_token(token_url, &token).await;
        Ok(token)
    }

    /// Authenticate again, bypassing the cache read, and attach the new token.
    pub async fn reset_token(&self, client: &AuthenticatedClient) -> Result<Arc<Token>> {
        let token = self.get_token(client, true).await?;
        client.attach_token(token).await
    }
}

#[async_trait]
impl TokenResolver for TokenManager {
    async fn resolve_token(&self, client: &AuthenticatedClient) -> Result<()> {
        let token = self.get_token(client, false).await?;
        client.attach_token(token).await?;
        Ok(())
    }
}

#[async_trait]
impl AuthFailureHandler for TokenManager {
    async fn on_auth_failure(
        &self,
        client: &AuthenticatedClient,
        request: &KeystoneRequest,
        response: KeystoneResponse,
    ) -> Result<KeystoneResponse> {
        let decision = auth_retry::decide(request, client.token_url());
        get_metrics().await.auth_retries.with_label_values(&[decision.as_str()]).inc();

        match decision {
            AuthRetryDecision::Skipped => {
                debug!("{} from token endpoint '{}', not retrying", response.status(), request.url());
                Ok(response)
            }
            AuthRetryDecision::Exhausted => {
                error!("Keystone request {} {} failed with {}, no more retries left", request.method(), request.url(), response.status());
                Ok(response)
            }
            AuthRetryDecision::Retry { remaining } => {
                debug!("{} for {} {}, token expired, fetching a new one", response.status(), request.method(), request.url());
                let token = self.reset_token(client).await?;
                let retried = auth_retry::prepare_retry(request, token.id(), remaining)?;
                let response = client.dispatch(&retried).await?;
                info!("retried {} {} with a new token -> {}", retried.method(), retried.url(), response.status());
                Ok(response)
            }
        }
    }
}

/// Builder for clients wired to a `TokenManager`.
pub struct ClientBuilder {
    manager: TokenManager,
    credentials: KeystoneCredentials,
    service_type: String,
    service_name: Option<String>,
}

impl ClientBuilder {
    pub fn tenant_name(mut self, tenant_name: &str) -> Self {
        self.credentials.tenant_name = Some(tenant_name.to_owned());
        self
    }

    pub fn service_name(mut self, service_name: &str) -> Self {
        self.service_name = Some(service_name.to_owned());
        self
    }

    pub fn build(self) -> Arc<AuthenticatedClient> {
        let manager = Arc::new(self.manager);
        let client = AuthenticatedClient::new(
            manager.transport.clone(),
            self.credentials,
            self.service_type,
            self.service_name,
        )
        .with_cache_key_filter(&[X_AUTH_TOKEN, X_AUTH_RETRIES])
        .with_token_resolver(manager.clone())
        .with_failure_handler(manager);
        Arc::new(client)
    }
}
