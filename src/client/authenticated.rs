use async_trait::async_trait;
use http::Method;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::client::request::{KeystoneRequest, KeystoneResponse};
use crate::client::transport::Transport;
use crate::error::{KeystoneError, Result};
use crate::helpers::time::mask_secret;
use crate::token::token::Token;
use crate::utils::constants::X_AUTH_TOKEN;

/// Resolves and attaches a token to a client that has none yet.
#[async_trait]
pub trait TokenResolver: Send + Sync {
    async fn resolve_token(&self, client: &AuthenticatedClient) -> Result<()>;
}

/// Handles a 401/403 response; returns the response the caller should see.
#[async_trait]
pub trait AuthFailureHandler: Send + Sync {
    async fn on_auth_failure(
        &self,
        client: &AuthenticatedClient,
        request: &KeystoneRequest,
        response: KeystoneResponse,
    ) -> Result<KeystoneResponse>;
}

/// Credentials and endpoint used to (re)authenticate.
#[derive(Clone)]
pub struct KeystoneCredentials {
    pub token_url: String,
    pub username: String,
    pub password: String,
    pub tenant_name: Option<String>,
}

impl fmt::Debug for KeystoneCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeystoneCredentials")
            .field("token_url", &self.token_url)
            .field("username", &self.username)
            .field("password", &"****")
            .field("tenant_name", &self.tenant_name)
            .finish()
    }
}

/// Token and the base URL resolved from it, always replaced together.
#[derive(Debug)]
pub struct Session {
    token: Arc<Token>,
    base_url: String,
}

impl Session {
    pub fn token(&self) -> &Arc<Token> {
        &self.token
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Client issuing requests against the public URL of one catalog service,
/// with the `X-Auth-Token` header of its current token.
pub struct AuthenticatedClient {
    transport: Arc<dyn Transport>,
    credentials: KeystoneCredentials,
    service_type: String,
    service_name: Option<String>,
    cache_key_filter: Vec<String>,
    session: RwLock<Option<Arc<Session>>>,
    token_resolver: Option<Arc<dyn TokenResolver>>,
    failure_handler: Option<Arc<dyn AuthFailureHandler>>,
}

impl AuthenticatedClient {
    pub fn new(
        transport: Arc<dyn Transport>,
        credentials: KeystoneCredentials,
        service_type: String,
        service_name: Option<String>,
    ) -> Self {
        Self {
            transport,
            credentials,
            service_type,
            service_name,
            cache_key_filter: Vec::new(),
            session: RwLock::new(None),
            token_resolver: None,
            failure_handler: None,
        }
    }

    pub fn with_token_resolver(mut self, resolver: Arc<dyn TokenResolver>) -> Self {
        self.token_resolver = Some(resolver);
        self
    }

    pub fn with_failure_handler(mut self, handler: Arc<dyn AuthFailureHandler>) -> Self {
        self.failure_handler = Some(handler);
        self
    }

    /// Header names left out of `request_cache_key`.
    pub fn with_cache_key_filter(mut self, headers: &[&str]) -> Self {
        self.cache_key_filter = headers.iter().map(|h| h.to_ascii_lowercase()).collect();
        self
    }

    pub fn credentials(&self) -> &KeystoneCredentials {
        &self.credentials
    }

    pub fn token_url(&self) -> &str {
        &self.credentials.token_url
    }

    pub fn tenant_name(&self) -> Option<&str> {
        self.credentials.tenant_name.as_deref()
    }

    pub fn service_type(&self) -> &str {
        &self.service_type
    }

    pub fn service_name(&self) -> Option<&str> {
        self.service_name.as_deref()
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Current session, without triggering resolution.
    pub async fn session(&self) -> Option<Arc<Session>> {
        self.session.read().await.clone()
    }

    pub async fn token(&self) -> Option<Arc<Token>> {
        self.session().await.map(|s| s.token.clone())
    }

    pub async fn token_id(&self) -> Option<String> {
        self.session().await.map(|s| s.token.id().to_owned())
    }

    /// Base URL of the current session, without triggering resolution.
    pub async fn base_url(&self) -> Option<String> {
        self.session().await.map(|s| s.base_url.clone())
    }

    /// Replace the current token. The public URL is resolved first, so a
    /// token lacking the service leaves the previous session untouched.
    pub async fn attach_token(&self, token: Token) -> Result<Arc<Token>> {
        let base_url = token.public_url(&self.service_type, self.service_name.as_deref())?;
        let token = Arc::new(token);
        let session = Arc::new(Session { token: token.clone(), base_url });

        debug!(
            token = %mask_secret(token.id()),
            base_url = %session.base_url,
            "token attached"
        );
        *self.session.write().await = Some(session);
        Ok(token)
    }

    /// Base URL of the service, resolving a token first when none is attached.
    pub async fn resolve_base_url(&self) -> Result<String> {
        Ok(self.resolve_session().await?.base_url.clone())
    }

    async fn resolve_session(&self) -> Result<Arc<Session>> {
        if let Some(session) = self.session().await {
            return Ok(session);
        }

        let resolver = self.token_resolver.as_ref().ok_or(KeystoneError::MissingToken)?;
        debug!("no token attached, resolving one from '{}'", self.token_url());
        resolver.resolve_token(self).await?;
        self.session().await.ok_or(KeystoneError::MissingToken)
    }

    /// Request to `path` under the base URL, carrying the current token.
    /// Absolute URLs are used as given.
    pub async fn request(&self, method: Method, path: &str) -> Result<KeystoneRequest> {
        let session = self.resolve_session().await?;
        let url = join_url(&session.base_url, path);
        KeystoneRequest::new(method, url).with_header(X_AUTH_TOKEN, session.token.id())
    }

    /// Send `request`; a 401/403 response goes through the failure handler,
    /// whose response replaces the original.
    pub async fn send(&self, request: KeystoneRequest) -> Result<KeystoneResponse> {
        let response = self.dispatch(&request).await?;
        if !response.is_auth_failure() {
            return Ok(response);
        }

        match &self.failure_handler {
            Some(handler) => handler.on_auth_failure(self, &request, response).await,
            None => Ok(response),
        }
    }

    /// Send through the transport without failure interception.
    pub async fn dispatch(&self, request: &KeystoneRequest) -> Result<KeystoneResponse> {
        self.transport.send(request).await
    }

    pub async fn get(&self, path: &str) -> Result<KeystoneResponse> {
        let request = self.request(Method::GET, path).await?;
        self.send(request).await
    }

    pub async fn delete(&self, path: &str) -> Result<KeystoneResponse> {
        let request = self.request(Method::DELETE, path).await?;
        self.send(request).await
    }

    pub async fn post_json<T: Serialize + ?Sized + Sync>(&self, path: &str, body: &T) -> Result<KeystoneResponse> {
        let request = self.request(Method::POST, path).await?.with_json(body)?;
        self.send(request).await
    }

    pub async fn put_json<T: Serialize + ?Sized + Sync>(&self, path: &str, body: &T) -> Result<KeystoneResponse> {
        let request = self.request(Method::PUT, path).await?.with_json(body)?;
        self.send(request).await
    }

    /// Key for request-level caches: method, URL and headers, minus the
    /// auth bookkeeping headers so a token refresh does not split entries.
    pub fn request_cache_key(&self, request: &KeystoneRequest) -> String {
        let mut headers: Vec<String> = request
            .headers()
            .iter()
            .filter(|(name, _)| !self.cache_key_filter.iter().any(|f| f == name.as_str()))
            .map(|(name, value)| format!("{}={}", name, String::from_utf8_lossy(value.as_bytes())))
            .collect();
        headers.sort();
        format!("{} {}|{}", request.method(), request.url(), headers.join(","))
    }
}

impl fmt::Debug for AuthenticatedClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthenticatedClient")
            .field("credentials", &self.credentials)
            .field("service_type", &self.service_type)
            .field("service_name", &self.service_name)
            .finish_non_exhaustive()
    }
}

fn join_url(base_url: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_owned();
    }
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        base_url.to_owned()
    } else {
        format!("{}/{}", base_url, path)
    }
}

#[cfg(test)]
mod test {
    use super::join_url;

    #[test]
    fn joins_paths_onto_base_url() {
        assert_eq!(join_url("http://svc/v1", "/servers"), "http://svc/v1/servers");
        assert_eq!(join_url("http://svc/v1", "servers/1"), "http://svc/v1/servers/1");
        assert_eq!(join_url("http://svc/v1", ""), "http://svc/v1");
        assert_eq!(join_url("http://svc/v1", "https://other/x"), "https://other/x");
    }
}
