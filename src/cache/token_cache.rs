use std::sync::Arc;
use tracing::{debug, warn};

use crate::cache::store::CacheStore;
use crate::helpers::time::now;
use crate::observability::metrics::get_metrics;
use crate::token::token::Token;
use crate::utils::constants::TOKEN_CACHE_KEY_PREFIX;

/// Token cache over an injected store, one slot per token endpoint URL.
///
/// Store failures, undecodable values and expired tokens all read as a miss;
/// writes are best effort.
#[derive(Clone)]
pub struct TokenCache {
    store: Arc<dyn CacheStore>,
}

impl TokenCache {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    /// Cache key of a token endpoint: prefix + raw URL-encoded endpoint.
    pub fn key_for(token_url: &str) -> String {
        format!("{}{}", TOKEN_CACHE_KEY_PREFIX, urlencoding::encode(token_url))
    }

    /// Cached, non-expired token issued by `token_url`
    pub async fn get_token(&self, token_url: &str) -> Option<Token> {
        let key = Self::key_for(token_url);
        let lookups = &get_metrics().await.token_cache_lookups;

        let bytes = match self.store.get(&key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                lookups.with_label_values(&["miss"]).inc();
                debug!("token cache miss for '{}'", key);
                return None;
            }
            Err(err) => {
                lookups.with_label_values(&["error"]).inc();
                warn!("token cache read for '{}' failed, treating as miss: {}", key, err);
                return None;
            }
        };

        let token: Token = match serde_json::from_slice(&bytes) {
            Ok(token) => token,
            Err(err) => {
                lookups.with_label_values(&["invalid"]).inc();
                warn!("cached token under '{}' is not decodable: {}", key, err);
                return None;
            }
        };

        if token.is_expired(now()) {
            lookups.with_label_values(&["expired"]).inc();
            debug!("cached token under '{}' expired at {}", key, token.expires_at());
            return None;
        }

        lookups.with_label_values(&["hit"]).inc();
        debug!("token cache hit for '{}'", key);
        Some(token)
    }

    /// Store `token` until it expires. Failures are logged, never returned.
    pub async fn put_token(&self, token_url: &str, token: &Token) {
        let key = Self::key_for(token_url);
        let ttl = token.seconds_until_expiry(now());

        let result = match serde_json::to_vec(token) {
            Ok(bytes) => self.store.set(&key, bytes, ttl).await,
            Err(err) => Err(err.into()),
        };

        match result {
            Ok(()) => debug!("token cached under '{}' for {}s", key, ttl),
            Err(err) => {
                get_metrics().await.token_cache_write_failures.inc();
                warn!("token cache write for '{}' failed: {}", key, err);
            }
        }
    }
}
