//! Shared constants and invariants

/// Header carrying the token id on every authenticated request.
pub const X_AUTH_TOKEN: &str = "x-auth-token";
/// Header carrying the remaining auth retry budget on retried requests.
pub const X_AUTH_RETRIES: &str = "x-auth-retries";
/// Retry budget of a request without `X-Auth-Retries`.
pub const DEFAULT_AUTH_RETRIES: i64 = 1;

pub const TOKEN_CACHE_KEY_PREFIX: &str = "keystone_token_";
pub const PUBLIC_URL_KEY: &str = "publicURL";

pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_CACHE_MAX_ENTRIES: usize = 1024;
