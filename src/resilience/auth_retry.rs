//! Retry policy for requests refused with 401/403.
//!
//! The remaining budget travels with the request in `X-Auth-Retries`
//! (absent means the default budget of one). A retry carries the budget
//! minus one, so a retried request that fails again is returned as is.

use crate::client::request::KeystoneRequest;
use crate::error::Result;
use crate::utils::constants::{DEFAULT_AUTH_RETRIES, X_AUTH_RETRIES, X_AUTH_TOKEN};

/// What to do with a request whose response was a 401/403.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRetryDecision {
    /// The request targeted the token endpoint itself; a new token cannot help.
    Skipped,
    /// No retries left.
    Exhausted,
    /// Refresh the token and resend with `remaining - 1`.
    Retry { remaining: i64 },
}

impl AuthRetryDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthRetryDecision::Skipped => "skipped",
            AuthRetryDecision::Exhausted => "exhausted",
            AuthRetryDecision::Retry { .. } => "retried",
        }
    }
}

/// Remaining retry budget of `request`. An unreadable value counts as none left.
pub fn remaining_retries(request: &KeystoneRequest) -> i64 {
    match request.headers().get(X_AUTH_RETRIES) {
        None => DEFAULT_AUTH_RETRIES,
        Some(value) => value
            .to_str()
            .ok()
            .and_then(|v| v.trim().parse::<i64>().ok())
            .unwrap_or(0),
    }
}

pub fn decide(request: &KeystoneRequest, token_url: &str) -> AuthRetryDecision {
    if request.url() == token_url {
        return AuthRetryDecision::Skipped;
    }
    match remaining_retries(request) {
        remaining if remaining < 1 => AuthRetryDecision::Exhausted,
        remaining => AuthRetryDecision::Retry { remaining },
    }
}

/// Copy of `request` with the new token and the decremented budget.
pub fn prepare_retry(request: &KeystoneRequest, token_id: &str, remaining: i64) -> Result<KeystoneRequest> {
    request
        .clone()
        .with_header(X_AUTH_TOKEN, token_id)?
        .with_header(X_AUTH_RETRIES, &(remaining - 1).to_string())
}

#[cfg(test)]
mod test {
    use super::*;
    use http::Method;

    const TOKEN_URL: &str = "http://keystone/v2.0/tokens";

    fn request(url: &str) -> KeystoneRequest {
        KeystoneRequest::new(Method::GET, url)
    }

    #[test]
    fn budget_defaults_to_one_and_bad_values_count_as_zero() {
        let req = request("http://svc/v1/servers");
        assert_eq!(remaining_retries(&req), 1);
        assert_eq!(remaining_retries(&req.clone().with_header(X_AUTH_RETRIES, "3").unwrap()), 3);
        assert_eq!(remaining_retries(&req.with_header(X_AUTH_RETRIES, "many").unwrap()), 0);
    }

    #[test]
    fn token_endpoint_is_never_retried() {
        assert_eq!(decide(&request(TOKEN_URL), TOKEN_URL), AuthRetryDecision::Skipped);
    }

    #[test]
    fn exhausted_budget_stops_retrying() {
        let req = request("http://svc/v1/servers").with_header(X_AUTH_RETRIES, "0").unwrap();
        assert_eq!(decide(&req, TOKEN_URL), AuthRetryDecision::Exhausted);
        let req = request("http://svc/v1/servers").with_header(X_AUTH_RETRIES, "-2").unwrap();
        assert_eq!(decide(&req, TOKEN_URL), AuthRetryDecision::Exhausted);
    }

    #[test]
    fn retry_copies_request_and_overrides_auth_headers() {
        let original = KeystoneRequest::new(Method::PUT, "http://svc/v1/servers/1")
            .with_header(X_AUTH_TOKEN, "old")
            .unwrap()
            .with_header("x-trace", "t1")
            .unwrap()
            .with_body(b"{}".to_vec());

        let AuthRetryDecision::Retry { remaining } = decide(&original, TOKEN_URL) else {
            panic!("expected a retry");
        };
        let retried = prepare_retry(&original, "xyz789", remaining).unwrap();

        assert_eq!(*retried.method(), Method::PUT);
        assert_eq!(retried.url(), original.url());
        assert_eq!(retried.body(), Some(&b"{}"[..]));
        assert_eq!(retried.header("x-trace"), Some("t1"));
        assert_eq!(retried.header(X_AUTH_TOKEN), Some("xyz789"));
        assert_eq!(retried.header(X_AUTH_RETRIES), Some("0"));
        // original untouched
        assert_eq!(original.header(X_AUTH_TOKEN), Some("old"));
        assert!(original.header(X_AUTH_RETRIES).is_none());
        assert_eq!(decide(&retried, TOKEN_URL), AuthRetryDecision::Exhausted);
    }
}
