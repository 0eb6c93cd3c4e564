use http::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::{debug, error, info};

use crate::client::authenticated::KeystoneCredentials;
use crate::client::request::KeystoneRequest;
use crate::client::transport::Transport;
use crate::error::{KeystoneError, Result};
use crate::helpers::time::{get_instant, mask_secret, parse_expiration};
use crate::observability::metrics::get_metrics;
use crate::token::catalog::{CatalogEntry, ServiceCatalog};
use crate::token::token::Token;
use crate::utils::constants::X_AUTH_TOKEN;

static SUCCESS_MSG: &str = "success";
static ERROR_MSG: &str = "error";

// -------------------------------
// wire format: request
// -------------------------------

#[derive(Debug, Serialize)]
struct AuthRequest<'a> {
    auth: AuthBody<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthBody<'a> {
    password_credentials: PasswordCredentials<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tenant_name: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct PasswordCredentials<'a> {
    username: &'a str,
    password: &'a str,
}

// -------------------------------
// wire format: response
// -------------------------------

#[derive(Debug, Deserialize)]
struct AuthResponse {
    access: Access,
}

#[derive(Debug, Deserialize)]
struct Access {
    token: AccessToken,
    #[serde(rename = "serviceCatalog", default)]
    service_catalog: Vec<CatalogService>,
}

#[derive(Debug, Deserialize)]
struct AccessToken {
    id: String,
    expires: String,
}

#[derive(Debug, Deserialize)]
struct CatalogService {
    #[serde(rename = "type")]
    service_type: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    endpoints: Vec<Map<String, Value>>,
}

/// Authentication request for `credentials`. Never carries `X-Auth-Token`.
pub fn build_auth_request(credentials: &KeystoneCredentials) -> Result<KeystoneRequest> {
    let body = AuthRequest {
        auth: AuthBody {
            password_credentials: PasswordCredentials {
                username: &credentials.username,
                password: &credentials.password,
            },
            tenant_name: credentials.tenant_name.as_deref().filter(|t| !t.is_empty()),
        },
    };

    Ok(KeystoneRequest::new(Method::POST, credentials.token_url.as_str())
        .with_json(&body)?
        .without_header(X_AUTH_TOKEN))
}

/// Build a token from an identity service response body.
pub fn parse_auth_response(body: &[u8]) -> Result<Token> {
    let response: AuthResponse = serde_json::from_slice(body)
        .map_err(|e| KeystoneError::Authentication(format!("malformed token response: {}", e)))?;

    let access = response.access;
    let expires_at = parse_expiration(&access.token.expires).ok_or_else(|| {
        KeystoneError::Authentication(format!("invalid token expiration '{}'", access.token.expires))
    })?;

    let catalog: ServiceCatalog = access
        .service_catalog
        .into_iter()
        .filter_map(|service| {
            let Some(endpoint) = service.endpoints.into_iter().next() else {
                debug!("service '{}' has no endpoints, skipped", service.service_type);
                return None;
            };
            let endpoint: BTreeMap<String, String> = endpoint
                .into_iter()
                .filter_map(|(k, v)| v.as_str().map(|v| (k, v.to_owned())))
                .collect();
            Some(CatalogEntry::new(service.service_type, service.name, endpoint))
        })
        .collect();

    Ok(Token::new(access.token.id, expires_at, catalog))
}

/// Password authentication against the client's token endpoint.
pub async fn authenticate(transport: &dyn Transport, credentials: &KeystoneCredentials) -> Result<Token> {
    let metrics = get_metrics().await;
    let start = get_instant();

    let result = exchange(transport, credentials).await;
    let outcome = if result.is_ok() { SUCCESS_MSG } else { ERROR_MSG };
    metrics.auth_exchanges.with_label_values(&[outcome]).inc();
    metrics.auth_exchange_duration.with_label_values(&[outcome]).observe(start.elapsed().as_secs_f64());

    match &result {
        Ok(token) => info!(
            token = %mask_secret(token.id()),
            expires_at = %token.expires_at(),
            "authenticated '{}' against '{}'", credentials.username, credentials.token_url
        ),
        Err(err) => error!("authentication of '{}' against '{}' failed: {}", credentials.username, credentials.token_url, err),
    }
    result
}

async fn exchange(transport: &dyn Transport, credentials: &KeystoneCredentials) -> Result<Token> {
    let request = build_auth_request(credentials)?;
    let response = transport
        .send(&request)
        .await
        .map_err(|e| KeystoneError::Authentication(e.to_string()))?;

    if !response.status().is_success() {
        return Err(KeystoneError::Authentication(format!(
            "token request failed: {}",
            response.status()
        )));
    }
    parse_auth_response(response.body())
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    fn credentials(tenant_name: Option<&str>) -> KeystoneCredentials {
        KeystoneCredentials {
            token_url: "http://keystone/v2.0/tokens".to_owned(),
            username: "u".to_owned(),
            password: "p".to_owned(),
            tenant_name: tenant_name.map(str::to_owned),
        }
    }

    #[test]
    fn auth_request_body_follows_password_credentials_contract() {
        let request = build_auth_request(&credentials(Some("demo"))).unwrap();
        assert_eq!(*request.method(), Method::POST);
        assert_eq!(request.url(), "http://keystone/v2.0/tokens");
        assert!(request.header(X_AUTH_TOKEN).is_none());
        assert_eq!(request.header("content-type"), Some("application/json"));

        let body: Value = serde_json::from_slice(request.body().unwrap()).unwrap();
        assert_eq!(
            body,
            json!({"auth": {"passwordCredentials": {"username": "u", "password": "p"}, "tenantName": "demo"}})
        );

        let request = build_auth_request(&credentials(None)).unwrap();
        let body: Value = serde_json::from_slice(request.body().unwrap()).unwrap();
        assert!(body["auth"].get("tenantName").is_none());
    }

    #[test]
    fn parses_token_and_first_endpoint_of_each_service() {
        let body = json!({
            "access": {
                "token": {"id": "abc123", "expires": "2030-01-01T00:00:00Z"},
                "serviceCatalog": [
                    {"type": "compute", "name": "nova", "endpoints": [
                        {"publicURL": "http://svc/v1/", "region": "one", "id": 7},
                        {"publicURL": "http://other/v1"}
                    ]},
                    {"type": "image", "name": "glance", "endpoints": []}
                ]
            }
        });
        let token = parse_auth_response(body.to_string().as_bytes()).unwrap();

        assert_eq!(token.id(), "abc123");
        assert_eq!(token.catalog().entries().len(), 1);
        let entry = token.service_catalog_entry("compute", None).unwrap();
        assert_eq!(entry.endpoint_value("region"), Some("one"));
        assert_eq!(entry.endpoint_value("id"), None);
        assert_eq!(token.public_url("compute", Some("nova")).unwrap(), "http://svc/v1");
    }

    #[test]
    fn malformed_bodies_are_authentication_errors() {
        for body in [
            "not json".to_owned(),
            json!({"access": {}}).to_string(),
            json!({"access": {"token": {"id": "x", "expires": "soon"}}}).to_string(),
        ] {
            let err = parse_auth_response(body.as_bytes()).unwrap_err();
            assert!(matches!(err, KeystoneError::Authentication(_)), "{err}");
        }
    }
}
