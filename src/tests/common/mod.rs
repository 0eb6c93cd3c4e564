// tests/common/mod.rs
pub use axum::Router;
pub use serde_json::json;
pub use tokio::task::JoinHandle;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use http::{HeaderMap, StatusCode};
use serde_json::Value;
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::Mutex;

use crate::cache::store::CacheStore;
use crate::client::request::{KeystoneRequest, KeystoneResponse};
use crate::client::transport::Transport;
use crate::error::{KeystoneError, Result};

/// Spawn an Axum router on an ephemeral port and return (JoinHandle, SocketAddr)
pub async fn spawn_axum(router: Router) -> (JoinHandle<()>, SocketAddr) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind failed");
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server failed");
    });
    (handle, addr)
}

/// Identity v2 token response with a single-endpoint catalog.
pub fn token_body(id: &str, expires_in_secs: i64, services: &[(&str, &str, &str)]) -> Value {
    let expires = (Utc::now() + Duration::seconds(expires_in_secs)).to_rfc3339();
    let catalog: Vec<Value> = services
        .iter()
        .map(|(service_type, name, public_url)| {
            json!({
                "type": service_type,
                "name": name,
                "endpoints": [{"publicURL": public_url, "region": "RegionOne"}]
            })
        })
        .collect();
    json!({"access": {"token": {"id": id, "expires": expires}, "serviceCatalog": catalog}})
}

pub fn json_response(status: StatusCode, body: &Value) -> KeystoneResponse {
    KeystoneResponse::new(status, HeaderMap::new(), body.to_string().into_bytes())
}

pub fn status_response(status: StatusCode) -> KeystoneResponse {
    KeystoneResponse::new(status, HeaderMap::new(), Vec::new())
}

/// Transport replaying queued responses: token endpoint requests and
/// service requests each have their own queue. Every sent request is recorded.
pub struct ScriptedTransport {
    token_url: String,
    token_responses: Mutex<VecDeque<KeystoneResponse>>,
    service_responses: Mutex<VecDeque<KeystoneResponse>>,
    sent: Mutex<Vec<KeystoneRequest>>,
}

impl ScriptedTransport {
    pub fn new(token_url: &str) -> Self {
        Self {
            token_url: token_url.to_owned(),
            token_responses: Mutex::new(VecDeque::new()),
            service_responses: Mutex::new(VecDeque::new()),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn push_token(&self, response: KeystoneResponse) {
        self.token_responses.lock().unwrap().push_back(response);
    }

    pub fn push_service(&self, response: KeystoneResponse) {
        self.service_responses.lock().unwrap().push_back(response);
    }

    pub fn sent(&self) -> Vec<KeystoneRequest> {
        self.sent.lock().unwrap().clone()
    }

    pub fn token_requests(&self) -> usize {
        self.sent().iter().filter(|r| r.url() == self.token_url).count()
    }

    pub fn service_requests(&self) -> Vec<KeystoneRequest> {
        self.sent().into_iter().filter(|r| r.url() != self.token_url).collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: &KeystoneRequest) -> Result<KeystoneResponse> {
        self.sent.lock().unwrap().push(request.clone());
        let queue = if request.url() == self.token_url {
            &self.token_responses
        } else {
            &self.service_responses
        };
        queue
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| KeystoneError::Transport(format!("no scripted response for {}", request.url())))
    }
}

/// Store whose every operation fails.
pub struct FailingStore;

#[async_trait]
impl CacheStore for FailingStore {
    async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>> {
        Err(KeystoneError::Cache("store unavailable".to_owned()))
    }

    async fn set(&self, _key: &str, _value: Vec<u8>, _ttl_seconds: u64) -> Result<()> {
        Err(KeystoneError::Cache("store unavailable".to_owned()))
    }
}
