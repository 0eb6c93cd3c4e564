//! # Keystone Client Library
//!
//! HTTP client augmentation that authenticates transparently against a
//! Keystone identity service: obtains a token, injects it into outgoing
//! requests, resolves the service base URL from the token's catalog,
//! caches tokens per token endpoint and re-authenticates once when a
//! request is rejected with 401/403.
//!
//! Modules:
//! - `token`: token value object and service catalog
//! - `cache`: cache store contract, in-memory store and token cache
//! - `client`: requests, responses, transport and the authenticated client
//! - `manager`: token manager, client factory and the authentication exchange
//! - `resilience`: auth failure retry policy
//! - `config`: YAML configuration for the binary

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod helpers;
pub mod manager;
pub mod observability;
pub mod resilience;
pub mod token;
pub mod utils;

#[cfg(test)]
mod tests;

pub use crate::cache::{store::{CacheStore, MemoryCache}, token_cache::TokenCache};
pub use crate::client::{
    authenticated::{AuthFailureHandler, AuthenticatedClient, KeystoneCredentials, Session, TokenResolver},
    request::{KeystoneRequest, KeystoneResponse},
    transport::{ReqwestTransport, Transport},
};
pub use crate::error::{KeystoneError, Result};
pub use crate::manager::token_manager::{ClientBuilder, TokenManager};
pub use crate::token::{catalog::{CatalogEntry, ServiceCatalog}, token::Token};
