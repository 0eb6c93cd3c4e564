use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{KeystoneError, Result};
use crate::helpers::time::mask_secret;
use crate::token::catalog::{CatalogEntry, ServiceCatalog};

/// Keystone token: bearer id, expiration and the service catalog issued with it.
///
/// Immutable once built. A client replaces its token rather than mutating it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    id: String,
    expires_at: DateTime<Utc>,
    catalog: ServiceCatalog,
}

impl Token {
    pub fn new(id: String, expires_at: DateTime<Utc>, catalog: ServiceCatalog) -> Self {
        Self { id, expires_at, catalog }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn catalog(&self) -> &ServiceCatalog {
        &self.catalog
    }

    /// A token is expired from its expiration instant on (inclusive).
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn is_expired_now(&self) -> bool {
        self.is_expired(Utc::now())
    }

    /// Whole seconds left before expiration, 0 once expired.
    pub fn seconds_until_expiry(&self, now: DateTime<Utc>) -> u64 {
        (self.expires_at - now).num_seconds().max(0) as u64
    }

    /// First catalog entry of `service_type`, or of `service_type` + `service_name`.
    pub fn service_catalog_entry(
        &self,
        service_type: &str,
        service_name: Option<&str>,
    ) -> Result<&CatalogEntry> {
        self.catalog
            .find(service_type, service_name)
            .ok_or_else(|| catalog_lookup_error(service_type, service_name))
    }

    /// Public URL of the matching catalog entry without trailing separators.
    pub fn public_url(&self, service_type: &str, service_name: Option<&str>) -> Result<String> {
        self.service_catalog_entry(service_type, service_name)?
            .public_url()
            .map(|url| url.trim_end_matches('/').to_owned())
            .ok_or_else(|| catalog_lookup_error(service_type, service_name))
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("id", &mask_secret(&self.id))
            .field("expires_at", &self.expires_at)
            .field("catalog", &self.catalog)
            .finish()
    }
}

fn catalog_lookup_error(service_type: &str, service_name: Option<&str>) -> KeystoneError {
    KeystoneError::CatalogLookup {
        service_type: service_type.to_owned(),
        service_name: service_name.map(str::to_owned),
    }
}
