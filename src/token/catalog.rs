use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::utils::constants::PUBLIC_URL_KEY;

/// One service of the catalog: its type, name and first endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    #[serde(rename = "type")]
    pub service_type: String,
    pub name: String,
    /// endpoint attributes as issued (publicURL, internalURL, region, ...)
    pub endpoint: BTreeMap<String, String>,
}

impl CatalogEntry {
    pub fn new(service_type: String, name: String, endpoint: BTreeMap<String, String>) -> Self {
        Self { service_type, name, endpoint }
    }

    /// Endpoint attribute, key compared case-insensitively.
    pub fn endpoint_value(&self, key: &str) -> Option<&str> {
        self.endpoint
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn public_url(&self) -> Option<&str> {
        self.endpoint_value(PUBLIC_URL_KEY)
    }

    fn matches(&self, service_type: &str, service_name: Option<&str>) -> bool {
        self.service_type == service_type
            && service_name.map(|name| self.name == name).unwrap_or(true)
    }
}

/// Ordered service catalog issued with a token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceCatalog {
    entries: Vec<CatalogEntry>,
}

impl ServiceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: CatalogEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First entry of `service_type`, restricted to `service_name` when given.
    pub fn find(&self, service_type: &str, service_name: Option<&str>) -> Option<&CatalogEntry> {
        self.entries
            .iter()
            .find(|entry| entry.matches(service_type, service_name))
    }
}

impl FromIterator<CatalogEntry> for ServiceCatalog {
    fn from_iter<I: IntoIterator<Item = CatalogEntry>>(iter: I) -> Self {
        Self { entries: iter.into_iter().collect() }
    }
}
