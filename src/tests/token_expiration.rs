#[cfg(test)]
mod test {
    use chrono::{Duration, TimeZone, Utc};
    use std::collections::BTreeMap;

    use crate::error::KeystoneError;
    use crate::token::catalog::{CatalogEntry, ServiceCatalog};
    use crate::token::token::Token;

    fn entry(service_type: &str, name: &str, key: &str, url: &str) -> CatalogEntry {
        let mut endpoint = BTreeMap::new();
        endpoint.insert(key.to_owned(), url.to_owned());
        CatalogEntry::new(service_type.to_owned(), name.to_owned(), endpoint)
    }

    fn catalog() -> ServiceCatalog {
        [
            entry("compute", "nova", "publicURL", "http://nova/v2/"),
            entry("compute", "nova-legacy", "publicurl", "http://legacy/v1"),
            entry("object-store", "swift", "PUBLICURL", "http://swift/v1//"),
            entry("image", "glance", "internalURL", "http://glance-internal/v2"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn expired_from_the_expiration_instant_on() {
        let expires_at = Utc.with_ymd_and_hms(2030, 1, 1, 12, 0, 0).unwrap();
        let token = Token::new("abc123".to_owned(), expires_at, ServiceCatalog::new());

        assert!(!token.is_expired(expires_at - Duration::milliseconds(1)));
        assert!(token.is_expired(expires_at));
        assert!(token.is_expired(expires_at + Duration::seconds(1)));

        assert_eq!(token.seconds_until_expiry(expires_at - Duration::seconds(3600)), 3600);
        assert_eq!(token.seconds_until_expiry(expires_at + Duration::seconds(5)), 0);
    }

    #[test]
    fn fresh_token_is_not_expired_now() {
        let token = Token::new("abc123".to_owned(), Utc::now() + Duration::hours(1), catalog());
        assert!(!token.is_expired_now());
        let token = Token::new("abc123".to_owned(), Utc::now() - Duration::seconds(1), catalog());
        assert!(token.is_expired_now());
    }

    #[test]
    fn catalog_lookup_by_type_returns_first_match() {
        let token = Token::new("abc123".to_owned(), Utc::now() + Duration::hours(1), catalog());

        assert_eq!(token.service_catalog_entry("compute", None).unwrap().name, "nova");
        assert_eq!(token.service_catalog_entry("compute", Some("nova-legacy")).unwrap().name, "nova-legacy");
        assert_eq!(token.public_url("compute", None).unwrap(), "http://nova/v2");
        assert_eq!(token.public_url("compute", Some("nova-legacy")).unwrap(), "http://legacy/v1");
        assert_eq!(token.public_url("object-store", None).unwrap(), "http://swift/v1");
    }

    #[test]
    fn catalog_lookup_failures() {
        let token = Token::new("abc123".to_owned(), Utc::now() + Duration::hours(1), catalog());

        let err = token.service_catalog_entry("volume", None).unwrap_err();
        assert!(matches!(err, KeystoneError::CatalogLookup { ref service_type, service_name: None } if service_type == "volume"));

        let err = token.service_catalog_entry("compute", Some("missing")).unwrap_err();
        assert!(matches!(err, KeystoneError::CatalogLookup { service_name: Some(ref name), .. } if name == "missing"));

        // entry exists but has no public URL
        assert!(token.service_catalog_entry("image", None).is_ok());
        assert!(matches!(token.public_url("image", None), Err(KeystoneError::CatalogLookup { .. })));
    }

    #[test]
    fn serialized_token_keeps_id_expiration_and_catalog() {
        let token = Token::new("abc123".to_owned(), Utc::now() + Duration::hours(1), catalog());
        let restored: Token = serde_json::from_slice(&serde_json::to_vec(&token).unwrap()).unwrap();
        assert_eq!(restored, token);
    }

    #[test]
    fn debug_output_masks_token_id() {
        let token = Token::new("abc123456".to_owned(), Utc::now(), ServiceCatalog::new());
        let debug = format!("{:?}", token);
        assert!(debug.contains("abc1****"));
        assert!(!debug.contains("abc123456"));
    }
}
