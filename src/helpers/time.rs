use chrono::{DateTime, NaiveDateTime, Utc};
use std::time::Instant;

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

pub fn get_instant() -> Instant {
    Instant::now()
}

/// Parse a Keystone `expires` value: RFC 3339, or a naive ISO-8601
/// timestamp which is taken as UTC.
pub fn parse_expiration(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

/// Keep the first 4 characters of a secret for log correlation.
pub fn mask_secret(value: &str) -> String {
    let prefix: String = value.chars().take(4).collect();
    if prefix.len() == value.len() {
        "****".to_owned()
    } else {
        format!("{}****", prefix)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_rfc3339_and_naive_expirations() {
        let expected = Utc.with_ymd_and_hms(2013, 2, 27, 18, 30, 59).unwrap();
        assert_eq!(parse_expiration("2013-02-27T18:30:59Z"), Some(expected));
        assert_eq!(parse_expiration("2013-02-27T19:30:59+01:00"), Some(expected));
        assert_eq!(parse_expiration("2013-02-27T18:30:59"), Some(expected));
        assert!(parse_expiration("2013-02-27T18:30:59.999999Z").is_some());
        assert!(parse_expiration("tomorrow").is_none());
    }

    #[test]
    fn masks_secrets() {
        assert_eq!(mask_secret("abc123"), "abc1****");
        assert_eq!(mask_secret("abc"), "****");
    }
}
