use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use tracing::debug;

/// Unifies the two content namespaces (slug, absolute URL) into one string
/// identity. Slug wins when both are present.
pub fn content_key(slug: Option<&str>, url: Option<&str>) -> Option<String> {
    let pick = |s: Option<&str>| {
        s.map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    pick(slug).or_else(|| pick(url))
}

/// One-way hash of the client IP. The raw IP must never reach the store or
/// the logs, so the hash is taken before anything else touches the value.
pub fn hash_ip(ip: &str) -> String {
    let digest = Sha256::digest(ip.as_bytes());

    digest[..8].iter().map(|b| format!("{b:02x}")).collect()
}

/// Client-supplied ISO-8601 timestamp, or now if missing/unparsable.
pub fn event_timestamp(raw: Option<&str>) -> DateTime<Utc> {
    match raw {
        Some(s) => DateTime::parse_from_rfc3339(s)
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or_else(|_| {
                debug!("Unparsable timestamp {s:?}, using server time");
                Utc::now()
            }),
        None => Utc::now(),
    }
}
