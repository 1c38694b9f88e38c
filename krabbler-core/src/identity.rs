use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Stable lookup key for a crawl target.
///
/// Hex-encoded SHA-256 of the canonical token, so the key only depends on
/// the server a URL points at, not on how the URL was spelled.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServerId(String);

impl ServerId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of a crawl target server, derived once from a raw URL and
/// immutable afterwards.
///
/// URLs that differ only by a leading `https:`, letter case, or `/`
/// characters derive the same [`ServerId`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServerIdentity {
    /// The URL exactly as it was handed in.
    pub raw_url: String,
    /// `raw_url` without the `https:` prefix, lower-cased, slashes removed.
    pub normalized_url: String,
    /// `normalized_url` reduced to `[a-z0-9]`; the hash input.
    pub canonical_token: String,
    /// Hex SHA-256 of `canonical_token`.
    pub id: ServerId,
}

impl ServerIdentity {
    /// Derives the canonical identity for a raw server URL.
    ///
    /// Pure string transforms, so this cannot fail. An empty input yields
    /// the identity of the empty canonical token, which is a valid,
    /// distinct entry.
    pub fn derive(raw_url: &str) -> Self {
        let stripped = raw_url.strip_prefix("https:").unwrap_or(raw_url);
        let normalized_url: String = stripped
            .chars()
            .map(|c| c.to_ascii_lowercase())
            .filter(|c| *c != '/')
            .collect();
        let canonical_token: String = normalized_url
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();
        let digest = Sha256::digest(canonical_token.as_bytes());

        ServerIdentity {
            raw_url: raw_url.to_string(),
            normalized_url,
            canonical_token,
            id: ServerId(hex::encode(digest)),
        }
    }
}
