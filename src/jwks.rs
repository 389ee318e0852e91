//! JWKS retrieval backed by a single key-value cache blob.
//!
//! The blob is `{"timestamp": "<RFC 3339 UTC>", "jwks": [<JWK>, ...]}` under
//! one configured key. It is read whole and replaced whole; concurrent
//! refreshes simply race to write equivalent content.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};
use std::sync::Arc;
use time::format_description::well_known::{Iso8601, Rfc3339};
use time::{Duration, OffsetDateTime, PrimitiveDateTime};

use crate::clock::Clock;
use crate::error::SignatureValidationError;
use crate::http::HttpGet;
use crate::store::KvStore;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Jwk {
    #[serde(default)]
    pub kid: Option<String>,
    #[serde(default)]
    pub kty: String,
    #[serde(default)]
    pub alg: String,
    #[serde(default, rename = "use", skip_serializing_if = "Option::is_none")]
    pub use_: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crv: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub e: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Json>,
}

impl Jwk {
    /// Absent `use` counts as signing use.
    pub fn is_for_signature(&self) -> bool {
        self.use_.as_deref().map_or(true, |u| u == "sig")
    }

    fn has_kid(&self, kid: &str) -> bool {
        self.kid.as_deref() == Some(kid)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Jwks {
    pub keys: Vec<Jwk>,
}

/// The cached blob. `timestamp` is written as RFC 3339 UTC; on read, an
/// ISO 8601 date-time without an offset is also accepted and taken as UTC.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwksCacheEntry {
    pub timestamp: String,
    pub jwks: Vec<Jwk>,
}

impl JwksCacheEntry {
    fn fetched_at(&self) -> Option<OffsetDateTime> {
        OffsetDateTime::parse(&self.timestamp, &Rfc3339)
            .or_else(|_| PrimitiveDateTime::parse(&self.timestamp, &Iso8601::DEFAULT).map(PrimitiveDateTime::assume_utc))
            .ok()
    }
}

/// Resolves a `kid` to a public JWK, refreshing the cached JWKS when needed.
pub struct JwksCache {
    jwks_url: String,
    cache_key: String,
    ttl: Duration,
    store: Arc<dyn KvStore>,
    http: Arc<dyn HttpGet>,
    clock: Arc<dyn Clock>,
}

impl JwksCache {
    pub fn new(
        jwks_url: &str,
        cache_key: &str,
        ttl: std::time::Duration,
        store: Arc<dyn KvStore>,
        http: Arc<dyn HttpGet>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            jwks_url: jwks_url.to_string(),
            cache_key: cache_key.to_string(),
            ttl: Duration::try_from(ttl).unwrap_or(Duration::MAX),
            store,
            http,
            clock,
        }
    }

    /// Cached keys are trusted as-is, except that one whose `use` is not
    /// `sig` is treated as stale. Freshly fetched keys get the `use` check.
    /// Among duplicate `kid`s the first one wins.
    #[tracing::instrument(skip(self))]
    pub fn get_jwk_by_kid(&self, kid: &str) -> Result<Jwk, SignatureValidationError> {
        if let Some(jwk) = self.get_fresh(kid) {
            tracing::debug!(kid, "jwks cache hit");
            return Ok(jwk);
        }
        tracing::debug!(kid, "jwks cache miss");

        let keys = self.refresh()?;
        let jwk = keys
            .into_iter()
            .find(|k| k.has_kid(kid))
            .ok_or_else(|| SignatureValidationError::KidNotFound(kid.to_string()))?;
        if !jwk.is_for_signature() {
            return Err(SignatureValidationError::NotForSignature(kid.to_string()));
        }
        Ok(jwk)
    }

    fn get_fresh(&self, kid: &str) -> Option<Jwk> {
        let raw = self.store.get_str(&self.cache_key)?;
        let entry: JwksCacheEntry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!(error = %err, "unreadable jwks cache blob, refreshing");
                return None;
            }
        };
        let Some(fetched_at) = entry.fetched_at() else {
            tracing::warn!(timestamp = %entry.timestamp, "bad jwks cache timestamp, refreshing");
            return None;
        };
        if self.clock.now() - fetched_at > self.ttl {
            tracing::debug!(timestamp = %entry.timestamp, "jwks cache expired");
            return None;
        }
        entry
            .jwks
            .into_iter()
            .find(|k| k.has_kid(kid))
            .filter(Jwk::is_for_signature)
    }

    /// Single GET, then one whole-blob write.
    fn refresh(&self) -> Result<Vec<Jwk>, SignatureValidationError> {
        let body = self.http.get(&self.jwks_url)?;
        let jwks: Jwks = serde_json::from_str(&body).map_err(|_| SignatureValidationError::JwksJson)?;

        tracing::info!(url = %self.jwks_url, keys = jwks.keys.len(), "refreshed jwks");

        // A blob we cannot timestamp is not written; the keys are still usable.
        let timestamp = match self.clock.now().format(&Rfc3339) {
            Ok(ts) => ts,
            Err(err) => {
                tracing::warn!(error = %err, "could not timestamp jwks cache blob, not caching");
                return Ok(jwks.keys);
            }
        };
        let entry = JwksCacheEntry { timestamp, jwks: jwks.keys };
        match serde_json::to_string(&entry) {
            Ok(blob) => self.store.set_str(&self.cache_key, blob),
            Err(err) => tracing::warn!(error = %err, "could not serialize jwks cache blob"),
        }
        Ok(entry.jwks)
    }
}
