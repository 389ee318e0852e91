use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Claims every protected header must list in `crit`, in check order.
pub const REQUIRED_CRIT: [&str; 5] = ["iss", "iat", "jti", "path", "sub"];

pub const DEFAULT_MAX_SKEW_SECS: u64 = 300;
pub const DEFAULT_CACHE_TTL_SECS: u64 = 12 * 60 * 60;
pub const DEFAULT_CACHE_KEY: &str = "pos_webhook_sig.jwks_cache";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// Knobs for webhook signature validation.
///
/// `cache_ttl_secs` defaults to 12 hours: a six hour old JWKS blob is served
/// from cache, a day old one is refetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorConfig {
    pub issuer: String,
    pub jwks_url: String,
    #[serde(default = "default_max_skew")]
    pub max_skew_secs: u64,
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_cache_key")]
    pub cache_key: String,
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,
    #[serde(default)]
    pub test_mode: bool,
}

fn default_max_skew() -> u64 { DEFAULT_MAX_SKEW_SECS }
fn default_cache_ttl() -> u64 { DEFAULT_CACHE_TTL_SECS }
fn default_cache_key() -> String { DEFAULT_CACHE_KEY.to_string() }
fn default_http_timeout() -> u64 { DEFAULT_HTTP_TIMEOUT_SECS }

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("issuer must not be empty")]
    EmptyIssuer,
    #[error("cache TTL must be positive")]
    ZeroTtl,
    #[error("JWKS URL must use https: {0}")]
    InsecureJwksUrl(String),
    #[error("cache key must not be empty")]
    EmptyCacheKey,
}

impl ValidatorConfig {
    /// Issuer and JWKS endpoint have no sensible default; everything else does.
    pub fn new(issuer: &str, jwks_url: &str) -> Self {
        Self {
            issuer: issuer.to_string(),
            jwks_url: jwks_url.to_string(),
            max_skew_secs: DEFAULT_MAX_SKEW_SECS,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            cache_key: DEFAULT_CACHE_KEY.to_string(),
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            test_mode: false,
        }
    }

    pub fn with_issuer(mut self, iss: &str) -> Self { self.issuer = iss.to_string(); self }
    pub fn with_max_skew(mut self, secs: u64) -> Self { self.max_skew_secs = secs; self }
    pub fn with_cache_ttl(mut self, secs: u64) -> Self { self.cache_ttl_secs = secs; self }
    pub fn with_jwks_url(mut self, url: &str) -> Self { self.jwks_url = url.to_string(); self }
    pub fn with_cache_key(mut self, key: &str) -> Self { self.cache_key = key.to_string(); self }
    pub fn with_http_timeout(mut self, secs: u64) -> Self { self.http_timeout_secs = secs; self }
    pub fn with_test_mode(mut self, on: bool) -> Self { self.test_mode = on; self }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Reject settings that would make every request fail or weaken key retrieval.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.issuer.is_empty() {
            return Err(ConfigError::EmptyIssuer);
        }
        if self.cache_ttl_secs == 0 {
            return Err(ConfigError::ZeroTtl);
        }
        if !self.jwks_url.starts_with("https://") {
            return Err(ConfigError::InsecureJwksUrl(self.jwks_url.clone()));
        }
        if self.cache_key.is_empty() {
            return Err(ConfigError::EmptyCacheKey);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> ValidatorConfig {
        ValidatorConfig::new("https://issuer.example", "https://keys.example/jwks")
    }

    #[test]
    fn new_config_is_valid() {
        let cfg = base();
        assert_eq!(cfg.validate(), Ok(()));
        assert_eq!(cfg.cache_ttl(), Duration::from_secs(43_200));
        assert!(!cfg.test_mode);
    }

    #[test]
    fn rejects_plain_http_jwks_url() {
        let cfg = base().with_jwks_url("http://jwks.example.com");
        assert_eq!(cfg.validate(), Err(ConfigError::InsecureJwksUrl("http://jwks.example.com".into())));
    }

    #[test]
    fn rejects_zero_ttl_and_empty_fields() {
        assert_eq!(base().with_cache_ttl(0).validate(), Err(ConfigError::ZeroTtl));
        assert_eq!(base().with_issuer("").validate(), Err(ConfigError::EmptyIssuer));
        assert_eq!(base().with_cache_key("").validate(), Err(ConfigError::EmptyCacheKey));
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let cfg: ValidatorConfig = serde_json::from_str(r#"{"issuer":"acme","jwks_url":"https://keys.example/jwks","test_mode":true}"#).unwrap();
        assert_eq!(cfg.issuer, "acme");
        assert!(cfg.test_mode);
        assert_eq!(cfg.max_skew_secs, 300);
        assert_eq!(cfg.cache_key, DEFAULT_CACHE_KEY);
    }
}
