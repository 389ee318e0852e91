use std::sync::Arc;

use crate::claims::{validate_critical_headers, ClaimContext};
use crate::clock::{Clock, SystemClock};
use crate::config::{ConfigError, ValidatorConfig, DEFAULT_HTTP_TIMEOUT_SECS};
use crate::error::SignatureValidationError;
use crate::http::{HttpGet, UreqHttp};
use crate::jwks::JwksCache;
use crate::jws::{DetachedJws, SIGNATURE_HEADER};
use crate::request::WebhookRequest;
use crate::store::KvStore;
use crate::verify::verify_jws_signature;

/// Long-lived half of webhook validation: configuration plus the shared
/// JWKS cache. Cheap to share across request threads.
pub struct WebhookVerifier {
    config: ValidatorConfig,
    jwks: JwksCache,
    clock: Arc<dyn Clock>,
}

impl WebhookVerifier {
    /// Production wiring: system clock and a `ureq` agent with the configured
    /// timeout. Verifiers on the default timeout share one connection pool.
    pub fn new(config: ValidatorConfig, store: Arc<dyn KvStore>) -> Result<Self, ConfigError> {
        config.validate()?;
        let http = if config.http_timeout_secs == DEFAULT_HTTP_TIMEOUT_SECS {
            Arc::new(UreqHttp::default())
        } else {
            Arc::new(UreqHttp::new(config.http_timeout()))
        };
        Self::with_ports(config, store, http, Arc::new(SystemClock))
    }

    /// Both constructors refuse a config that [`ValidatorConfig::validate`] rejects.
    pub fn with_ports(
        config: ValidatorConfig,
        store: Arc<dyn KvStore>,
        http: Arc<dyn HttpGet>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let jwks = JwksCache::new(&config.jwks_url, &config.cache_key, config.cache_ttl(), store, http, clock.clone());
        Ok(Self { config, jwks, clock })
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    pub fn jwks(&self) -> &JwksCache {
        &self.jwks
    }

    /// Start validating one request. Test mode comes from the config.
    pub fn validator<'a>(&'a self, request: &'a WebhookRequest) -> SignatureValidator<'a> {
        SignatureValidator { verifier: self, request, subject: None, test_mode: self.config.test_mode }
    }
}

/// Per-request validator. Use once, then drop.
pub struct SignatureValidator<'a> {
    verifier: &'a WebhookVerifier,
    request: &'a WebhookRequest,
    subject: Option<String>,
    test_mode: bool,
}

impl<'a> SignatureValidator<'a> {
    pub fn with_test_mode(mut self, on: bool) -> Self {
        self.test_mode = on;
        self
    }

    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    /// Extract, fetch key, verify signature, then check critical headers.
    ///
    /// In test mode any failure is logged at warn level and `Ok(())` is returned.
    #[tracing::instrument(skip(self), fields(url = %self.request.url))]
    pub fn verify_signature(&mut self) -> Result<(), SignatureValidationError> {
        let result = self.run_checks();
        self.tolerate(result)
    }

    /// Compare the `sub` captured by [`verify_signature`](Self::verify_signature)
    /// with what the business layer expects.
    pub fn verify_subject(&self, expected: &str) -> Result<(), SignatureValidationError> {
        let actual = self.subject.as_deref().unwrap_or_default();
        let result = if actual == expected {
            Ok(())
        } else {
            Err(SignatureValidationError::Subject(actual.to_string()))
        };
        self.tolerate(result)
    }

    fn run_checks(&mut self) -> Result<(), SignatureValidationError> {
        let jws = DetachedJws::parse(self.request.header(SIGNATURE_HEADER))?;
        let jwk = self.verifier.jwks.get_jwk_by_kid(&jws.kid)?;
        verify_jws_signature(&jwk, &jws.signing_input(&self.request.data), &jws.signature_b64)?;

        let config = &self.verifier.config;
        let cx = ClaimContext {
            issuer: &config.issuer,
            max_skew_secs: config.max_skew_secs,
            request_url: &self.request.url,
            now: self.verifier.clock.now(),
        };
        self.subject = Some(validate_critical_headers(&jws.header, &cx)?);
        tracing::debug!(kid = %jws.kid, "webhook signature verified");
        Ok(())
    }

    fn tolerate(&self, result: Result<(), SignatureValidationError>) -> Result<(), SignatureValidationError> {
        match result {
            Err(err) if self.test_mode => {
                tracing::warn!(error = %err, "signature validation failed (test mode, continuing)");
                Ok(())
            }
            other => other,
        }
    }
}
