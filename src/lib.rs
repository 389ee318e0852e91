#![forbid(unsafe_code)]

//! Detached-JWS signature validation for payment-terminal webhooks.
//!
//! A callback carries `Signature: <protected>..<signature>`; the body is the
//! payload. [`WebhookVerifier`] resolves the signing key from a JWKS endpoint
//! (cached in a [`KvStore`]), verifies ES256 or RS256 over
//! `<protected>.<b64url(body)>`, then enforces the critical protected-header
//! claims. Per request, call [`WebhookVerifier::validator`] and then
//! [`SignatureValidator::verify_signature`].

mod claims;
mod clock;
mod config;
mod error;
mod http;
mod jwks;
mod jws;
mod request;
mod store;
mod validator;
mod verify;

#[cfg(test)]
mod testutil;

pub use claims::{format_iat, validate_critical_headers, ClaimContext};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ConfigError, ValidatorConfig, DEFAULT_CACHE_KEY, DEFAULT_CACHE_TTL_SECS, DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_MAX_SKEW_SECS, REQUIRED_CRIT};
pub use error::{NameList, NameSet, SignatureValidationError};
pub use http::{HttpGet, UreqHttp};
pub use jwks::{Jwk, Jwks, JwksCache, JwksCacheEntry};
pub use jws::{DetachedJws, SIGNATURE_HEADER};
pub use request::WebhookRequest;
pub use store::{KvStore, MemoryStore};
pub use validator::{SignatureValidator, WebhookVerifier};
pub use verify::verify_jws_signature;
