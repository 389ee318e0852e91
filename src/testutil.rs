//! Shared fixtures for the unit tests: key pairs, signers, a fake HTTP port
//! and a log-capturing subscriber.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD as B64URL, Engine as _};
use once_cell::sync::Lazy;
use p256::ecdsa::{signature::Signer as _, Signature as EcSignature, SigningKey as EcSigningKey};
use parking_lot::Mutex;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use rsa::pkcs1v15::SigningKey as RsaSigningKey;
use rsa::signature::SignatureEncoding as _;
use rsa::traits::PublicKeyParts as _;
use rsa::RsaPrivateKey;
use serde_json::{json, Value as Json};
use sha2::Sha256;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::error::SignatureValidationError;
use crate::http::HttpGet;
use crate::jwks::Jwk;

static RSA_KEY: Lazy<RsaPrivateKey> = Lazy::new(|| {
    let mut rng = ChaCha20Rng::seed_from_u64(2048);
    RsaPrivateKey::new(&mut rng, 2048).unwrap()
});

/// A JWK-shaped value with placeholder coordinates, for cache bookkeeping tests.
pub fn ec_jwk(kid: &str) -> Json {
    json!({"kty":"EC","alg":"ES256","use":"sig","crv":"P-256","kid":kid,"x":"xx","y":"yy"})
}

pub fn ec_keypair(kid: &str) -> (EcSigningKey, Jwk) {
    let mut rng = ChaCha20Rng::seed_from_u64(42);
    let sk = EcSigningKey::random(&mut rng);
    let point = sk.verifying_key().to_encoded_point(false);
    let jwk = json!({
        "kty": "EC",
        "alg": "ES256",
        "use": "sig",
        "crv": "P-256",
        "kid": kid,
        "x": B64URL.encode(point.x().unwrap()),
        "y": B64URL.encode(point.y().unwrap()),
    });
    (sk, serde_json::from_value(jwk).unwrap())
}

pub fn rsa_keypair(kid: &str) -> (&'static RsaPrivateKey, Jwk) {
    let pk = RSA_KEY.to_public_key();
    let jwk = json!({
        "kty": "RSA",
        "alg": "RS256",
        "use": "sig",
        "kid": kid,
        "n": B64URL.encode(pk.n().to_bytes_be()),
        "e": B64URL.encode(pk.e().to_bytes_be()),
    });
    (&RSA_KEY, serde_json::from_value(jwk).unwrap())
}

pub fn sign_es256(sk: &EcSigningKey, signing_input: &str) -> String {
    let sig: EcSignature = sk.sign(signing_input.as_bytes());
    B64URL.encode(sig.to_bytes())
}

pub fn sign_rs256(sk: &RsaPrivateKey, signing_input: &str) -> String {
    let signer = RsaSigningKey::<Sha256>::new(sk.clone());
    B64URL.encode(signer.sign(signing_input.as_bytes()).to_bytes())
}

/// Canned JWKS endpoint that counts how often it is hit.
pub struct FakeHttp {
    response: Result<String, String>,
    calls: AtomicUsize,
}

impl FakeHttp {
    pub fn ok(body: Json) -> Self {
        Self { response: Ok(body.to_string()), calls: AtomicUsize::new(0) }
    }

    pub fn failing(reason: &str) -> Self {
        Self { response: Err(reason.to_string()), calls: AtomicUsize::new(0) }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl HttpGet for FakeHttp {
    fn get(&self, _url: &str) -> Result<String, SignatureValidationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.response.clone().map_err(SignatureValidationError::JwksHttp)
    }
}

/// Records `(level, message)` for every event emitted while installed.
#[derive(Clone, Default)]
pub struct LogCapture {
    events: Arc<Mutex<Vec<(tracing::Level, String)>>>,
}

impl LogCapture {
    pub fn warnings(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter(|(level, _)| *level == tracing::Level::WARN)
            .map(|(_, msg)| msg.clone())
            .collect()
    }
}

struct MessageVisitor(String);

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        let part = if field.name() == "message" {
            format!("{:?}", value)
        } else {
            format!("{}={:?}", field.name(), value)
        };
        if !self.0.is_empty() {
            self.0.push(' ');
        }
        self.0.push_str(&part);
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for LogCapture {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = MessageVisitor(String::new());
        event.record(&mut visitor);
        self.events.lock().push((*event.metadata().level(), visitor.0));
    }
}
