use base64::{engine::general_purpose::URL_SAFE_NO_PAD as B64URL, Engine as _};
use p256::ecdsa::{signature::Signer, Signature, SigningKey};
use pos_webhook_sig::{format_iat, FixedClock, HttpGet, MemoryStore, SignatureValidationError, ValidatorConfig, WebhookRequest, WebhookVerifier};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use serde_json::json;
use std::sync::Arc;
use time::OffsetDateTime;

/// Serves a fixed JWKS document instead of going to the network.
struct StaticJwks(String);

impl HttpGet for StaticJwks {
    fn get(&self, _url: &str) -> Result<String, SignatureValidationError> {
        Ok(self.0.clone())
    }
}

fn main() -> anyhow::Result<()> {
    let mut rng = ChaCha20Rng::seed_from_u64(7);
    let sk = SigningKey::random(&mut rng);
    let point = sk.verifying_key().to_encoded_point(false);
    let x = point.x().map(|x| B64URL.encode(x)).unwrap_or_default();
    let y = point.y().map(|y| B64URL.encode(y)).unwrap_or_default();
    let jwks = json!({"keys": [{"kty":"EC","alg":"ES256","use":"sig","crv":"P-256","kid":"demo","x":x,"y":y}]});

    let url = "https://shop.example/pos/webhook";
    let now = OffsetDateTime::now_utc();
    let header = json!({
        "alg": "ES256",
        "kid": "demo",
        "crit": ["iss", "iat", "jti", "path", "sub"],
        "iss": "demo-issuer",
        "iat": format_iat(now),
        "jti": "demo-1",
        "path": url,
        "sub": "terminal-42",
    });
    let body = br#"{"status":"SUCCEEDED"}"#;
    let protected = B64URL.encode(serde_json::to_string(&header)?);
    let signing_input = format!("{}.{}", protected, B64URL.encode(body));
    let sig: Signature = sk.sign(signing_input.as_bytes());
    let request = WebhookRequest::new(url, body.to_vec())
        .with_header("Signature", &format!("{}..{}", protected, B64URL.encode(sig.to_bytes())));

    let config = ValidatorConfig::new("demo-issuer", "https://keys.example/jwks");
    let verifier = WebhookVerifier::with_ports(
        config,
        Arc::new(MemoryStore::new()),
        Arc::new(StaticJwks(jwks.to_string())),
        Arc::new(FixedClock::new(now)),
    )?;

    let mut validator = verifier.validator(&request);
    validator.verify_signature()?;
    validator.verify_subject("terminal-42")?;
    println!("verified sub = {}", validator.subject().unwrap_or_default());
    Ok(())
}
