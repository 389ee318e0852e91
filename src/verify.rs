use p256::ecdsa::{signature::Verifier as _, Signature as EcSignature, VerifyingKey as EcVerifyingKey};
use p256::EncodedPoint;
use rsa::pkcs1v15::{Signature as RsaSignature, VerifyingKey as RsaVerifyingKey};
use rsa::{BigUint, RsaPublicKey};
use sha2::Sha256;

use crate::error::SignatureValidationError;
use crate::jwks::Jwk;
use crate::jws::decode_b64url;

/// Check `signature_b64` over `signing_input` with the key described by `jwk`.
/// Dispatch is on the JWK's own `alg`.
pub fn verify_jws_signature(jwk: &Jwk, signing_input: &str, signature_b64: &str) -> Result<(), SignatureValidationError> {
    match jwk.alg.as_str() {
        "ES256" => verify_es256(jwk, signing_input.as_bytes(), signature_b64),
        "RS256" => verify_rs256(jwk, signing_input.as_bytes(), signature_b64),
        other => Err(SignatureValidationError::UnsupportedAlg(other.to_string())),
    }
}

fn bad_jwk(alg: &'static str, reason: impl Into<String>) -> SignatureValidationError {
    SignatureValidationError::BadJwk { alg, reason: reason.into() }
}

fn p256_coordinate(jwk_field: Option<&str>, name: &str) -> Result<[u8; 32], SignatureValidationError> {
    let raw = jwk_field
        .and_then(decode_b64url)
        .ok_or_else(|| bad_jwk("ES256", format!("missing or undecodable '{}'", name)))?;
    raw.as_slice()
        .try_into()
        .map_err(|_| bad_jwk("ES256", format!("'{}' must be 32 bytes, got {}", name, raw.len())))
}

fn es256_key(jwk: &Jwk) -> Result<EcVerifyingKey, SignatureValidationError> {
    if jwk.crv.as_deref() != Some("P-256") {
        return Err(bad_jwk("ES256", "crv must be P-256"));
    }
    let x = p256_coordinate(jwk.x.as_deref(), "x")?;
    let y = p256_coordinate(jwk.y.as_deref(), "y")?;
    let point = EncodedPoint::from_affine_coordinates(&x.into(), &y.into(), false);
    EcVerifyingKey::from_encoded_point(&point).map_err(|_| bad_jwk("ES256", "point is not on the curve"))
}

// The wire form is fixed-width r||s (64 bytes), not DER.
fn verify_es256(jwk: &Jwk, msg: &[u8], signature_b64: &str) -> Result<(), SignatureValidationError> {
    let key = es256_key(jwk)?;
    let raw = decode_b64url(signature_b64).ok_or(SignatureValidationError::Ecdsa)?;
    if raw.len() != 64 {
        return Err(SignatureValidationError::Ecdsa);
    }
    let sig = EcSignature::from_slice(&raw).map_err(|_| SignatureValidationError::Ecdsa)?;
    key.verify(msg, &sig).map_err(|_| SignatureValidationError::Ecdsa)
}

fn rs256_key(jwk: &Jwk) -> Result<RsaPublicKey, SignatureValidationError> {
    let n = jwk
        .n
        .as_deref()
        .and_then(decode_b64url)
        .ok_or_else(|| bad_jwk("RS256", "missing or undecodable 'n'"))?;
    let e = jwk
        .e
        .as_deref()
        .and_then(decode_b64url)
        .ok_or_else(|| bad_jwk("RS256", "missing or undecodable 'e'"))?;
    RsaPublicKey::new(BigUint::from_bytes_be(&n), BigUint::from_bytes_be(&e)).map_err(|err| bad_jwk("RS256", err.to_string()))
}

fn verify_rs256(jwk: &Jwk, msg: &[u8], signature_b64: &str) -> Result<(), SignatureValidationError> {
    let key = RsaVerifyingKey::<Sha256>::new(rs256_key(jwk)?);
    let raw = decode_b64url(signature_b64).ok_or(SignatureValidationError::Rsa)?;
    let sig = RsaSignature::try_from(raw.as_slice()).map_err(|_| SignatureValidationError::Rsa)?;
    key.verify(msg, &sig).map_err(|_| SignatureValidationError::Rsa)
}
