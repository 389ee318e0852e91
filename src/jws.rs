//! Detached compact JWS parsing for the `Signature` header.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD as B64URL, Engine as _};
use serde_json::{Map, Value as Json};

use crate::error::SignatureValidationError;

pub const SIGNATURE_HEADER: &str = "Signature";

/// A `<protected>..<signature>` value split into its pieces.
///
/// `protected_b64` is kept exactly as received; the signing input is rebuilt
/// from it, never from a re-serialization of `header`.
#[derive(Debug, Clone)]
pub struct DetachedJws {
    pub protected_b64: String,
    pub signature_b64: String,
    pub kid: String,
    pub header: Map<String, Json>,
}

impl DetachedJws {
    pub fn parse(value: Option<&str>) -> Result<Self, SignatureValidationError> {
        let value = value.ok_or(SignatureValidationError::MissingHeader)?;

        let mut it = value.split('.');
        let (protected_b64, signature_b64) = match (it.next(), it.next(), it.next()) {
            (Some(p), Some(""), Some(s)) if it.next().is_none() => (p, s),
            _ => return Err(SignatureValidationError::MalformedSignature),
        };

        let header = decode_header(protected_b64).ok_or(SignatureValidationError::ProtectedHeader)?;
        let kid = header
            .get("kid")
            .and_then(Json::as_str)
            .ok_or(SignatureValidationError::ProtectedHeader)?
            .to_string();

        Ok(Self {
            protected_b64: protected_b64.to_string(),
            signature_b64: signature_b64.to_string(),
            kid,
            header,
        })
    }

    /// `<protected_b64>.<b64url(payload)>`
    pub fn signing_input(&self, payload: &[u8]) -> String {
        let payload_b64 = B64URL.encode(payload);
        let mut s = String::with_capacity(self.protected_b64.len() + 1 + payload_b64.len());
        s.push_str(&self.protected_b64);
        s.push('.');
        s.push_str(&payload_b64);
        s
    }
}

fn decode_header(protected_b64: &str) -> Option<Map<String, Json>> {
    let bytes = decode_b64url(protected_b64)?;
    match serde_json::from_slice(&bytes).ok()? {
        Json::Object(map) => Some(map),
        _ => None,
    }
}

/// Unpadded base64url, tolerating trailing `=` from lenient encoders.
pub(crate) fn decode_b64url(s: &str) -> Option<Vec<u8>> {
    B64URL.decode(s.trim_end_matches('=')).ok()
}
