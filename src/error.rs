use std::collections::BTreeSet;
use std::fmt;

/// Every way a webhook signature can fail validation.
///
/// The `Display` text of each variant is stable: callers and operators match
/// on these strings, so they must not be reworded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureValidationError {
    #[error("Missing Signature header")]
    MissingHeader,
    #[error("Malformed Signature format.")]
    MalformedSignature,
    #[error("Unable to decode or parse protected header.")]
    ProtectedHeader,
    #[error("Failed to fetch JWKS: {0}")]
    JwksHttp(String),
    #[error("Unable to parse JWKS response.")]
    JwksJson,
    #[error("JWK with kid {0} not found after JWKS refresh")]
    KidNotFound(String),
    #[error("JWK with kid {0} is not for signature use")]
    NotForSignature(String),
    #[error("Unsupported JWK algorithm: {0}")]
    UnsupportedAlg(String),
    #[error("Invalid {alg} JWK: {reason}")]
    BadJwk { alg: &'static str, reason: String },
    #[error("ECDSA signature verification failed.")]
    Ecdsa,
    #[error("RSA signature verification failed.")]
    Rsa,
    #[error("Invalid crit header: missing {missing}, unexpected {unexpected}")]
    Crit { missing: NameSet, unexpected: NameSet },
    #[error("Missing required protected header(s): {0}")]
    MissingClaims(NameList),
    #[error("Invalid issuer: {0}")]
    Issuer(String),
    #[error("Invalid iat format: {0}")]
    IatFormat(String),
    #[error("Invalid iat: outside allowed skew ({0}s)")]
    IatSkew(u64),
    #[error("Path mismatch: {claim} != {url}")]
    PathMismatch { claim: String, url: String },
    #[error("Invalid subject: {0}")]
    Subject(String),
}

/// Unordered claim names, rendered sorted as `{a, b}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameSet(pub BTreeSet<String>);

impl NameSet {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for NameSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for NameSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, name) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(name)?;
        }
        f.write_str("}")
    }
}

/// Ordered claim names, rendered as `['a', 'b']`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameList(pub Vec<String>);

impl fmt::Display for NameList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, name) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "'{}'", name)?;
        }
        f.write_str("]")
    }
}
