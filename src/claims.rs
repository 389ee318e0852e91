//! Critical protected-header checks.

use serde_json::{Map, Value as Json};
use std::collections::BTreeSet;
use time::{format_description::FormatItem, macros::format_description, Duration, OffsetDateTime, PrimitiveDateTime};

use crate::config::REQUIRED_CRIT;
use crate::error::{NameList, NameSet, SignatureValidationError};

const IAT_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z");

/// What a critical-header check needs from the surrounding request.
#[derive(Debug, Clone, Copy)]
pub struct ClaimContext<'a> {
    pub issuer: &'a str,
    pub max_skew_secs: u64,
    pub request_url: &'a str,
    pub now: OffsetDateTime,
}

/// Enforce `crit`, presence of every critical claim, then iss, iat and path.
/// Returns the `sub` claim for a later subject check.
pub fn validate_critical_headers(header: &Map<String, Json>, cx: &ClaimContext<'_>) -> Result<String, SignatureValidationError> {
    check_crit(header)?;

    let missing: Vec<String> = REQUIRED_CRIT
        .iter()
        .filter(|name| !header.contains_key(**name))
        .map(|name| name.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(SignatureValidationError::MissingClaims(NameList(missing)));
    }

    let iss = claim_str(header, "iss");
    if iss != cx.issuer {
        return Err(SignatureValidationError::Issuer(iss));
    }

    let iat = claim_str(header, "iat");
    let issued = parse_iat(&iat).ok_or_else(|| SignatureValidationError::IatFormat(iat.clone()))?;
    let skew = Duration::seconds(i64::try_from(cx.max_skew_secs).unwrap_or(i64::MAX));
    if (cx.now - issued).abs() > skew {
        return Err(SignatureValidationError::IatSkew(cx.max_skew_secs));
    }

    let path = claim_str(header, "path");
    if normalize_scheme(&path) != normalize_scheme(cx.request_url) {
        return Err(SignatureValidationError::PathMismatch { claim: path, url: cx.request_url.to_string() });
    }

    Ok(claim_str(header, "sub"))
}

fn check_crit(header: &Map<String, Json>) -> Result<(), SignatureValidationError> {
    let listed: BTreeSet<String> = header
        .get("crit")
        .and_then(Json::as_array)
        .map(|names| names.iter().map(|n| n.as_str().map_or_else(|| n.to_string(), str::to_string)).collect())
        .unwrap_or_default();
    let required: BTreeSet<String> = REQUIRED_CRIT.iter().map(|s| s.to_string()).collect();

    let missing: NameSet = required.difference(&listed).cloned().collect();
    let unexpected: NameSet = listed.difference(&required).cloned().collect();
    if missing.is_empty() && unexpected.is_empty() {
        Ok(())
    } else {
        Err(SignatureValidationError::Crit { missing, unexpected })
    }
}

// Non-string claims are compared by their JSON text so mismatches still
// report something readable.
fn claim_str(header: &Map<String, Json>, name: &str) -> String {
    match header.get(name) {
        Some(Json::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

fn parse_iat(raw: &str) -> Option<OffsetDateTime> {
    PrimitiveDateTime::parse(raw, IAT_FORMAT).ok().map(PrimitiveDateTime::assume_utc)
}

/// Render an instant the way signers put it in `iat`.
pub fn format_iat(at: OffsetDateTime) -> String {
    let at = at.to_offset(time::UtcOffset::UTC);
    PrimitiveDateTime::new(at.date(), at.time()).format(IAT_FORMAT).unwrap_or_default()
}

/// Drop a leading `http://` or `https://`, matching the scheme case-insensitively.
fn normalize_scheme(url: &str) -> &str {
    for scheme in ["https://", "http://"] {
        if let Some(prefix) = url.get(..scheme.len()) {
            if prefix.eq_ignore_ascii_case(scheme) {
                return &url[scheme.len()..];
            }
        }
    }
    url
}
