//! Alibaba Cloud V3 request signature (`ACS3-HMAC-SHA256`).

use crate::utils::errors::{Result, RotatorError};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

type HmacSha256 = Hmac<Sha256>;

pub const ALGORITHM: &str = "ACS3-HMAC-SHA256";

/// RFC 3986 encoding: everything except `A-Z a-z 0-9 - _ . ~` is escaped.
pub fn percent_encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// `k=v` pairs sorted by key and joined with `&`. Also used for form bodies.
pub fn canonical_query(params: &BTreeMap<String, String>) -> String {
    params
        .iter()
        .map(|(key, value)| format!("{}={}", percent_encode(key), percent_encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Returns `(canonical_headers, signed_headers)`. Only `host`, `content-type`
/// and `x-acs-*` headers are signed.
pub fn canonical_headers(headers: &BTreeMap<String, String>) -> (String, String) {
    let signed: BTreeMap<String, &str> = headers
        .iter()
        .map(|(name, value)| (name.to_lowercase(), value.trim()))
        .filter(|(name, _)| name == "host" || name == "content-type" || name.starts_with("x-acs-"))
        .collect();

    let canonical = signed
        .iter()
        .map(|(name, value)| format!("{name}:{value}\n"))
        .collect::<String>();
    let names = signed.keys().cloned().collect::<Vec<_>>().join(";");

    (canonical, names)
}

pub fn hash_payload(payload: &[u8]) -> String {
    hex::encode(Sha256::digest(payload))
}

pub fn canonical_request(
    method: &str,
    query: &BTreeMap<String, String>,
    headers: &BTreeMap<String, String>,
    payload_hash: &str,
) -> String {
    let (canonical_headers, signed_headers) = canonical_headers(headers);
    format!(
        "{}\n/\n{}\n{}\n{}\n{}",
        method,
        canonical_query(query),
        canonical_headers,
        signed_headers,
        payload_hash
    )
}

pub fn signature(secret: &str, canonical_request: &str) -> Result<String> {
    let string_to_sign = format!("{ALGORITHM}\n{}", hash_payload(canonical_request.as_bytes()));
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| RotatorError::Signing(e.to_string()))?;
    mac.update(string_to_sign.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Value of the `Authorization` header for a fully populated request.
pub fn authorization(
    access_key_id: &str,
    secret: &str,
    method: &str,
    query: &BTreeMap<String, String>,
    headers: &BTreeMap<String, String>,
    payload_hash: &str,
) -> Result<String> {
    let request = canonical_request(method, query, headers, payload_hash);
    let (_, signed_headers) = canonical_headers(headers);
    let signature = signature(secret, &request)?;
    tracing::trace!("Canonical request:\n{request}");

    Ok(format!(
        "{ALGORITHM} Credential={access_key_id},\
         SignedHeaders={signed_headers},Signature={signature}"
    ))
}
