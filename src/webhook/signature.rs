//! `X-Hub-Signature-256` verification.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const SIGNATURE_PREFIX: &str = "sha256=";

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("Signature is missing")]
    Missing,
    #[error("Invalid signature")]
    Invalid,
}

/// Compute the header value GitHub sends for `body` signed with `secret`.
#[must_use]
pub fn sign(secret: &[u8], body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts keys of any length");
    mac.update(body);
    format!("{SIGNATURE_PREFIX}{}", hex::encode(mac.finalize().into_bytes()))
}

/// Verify a `sha256=<hex>` header against the raw request body.
///
/// The digest comparison runs in constant time.
///
/// # Errors
///
/// [`SignatureError::Missing`] when no header was sent,
/// [`SignatureError::Invalid`] for a malformed or mismatched value.
pub fn verify(secret: &[u8], body: &[u8], header: Option<&str>) -> Result<(), SignatureError> {
    let header = header.ok_or(SignatureError::Missing)?;
    let digest = header
        .strip_prefix(SIGNATURE_PREFIX)
        .and_then(|hex_digest| hex::decode(hex_digest).ok())
        .ok_or(SignatureError::Invalid)?;

    let mut mac = HmacSha256::new_from_slice(secret).map_err(|_| SignatureError::Invalid)?;
    mac.update(body);
    mac.verify_slice(&digest).map_err(|_| SignatureError::Invalid)
}

#[cfg(test)]
#[path = "signature_test.rs"]
mod tests;
