//! GitHub App JWTs (RS256), used only to mint installation tokens.

use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::Serialize;

use super::GitHubError;

/// Backdate `iat` to tolerate clock drift between us and GitHub.
const ISSUED_AT_SKEW_SECS: i64 = 60;
/// GitHub rejects app JWTs that live longer than ten minutes.
const LIFETIME_SECS: i64 = 540;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppClaims {
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
}

impl AppClaims {
    #[must_use]
    pub fn new(app_id: &str, now: i64) -> Self {
        Self { iat: now - ISSUED_AT_SKEW_SECS, exp: now + LIFETIME_SECS, iss: app_id.to_string() }
    }
}

/// Signs app JWTs with the App's RSA private key.
pub struct AppSigner {
    app_id: String,
    key: EncodingKey,
}

impl AppSigner {
    /// # Errors
    ///
    /// Returns [`GitHubError::InvalidKey`] if the PEM is not an RSA key.
    pub fn new(app_id: String, private_key_pem: &str) -> Result<Self, GitHubError> {
        let key = EncodingKey::from_rsa_pem(private_key_pem.as_bytes()).map_err(|e| GitHubError::InvalidKey(e.to_string()))?;
        Ok(Self { app_id, key })
    }

    /// # Errors
    ///
    /// Returns [`GitHubError::Jwt`] if signing fails.
    pub fn sign(&self) -> Result<String, GitHubError> {
        let claims = AppClaims::new(&self.app_id, unix_now());
        jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &self.key).map_err(|e| GitHubError::Jwt(e.to_string()))
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claims_window_stays_under_ten_minutes() {
        let claims = AppClaims::new("1234", 1_700_000_000);
        assert_eq!(claims.iss, "1234");
        assert_eq!(claims.iat, 1_700_000_000 - 60);
        assert_eq!(claims.exp, 1_700_000_000 + 540);
        assert!(claims.exp - claims.iat <= 600);
    }

    #[test]
    fn non_rsa_pem_is_rejected() {
        let err = AppSigner::new("1".into(), "not a pem").err().unwrap();
        assert!(matches!(err, GitHubError::InvalidKey(_)));
    }

    #[test]
    fn unix_now_is_after_2020() {
        assert!(unix_now() > 1_577_836_800);
    }
}
