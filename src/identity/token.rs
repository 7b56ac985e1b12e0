//! Signed session tokens (HS256 JWT).
//!
//! The token carries the caller's identity claims plus issuer, audience and
//! expiry. Verification checks all four; expiry is reported separately from
//! other failures so the server log can tell them apart, but both end up as 401.

use chrono::TimeDelta;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::principal::{Principal, Role};

pub const DEFAULT_ISSUER: &str = "jwt-rbac-api";
pub const DEFAULT_AUDIENCE: &str = "jwt-rbac-users";
pub const DEFAULT_EXPIRY_HOURS: i64 = 24;

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("invalid token: {0}")]
    Invalid(String),
    #[error("token encoding failed: {0}")]
    Encode(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    #[serde(rename = "userId")]
    pub user_id: i64,
    pub email: String,
    pub role: Role,
    pub iss: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

impl TokenClaims {
    pub fn principal(&self) -> Principal {
        Principal { user_id: self.user_id, email: self.email.clone(), role: self.role }
    }
}

pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
    expiry_hours: i64,
}

impl TokenService {
    pub fn new(secret: &str, issuer: impl Into<String>, audience: impl Into<String>, expiry_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.into(),
            audience: audience.into(),
            expiry_hours,
        }
    }

    /// Fails with `Encode` when the configured lifetime does not fit a timestamp.
    pub fn claims_for(&self, principal: &Principal) -> Result<TokenClaims, TokenError> {
        let now = chrono::Utc::now();
        let exp = TimeDelta::try_hours(self.expiry_hours)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or_else(|| TokenError::Encode(format!("token lifetime of {} hours overflows", self.expiry_hours)))?;
        Ok(TokenClaims {
            user_id: principal.user_id,
            email: principal.email.clone(),
            role: principal.role,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        })
    }

    pub fn issue(&self, principal: &Principal) -> Result<String, TokenError> {
        self.sign(&self.claims_for(principal)?)
    }

    pub fn sign(&self, claims: &TokenClaims) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| TokenError::Encode(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<TokenClaims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_audience(&[self.audience.as_str()]);
        validation.validate_nbf = false;

        decode::<TokenClaims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e.to_string()),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Principal {
        Principal { user_id: 7, email: "alice@test.com".into(), role: Role::User }
    }

    fn service(secret: &str) -> TokenService {
        TokenService::new(secret, DEFAULT_ISSUER, DEFAULT_AUDIENCE, DEFAULT_EXPIRY_HOURS)
    }

    #[test]
    fn issue_then_verify_roundtrips_identity() {
        let svc = service("test-secret");
        let token = svc.issue(&alice()).unwrap();
        let claims = svc.verify(&token).unwrap();
        assert_eq!(claims.principal(), alice());
        assert_eq!(claims.iss, DEFAULT_ISSUER);
        assert_eq!(claims.aud, DEFAULT_AUDIENCE);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn wrong_secret_is_invalid() {
        let token = service("test-secret").issue(&alice()).unwrap();
        let res = service("other-secret").verify(&token);
        assert!(matches!(res, Err(TokenError::Invalid(_))));
    }

    #[test]
    fn expired_is_distinguished() {
        let svc = service("test-secret");
        let mut claims = svc.claims_for(&alice()).unwrap();
        claims.iat -= 7200;
        claims.exp = chrono::Utc::now().timestamp() - 3600;
        let token = svc.sign(&claims).unwrap();
        assert!(matches!(svc.verify(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn foreign_issuer_and_audience_rejected() {
        let svc = service("test-secret");

        let mut claims = svc.claims_for(&alice()).unwrap();
        claims.iss = "someone-else".into();
        let token = svc.sign(&claims).unwrap();
        assert!(matches!(svc.verify(&token), Err(TokenError::Invalid(_))));

        let mut claims = svc.claims_for(&alice()).unwrap();
        claims.aud = "other-audience".into();
        let token = svc.sign(&claims).unwrap();
        assert!(matches!(svc.verify(&token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn oversized_lifetime_is_an_error_not_a_panic() {
        let svc = TokenService::new("test-secret", DEFAULT_ISSUER, DEFAULT_AUDIENCE, 100_000_000_000);
        assert!(matches!(svc.issue(&alice()), Err(TokenError::Encode(_))));
        let svc = TokenService::new("test-secret", DEFAULT_ISSUER, DEFAULT_AUDIENCE, i64::MAX);
        assert!(matches!(svc.claims_for(&alice()), Err(TokenError::Encode(_))));
    }

    #[test]
    fn garbage_is_invalid() {
        let svc = service("test-secret");
        assert!(matches!(svc.verify("not.a.jwt"), Err(TokenError::Invalid(_))));
        assert!(matches!(svc.verify(""), Err(TokenError::Invalid(_))));
    }
}
