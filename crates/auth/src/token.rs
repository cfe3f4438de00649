//! Bearer-token claims: the upstream principal provider.
//!
//! Only verification lives here. Issuing tokens is someone else's job.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Role, UserPrincipal};

/// Claims carried by a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject: the user name the principal is known by.
    pub sub: String,

    /// Roles granted to the subject.
    #[serde(default)]
    pub roles: Vec<Role>,

    /// Issued-at timestamp.
    #[serde(with = "chrono::serde::ts_seconds")]
    pub iat: DateTime<Utc>,

    /// Expiration timestamp.
    #[serde(with = "chrono::serde::ts_seconds")]
    pub exp: DateTime<Utc>,
}

impl SessionClaims {
    pub fn into_principal(self) -> UserPrincipal {
        UserPrincipal::authenticated(self.sub, self.roles)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (iat is in the future)")]
    NotYetValid,

    #[error("invalid token time window (exp <= iat)")]
    InvalidTimeWindow,

    #[error("token has an empty subject")]
    EmptySubject,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("malformed or unverifiable token: {0}")]
    Malformed(String),

    #[error(transparent)]
    Claims(#[from] TokenValidationError),
}

/// Deterministically validate session claims against `now`.
pub fn validate_claims(claims: &SessionClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    if claims.sub.trim().is_empty() {
        return Err(TokenValidationError::EmptySubject);
    }
    if claims.exp <= claims.iat {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now < claims.iat {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.exp {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

/// Verifies a bearer token and yields its claims.
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, TokenError>;
}

/// HMAC-SHA256 signed JWTs.
pub struct Hs256Verifier {
    key: DecodingKey,
    validation: Validation,
}

impl Hs256Verifier {
    pub fn new(secret: &[u8]) -> Self {
        // Time checks are done by `validate_claims` against the caller's clock.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims = HashSet::new();

        Self {
            key: DecodingKey::from_secret(secret),
            validation,
        }
    }
}

impl TokenVerifier for Hs256Verifier {
    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, TokenError> {
        let data = jsonwebtoken::decode::<SessionClaims>(token, &self.key, &self.validation)
            .map_err(|e| TokenError::Malformed(e.to_string()))?;
        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use jsonwebtoken::{EncodingKey, Header};

    use super::*;
    use crate::Principal;

    fn claims(now: DateTime<Utc>) -> SessionClaims {
        SessionClaims {
            sub: "alice".to_string(),
            roles: vec![Role::new("Admin")],
            iat: now - Duration::minutes(1),
            exp: now + Duration::minutes(10),
        }
    }

    fn mint(secret: &[u8], claims: &SessionClaims) -> String {
        jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret),
        )
        .unwrap()
    }

    #[test]
    fn time_window_checks() {
        let now = Utc::now();
        let c = claims(now);
        assert_eq!(validate_claims(&c, now), Ok(()));
        assert_eq!(
            validate_claims(&c, now + Duration::hours(1)),
            Err(TokenValidationError::Expired)
        );
        assert_eq!(
            validate_claims(&c, now - Duration::hours(1)),
            Err(TokenValidationError::NotYetValid)
        );

        let inverted = SessionClaims { exp: c.iat, ..c };
        assert_eq!(
            validate_claims(&inverted, now),
            Err(TokenValidationError::InvalidTimeWindow)
        );
    }

    #[test]
    fn verifies_signed_token_into_principal() {
        let now = Utc::now();
        let token = mint(b"secret", &claims(now));

        let verified = Hs256Verifier::new(b"secret").verify(&token, now).unwrap();
        let principal = verified.into_principal();
        assert!(principal.is_authenticated());
        assert_eq!(principal.name(), "alice");
        assert!(principal.has_role("admin"));
    }

    #[test]
    fn wrong_secret_is_malformed() {
        let now = Utc::now();
        let token = mint(b"secret", &claims(now));
        let err = Hs256Verifier::new(b"other").verify(&token, now).unwrap_err();
        assert!(matches!(err, TokenError::Malformed(_)));
    }

    #[test]
    fn expired_token_is_rejected() {
        let now = Utc::now();
        let token = mint(b"secret", &claims(now));
        let err = Hs256Verifier::new(b"secret")
            .verify(&token, now + Duration::days(1))
            .unwrap_err();
        assert_eq!(err, TokenError::Claims(TokenValidationError::Expired));
    }
}
