use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::Serialize;

use crate::{AuthError, JwtClaims, TokenType, User, validate_claims};

/// Verifies a bearer token and returns its claims.
pub trait JwtValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, AuthError>;
}

/// HMAC-SHA256 validator over a shared secret.
pub struct Hs256JwtValidator {
    decoding_key: DecodingKey,
}

impl Hs256JwtValidator {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_ref()),
        }
    }
}

impl JwtValidator for Hs256JwtValidator {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against the caller's clock in `validate_claims`.
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["sub", "exp", "iat"]);

        let data = decode::<JwtClaims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::InvalidToken,
            }
        })?;

        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Signs access and refresh tokens.
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: impl AsRef<[u8]>, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_ref()),
            access_ttl,
            refresh_ttl,
        }
    }

    pub fn issue_pair(&self, user: &User, now: DateTime<Utc>) -> Result<TokenPair, AuthError> {
        Ok(TokenPair {
            access: self.issue(user.id, &user.username, TokenType::Access, now)?,
            refresh: self.issue(user.id, &user.username, TokenType::Refresh, now)?,
        })
    }

    /// Exchange a validated refresh token's claims for a new access token.
    pub fn refresh_access(&self, refresh: &JwtClaims, now: DateTime<Utc>) -> Result<String, AuthError> {
        if refresh.token_type != TokenType::Refresh {
            return Err(AuthError::WrongTokenType);
        }
        self.issue(refresh.sub, &refresh.username, TokenType::Access, now)
    }

    fn issue(
        &self,
        sub: storefront_core::UserId,
        username: &str,
        token_type: TokenType,
        now: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let ttl = match token_type {
            TokenType::Access => self.access_ttl,
            TokenType::Refresh => self.refresh_ttl,
        };
        let claims = JwtClaims {
            sub,
            username: username.to_string(),
            token_type,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!(error = %e, "failed to sign token");
            AuthError::TokenSigning(e.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_core::UserId;

    const SECRET: &[u8] = b"test-secret-test-secret-test-secret";

    fn user() -> User {
        User {
            id: UserId::new(),
            username: "testuser".to_string(),
            email: "test@example.com".to_string(),
            first_name: String::new(),
            last_name: String::new(),
            password_hash: String::new(),
            date_joined: Utc::now(),
        }
    }

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(SECRET, Duration::minutes(60), Duration::days(1))
    }

    #[test]
    fn issued_access_token_validates() {
        let u = user();
        let now = Utc::now();
        let pair = issuer().issue_pair(&u, now).unwrap();

        let claims = Hs256JwtValidator::new(SECRET).validate(&pair.access, now).unwrap();
        assert_eq!(claims.sub, u.id);
        assert_eq!(claims.username, "testuser");
        assert_eq!(claims.token_type, TokenType::Access);
    }

    #[test]
    fn access_token_expires_after_ttl() {
        let now = Utc::now();
        let pair = issuer().issue_pair(&user(), now).unwrap();
        let later = now + Duration::minutes(61);

        let validator = Hs256JwtValidator::new(SECRET);
        assert_eq!(validator.validate(&pair.access, later), Err(AuthError::Expired));
        assert!(validator.validate(&pair.refresh, later).is_ok());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let now = Utc::now();
        let pair = issuer().issue_pair(&user(), now).unwrap();
        let validator = Hs256JwtValidator::new(b"another-secret");
        assert_eq!(validator.validate(&pair.access, now), Err(AuthError::InvalidToken));
    }

    #[test]
    fn garbage_is_rejected() {
        let validator = Hs256JwtValidator::new(SECRET);
        assert_eq!(validator.validate("not.a.jwt", Utc::now()), Err(AuthError::InvalidToken));
    }

    #[test]
    fn refresh_only_accepts_refresh_tokens() {
        let now = Utc::now();
        let issuer = issuer();
        let pair = issuer.issue_pair(&user(), now).unwrap();
        let validator = Hs256JwtValidator::new(SECRET);

        let refresh = validator.validate(&pair.refresh, now).unwrap();
        let access = issuer.refresh_access(&refresh, now).unwrap();
        assert_eq!(
            validator.validate(&access, now).unwrap().token_type,
            TokenType::Access
        );

        let access_claims = validator.validate(&pair.access, now).unwrap();
        assert_eq!(
            issuer.refresh_access(&access_claims, now),
            Err(AuthError::WrongTokenType)
        );
    }
}
