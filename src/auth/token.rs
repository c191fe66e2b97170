use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::config;

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("Token has expired")]
    Expired,

    #[error("Token is malformed or has an invalid signature")]
    Malformed,

    #[error("JWT secret is not configured")]
    MissingSecret,

    #[error("Token signing failed: {0}")]
    Signing(String),
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: Uuid,
    iat: i64,
    exp: i64,
}

/// Verified token contents. `issued_at` feeds the stale-password check in the
/// auth middleware.
#[derive(Debug, Clone)]
pub struct TokenData {
    pub principal_id: Uuid,
    pub issued_at: DateTime<Utc>,
}

fn secret() -> Result<&'static str, TokenError> {
    let secret = config().security.jwt_secret.as_str();
    if secret.is_empty() {
        return Err(TokenError::MissingSecret);
    }
    Ok(secret)
}

/// Sign a session token for the given account.
pub fn issue_token(principal_id: Uuid) -> Result<String, TokenError> {
    let now = Utc::now();
    let claims = Claims {
        sub: principal_id,
        iat: now.timestamp(),
        exp: (now + Duration::hours(config().security.jwt_expiry_hours as i64)).timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret()?.as_bytes()),
    )
    .map_err(|e| TokenError::Signing(e.to_string()))
}

/// Verify signature and expiry. Expired tokens are reported distinctly from
/// malformed ones; the API maps them to different status codes.
pub fn verify_token(token: &str) -> Result<TokenData, TokenError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret()?.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Malformed,
    })?;

    let issued_at = Utc
        .timestamp_opt(data.claims.iat, 0)
        .single()
        .ok_or(TokenError::Malformed)?;
    Ok(TokenData {
        principal_id: data.claims.sub,
        issued_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_verifies_and_carries_the_principal() {
        let id = Uuid::new_v4();
        let token = issue_token(id).unwrap();
        let data = verify_token(&token).unwrap();
        assert_eq!(data.principal_id, id);
        assert!(data.issued_at <= Utc::now());
    }

    #[test]
    fn expired_token_is_distinguished_from_malformed() {
        let now = Utc::now();
        let claims = Claims {
            sub: Uuid::new_v4(),
            iat: (now - Duration::hours(2)).timestamp(),
            exp: (now - Duration::hours(1)).timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config().security.jwt_secret.as_bytes()),
        )
        .unwrap();

        assert!(matches!(verify_token(&token), Err(TokenError::Expired)));
        assert!(matches!(
            verify_token("not.a.token"),
            Err(TokenError::Malformed)
        ));
    }

    #[test]
    fn tampered_token_fails_verification() {
        let token = issue_token(Uuid::new_v4()).unwrap();
        let mut tampered = token.clone();
        tampered.push('x');
        assert!(matches!(
            verify_token(&tampered),
            Err(TokenError::Malformed)
        ));
    }
}
