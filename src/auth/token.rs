use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// User snapshot embedded in a session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: Uuid,
    pub email: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "orgId")]
    pub org_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub user: SessionUser,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Session secret is not configured")]
    MissingSecret,

    #[error("Token generation error: {0}")]
    Signing(String),

    /// Malformed, tampered and expired tokens are deliberately indistinguishable.
    #[error("Invalid session token")]
    Invalid,
}

/// Signs and verifies HS256 session tokens with one process-wide secret
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec").finish_non_exhaustive()
    }
}

impl TokenCodec {
    pub fn new(secret: &str) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::MissingSecret);
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        })
    }

    pub fn issue(&self, user: &SessionUser, ttl: Duration) -> Result<String, TokenError> {
        self.issue_at(user, ttl, Utc::now())
    }

    pub fn issue_at(
        &self,
        user: &SessionUser,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let claims = Claims {
            sub: user.id.to_string(),
            user: user.clone(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify against an explicit clock. Valid strictly before `exp`, no leeway.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            tracing::debug!("Session token rejected: {}", e);
            TokenError::Invalid
        })?;

        if now.timestamp() >= data.claims.exp {
            tracing::debug!("Session token expired at {}", data.claims.exp);
            return Err(TokenError::Invalid);
        }

        if data.claims.sub != data.claims.user.id.to_string() {
            tracing::debug!("Session token subject does not match embedded user");
            return Err(TokenError::Invalid);
        }

        Ok(data.claims)
    }
}
