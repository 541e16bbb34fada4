//! Token verification for the chat handshake.
//!
//! Credentials are HS256 JWTs issued by the platform's account service. The
//! verifier checks signature and expiry against the process-wide secret and
//! yields the identity claim the connection will carry for its lifetime. It
//! performs no I/O and is safe to call concurrently from many handlers.

use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::domain::{AuthError, IdentityClaim};

/// Fallback secret for local development only. Production deployments must
/// set `JWT_SECRET`.
const DEV_SECRET: &str = "tendril-dev-secret-change-in-production";

/// Read the signing secret from the environment.
pub fn secret_from_env() -> String {
    std::env::var("JWT_SECRET").unwrap_or_else(|_| {
        tracing::warn!("JWT_SECRET is not set; falling back to the development secret");
        DEV_SECRET.to_string()
    })
}

/// JWT claims carried by a chat credential.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// User ID
    sub: String,
    /// Display name
    username: String,
    /// Optional profile attribute
    #[serde(default, rename = "avatarColor")]
    avatar_color: Option<String>,
    /// Expiration time (Unix timestamp, seconds)
    exp: u64,
    /// Issued at time (Unix timestamp, seconds)
    iat: u64,
}

/// Validates opaque signed credentials and yields identity claims.
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_ref()),
            validation: Validation::default(),
        }
    }

    /// Verify a raw credential, `None` meaning no credential was presented.
    ///
    /// Succeeds only if the signature is valid for the configured secret and
    /// the token has not expired. The caller must close the connection on any
    /// error and never proceed to the message loop.
    pub fn verify(&self, raw_credential: Option<&str>) -> Result<IdentityClaim, AuthError> {
        let token = raw_credential.ok_or(AuthError::Missing)?;
        if token.is_empty() {
            return Err(AuthError::Missing);
        }

        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::Expired,
                jsonwebtoken::errors::ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                _ => AuthError::Malformed,
            }
        })?;

        Ok(IdentityClaim {
            user_id: data.claims.sub,
            username: data.claims.username,
            avatar_color: data.claims.avatar_color,
        })
    }
}

/// Create a signed chat token. Used by tests and local tooling; in production
/// tokens come from the account service, signed with the same secret.
pub fn issue_token(
    secret: &str,
    user_id: &str,
    username: &str,
    avatar_color: Option<&str>,
    ttl_secs: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: user_id.to_string(),
        username: username.to_string(),
        avatar_color: avatar_color.map(str::to_string),
        exp: (now + ttl_secs).max(0) as u64,
        iat: now.max(0) as u64,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
}
