use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Issuer claim stamped into every session token
pub const TOKEN_ISSUER: &str = "fintrack-api";

/// Fixed session lifetime in days
pub const TOKEN_LIFETIME_DAYS: i64 = 60;

/// Claim set carried by a session token.
///
/// Tokens whose payload does not deserialize into exactly this shape are
/// rejected at verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Identity (user email)
    pub sub: String,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Not before (unix seconds)
    pub nbf: i64,
    /// Expiry (unix seconds)
    pub exp: i64,
    /// Issuing service name
    pub iss: String,
}

/// Session token errors
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Session signing key is not configured")]
    MissingKey,
    #[error("Failed to sign session token")]
    Signing(#[source] jsonwebtoken::errors::Error),
    #[error("Invalid session token")]
    Invalid,
}

/// Issues and verifies signed session tokens.
///
/// The signing key is injected once at construction and never exposed.
/// Every verification failure collapses to [`TokenError::Invalid`] so callers
/// cannot distinguish an expired token from a forged or malformed one.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    pub fn new(secret: &str) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::MissingKey);
        }

        // Signature algorithm is pinned to HS256; expiry is checked against
        // the caller-supplied clock instead of the library's.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.required_spec_claims.clear();

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }

    /// Issue a token for `identity`, valid from `now` for the fixed lifetime
    pub fn issue(&self, identity: &str, now: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = Claims {
            sub: identity.to_string(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: (now + Duration::days(TOKEN_LIFETIME_DAYS)).timestamp(),
            iss: TOKEN_ISSUER.to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(TokenError::Signing)
    }

    /// Verify a token as of `now` and return the identity it carries
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<String, TokenError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|_| TokenError::Invalid)?;

        let claims = data.claims;
        if claims.exp <= now.timestamp() {
            return Err(TokenError::Invalid);
        }
        if claims.nbf > now.timestamp() {
            return Err(TokenError::Invalid);
        }
        if claims.sub.is_empty() {
            return Err(TokenError::Invalid);
        }

        Ok(claims.sub)
    }
}
