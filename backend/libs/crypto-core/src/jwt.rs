/// JWT issue and validation for Postboard services
///
/// Tokens are RS256 only; no symmetric algorithms are accepted. Keys are held
/// by a [`JwtCodec`] that the service builds once at startup and shares with
/// request handlers.
use crate::{CryptoError, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

const ACCESS_TOKEN_EXPIRY_HOURS: i64 = 1;

const JWT_ALGORITHM: Algorithm = Algorithm::RS256;

/// Claims carried by Postboard access tokens
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,
    /// User handle
    pub handle: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Token type, always "access" for now
    pub token_type: String,
}

/// Signs and validates access tokens.
///
/// Built validation-only when the private key is not configured; issuing then fails.
#[derive(Clone)]
pub struct JwtCodec {
    encoding_key: Option<EncodingKey>,
    decoding_key: DecodingKey,
    access_ttl: Duration,
}

impl JwtCodec {
    /// Build a codec that can both issue and validate tokens.
    pub fn from_rsa_pem(private_key_pem: &str, public_key_pem: &str) -> Result<Self> {
        let encoding_key = EncodingKey::from_rsa_pem(private_key_pem.as_bytes())
            .map_err(|e| CryptoError::InvalidKey(format!("RSA private key: {e}")))?;

        let mut codec = Self::validation_only(public_key_pem)?;
        codec.encoding_key = Some(encoding_key);
        Ok(codec)
    }

    /// Build a codec that only validates tokens.
    pub fn validation_only(public_key_pem: &str) -> Result<Self> {
        let decoding_key = DecodingKey::from_rsa_pem(public_key_pem.as_bytes())
            .map_err(|e| CryptoError::InvalidKey(format!("RSA public key: {e}")))?;

        Ok(Self {
            encoding_key: None,
            decoding_key,
            access_ttl: Duration::hours(ACCESS_TOKEN_EXPIRY_HOURS),
        })
    }

    pub fn with_access_ttl(mut self, ttl: Duration) -> Self {
        self.access_ttl = ttl;
        self
    }

    pub fn can_issue(&self) -> bool {
        self.encoding_key.is_some()
    }

    /// Issue an access token for a user.
    pub fn issue_access_token(&self, user_id: &str, handle: &str) -> Result<String> {
        let encoding_key = self.encoding_key.as_ref().ok_or_else(|| {
            CryptoError::TokenGeneration("no private key configured".to_string())
        })?;

        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            handle: handle.to_string(),
            iat: now.timestamp(),
            exp: (now + self.access_ttl).timestamp(),
            token_type: "access".to_string(),
        };

        encode(&Header::new(JWT_ALGORITHM), &claims, encoding_key)
            .map_err(|e| CryptoError::TokenGeneration(e.to_string()))
    }

    /// Validate signature and expiry, returning the claims.
    pub fn validate(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(JWT_ALGORITHM);
        validation.validate_exp = true;
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| CryptoError::InvalidToken(e.to_string()))?;

        if data.claims.token_type != "access" {
            return Err(CryptoError::InvalidToken(format!(
                "unexpected token type '{}'",
                data.claims.token_type
            )));
        }

        Ok(data.claims)
    }
}
