//! Shared security primitives for Postboard
//!
//! - [`jwt`]: RS256 access token issue and validation
//! - [`password`]: Argon2id password hashing

pub mod jwt;
pub mod password;

#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("invalid key material: {0}")]
    InvalidKey(String),

    #[error("token generation failed: {0}")]
    TokenGeneration(String),

    #[error("token validation failed: {0}")]
    InvalidToken(String),

    #[error("password hashing failed: {0}")]
    PasswordHash(String),
}

pub type Result<T> = std::result::Result<T, CryptoError>;
