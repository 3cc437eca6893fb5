use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config;
use crate::database::models::{Role, User};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub role: Role,
    pub token_type: TokenType,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(user: &User, token_type: TokenType) -> Self {
        let now = Utc::now();
        let security = &config::config().security;
        let lifetime = match token_type {
            TokenType::Access => Duration::minutes(security.access_token_minutes),
            TokenType::Refresh => Duration::hours(security.refresh_token_hours),
        };

        Self {
            sub: user.id,
            username: user.username.clone(),
            role: user.role,
            token_type,
            exp: (now + lifetime).timestamp(),
            iat: now.timestamp(),
        }
    }
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("JWT generation error: {0}")]
    Generation(String),

    #[error("JWT secret not configured")]
    InvalidSecret,

    #[error("Token is invalid or expired")]
    Invalid(#[from] jsonwebtoken::errors::Error),

    #[error("Token has wrong type")]
    WrongType,
}

/// Access/refresh pair returned by login
#[derive(Debug, Serialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

fn secret() -> Result<&'static str, TokenError> {
    let secret = config::config().security.jwt_secret.as_str();
    if secret.is_empty() {
        return Err(TokenError::InvalidSecret);
    }
    Ok(secret)
}

pub fn generate_jwt(claims: &Claims) -> Result<String, TokenError> {
    let encoding_key = EncodingKey::from_secret(secret()?.as_bytes());
    encode(&Header::default(), claims, &encoding_key).map_err(|e| TokenError::Generation(e.to_string()))
}

pub fn issue_pair(user: &User) -> Result<TokenPair, TokenError> {
    Ok(TokenPair {
        access: generate_jwt(&Claims::new(user, TokenType::Access))?,
        refresh: generate_jwt(&Claims::new(user, TokenType::Refresh))?,
    })
}

/// Decode `token` and require it to be of `expected` type
pub fn validate_jwt(token: &str, expected: TokenType) -> Result<Claims, TokenError> {
    let decoding_key = DecodingKey::from_secret(secret()?.as_bytes());
    let claims = decode::<Claims>(token, &decoding_key, &Validation::default())?.claims;
    if claims.token_type != expected {
        return Err(TokenError::WrongType);
    }
    Ok(claims)
}
