use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::SecurityConfig;

/// Caller role carried in the access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Role {
    /// Code 0. No route guard admits it.
    Anonymous = 0,
    Admin = 1,
    User = 2,
}

impl Role {
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl From<Role> for u8 {
    fn from(role: Role) -> Self {
        role.code()
    }
}

impl TryFrom<u8> for Role {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Role::Anonymous),
            1 => Ok(Role::Admin),
            2 => Ok(Role::User),
            other => Err(format!("unknown role {}", other)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub id: Uuid,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(id: Uuid, role: Role, expiry_hours: u64) -> Self {
        let now = Utc::now();
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self {
            id,
            role,
            exp,
            iat: now.timestamp(),
        }
    }
}

/// Identity of the request issuer, placed in request extensions by the
/// authorization middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub id: Option<Uuid>,
    pub role: Role,
}

impl Caller {
    pub fn anonymous() -> Self {
        Self { id: None, role: Role::Anonymous }
    }

    pub fn new(id: Uuid, role: Role) -> Self {
        Self { id: Some(id), role }
    }

    pub fn id_string(&self) -> Option<String> {
        self.id.map(|id| id.to_string())
    }
}

impl From<Claims> for Caller {
    fn from(claims: Claims) -> Self {
        Self { id: Some(claims.id), role: claims.role }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),
    #[error("Invalid JWT token: {0}")]
    InvalidToken(String),
    #[error("JWT secret not configured")]
    InvalidSecret,
}

pub fn generate_jwt(security: &SecurityConfig, id: Uuid, role: Role) -> Result<String, JwtError> {
    let secret = &security.jwt_secret;

    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let claims = Claims::new(id, role, security.jwt_expiry_hours);
    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), &claims, &encoding_key).map_err(|e| JwtError::TokenGeneration(e.to_string()))
}

pub fn verify_jwt(security: &SecurityConfig, token: &str) -> Result<Claims, JwtError> {
    let secret = &security.jwt_secret;

    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let token_data = decode::<Claims>(token, &decoding_key, &Validation::default())
        .map_err(|e| JwtError::InvalidToken(e.to_string()))?;

    Ok(token_data.claims)
}
