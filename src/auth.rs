//! Credential storage and token issuance: bcrypt password hashing and HS256
//! JWT access tokens. Standard patterns, no novelty — auth failures follow
//! the strict side of the error policy and are surfaced as 4xx.

use anyhow::Result;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::AuthConfig;
use crate::database::Database;
use crate::models::{LoginRequest, SignupRequest, TokenResponse, User};

/// bcrypt ignores input past 72 bytes; truncate explicitly so long
/// passphrases verify consistently.
const BCRYPT_MAX_BYTES: usize = 72;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Email already registered")]
    EmailTaken,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
}

#[derive(Clone)]
pub struct AuthService {
    db: Database,
    jwt_secret: String,
    token_ttl_minutes: i64,
}

impl AuthService {
    pub fn new(db: Database, config: &AuthConfig) -> Self {
        Self {
            db,
            jwt_secret: config.jwt_secret.clone(),
            token_ttl_minutes: config.token_ttl_minutes,
        }
    }

    pub async fn signup(&self, request: SignupRequest) -> Result<User, AuthError> {
        if self
            .db
            .find_user_by_email(&request.email)
            .await
            .map_err(AuthError::Internal)?
            .is_some()
        {
            warn!(email = %request.email, "Signup rejected: email already registered");
            return Err(AuthError::EmailTaken);
        }

        let hashed = hash_password(&request.password).map_err(AuthError::Internal)?;
        let user = self
            .db
            .create_user(&request.username, &request.email, &hashed)
            .await
            .map_err(AuthError::Internal)?;

        info!(user_id = %user.id, email = %user.email, "User created");
        Ok(user)
    }

    pub async fn login(&self, request: LoginRequest) -> Result<TokenResponse, AuthError> {
        let user = self
            .db
            .find_user_by_email(&request.email)
            .await
            .map_err(AuthError::Internal)?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(&request.password, &user.hashed_password)
            .map_err(AuthError::Internal)?
        {
            warn!(email = %request.email, "Login rejected: password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        let access_token = self
            .create_access_token(&user.email)
            .map_err(AuthError::Internal)?;

        info!(user_id = %user.id, "Login succeeded");
        Ok(TokenResponse {
            access_token,
            token_type: "bearer".to_string(),
        })
    }

    pub fn create_access_token(&self, email: &str) -> Result<String> {
        let expiry = Utc::now() + Duration::minutes(self.token_ttl_minutes);
        let claims = Claims {
            sub: email.to_string(),
            exp: expiry.timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )?;
        Ok(token)
    }

    pub fn decode_access_token(&self, token: &str) -> Option<Claims> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .ok()
    }
}

fn hash_password(password: &str) -> Result<String> {
    let bytes = clamp_to_bcrypt_limit(password.as_bytes());
    Ok(bcrypt::hash(bytes, bcrypt::DEFAULT_COST)?)
}

fn verify_password(password: &str, hashed: &str) -> Result<bool> {
    let bytes = clamp_to_bcrypt_limit(password.as_bytes());
    Ok(bcrypt::verify(bytes, hashed)?)
}

fn clamp_to_bcrypt_limit(bytes: &[u8]) -> &[u8] {
    if bytes.len() > BCRYPT_MAX_BYTES {
        &bytes[..BCRYPT_MAX_BYTES]
    } else {
        bytes
    }
}
