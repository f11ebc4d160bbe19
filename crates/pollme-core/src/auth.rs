use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use pollme_db::{users::UserRow, DbPool};
use pollme_models::permissions::Permissions;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::AppConfig;

pub const MAX_USERNAME_LEN: usize = 150;
pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: i64,
    pub iat: i64,
    pub exp: i64,
}

pub fn hash_password(password: &str) -> Result<String, CoreError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| CoreError::Internal(format!("password hashing failed: {e}")))
}

pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

pub fn create_token(user_id: i64, secret: &str, expiry_seconds: u64) -> Result<String, CoreError> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: user_id,
        iat: now,
        exp: now.saturating_add(i64::try_from(expiry_seconds).unwrap_or(i64::MAX)),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| CoreError::Internal(format!("token encoding failed: {e}")))
}

pub fn validate_token(token: &str, secret: &str) -> Result<Claims, CoreError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| CoreError::InvalidCredentials)
}

fn validate_username(username: &str) -> Result<(), CoreError> {
    if username.is_empty() || username.chars().count() > MAX_USERNAME_LEN {
        return Err(CoreError::BadRequest(format!(
            "Username must be between 1 and {MAX_USERNAME_LEN} characters"
        )));
    }
    let allowed = |ch: char| ch.is_alphanumeric() || matches!(ch, '@' | '.' | '+' | '-' | '_');
    if !username.chars().all(allowed) {
        return Err(CoreError::BadRequest(
            "Username may only contain letters, digits and @/./+/-/_".into(),
        ));
    }
    Ok(())
}

pub async fn register_user(
    pool: &DbPool,
    config: &AppConfig,
    username: &str,
    password: &str,
) -> Result<UserRow, CoreError> {
    let username = username.trim();
    validate_username(username)?;
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(CoreError::BadRequest(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let permissions = if config.grant_add_poll_on_register {
        Permissions::REGISTERED_DEFAULT
    } else {
        Permissions::empty()
    };
    let password_hash = hash_password(password)?;
    let user =
        pollme_db::users::create_user(pool, username, &password_hash, permissions.bits()).await?;
    tracing::info!(user_id = user.id, "registered user");
    Ok(user)
}

/// Check a username/password pair and return the matching account.
pub async fn authenticate(
    pool: &DbPool,
    username: &str,
    password: &str,
) -> Result<UserRow, CoreError> {
    let user = pollme_db::users::get_user_by_username(pool, username)
        .await?
        .ok_or(CoreError::InvalidCredentials)?;
    if !verify_password(password, &user.password_hash) {
        return Err(CoreError::InvalidCredentials);
    }
    Ok(UserRow {
        id: user.id,
        username: user.username,
        permissions: user.permissions,
        created_at: user.created_at,
    })
}
