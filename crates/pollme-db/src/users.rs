use crate::{is_unique_violation, DbError, DbPool};
use chrono::{DateTime, Utc};
use pollme_models::permissions::Permissions;

fn normalize_username(username: &str) -> String {
    username.trim().to_string()
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub permissions: i64,
    pub created_at: DateTime<Utc>,
}

impl From<UserRow> for pollme_models::user::User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            permissions: Permissions::from_bits_truncate(row.permissions),
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserAuthRow {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub permissions: i64,
    pub created_at: DateTime<Utc>,
}

pub async fn create_user(
    pool: &DbPool,
    username: &str,
    password_hash: &str,
    permissions: i64,
) -> Result<UserRow, DbError> {
    let username = normalize_username(username);
    let row = sqlx::query_as::<_, UserRow>(
        "INSERT INTO users (username, password_hash, permissions)
         VALUES (?1, ?2, ?3)
         RETURNING id, username, permissions, created_at",
    )
    .bind(&username)
    .bind(password_hash)
    .bind(permissions)
    .fetch_one(pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            DbError::Conflict(format!("username '{username}' is taken"))
        } else {
            DbError::Sqlx(e)
        }
    })?;
    Ok(row)
}

pub async fn get_user_by_id(pool: &DbPool, id: i64) -> Result<Option<UserRow>, DbError> {
    let row = sqlx::query_as::<_, UserRow>(
        "SELECT id, username, permissions, created_at
         FROM users WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn get_user_by_username(
    pool: &DbPool,
    username: &str,
) -> Result<Option<UserAuthRow>, DbError> {
    let row = sqlx::query_as::<_, UserAuthRow>(
        "SELECT id, username, password_hash, permissions, created_at
         FROM users WHERE username = ?1",
    )
    .bind(normalize_username(username))
    .fetch_optional(pool)
    .await?;
    Ok(row)
}
