use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use pollme_core::AppState;
use pollme_models::user::User;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::middleware::TOKEN_COOKIE;

#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<CredentialsRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let user =
        pollme_core::auth::register_user(&state.db, &state.config, &body.username, &body.password)
            .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "user": User::from(user) })),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<CredentialsRequest>,
) -> Result<(CookieJar, Json<Value>), ApiError> {
    let user = pollme_core::auth::authenticate(&state.db, &body.username, &body.password).await?;
    let token = pollme_core::auth::create_token(
        user.id,
        &state.config.jwt_secret,
        state.config.jwt_expiry_seconds,
    )?;
    tracing::info!(user_id = user.id, "user logged in");

    let cookie = Cookie::build((TOKEN_COOKIE, token.clone()))
        .path("/")
        .http_only(true)
        .secure(state.config.secure_cookies)
        .same_site(SameSite::Lax);

    Ok((
        jar.add(cookie),
        Json(json!({
            "token": token,
            "user": User::from(user),
        })),
    ))
}

pub async fn logout(jar: CookieJar) -> (CookieJar, StatusCode) {
    (
        jar.remove(Cookie::build(TOKEN_COOKIE).path("/")),
        StatusCode::NO_CONTENT,
    )
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
