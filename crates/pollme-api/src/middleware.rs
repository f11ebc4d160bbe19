use axum::{
    extract::{FromRequestParts, Path},
    http::{header, request::Parts},
};
use axum_extra::extract::cookie::CookieJar;
use pollme_core::AppState;
use pollme_models::permissions::Permissions;

use crate::error::ApiError;

/// Cookie holding the session token set by the login route.
pub const TOKEN_COOKIE: &str = "pollme_token";

pub struct AuthUser {
    pub user_id: i64,
    pub username: String,
    pub permissions: Permissions,
}

fn bearer_token(parts: &Parts) -> Option<String> {
    let raw = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())?;
    raw.strip_prefix("Bearer ").map(str::to_string)
}

fn cookie_token(parts: &Parts) -> Option<String> {
    CookieJar::from_headers(&parts.headers)
        .get(TOKEN_COOKIE)
        .map(|c| c.value().to_string())
}

/// `<login_url>?next=<path>` for the current request.
fn login_redirect(parts: &Parts, state: &AppState) -> ApiError {
    let next = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("next", next)
        .finish();
    ApiError::LoginRequired(format!("{}?{}", state.config.login_url, query))
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Header first, then the cookie set by the login route.
        let Some(token) = bearer_token(parts).or_else(|| cookie_token(parts)) else {
            return Err(login_redirect(parts, state));
        };

        let Ok(claims) = pollme_core::auth::validate_token(&token, &state.config.jwt_secret)
        else {
            return Err(login_redirect(parts, state));
        };

        let user = pollme_db::users::get_user_by_id(&state.db, claims.sub)
            .await
            .map_err(|e| ApiError::Internal(anyhow::anyhow!(e)))?;
        let Some(user) = user else {
            return Err(login_redirect(parts, state));
        };

        Ok(AuthUser {
            user_id: user.id,
            username: user.username,
            permissions: Permissions::from_bits_truncate(user.permissions),
        })
    }
}

/// Numeric id from the route's single path parameter. Anything that does
/// not parse as an `i64` names no row, so it is a 404 rather than a 400.
pub struct Id(pub i64);

impl<S: Send + Sync> FromRequestParts<S> for Id {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<i64>::from_request_parts(parts, state).await {
            Ok(Path(id)) => Ok(Id(id)),
            Err(rejection) => {
                tracing::debug!(uri = %parts.uri, "unparsable id: {rejection}");
                Err(ApiError::NotFound)
            }
        }
    }
}
