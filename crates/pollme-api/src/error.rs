use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("not found")]
    NotFound,
    #[error("unauthorized")]
    Unauthorized,
    /// Carries the login URL (with `next`) to send the browser to.
    #[error("login required")]
    LoginRequired(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("internal server error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    /// Machine-readable error code string.
    fn error_code(&self) -> &'static str {
        match self {
            ApiError::NotFound => "NOT_FOUND",
            ApiError::Unauthorized => "UNAUTHORIZED",
            ApiError::LoginRequired(_) => "LOGIN_REQUIRED",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::LoginRequired(_) => StatusCode::SEE_OTHER,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::LoginRequired(target) = &self {
            return Redirect::to(target).into_response();
        }

        let status = self.status_code();
        let code = self.error_code();

        let message = match &self {
            ApiError::Internal(err) => {
                tracing::error!("API internal error: {err:#}");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = json!({
            "code": code,
            "message": message,
            "details": Value::Null,
        });

        (status, Json(body)).into_response()
    }
}

impl From<pollme_core::error::CoreError> for ApiError {
    fn from(e: pollme_core::error::CoreError) -> Self {
        use pollme_core::error::CoreError;
        match e {
            CoreError::NotFound => ApiError::NotFound,
            CoreError::InvalidCredentials => ApiError::Unauthorized,
            CoreError::BadRequest(msg) => ApiError::BadRequest(msg),
            CoreError::Conflict(msg) => ApiError::Conflict(msg),
            CoreError::Database(err) => ApiError::Internal(anyhow::anyhow!(err)),
            CoreError::Internal(msg) => ApiError::Internal(anyhow::anyhow!(msg)),
        }
    }
}

impl From<pollme_db::DbError> for ApiError {
    fn from(e: pollme_db::DbError) -> Self {
        match e {
            pollme_db::DbError::NotFound => ApiError::NotFound,
            pollme_db::DbError::Conflict(msg) => ApiError::Conflict(msg),
            pollme_db::DbError::Sqlx(err) => ApiError::Internal(anyhow::anyhow!(err)),
        }
    }
}
