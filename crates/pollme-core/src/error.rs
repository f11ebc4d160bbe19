use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("not found")]
    NotFound,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("database error: {0}")]
    Database(pollme_db::DbError),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<pollme_db::DbError> for CoreError {
    fn from(e: pollme_db::DbError) -> Self {
        match e {
            pollme_db::DbError::NotFound => CoreError::NotFound,
            pollme_db::DbError::Conflict(msg) => CoreError::Conflict(msg),
            other => CoreError::Database(other),
        }
    }
}
