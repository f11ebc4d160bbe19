use crate::{DbError, DbPool};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VoteRow {
    pub id: i64,
    pub user_id: i64,
    pub poll_id: i64,
    pub choice_id: i64,
}

impl From<VoteRow> for pollme_models::poll::Vote {
    fn from(row: VoteRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            poll_id: row.poll_id,
            choice_id: row.choice_id,
        }
    }
}

pub async fn has_voted(pool: &DbPool, user_id: i64, poll_id: i64) -> Result<bool, DbError> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM votes WHERE user_id = ?1 AND poll_id = ?2)",
    )
    .bind(user_id)
    .bind(poll_id)
    .fetch_one(pool)
    .await?;
    Ok(exists)
}

/// Plain insert. Callers check `has_voted` first; nothing here stops a
/// second row for the same user and poll.
pub async fn create_vote(
    pool: &DbPool,
    user_id: i64,
    poll_id: i64,
    choice_id: i64,
) -> Result<VoteRow, DbError> {
    let row = sqlx::query_as::<_, VoteRow>(
        "INSERT INTO votes (user_id, poll_id, choice_id)
         VALUES (?1, ?2, ?3)
         RETURNING id, user_id, poll_id, choice_id",
    )
    .bind(user_id)
    .bind(poll_id)
    .bind(choice_id)
    .fetch_one(pool)
    .await?;
    Ok(row)
}
