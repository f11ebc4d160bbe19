use crate::{DbError, DbPool};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ChoiceRow {
    pub id: i64,
    pub poll_id: i64,
    pub choice_text: String,
}

impl From<ChoiceRow> for pollme_models::poll::Choice {
    fn from(row: ChoiceRow) -> Self {
        Self {
            id: row.id,
            poll_id: row.poll_id,
            choice_text: row.choice_text,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ChoiceTallyRow {
    pub id: i64,
    pub choice_text: String,
    pub votes: i64,
}

pub async fn create_choice(
    pool: &DbPool,
    poll_id: i64,
    choice_text: &str,
) -> Result<ChoiceRow, DbError> {
    let row = sqlx::query_as::<_, ChoiceRow>(
        "INSERT INTO choices (poll_id, choice_text)
         VALUES (?1, ?2)
         RETURNING id, poll_id, choice_text",
    )
    .bind(poll_id)
    .bind(choice_text)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

pub async fn get_choice(pool: &DbPool, id: i64) -> Result<Option<ChoiceRow>, DbError> {
    let row = sqlx::query_as::<_, ChoiceRow>(
        "SELECT id, poll_id, choice_text FROM choices WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn get_poll_choices(pool: &DbPool, poll_id: i64) -> Result<Vec<ChoiceRow>, DbError> {
    let rows = sqlx::query_as::<_, ChoiceRow>(
        "SELECT id, poll_id, choice_text FROM choices
         WHERE poll_id = ?1
         ORDER BY id",
    )
    .bind(poll_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn update_choice_text(
    pool: &DbPool,
    id: i64,
    choice_text: &str,
) -> Result<ChoiceRow, DbError> {
    let row = sqlx::query_as::<_, ChoiceRow>(
        "UPDATE choices SET choice_text = ?2
         WHERE id = ?1
         RETURNING id, poll_id, choice_text",
    )
    .bind(id)
    .bind(choice_text)
    .fetch_optional(pool)
    .await?;
    row.ok_or(DbError::NotFound)
}

pub async fn delete_choice(pool: &DbPool, id: i64) -> Result<(), DbError> {
    sqlx::query("DELETE FROM choices WHERE id = ?1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Every choice of the poll with its vote count, in creation order.
pub async fn get_choice_tallies(
    pool: &DbPool,
    poll_id: i64,
) -> Result<Vec<ChoiceTallyRow>, DbError> {
    let rows = sqlx::query_as::<_, ChoiceTallyRow>(
        "SELECT c.id, c.choice_text, COUNT(v.id) AS votes
         FROM choices c
         LEFT JOIN votes v ON v.choice_id = c.id
         WHERE c.poll_id = ?1
         GROUP BY c.id, c.choice_text
         ORDER BY c.id",
    )
    .bind(poll_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
