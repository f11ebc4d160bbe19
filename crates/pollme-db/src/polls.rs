use crate::{DbError, DbPool};
use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite};

const POLL_SELECT: &str = "SELECT p.id, p.text, p.owner_id, u.username AS owner_username,
        p.pub_date, p.active,
        (SELECT COUNT(*) FROM votes v WHERE v.poll_id = p.id) AS vote_count
     FROM polls p
     JOIN users u ON u.id = p.owner_id";

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PollRow {
    pub id: i64,
    pub text: String,
    pub owner_id: i64,
    pub owner_username: String,
    pub pub_date: DateTime<Utc>,
    pub active: bool,
    pub vote_count: i64,
}

impl From<PollRow> for pollme_models::poll::Poll {
    fn from(row: PollRow) -> Self {
        Self {
            id: row.id,
            text: row.text,
            owner_id: row.owner_id,
            owner_username: row.owner_username,
            pub_date: row.pub_date,
            active: row.active,
            vote_count: row.vote_count,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PollOrder {
    /// Most recently published first.
    #[default]
    Newest,
    Text,
    PubDate,
    VoteCount,
}

impl PollOrder {
    fn order_by(self) -> &'static str {
        match self {
            PollOrder::Newest => " ORDER BY p.pub_date DESC, p.id DESC",
            PollOrder::Text => " ORDER BY p.text ASC, p.id ASC",
            PollOrder::PubDate => " ORDER BY p.pub_date ASC, p.id ASC",
            PollOrder::VoteCount => " ORDER BY vote_count ASC, p.id ASC",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PollFilter {
    pub owner_id: Option<i64>,
    /// Case-insensitive substring match on the poll text.
    pub search: Option<String>,
    pub order: PollOrder,
}

fn push_conditions(qb: &mut QueryBuilder<'_, Sqlite>, filter: &PollFilter) {
    let mut keyword = " WHERE ";
    if let Some(owner_id) = filter.owner_id {
        qb.push(keyword).push("p.owner_id = ").push_bind(owner_id);
        keyword = " AND ";
    }
    if let Some(search) = &filter.search {
        qb.push(keyword)
            .push("instr(lower(p.text), lower(")
            .push_bind(search.clone())
            .push(")) > 0");
    }
}

/// Insert a poll and its initial choices in one transaction.
pub async fn create_poll(
    pool: &DbPool,
    owner_id: i64,
    text: &str,
    choices: &[&str],
) -> Result<PollRow, DbError> {
    let mut tx = pool.begin().await?;
    let (id,): (i64,) =
        sqlx::query_as("INSERT INTO polls (owner_id, text) VALUES (?1, ?2) RETURNING id")
            .bind(owner_id)
            .bind(text)
            .fetch_one(&mut *tx)
            .await?;

    for choice_text in choices {
        sqlx::query("INSERT INTO choices (poll_id, choice_text) VALUES (?1, ?2)")
            .bind(id)
            .bind(*choice_text)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    get_poll(pool, id).await?.ok_or(DbError::NotFound)
}

pub async fn get_poll(pool: &DbPool, id: i64) -> Result<Option<PollRow>, DbError> {
    let row = sqlx::query_as::<_, PollRow>(&format!("{POLL_SELECT} WHERE p.id = ?1"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn update_poll_text(pool: &DbPool, id: i64, text: &str) -> Result<PollRow, DbError> {
    let result = sqlx::query("UPDATE polls SET text = ?2 WHERE id = ?1")
        .bind(id)
        .bind(text)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    get_poll(pool, id).await?.ok_or(DbError::NotFound)
}

/// Mark a poll as ended. Returns `false` when it was already inactive.
pub async fn end_poll(pool: &DbPool, id: i64) -> Result<bool, DbError> {
    let result = sqlx::query("UPDATE polls SET active = 0 WHERE id = ?1 AND active = 1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete_poll(pool: &DbPool, id: i64) -> Result<(), DbError> {
    sqlx::query("DELETE FROM polls WHERE id = ?1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn count_polls(pool: &DbPool, filter: &PollFilter) -> Result<i64, DbError> {
    let mut qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM polls p");
    push_conditions(&mut qb, filter);
    let count: i64 = qb.build_query_scalar().fetch_one(pool).await?;
    Ok(count)
}

pub async fn list_polls(
    pool: &DbPool,
    filter: &PollFilter,
    limit: i64,
    offset: i64,
) -> Result<Vec<PollRow>, DbError> {
    let mut qb = QueryBuilder::<Sqlite>::new(POLL_SELECT);
    push_conditions(&mut qb, filter);
    qb.push(filter.order.order_by());
    qb.push(" LIMIT ").push_bind(limit);
    qb.push(" OFFSET ").push_bind(offset);
    let rows = qb.build_query_as::<PollRow>().fetch_all(pool).await?;
    Ok(rows)
}
