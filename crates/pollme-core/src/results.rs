use crate::error::CoreError;
use pollme_db::choices::ChoiceTallyRow;
use pollme_db::DbPool;
use pollme_models::poll::{ChoiceResult, PollResults};

fn percentage(votes: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    let raw = votes as f64 * 100.0 / total as f64;
    (raw * 100.0).round() / 100.0
}

pub fn tally(poll_id: i64, rows: Vec<ChoiceTallyRow>) -> PollResults {
    let total_votes: i64 = rows.iter().map(|r| r.votes).sum();
    let choices = rows
        .into_iter()
        .map(|r| ChoiceResult {
            id: r.id,
            percentage: percentage(r.votes, total_votes),
            choice_text: r.choice_text,
            votes: r.votes,
        })
        .collect();
    PollResults {
        poll_id,
        total_votes,
        choices,
    }
}

pub async fn poll_results(pool: &DbPool, poll_id: i64) -> Result<PollResults, CoreError> {
    let rows = pollme_db::choices::get_choice_tallies(pool, poll_id).await?;
    Ok(tally(poll_id, rows))
}
