use crate::error::CoreError;
use pollme_db::polls::PollRow;
use pollme_db::votes::VoteRow;
use pollme_db::DbPool;

/// What happened to a submitted ballot. Only `Recorded` writes a row.
#[derive(Debug)]
pub enum VoteOutcome {
    Recorded(VoteRow),
    AlreadyVoted,
    NoChoiceSelected,
    ChoiceMissing,
}

pub async fn can_vote(pool: &DbPool, poll_id: i64, user_id: i64) -> Result<bool, CoreError> {
    Ok(!pollme_db::votes::has_voted(pool, user_id, poll_id).await?)
}

/// Apply the voting rules to a ballot for `poll`.
///
/// `choice` is the raw submitted value; blank counts as no selection, and
/// anything that does not name a choice of this poll counts as missing.
/// The already-voted check and the insert are separate statements, so two
/// concurrent ballots from one user can both be recorded.
pub async fn cast_vote(
    pool: &DbPool,
    poll: &PollRow,
    user_id: i64,
    choice: Option<&str>,
) -> Result<VoteOutcome, CoreError> {
    if !can_vote(pool, poll.id, user_id).await? {
        return Ok(VoteOutcome::AlreadyVoted);
    }
    let raw = match choice.map(str::trim) {
        Some(raw) if !raw.is_empty() => raw,
        _ => return Ok(VoteOutcome::NoChoiceSelected),
    };
    let Ok(choice_id) = raw.parse::<i64>() else {
        return Ok(VoteOutcome::ChoiceMissing);
    };
    let choice = match pollme_db::choices::get_choice(pool, choice_id).await? {
        Some(choice) if choice.poll_id == poll.id => choice,
        _ => return Ok(VoteOutcome::ChoiceMissing),
    };

    let vote = pollme_db::votes::create_vote(pool, user_id, poll.id, choice.id).await?;
    tracing::info!(poll_id = poll.id, choice_id = choice.id, user_id, "vote recorded");
    Ok(VoteOutcome::Recorded(vote))
}
