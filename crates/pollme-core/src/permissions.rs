use crate::error::CoreError;
use pollme_db::choices::ChoiceRow;
use pollme_db::polls::PollRow;
use pollme_db::DbPool;
use pollme_models::permissions::Permissions;

/// Result of resolving a poll for an owner-only action.
#[derive(Debug)]
pub enum PollAccess {
    Found(PollRow),
    Forbidden,
    NotFound,
}

/// Result of resolving a choice through its parent poll's owner.
#[derive(Debug)]
pub enum ChoiceAccess {
    Found { choice: ChoiceRow, poll: PollRow },
    Forbidden,
    NotFound,
}

pub fn is_owner(poll: &PollRow, user_id: i64) -> bool {
    poll.owner_id == user_id
}

/// Check if permission set contains every required flag
pub fn has_permission(perms: Permissions, required: Permissions) -> bool {
    perms.contains(required)
}

pub async fn resolve_owned_poll(
    pool: &DbPool,
    poll_id: i64,
    user_id: i64,
) -> Result<PollAccess, CoreError> {
    let Some(poll) = pollme_db::polls::get_poll(pool, poll_id).await? else {
        return Ok(PollAccess::NotFound);
    };
    if !is_owner(&poll, user_id) {
        tracing::debug!(poll_id, user_id, "poll access denied: not the owner");
        return Ok(PollAccess::Forbidden);
    }
    Ok(PollAccess::Found(poll))
}

pub async fn resolve_owned_choice(
    pool: &DbPool,
    choice_id: i64,
    user_id: i64,
) -> Result<ChoiceAccess, CoreError> {
    let Some(choice) = pollme_db::choices::get_choice(pool, choice_id).await? else {
        return Ok(ChoiceAccess::NotFound);
    };
    match resolve_owned_poll(pool, choice.poll_id, user_id).await? {
        PollAccess::Found(poll) => Ok(ChoiceAccess::Found { choice, poll }),
        PollAccess::Forbidden => Ok(ChoiceAccess::Forbidden),
        PollAccess::NotFound => Ok(ChoiceAccess::NotFound),
    }
}
