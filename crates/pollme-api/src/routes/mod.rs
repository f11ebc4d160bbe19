pub mod accounts;
pub mod choices;
pub mod polls;
pub mod votes;

use pollme_core::permissions::{ChoiceAccess, PollAccess};
use pollme_core::AppState;
use pollme_db::choices::ChoiceRow;
use pollme_db::polls::PollRow;

use crate::error::ApiError;

/// The poll if `user_id` owns it, `None` if someone else does.
/// An unknown id is a 404.
pub(crate) async fn owned_poll(
    state: &AppState,
    poll_id: i64,
    user_id: i64,
) -> Result<Option<PollRow>, ApiError> {
    match pollme_core::permissions::resolve_owned_poll(&state.db, poll_id, user_id).await? {
        PollAccess::Found(poll) => Ok(Some(poll)),
        PollAccess::Forbidden => Ok(None),
        PollAccess::NotFound => Err(ApiError::NotFound),
    }
}

/// Same as [`owned_poll`], resolved through the choice's parent poll.
pub(crate) async fn owned_choice(
    state: &AppState,
    choice_id: i64,
    user_id: i64,
) -> Result<Option<(ChoiceRow, PollRow)>, ApiError> {
    match pollme_core::permissions::resolve_owned_choice(&state.db, choice_id, user_id).await? {
        ChoiceAccess::Found { choice, poll } => Ok(Some((choice, poll))),
        ChoiceAccess::Forbidden => Ok(None),
        ChoiceAccess::NotFound => Err(ApiError::NotFound),
    }
}
