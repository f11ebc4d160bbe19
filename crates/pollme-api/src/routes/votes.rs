use axum::{
    extract::State,
    response::Response,
    Form,
};
use axum_extra::extract::cookie::CookieJar;
use pollme_core::voting::VoteOutcome;
use pollme_core::AppState;
use pollme_models::notification::Notification;
use pollme_models::poll::{Poll, Vote};
use serde_json::json;

use crate::error::ApiError;
use crate::forms::VoteForm;
use crate::middleware::{AuthUser, Id};
use crate::views::{self, detail_path, list_path};

pub async fn vote(
    State(state): State<AppState>,
    auth: AuthUser,
    Id(poll_id): Id,
    jar: CookieJar,
    Form(form): Form<VoteForm>,
) -> Result<Response, ApiError> {
    let poll = pollme_db::polls::get_poll(&state.db, poll_id)
        .await?
        .ok_or(ApiError::NotFound)?;

    let outcome =
        pollme_core::voting::cast_vote(&state.db, &poll, auth.user_id, form.choice.as_deref())
            .await?;

    let detail = detail_path(poll.id);
    let response = match outcome {
        VoteOutcome::Recorded(vote) => {
            let poll = pollme_db::polls::get_poll(&state.db, poll.id)
                .await?
                .ok_or(ApiError::NotFound)?;
            let results = pollme_core::results::poll_results(&state.db, poll.id).await?;
            views::render(
                jar,
                views::RESULT_VIEW,
                json!({
                    "poll": Poll::from(poll),
                    "results": results,
                    "vote": Vote::from(vote),
                }),
            )
        }
        VoteOutcome::AlreadyVoted => views::redirect_with(
            jar,
            list_path(),
            Notification::warning("You already voted this poll!"),
        ),
        VoteOutcome::NoChoiceSelected => {
            views::redirect_with(jar, &detail, Notification::warning("No choice selected!"))
        }
        VoteOutcome::ChoiceMissing => {
            views::redirect_with(jar, &detail, Notification::warning("Choice does not exist"))
        }
    };
    Ok(response)
}
