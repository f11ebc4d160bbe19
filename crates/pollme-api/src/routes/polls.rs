use axum::{
    extract::{RawQuery, State},
    response::Response,
    Form,
};
use axum_extra::extract::cookie::CookieJar;
use pollme_core::listing::{ListParams, PollListing};
use pollme_core::AppState;
use pollme_models::notification::Notification;
use pollme_models::permissions::Permissions;
use pollme_models::poll::Poll;
use serde_json::json;

use super::owned_poll;
use crate::error::ApiError;
use crate::forms::{form_json, EditPollForm, FormErrors, PollAddForm};
use crate::middleware::{AuthUser, Id};
use crate::views::{self, list_path};

fn listing_context(listing: PollListing) -> serde_json::Value {
    json!({
        "polls": listing.polls,
        "params": listing.params,
        "search_term": listing.search_term,
    })
}

pub async fn list_polls(
    State(state): State<AppState>,
    _auth: AuthUser,
    jar: CookieJar,
    RawQuery(query): RawQuery,
) -> Result<Response, ApiError> {
    let params = ListParams::from_query(query.as_deref());
    let listing = pollme_core::listing::list_polls(&state.db, &params, None).await?;
    Ok(views::render(jar, views::LIST_VIEW, listing_context(listing)))
}

pub async fn list_user_polls(
    State(state): State<AppState>,
    auth: AuthUser,
    jar: CookieJar,
    RawQuery(query): RawQuery,
) -> Result<Response, ApiError> {
    let params = ListParams::from_query(query.as_deref());
    let listing =
        pollme_core::listing::list_polls(&state.db, &params, Some(auth.user_id)).await?;
    Ok(views::render(jar, views::LIST_VIEW, listing_context(listing)))
}

pub async fn add_poll_form(_auth: AuthUser, jar: CookieJar) -> Response {
    views::render(
        jar,
        views::ADD_POLL_VIEW,
        json!({ "form": form_json(&PollAddForm::default(), &FormErrors::default()) }),
    )
}

pub async fn add_poll(
    State(state): State<AppState>,
    auth: AuthUser,
    jar: CookieJar,
    Form(form): Form<PollAddForm>,
) -> Result<Response, ApiError> {
    if !pollme_core::permissions::has_permission(auth.permissions, Permissions::ADD_POLL) {
        return Ok(views::redirect_with(
            jar,
            list_path(),
            Notification::error("Sorry but you don't have permission to do that!"),
        ));
    }

    let new_poll = match form.validate() {
        Ok(new_poll) => new_poll,
        Err(errors) => {
            return Ok(views::render(
                jar,
                views::ADD_POLL_VIEW,
                json!({ "form": form_json(&form, &errors) }),
            ));
        }
    };

    let poll = pollme_db::polls::create_poll(
        &state.db,
        auth.user_id,
        &new_poll.text,
        &[new_poll.choice1.as_str(), new_poll.choice2.as_str()],
    )
    .await?;
    tracing::info!(poll_id = poll.id, owner_id = auth.user_id, "poll created");

    Ok(views::redirect_with(
        jar,
        list_path(),
        Notification::success("Poll & Choices added successfully."),
    ))
}

pub async fn edit_poll_form(
    State(state): State<AppState>,
    auth: AuthUser,
    Id(poll_id): Id,
    jar: CookieJar,
) -> Result<Response, ApiError> {
    let Some(poll) = owned_poll(&state, poll_id, auth.user_id).await? else {
        return Ok(views::redirect_with(
            jar,
            list_path(),
            Notification::error("You don't have permission to edit this Poll!"),
        ));
    };

    let choices = pollme_db::choices::get_poll_choices(&state.db, poll.id).await?;
    let form = EditPollForm {
        text: Some(poll.text.clone()),
    };
    Ok(views::render(
        jar,
        views::EDIT_POLL_VIEW,
        json!({
            "form": form_json(&form, &FormErrors::default()),
            "poll": views::poll_json(poll),
            "choices": views::choices_json(choices),
        }),
    ))
}

pub async fn edit_poll(
    State(state): State<AppState>,
    auth: AuthUser,
    Id(poll_id): Id,
    jar: CookieJar,
    Form(form): Form<EditPollForm>,
) -> Result<Response, ApiError> {
    let Some(poll) = owned_poll(&state, poll_id, auth.user_id).await? else {
        return Ok(views::redirect(jar, list_path()));
    };

    let text = match form.validate() {
        Ok(text) => text,
        Err(errors) => {
            let choices = pollme_db::choices::get_poll_choices(&state.db, poll.id).await?;
            return Ok(views::render(
                jar,
                views::EDIT_POLL_VIEW,
                json!({
                    "form": form_json(&form, &errors),
                    "poll": views::poll_json(poll),
                    "choices": views::choices_json(choices),
                }),
            ));
        }
    };

    pollme_db::polls::update_poll_text(&state.db, poll.id, &text).await?;
    Ok(views::redirect_with(
        jar,
        list_path(),
        Notification::success("Poll Updated successfully."),
    ))
}

pub async fn delete_poll(
    State(state): State<AppState>,
    auth: AuthUser,
    Id(poll_id): Id,
    jar: CookieJar,
) -> Result<Response, ApiError> {
    let Some(poll) = owned_poll(&state, poll_id, auth.user_id).await? else {
        return Ok(views::redirect(jar, list_path()));
    };

    pollme_db::polls::delete_poll(&state.db, poll.id).await?;
    tracing::info!(poll_id = poll.id, "poll deleted");
    Ok(views::redirect_with(
        jar,
        list_path(),
        Notification::success("Poll Deleted successfully."),
    ))
}

/// Ending an already-ended poll is a no-op that still shows the results.
pub async fn end_poll(
    State(state): State<AppState>,
    auth: AuthUser,
    Id(poll_id): Id,
    jar: CookieJar,
) -> Result<Response, ApiError> {
    let Some(poll) = owned_poll(&state, poll_id, auth.user_id).await? else {
        return Ok(views::redirect(jar, list_path()));
    };

    if pollme_db::polls::end_poll(&state.db, poll.id).await? {
        tracing::info!(poll_id = poll.id, "poll ended");
    }

    let poll = pollme_db::polls::get_poll(&state.db, poll.id)
        .await?
        .ok_or(ApiError::NotFound)?;
    let results = pollme_core::results::poll_results(&state.db, poll.id).await?;
    Ok(views::render_results(jar, Poll::from(poll), results))
}

/// Voting form while the poll is active, results once it has ended.
pub async fn poll_detail(
    State(state): State<AppState>,
    Id(poll_id): Id,
    jar: CookieJar,
) -> Result<Response, ApiError> {
    let poll = pollme_db::polls::get_poll(&state.db, poll_id)
        .await?
        .ok_or(ApiError::NotFound)?;

    if !poll.active {
        let results = pollme_core::results::poll_results(&state.db, poll.id).await?;
        return Ok(views::render_results(jar, Poll::from(poll), results));
    }

    let choices = pollme_db::choices::get_poll_choices(&state.db, poll.id).await?;
    Ok(views::render(
        jar,
        views::DETAIL_VIEW,
        json!({
            "poll": views::poll_json(poll),
            "choices": views::choices_json(choices),
        }),
    ))
}
