use axum::{
    extract::State,
    response::Response,
    Form,
};
use axum_extra::extract::cookie::CookieJar;
use pollme_core::AppState;
use pollme_models::notification::Notification;
use pollme_models::poll::Choice;
use serde_json::json;

use super::{owned_choice, owned_poll};
use crate::error::ApiError;
use crate::forms::{form_json, ChoiceForm, FormErrors};
use crate::middleware::{AuthUser, Id};
use crate::views::{self, edit_path, list_path};

pub async fn add_choice_form(
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

    Ok(views::render(
        jar,
        views::CHOICE_VIEW,
        json!({
            "form": form_json(&ChoiceForm::default(), &FormErrors::default()),
            "poll": views::poll_json(poll),
        }),
    ))
}

pub async fn add_choice(
    State(state): State<AppState>,
    auth: AuthUser,
    Id(poll_id): Id,
    jar: CookieJar,
    Form(form): Form<ChoiceForm>,
) -> Result<Response, ApiError> {
    let Some(poll) = owned_poll(&state, poll_id, auth.user_id).await? else {
        return Ok(views::redirect(jar, list_path()));
    };

    let choice_text = match form.validate() {
        Ok(text) => text,
        Err(errors) => {
            return Ok(views::render(
                jar,
                views::CHOICE_VIEW,
                json!({
                    "form": form_json(&form, &errors),
                    "poll": views::poll_json(poll),
                }),
            ));
        }
    };

    let choice = pollme_db::choices::create_choice(&state.db, poll.id, &choice_text).await?;
    tracing::debug!(poll_id = poll.id, choice_id = choice.id, "choice added");
    Ok(views::redirect_with(
        jar,
        &edit_path(poll.id),
        Notification::success("Choice added successfully."),
    ))
}

pub async fn edit_choice_form(
    State(state): State<AppState>,
    auth: AuthUser,
    Id(choice_id): Id,
    jar: CookieJar,
) -> Result<Response, ApiError> {
    let Some((choice, _poll)) = owned_choice(&state, choice_id, auth.user_id).await? else {
        return Ok(views::redirect_with(
            jar,
            list_path(),
            Notification::error("You don't have permission to edit this Choice!"),
        ));
    };

    let form = ChoiceForm {
        choice_text: Some(choice.choice_text.clone()),
    };
    Ok(views::render(
        jar,
        views::CHOICE_VIEW,
        json!({
            "form": form_json(&form, &FormErrors::default()),
            "edit_choice": true,
            "choice": Choice::from(choice),
        }),
    ))
}

pub async fn edit_choice(
    State(state): State<AppState>,
    auth: AuthUser,
    Id(choice_id): Id,
    jar: CookieJar,
    Form(form): Form<ChoiceForm>,
) -> Result<Response, ApiError> {
    let Some((choice, poll)) = owned_choice(&state, choice_id, auth.user_id).await? else {
        return Ok(views::redirect(jar, list_path()));
    };

    let choice_text = match form.validate() {
        Ok(text) => text,
        Err(errors) => {
            return Ok(views::render(
                jar,
                views::CHOICE_VIEW,
                json!({
                    "form": form_json(&form, &errors),
                    "edit_choice": true,
                    "choice": Choice::from(choice),
                }),
            ));
        }
    };

    pollme_db::choices::update_choice_text(&state.db, choice.id, &choice_text).await?;
    Ok(views::redirect_with(
        jar,
        &edit_path(poll.id),
        Notification::success("Choice updated successfully."),
    ))
}

pub async fn delete_choice(
    State(state): State<AppState>,
    auth: AuthUser,
    Id(choice_id): Id,
    jar: CookieJar,
) -> Result<Response, ApiError> {
    let Some((choice, poll)) = owned_choice(&state, choice_id, auth.user_id).await? else {
        return Ok(views::redirect(jar, list_path()));
    };

    pollme_db::choices::delete_choice(&state.db, choice.id).await?;
    Ok(views::redirect_with(
        jar,
        &edit_path(poll.id),
        Notification::success("Choice Deleted successfully."),
    ))
}
