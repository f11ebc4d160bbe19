pub mod error;
pub mod flash;
pub mod forms;
pub mod middleware;
pub mod routes;
pub mod views;

use axum::{
    routing::{get, post},
    Router,
};
use pollme_core::AppState;

use routes::{accounts, choices, polls, votes};

pub fn build_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(accounts::health))
        // Polls
        .route("/polls/list/", get(polls::list_polls))
        .route("/polls/list/user/", get(polls::list_user_polls))
        .route("/polls/add/", get(polls::add_poll_form).post(polls::add_poll))
        .route(
            "/polls/edit/{poll_id}/",
            get(polls::edit_poll_form).post(polls::edit_poll),
        )
        .route(
            "/polls/delete/{poll_id}/",
            get(polls::delete_poll).post(polls::delete_poll),
        )
        .route(
            "/polls/end/{poll_id}/",
            get(polls::end_poll).post(polls::end_poll),
        )
        .route("/polls/{poll_id}/", get(polls::poll_detail))
        // Choices
        .route(
            "/polls/edit/{poll_id}/choice/add/",
            get(choices::add_choice_form).post(choices::add_choice),
        )
        .route(
            "/polls/edit/choice/{choice_id}/",
            get(choices::edit_choice_form).post(choices::edit_choice),
        )
        .route(
            "/polls/delete/choice/{choice_id}/",
            get(choices::delete_choice).post(choices::delete_choice),
        )
        // Votes
        .route("/polls/{poll_id}/vote/", post(votes::vote))
        // Accounts
        .route("/accounts/register/", post(accounts::register))
        .route("/accounts/login/", post(accounts::login))
        .route("/accounts/logout/", post(accounts::logout))
}
