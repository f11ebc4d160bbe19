use axum::{
    response::{IntoResponse, Redirect, Response},
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use pollme_db::choices::ChoiceRow;
use pollme_models::notification::Notification;
use pollme_models::poll::{Choice, Poll, PollResults};
use serde_json::{json, Map, Value};

use crate::flash;

pub const LIST_VIEW: &str = "polls/polls_list";
pub const ADD_POLL_VIEW: &str = "polls/add_poll";
pub const EDIT_POLL_VIEW: &str = "polls/poll_edit";
pub const CHOICE_VIEW: &str = "polls/add_choice";
pub const DETAIL_VIEW: &str = "polls/poll_detail";
pub const RESULT_VIEW: &str = "polls/poll_result";

pub fn list_path() -> &'static str {
    "/polls/list/"
}

pub fn edit_path(poll_id: i64) -> String {
    format!("/polls/edit/{poll_id}/")
}

pub fn detail_path(poll_id: i64) -> String {
    format!("/polls/{poll_id}/")
}

fn notification_json(n: &Notification) -> Value {
    json!({
        "level": n.level,
        "message": n.message,
        "tags": n.level.tags(),
    })
}

/// Render a view document, draining any queued notifications into it.
///
/// `context` must be a JSON object; its keys sit beside `view` and
/// `messages` at the top level.
pub fn render(jar: CookieJar, view: &str, context: Value) -> Response {
    let (jar, pending) = flash::take(jar);

    let mut body = Map::new();
    body.insert("view".into(), json!(view));
    body.insert(
        "messages".into(),
        Value::Array(pending.iter().map(notification_json).collect()),
    );
    if let Value::Object(fields) = context {
        body.extend(fields);
    }

    (jar, Json(Value::Object(body))).into_response()
}

pub fn redirect(jar: CookieJar, to: &str) -> Response {
    (jar, Redirect::to(to)).into_response()
}

/// Queue `notification` and redirect.
pub fn redirect_with(jar: CookieJar, to: &str, notification: Notification) -> Response {
    redirect(flash::push(jar, notification), to)
}

pub fn poll_json(poll: impl Into<Poll>) -> Value {
    json!(poll.into())
}

pub fn choices_json(choices: Vec<ChoiceRow>) -> Value {
    json!(choices.into_iter().map(Choice::from).collect::<Vec<_>>())
}

pub fn render_results(jar: CookieJar, poll: Poll, results: PollResults) -> Response {
    render(
        jar,
        RESULT_VIEW,
        json!({
            "poll": poll,
            "results": results,
        }),
    )
}
