use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
    Router,
};
use axum_extra::extract::cookie::Cookie;
use pollme_api::flash::{self, FLASH_COOKIE};
use pollme_core::{AppConfig, AppState};
use pollme_db::DbPool;
use pollme_models::notification::{Level, Notification};
use pollme_models::permissions::Permissions;
use serde_json::Value;
use tower::ServiceExt;

const SECRET: &str = "test-secret";

async fn setup() -> (Router, DbPool) {
    let pool = pollme_db::create_pool("sqlite::memory:", 1).await.unwrap();
    pollme_db::run_migrations(&pool).await.unwrap();
    let state = AppState {
        db: pool.clone(),
        config: AppConfig {
            jwt_secret: SECRET.to_string(),
            ..AppConfig::default()
        },
    };
    (pollme_api::build_router().with_state(state), pool)
}

/// Create an account directly and mint a token for it.
async fn user(pool: &DbPool, username: &str, permissions: Permissions) -> (i64, String) {
    let id = pollme_db::users::create_user(pool, username, "hash", permissions.bits())
        .await
        .unwrap()
        .id;
    let token = pollme_core::auth::create_token(id, SECRET, 3600).unwrap();
    (id, token)
}

async fn poll_with_choices(pool: &DbPool, owner: i64, text: &str) -> (i64, Vec<i64>) {
    let poll = pollme_db::polls::create_poll(pool, owner, text, &["Yes", "No"])
        .await
        .unwrap();
    let choices = pollme_db::choices::get_poll_choices(pool, poll.id)
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.id)
        .collect();
    (poll.id, choices)
}

fn get(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

fn post_form(uri: &str, token: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: &Router, req: Request<Body>) -> Response<Body> {
    app.clone().oneshot(req).await.unwrap()
}

async fn json_body(resp: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn location(resp: &Response<Body>) -> &str {
    resp.headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
}

fn set_cookie(resp: &Response<Body>, name: &str) -> Option<String> {
    resp.headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|raw| Cookie::parse(raw.to_string()).ok())
        .find(|c| c.name() == name)
        .map(|c| c.value().to_string())
}

fn flashed(resp: &Response<Body>) -> Vec<Notification> {
    set_cookie(resp, FLASH_COOKIE)
        .map(|value| flash::decode(&value))
        .unwrap_or_default()
}

fn assert_redirect(resp: &Response<Body>, to: &str) {
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(resp), to);
}

#[tokio::test]
async fn anonymous_requests_go_to_login() {
    let (app, _pool) = setup().await;
    let req = Request::builder()
        .uri("/polls/list/?page=2")
        .body(Body::empty())
        .unwrap();
    let resp = send(&app, req).await;
    assert_redirect(&resp, "/accounts/login/?next=%2Fpolls%2Flist%2F%3Fpage%3D2");

    let resp = send(&app, get("/polls/list/", "not-a-token")).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn add_poll_creates_poll_and_choices() {
    let (app, pool) = setup().await;
    let (owner, token) = user(&pool, "owner", Permissions::ADD_POLL).await;

    let resp = send(
        &app,
        post_form("/polls/add/", &token, "text=Best+color%3F&choice1=Red&choice2=Blue"),
    )
    .await;
    assert_redirect(&resp, "/polls/list/");
    assert_eq!(
        flashed(&resp),
        vec![Notification::success("Poll & Choices added successfully.")]
    );

    let listing = pollme_db::polls::list_polls(
        &pool,
        &pollme_db::polls::PollFilter {
            owner_id: Some(owner),
            ..Default::default()
        },
        10,
        0,
    )
    .await
    .unwrap();
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0].text, "Best color?");
    let choices = pollme_db::choices::get_poll_choices(&pool, listing[0].id)
        .await
        .unwrap();
    let texts: Vec<&str> = choices.iter().map(|c| c.choice_text.as_str()).collect();
    assert_eq!(texts, vec!["Red", "Blue"]);
}

#[tokio::test]
async fn add_poll_without_permission_is_refused() {
    let (app, pool) = setup().await;
    let (_, token) = user(&pool, "viewer", Permissions::empty()).await;

    let resp = send(
        &app,
        post_form("/polls/add/", &token, "text=Q&choice1=a&choice2=b"),
    )
    .await;
    assert_redirect(&resp, "/polls/list/");
    let messages = flashed(&resp);
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].level, Level::Error);
    assert_eq!(
        messages[0].message,
        "Sorry but you don't have permission to do that!"
    );

    let count = pollme_db::polls::count_polls(&pool, &Default::default())
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn invalid_add_form_is_rerendered_with_errors() {
    let (app, pool) = setup().await;
    let (_, token) = user(&pool, "owner", Permissions::ADD_POLL).await;

    let resp = send(&app, post_form("/polls/add/", &token, "text=Q&choice1=a")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["view"], "polls/add_poll");
    assert_eq!(body["form"]["data"]["text"], "Q");
    assert_eq!(
        body["form"]["errors"]["choice2"][0],
        "This field is required."
    );
}

#[tokio::test]
async fn non_owner_cannot_edit_or_delete() {
    let (app, pool) = setup().await;
    let (owner, _) = user(&pool, "owner", Permissions::ADD_POLL).await;
    let (_, intruder) = user(&pool, "intruder", Permissions::ADD_POLL).await;
    let (poll_id, _) = poll_with_choices(&pool, owner, "Original").await;

    let resp = send(
        &app,
        post_form(&format!("/polls/edit/{poll_id}/"), &intruder, "text=Hijacked"),
    )
    .await;
    assert_redirect(&resp, "/polls/list/");
    assert!(flashed(&resp).is_empty());

    let resp = send(&app, get(&format!("/polls/delete/{poll_id}/"), &intruder)).await;
    assert_redirect(&resp, "/polls/list/");
    assert!(flashed(&resp).is_empty());

    let resp = send(&app, get(&format!("/polls/edit/{poll_id}/"), &intruder)).await;
    assert_redirect(&resp, "/polls/list/");
    assert_eq!(
        flashed(&resp),
        vec![Notification::error("You don't have permission to edit this Poll!")]
    );

    let poll = pollme_db::polls::get_poll(&pool, poll_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(poll.text, "Original");
}

#[tokio::test]
async fn non_owner_cannot_touch_choices_or_end() {
    let (app, pool) = setup().await;
    let (owner, _) = user(&pool, "owner", Permissions::ADD_POLL).await;
    let (_, intruder) = user(&pool, "intruder", Permissions::ADD_POLL).await;
    let (poll_id, choices) = poll_with_choices(&pool, owner, "Guarded").await;

    let resp = send(
        &app,
        post_form(
            &format!("/polls/edit/choice/{}/", choices[0]),
            &intruder,
            "choice_text=Hijacked",
        ),
    )
    .await;
    assert_redirect(&resp, "/polls/list/");
    assert!(flashed(&resp).is_empty());
    let choice = pollme_db::choices::get_choice(&pool, choices[0])
        .await
        .unwrap()
        .unwrap();
    assert_eq!(choice.choice_text, "Yes");

    let resp = send(
        &app,
        get(&format!("/polls/delete/choice/{}/", choices[1]), &intruder),
    )
    .await;
    assert_redirect(&resp, "/polls/list/");
    assert!(pollme_db::choices::get_choice(&pool, choices[1])
        .await
        .unwrap()
        .is_some());

    let resp = send(
        &app,
        post_form(
            &format!("/polls/edit/{poll_id}/choice/add/"),
            &intruder,
            "choice_text=Sneaky",
        ),
    )
    .await;
    assert_redirect(&resp, "/polls/list/");
    let remaining = pollme_db::choices::get_poll_choices(&pool, poll_id)
        .await
        .unwrap();
    assert_eq!(remaining.len(), 2);

    let resp = send(&app, get(&format!("/polls/end/{poll_id}/"), &intruder)).await;
    assert_redirect(&resp, "/polls/list/");
    let poll = pollme_db::polls::get_poll(&pool, poll_id)
        .await
        .unwrap()
        .unwrap();
    assert!(poll.active);
}

#[tokio::test]
async fn owner_edits_poll() {
    let (app, pool) = setup().await;
    let (owner, token) = user(&pool, "owner", Permissions::ADD_POLL).await;
    let (poll_id, _) = poll_with_choices(&pool, owner, "Original").await;

    let resp = send(&app, get(&format!("/polls/edit/{poll_id}/"), &token)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["view"], "polls/poll_edit");
    assert_eq!(body["form"]["data"]["text"], "Original");
    assert_eq!(body["choices"].as_array().unwrap().len(), 2);

    let resp = send(
        &app,
        post_form(&format!("/polls/edit/{poll_id}/"), &token, "text=Renamed"),
    )
    .await;
    assert_redirect(&resp, "/polls/list/");
    assert_eq!(
        flashed(&resp),
        vec![Notification::success("Poll Updated successfully.")]
    );
    let poll = pollme_db::polls::get_poll(&pool, poll_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(poll.text, "Renamed");
}

#[tokio::test]
async fn owner_delete_cascades_to_choices() {
    let (app, pool) = setup().await;
    let (owner, token) = user(&pool, "owner", Permissions::ADD_POLL).await;
    let (poll_id, _) = poll_with_choices(&pool, owner, "Doomed").await;

    let resp = send(
        &app,
        post_form(&format!("/polls/delete/{poll_id}/"), &token, ""),
    )
    .await;
    assert_redirect(&resp, "/polls/list/");
    assert_eq!(
        flashed(&resp),
        vec![Notification::success("Poll Deleted successfully.")]
    );
    assert!(pollme_db::polls::get_poll(&pool, poll_id)
        .await
        .unwrap()
        .is_none());
    assert!(pollme_db::choices::get_poll_choices(&pool, poll_id)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn unknown_poll_is_not_found() {
    let (app, pool) = setup().await;
    let (_, token) = user(&pool, "owner", Permissions::ADD_POLL).await;

    let resp = send(&app, get("/polls/999/", &token)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(resp).await["code"], "NOT_FOUND");

    let resp = send(&app, get("/polls/edit/999/", &token)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = send(&app, post_form("/polls/999/vote/", &token, "choice=1")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_ids_are_not_found() {
    let (app, pool) = setup().await;
    let (_, token) = user(&pool, "owner", Permissions::ADD_POLL).await;

    for uri in [
        "/polls/abc/",
        "/polls/99999999999999999999/",
        "/polls/edit/abc/",
        "/polls/end/1.5/",
        "/polls/edit/choice/abc/",
    ] {
        let resp = send(&app, get(uri, &token)).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(json_body(resp).await["code"], "NOT_FOUND", "{uri}");
    }

    let resp = send(&app, post_form("/polls/abc/vote/", &token, "choice=1")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn ending_a_poll_is_idempotent() {
    let (app, pool) = setup().await;
    let (owner, token) = user(&pool, "owner", Permissions::ADD_POLL).await;
    let (poll_id, _) = poll_with_choices(&pool, owner, "Closing").await;

    let body = json_body(send(&app, get(&format!("/polls/{poll_id}/"), &token)).await).await;
    assert_eq!(body["view"], "polls/poll_detail");

    for _ in 0..2 {
        let resp = send(&app, get(&format!("/polls/end/{poll_id}/"), &token)).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_body(resp).await;
        assert_eq!(body["view"], "polls/poll_result");
        assert_eq!(body["poll"]["active"], false);
    }

    let body = json_body(send(&app, get(&format!("/polls/{poll_id}/"), &token)).await).await;
    assert_eq!(body["view"], "polls/poll_result");
    assert_eq!(body["results"]["total_votes"], 0);
}

#[tokio::test]
async fn vote_is_recorded_once() {
    let (app, pool) = setup().await;
    let (owner, _) = user(&pool, "owner", Permissions::ADD_POLL).await;
    let (_, token) = user(&pool, "voter", Permissions::empty()).await;
    let (poll_id, choices) = poll_with_choices(&pool, owner, "Vote me").await;
    let vote_uri = format!("/polls/{poll_id}/vote/");

    let resp = send(
        &app,
        post_form(&vote_uri, &token, &format!("choice={}", choices[0])),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["view"], "polls/poll_result");
    assert_eq!(body["results"]["total_votes"], 1);
    assert_eq!(body["results"]["choices"][0]["percentage"], 100.0);
    assert_eq!(body["vote"]["choice_id"], choices[0]);

    let resp = send(
        &app,
        post_form(&vote_uri, &token, &format!("choice={}", choices[1])),
    )
    .await;
    assert_redirect(&resp, "/polls/list/");
    assert_eq!(
        flashed(&resp),
        vec![Notification::warning("You already voted this poll!")]
    );

    let tallies: Vec<i64> = pollme_db::choices::get_choice_tallies(&pool, poll_id)
        .await
        .unwrap()
        .iter()
        .map(|t| t.votes)
        .collect();
    assert_eq!(tallies, vec![1, 0]);
}

#[tokio::test]
async fn vote_with_unknown_choice_writes_nothing() {
    let (app, pool) = setup().await;
    let (owner, _) = user(&pool, "owner", Permissions::ADD_POLL).await;
    let (voter, token) = user(&pool, "voter", Permissions::empty()).await;
    let (poll_id, _) = poll_with_choices(&pool, owner, "Vote me").await;
    let vote_uri = format!("/polls/{poll_id}/vote/");

    let resp = send(&app, post_form(&vote_uri, &token, "choice=9999")).await;
    assert_redirect(&resp, &format!("/polls/{poll_id}/"));
    assert_eq!(
        flashed(&resp),
        vec![Notification::warning("Choice does not exist")]
    );

    let resp = send(&app, post_form(&vote_uri, &token, "")).await;
    assert_redirect(&resp, &format!("/polls/{poll_id}/"));
    assert_eq!(
        flashed(&resp),
        vec![Notification::warning("No choice selected!")]
    );

    assert!(!pollme_db::votes::has_voted(&pool, voter, poll_id)
        .await
        .unwrap());
}

#[tokio::test]
async fn vote_on_ended_poll_is_recorded() {
    let (app, pool) = setup().await;
    let (owner, _) = user(&pool, "owner", Permissions::ADD_POLL).await;
    let (voter, token) = user(&pool, "voter", Permissions::empty()).await;
    let (poll_id, choices) = poll_with_choices(&pool, owner, "Closed").await;
    pollme_db::polls::end_poll(&pool, poll_id).await.unwrap();

    let resp = send(
        &app,
        post_form(
            &format!("/polls/{poll_id}/vote/"),
            &token,
            &format!("choice={}", choices[0]),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["view"], "polls/poll_result");
    assert_eq!(body["poll"]["active"], false);
    assert_eq!(body["results"]["total_votes"], 1);
    assert_eq!(body["vote"]["choice_id"], choices[0]);
    assert!(pollme_db::votes::has_voted(&pool, voter, poll_id)
        .await
        .unwrap());
}

#[tokio::test]
async fn list_searches_and_paginates() {
    let (app, pool) = setup().await;
    let (owner, token) = user(&pool, "owner", Permissions::ADD_POLL).await;
    for i in 1..=9 {
        pollme_db::polls::create_poll(&pool, owner, &format!("Poll {i}"), &[])
            .await
            .unwrap();
    }
    pollme_db::polls::create_poll(&pool, owner, "First Poll", &[])
        .await
        .unwrap();

    let body = json_body(send(&app, get("/polls/list/", &token)).await).await;
    assert_eq!(body["view"], "polls/polls_list");
    assert_eq!(body["polls"]["items"].as_array().unwrap().len(), 6);
    assert_eq!(body["polls"]["num_pages"], 2);

    let body = json_body(send(&app, get("/polls/list/?page=2&name=1", &token)).await).await;
    assert_eq!(body["polls"]["items"].as_array().unwrap().len(), 4);
    assert_eq!(body["params"], "name=1");

    let body = json_body(send(&app, get("/polls/list/?search=first", &token)).await).await;
    let items = body["polls"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["text"], "First Poll");
    assert_eq!(body["search_term"], "first");
}

#[tokio::test]
async fn user_list_only_shows_own_polls() {
    let (app, pool) = setup().await;
    let (owner, token) = user(&pool, "owner", Permissions::ADD_POLL).await;
    let (other, _) = user(&pool, "other", Permissions::ADD_POLL).await;
    poll_with_choices(&pool, owner, "Mine").await;
    poll_with_choices(&pool, other, "Theirs").await;

    let body = json_body(send(&app, get("/polls/list/user/", &token)).await).await;
    let items = body["polls"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["text"], "Mine");
}

#[tokio::test]
async fn rendered_view_drains_flash_messages() {
    let (app, pool) = setup().await;
    let (_, token) = user(&pool, "owner", Permissions::ADD_POLL).await;
    let queued = flash::encode(&[Notification::success("Poll Deleted successfully.")]);

    let req = Request::builder()
        .uri("/polls/list/")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::COOKIE, format!("{FLASH_COOKIE}={queued}"))
        .body(Body::empty())
        .unwrap();
    let resp = send(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(set_cookie(&resp, FLASH_COOKIE).as_deref(), Some(""));

    let body = json_body(resp).await;
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["message"], "Poll Deleted successfully.");
    assert_eq!(
        messages[0]["tags"],
        "alert alert-success alert-dismissible fade show"
    );
}

#[tokio::test]
async fn owner_manages_choices() {
    let (app, pool) = setup().await;
    let (owner, token) = user(&pool, "owner", Permissions::ADD_POLL).await;
    let (_, intruder) = user(&pool, "intruder", Permissions::ADD_POLL).await;
    let (poll_id, choices) = poll_with_choices(&pool, owner, "Choices").await;
    let edit_page = format!("/polls/edit/{poll_id}/");

    let resp = send(
        &app,
        post_form(
            &format!("/polls/edit/{poll_id}/choice/add/"),
            &token,
            "choice_text=Maybe",
        ),
    )
    .await;
    assert_redirect(&resp, &edit_page);
    assert_eq!(
        flashed(&resp),
        vec![Notification::success("Choice added successfully.")]
    );

    let choice_uri = format!("/polls/edit/choice/{}/", choices[0]);
    let resp = send(&app, get(&choice_uri, &intruder)).await;
    assert_redirect(&resp, "/polls/list/");
    assert_eq!(
        flashed(&resp),
        vec![Notification::error("You don't have permission to edit this Choice!")]
    );

    let body = json_body(send(&app, get(&choice_uri, &token)).await).await;
    assert_eq!(body["view"], "polls/add_choice");
    assert_eq!(body["edit_choice"], true);
    assert_eq!(body["form"]["data"]["choice_text"], "Yes");

    let resp = send(&app, post_form(&choice_uri, &token, "choice_text=Absolutely")).await;
    assert_redirect(&resp, &edit_page);
    let updated = pollme_db::choices::get_choice(&pool, choices[0])
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.choice_text, "Absolutely");

    let resp = send(
        &app,
        get(&format!("/polls/delete/choice/{}/", choices[1]), &token),
    )
    .await;
    assert_redirect(&resp, &edit_page);
    assert_eq!(
        flashed(&resp),
        vec![Notification::success("Choice Deleted successfully.")]
    );
    let remaining = pollme_db::choices::get_poll_choices(&pool, poll_id)
        .await
        .unwrap();
    assert_eq!(remaining.len(), 2);
}

#[tokio::test]
async fn register_login_and_use_cookie() {
    let (app, _pool) = setup().await;

    let resp = send(
        &app,
        post_json(
            "/accounts/register/",
            serde_json::json!({ "username": "alice", "password": "correct-horse" }),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = json_body(resp).await;
    assert_eq!(body["user"]["username"], "alice");

    let resp = send(
        &app,
        post_json(
            "/accounts/login/",
            serde_json::json!({ "username": "alice", "password": "wrong-password" }),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = send(
        &app,
        post_json(
            "/accounts/login/",
            serde_json::json!({ "username": "alice", "password": "correct-horse" }),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let token = set_cookie(&resp, "pollme_token").unwrap();
    let body = json_body(resp).await;
    assert_eq!(body["token"], token.as_str());

    let req = Request::builder()
        .uri("/polls/add/")
        .header(header::COOKIE, format!("pollme_token={token}"))
        .body(Body::empty())
        .unwrap();
    let resp = send(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["view"], "polls/add_poll");

    let req = Request::builder()
        .method("POST")
        .uri("/accounts/logout/")
        .header(header::COOKIE, format!("pollme_token={token}"))
        .body(Body::empty())
        .unwrap();
    let resp = send(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert_eq!(set_cookie(&resp, "pollme_token").as_deref(), Some(""));
}
