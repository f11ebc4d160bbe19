//! One-shot notifications carried across a redirect in a cookie.
//!
//! Handlers that redirect push onto the jar; the next rendered view drains
//! it. The payload is the JSON list of pending notifications, base64url
//! encoded so it survives cookie value rules.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use pollme_models::notification::Notification;

pub const FLASH_COOKIE: &str = "messages";

pub fn pending(jar: &CookieJar) -> Vec<Notification> {
    jar.get(FLASH_COOKIE)
        .map(|c| decode(c.value()))
        .unwrap_or_default()
}

/// Cookie value back to notifications. Anything malformed reads as empty.
pub fn decode(value: &str) -> Vec<Notification> {
    URL_SAFE_NO_PAD
        .decode(value)
        .ok()
        .and_then(|bytes| serde_json::from_slice(&bytes).ok())
        .unwrap_or_default()
}

pub fn encode(notifications: &[Notification]) -> String {
    let json = serde_json::to_vec(notifications).unwrap_or_default();
    URL_SAFE_NO_PAD.encode(json)
}

pub fn push(jar: CookieJar, notification: Notification) -> CookieJar {
    let mut queued = pending(&jar);
    queued.push(notification);
    let cookie = Cookie::build((FLASH_COOKIE, encode(&queued)))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);
    jar.add(cookie)
}

/// Remove and return everything queued.
pub fn take(jar: CookieJar) -> (CookieJar, Vec<Notification>) {
    let queued = pending(&jar);
    if queued.is_empty() {
        return (jar, queued);
    }
    (jar.remove(Cookie::build(FLASH_COOKIE).path("/")), queued)
}
