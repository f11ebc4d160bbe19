pub mod auth;
pub mod error;
pub mod listing;
pub mod permissions;
pub mod results;
pub mod voting;

use pollme_db::DbPool;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: AppConfig,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub jwt_secret: String,
    pub jwt_expiry_seconds: u64,
    /// Where unauthenticated requests to login-gated actions are sent.
    pub login_url: String,
    /// Give newly registered accounts the `ADD_POLL` grant.
    pub grant_add_poll_on_register: bool,
    /// Mark auth cookies `Secure`. Off for plain-http local setups.
    pub secure_cookies: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            jwt_expiry_seconds: 60 * 60 * 24 * 7,
            login_url: "/accounts/login/".to_string(),
            grant_add_poll_on_register: true,
            secure_cookies: false,
        }
    }
}
