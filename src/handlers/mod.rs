pub mod health;
pub mod sms;
pub mod users;

use std::sync::Arc;

use axum::http::HeaderMap;
use axum::routing::{get, post, put};
use axum::Router;

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::state::AppState;

pub const SHOP_ID_HEADER: &str = "x-shop-id";

fn check_auth(headers: &HeaderMap, expected_token: &str) -> Result<(), AppError> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    if token.is_empty() || token != expected_token {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

/// The shop the caller is acting for: the `X-Shop-Id` header, else the
/// configured default shop.
fn current_shop_id(headers: &HeaderMap, config: &AppConfig) -> String {
    headers
        .get(SHOP_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| config.default_shop_id.clone())
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route(
            "/api/sms/settings",
            get(sms::get_settings).post(sms::save_settings),
        )
        .route("/api/sms/send", post(sms::send))
        .route("/api/users/:id", put(users::upsert_user))
        .with_state(state)
}
