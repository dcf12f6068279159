use std::sync::Arc;

use anyhow::anyhow;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{AddressBook, User};
use crate::state::AppState;

use super::check_auth;

// PUT /api/users/:id
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertUserRequest {
    pub name: Option<String>,
    pub address_book: Option<AddressBook>,
}

pub async fn upsert_user(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<UpsertUserRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let user = User {
        id,
        name: body.name,
        address_book: body.address_book,
    };

    let db = state
        .db
        .lock()
        .map_err(|_| anyhow!("database lock poisoned"))?;
    queries::save_user(&db, &user)?;

    Ok(Json(serde_json::json!({ "ok": true })))
}
