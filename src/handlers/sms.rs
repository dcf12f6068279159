use std::sync::Arc;

use anyhow::anyhow;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{SaveOutcome, SmsSettingsUpdate};
use crate::services::sms;
use crate::state::AppState;

use super::{check_auth, current_shop_id};

// POST /api/sms/settings
#[derive(Serialize)]
pub struct SaveSettingsResponse {
    ok: bool,
    result: SaveOutcome,
}

pub async fn save_settings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<SmsSettingsUpdate>,
) -> Result<Json<SaveSettingsResponse>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let shop_id = current_shop_id(&headers, &state.config);
    let result = {
        let db = state
            .db
            .lock()
            .map_err(|_| anyhow!("database lock poisoned"))?;
        sms::save_settings(&db, &shop_id, &body)?
    };

    Ok(Json(SaveSettingsResponse { ok: true, result }))
}

// GET /api/sms/settings
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsResponse {
    shop_id: String,
    sms_provider: Option<String>,
    api_key: Option<String>,
    api_token_configured: bool,
    sms_phone: Option<String>,
    updated_at: NaiveDateTime,
}

pub async fn get_settings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<SettingsResponse>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let shop_id = current_shop_id(&headers, &state.config);
    let settings = {
        let db = state
            .db
            .lock()
            .map_err(|_| anyhow!("database lock poisoned"))?;
        queries::get_sms_settings(&db, &shop_id)?
    };

    let settings =
        settings.ok_or_else(|| AppError::NotFound(format!("SMS settings for shop {shop_id}")))?;

    Ok(Json(SettingsResponse {
        shop_id: settings.shop_id,
        sms_provider: settings.sms_provider,
        api_key: settings.api_key,
        api_token_configured: settings.api_token.is_some_and(|t| !t.is_empty()),
        sms_phone: settings.sms_phone,
        updated_at: settings.updated_at,
    }))
}

// POST /api/sms/send
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendRequest {
    pub message: String,
    pub user_id: String,
    pub shop_id: String,
}

pub async fn send(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<SendRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    if body.user_id.trim().is_empty() || body.shop_id.trim().is_empty() {
        return Err(AppError::BadRequest(
            "userId and shopId must not be empty".to_string(),
        ));
    }

    // The outcome is logged by the dispatcher; nobody waits for it here.
    let _ = sms::spawn_send(state.clone(), body.message, body.user_id, body.shop_id);

    Ok((
        StatusCode::ACCEPTED,
        Json(serde_json::json!({ "queued": true })),
    ))
}
