//! `/settings/*` — global configuration plus the backup export/import pair.

use axum::{Json, extract::State};

use mailagg_store::{ExportDocument, Settings, SettingsPatch};

use crate::{dto::SettingsPatchRequest, error::Result, state::AppState};

pub async fn get(State(state): State<AppState>) -> Result<Json<Settings>> {
    let settings = state.store.get_settings().await?;
    Ok(Json(settings))
}

pub async fn patch(
    State(state): State<AppState>,
    Json(body): Json<SettingsPatchRequest>,
) -> Result<Json<Settings>> {
    let settings = state
        .store
        .patch_settings(SettingsPatch {
            telegram_bot_token: body.telegram_bot_token,
            telegram_chat_id: body.telegram_chat_id,
            poll_interval_seconds: body.poll_interval_seconds,
            webhook_url: body.webhook_url,
            api_token: body.api_token,
            retention_keep_days: body.retention_keep_days,
            retention_keep_per_account: body.retention_keep_per_account,
            mirror_mark_read_to_server: body.mirror_mark_read_to_server,
        })
        .await?;
    Ok(Json(settings))
}

pub async fn export(State(state): State<AppState>) -> Result<Json<ExportDocument>> {
    let doc = state.store.export_state().await?;
    Ok(Json(doc))
}

pub async fn import(
    State(state): State<AppState>,
    Json(doc): Json<ExportDocument>,
) -> Result<Json<serde_json::Value>> {
    state.store.import_state(doc).await?;
    Ok(Json(serde_json::json!({ "ok": true })))
}
