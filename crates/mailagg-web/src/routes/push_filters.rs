//! `/accounts/{id}/telegram-rules` and `/accounts/telegram-rules/{id}` — the
//! allow/deny filters the delivery layer checks before a Telegram push goes
//! out.

use axum::{
    Json,
    extract::{Path, State},
};

use mailagg_store::{NewPushFilter, PushFilter};

use crate::{dto::PushFilterCreateRequest, error::Result, state::AppState};

pub async fn list(
    State(state): State<AppState>,
    Path(account_id): Path<i64>,
) -> Result<Json<Vec<PushFilter>>> {
    let filters = state.store.list_push_filters(account_id).await?;
    Ok(Json(filters))
}

pub async fn create(
    State(state): State<AppState>,
    Path(account_id): Path<i64>,
    Json(body): Json<PushFilterCreateRequest>,
) -> Result<Json<PushFilter>> {
    let filter = state
        .store
        .create_push_filter(NewPushFilter {
            account_id,
            field: body.field,
            mode: body.mode,
            value: body.value,
            rule_order: body.rule_order,
        })
        .await?;
    Ok(Json(filter))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>> {
    state.store.delete_push_filter(id).await?;
    Ok(Json(serde_json::json!({ "ok": true })))
}
