//! `/stats/*` — read-only overview plus the two retention maintenance
//! operations (cleanup, archive) and archive retrieval.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::Utc;

use mailagg_store::{ArchiveResult, CleanupResult, StatsOverview};

use crate::{
    dto::{ArchiveRequest, CleanupRequest, StatsOverviewQuery},
    error::Result,
    state::AppState,
};

pub async fn overview(
    State(state): State<AppState>,
    Query(query): Query<StatsOverviewQuery>,
) -> Result<Json<StatsOverview>> {
    let overview = state.store.stats_overview(query.days.unwrap_or(7)).await?;
    Ok(Json(overview))
}

pub async fn cleanup(
    State(state): State<AppState>,
    Json(body): Json<CleanupRequest>,
) -> Result<Json<CleanupResult>> {
    let settings = state.store.get_settings().await?;
    let keep_days = body.keep_days.or(settings.retention_keep_days);
    let keep_per_account = body
        .keep_per_account
        .or(settings.retention_keep_per_account);

    let result = state
        .store
        .cleanup_retention(keep_days, keep_per_account)
        .await?;
    Ok(Json(result))
}

pub async fn archive(
    State(state): State<AppState>,
    Json(body): Json<ArchiveRequest>,
) -> Result<Json<ArchiveResult>> {
    let settings = state.store.get_settings().await?;
    let keep_days = body.keep_days.or(settings.retention_keep_days);
    let keep_per_account = body
        .keep_per_account
        .or(settings.retention_keep_per_account);
    let name = body
        .name
        .unwrap_or_else(|| format!("archive-{}", Utc::now().format("%Y%m%d%H%M%S")));

    let result = state
        .store
        .archive_retention(&name, keep_days, keep_per_account)
        .await?;
    Ok(Json(result))
}

pub async fn get_archive(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<serde_json::Value>> {
    let payload = state.store.get_archive(&name).await?;
    let value: serde_json::Value = serde_json::from_str(&payload)
        .map_err(|e| crate::error::AppError::Invalid(e.to_string()))?;
    Ok(Json(value))
}
