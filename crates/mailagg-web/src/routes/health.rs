//! `GET /health` — aggregate poller liveness across every known account,
//! used by process supervisors rather than the admin UI.

use axum::{Json, extract::State};

use crate::{
    dto::{HealthResponse, PollerHealth},
    error::Result,
    state::AppState,
};

pub async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>> {
    let statuses = state.store.list_poll_status().await?;

    let last_started_at = statuses.iter().filter_map(|s| s.last_started_at).max();
    let last_finished_at = statuses.iter().filter_map(|s| s.last_finished_at).max();

    Ok(Json(HealthResponse {
        poller: PollerHealth {
            last_started_at,
            last_finished_at,
        },
    }))
}
