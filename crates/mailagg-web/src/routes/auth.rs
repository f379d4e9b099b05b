//! `/auth/*` — password login, change, reset, and a config probe the admin
//! UI uses to decide whether to show the "forgot password" form.

use axum::{Json, extract::State};

use crate::{
    dto::{
        AuthConfigResponse, ChangePasswordRequest, LoginRequest, LoginResponse,
        ResetPasswordRequest,
    },
    error::Result,
    state::AppState,
};

pub async fn config(State(state): State<AppState>) -> Json<AuthConfigResponse> {
    Json(AuthConfigResponse {
        reset_enabled: state.auth.reset_enabled(),
    })
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let token = state.auth.login(&body.username, &body.password).await?;
    Ok(Json(LoginResponse { token }))
}

pub async fn change_password(
    State(state): State<AppState>,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<Json<serde_json::Value>> {
    state
        .auth
        .change_password(&body.current_password, &body.new_password)
        .await?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

pub async fn reset_password(
    State(state): State<AppState>,
    Json(body): Json<ResetPasswordRequest>,
) -> Result<Json<serde_json::Value>> {
    state
        .auth
        .reset_password(&body.reset_token, &body.new_password)
        .await?;
    Ok(Json(serde_json::json!({ "ok": true })))
}
