//! Auth gate applied to every mutating and data-bearing route: read the
//! bearer token off the request, check it, and either forward to `next` or
//! short-circuit with a 401.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::{error::AppError, state::AppState};

pub async fn require_auth(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    let Some(token) = token else {
        return AppError::Unauthorized.into_response();
    };

    let api_token = match state.store.get_settings().await {
        Ok(settings) => settings.api_token,
        Err(err) => return AppError::Store(err).into_response(),
    };

    if let Err(err) = state.auth.authorize(token, api_token.as_deref()) {
        return err.into_response();
    }

    next.run(request).await
}
