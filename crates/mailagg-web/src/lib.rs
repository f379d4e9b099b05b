//! HTTP control plane: every mutating and read endpoint the admin API
//! exposes, mounted under `/api`.

pub mod auth;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

pub use state::AppState;

/// Endpoints that do not require a bearer token: health probes and the
/// login surface itself, which cannot require what it is there to grant.
fn public_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(routes::health::health))
        .route("/auth/config", get(routes::auth::config))
        .route("/auth/login", post(routes::auth::login))
        .route("/auth/reset-password", post(routes::auth::reset_password))
}

fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/auth/change-password", post(routes::auth::change_password))
        .route(
            "/accounts/",
            get(routes::accounts::list).post(routes::accounts::create),
        )
        .route("/accounts/status", get(routes::accounts::status))
        .route(
            "/accounts/{id}",
            axum::routing::patch(routes::accounts::patch).delete(routes::accounts::delete),
        )
        .route(
            "/accounts/{id}/telegram-rules",
            get(routes::push_filters::list).post(routes::push_filters::create),
        )
        .route(
            "/accounts/telegram-rules/{id}",
            axum::routing::delete(routes::push_filters::delete),
        )
        .route(
            "/rules/",
            get(routes::rules::list).post(routes::rules::create),
        )
        .route(
            "/rules/{id}",
            axum::routing::patch(routes::rules::patch).delete(routes::rules::delete),
        )
        .route("/emails/", get(routes::emails::list))
        .route("/emails/{id}", get(routes::emails::get))
        .route("/emails/{id}/read", post(routes::emails::mark_read))
        .route("/emails/apply-rules", post(routes::emails::apply_rules))
        .route(
            "/emails/accounts/{id}/fetch_once",
            post(routes::emails::fetch_once),
        )
        .route(
            "/settings",
            get(routes::settings::get).patch(routes::settings::patch),
        )
        .route("/settings/export", get(routes::settings::export))
        .route("/settings/import", post(routes::settings::import))
        .route("/stats/overview", get(routes::stats::overview))
        .route("/stats/cleanup", post(routes::stats::cleanup))
        .route("/stats/archive", post(routes::stats::archive))
        .route("/stats/archive/{name}", get(routes::stats::get_archive))
}

/// Assemble the full router. `state` carries the store, scheduler, vault,
/// and auth state every handler needs.
#[must_use]
pub fn router(state: AppState) -> Router {
    let protected = protected_router().route_layer(axum::middleware::from_fn_with_state(
        state.clone(),
        middleware::require_auth,
    ));

    Router::new()
        .nest("/api", public_router().merge(protected))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until the process is killed.
pub async fn serve(state: AppState, bind: &str, port: u16) -> std::io::Result<()> {
    let app = router(state);
    let addr = format!("{bind}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "control plane listening");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await
}
