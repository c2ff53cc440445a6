//! HTTP command surface
//!
//! Mirrors the chat commands so the monitor can be driven without the
//! Discord gateway.
//!
//! ## Endpoints
//!
//! - `GET /api/v1/health` - Health check (no auth)
//! - `GET /api/v1/status` - Rendered status and raw endpoint records
//! - `GET /api/v1/endpoints?prefix=` - Autocomplete choices
//! - `POST /api/v1/endpoints` - Add a server
//! - `DELETE /api/v1/endpoints/:address` - Remove a server
//! - `PUT /api/v1/display` - Move the status message
//! - `PUT /api/v1/alert` - Set alert channel and message
//! - `POST /api/v1/display/show-address` - Toggle address display
//! - `POST /api/v1/cycle` - Run a cycle now

pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod types;

pub use error::{ApiError, ApiResult};
pub use state::ApiState;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, post, put},
};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::ApiConfig;

/// Build the router with all routes and layers
pub fn router(config: &ApiConfig, state: ApiState) -> Router {
    let cors = if config.cors {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
    };

    let mut app = Router::new()
        .route("/api/v1/health", get(routes::health::health_check))
        .route("/api/v1/status", get(routes::status::get_status))
        .route(
            "/api/v1/endpoints",
            get(routes::endpoints::list_choices).post(routes::endpoints::add_endpoint),
        )
        .route(
            "/api/v1/endpoints/:address",
            delete(routes::endpoints::remove_endpoint),
        )
        .route("/api/v1/display", put(routes::settings::set_display))
        .route(
            "/api/v1/display/show-address",
            post(routes::settings::toggle_show_address),
        )
        .route("/api/v1/alert", put(routes::settings::set_alert))
        .route("/api/v1/cycle", post(routes::cycle::run_cycle))
        .with_state(state);

    if let Some(token) = config.token.as_deref() {
        app = app.layer(axum::middleware::from_fn_with_state(
            Arc::<str>::from(token),
            middleware::auth::require_token,
        ));
    }

    app.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors),
    )
}

/// Spawn the API server
///
/// Starts the server in a background task and returns the bound address.
pub async fn spawn_api_server(config: ApiConfig, state: ApiState) -> anyhow::Result<SocketAddr> {
    info!("starting API server on {}", config.bind);

    if config.token.is_none() {
        tracing::warn!("API server has no token configured, every request is accepted");
    }

    let app = router(&config, state);

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    let addr = listener.local_addr()?;

    info!("API server listening on {}", addr);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("API server error: {}", e);
        }
    });

    Ok(addr)
}
