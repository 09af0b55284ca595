use std::net::SocketAddr;

use axum::{Json, Router, routing::get};
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;

use super::v0;
use crate::monitor::Monitor;
use crate::tracing::prelude::*;

/// State available to every handler.
#[derive(Clone)]
pub struct SharedState {
    pub monitor: Monitor,
}

#[derive(OpenApi)]
#[openapi(info(
    title = "powerwatch API",
    description = "Power presence state, summaries and commands"
))]
struct ApiDoc;

/// Build the full router, including `/api/v0/openapi.json`.
pub fn router(state: SharedState) -> Router {
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .nest("/api/v0", v0::routes())
        .split_for_parts();

    router
        .route(
            "/api/v0/openapi.json",
            get(move || {
                let api = api.clone();
                async move { Json(api) }
            }),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the API on `addr` until `shutdown` is cancelled.
pub async fn serve(
    addr: SocketAddr,
    state: SharedState,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "API server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;

    debug!("API server stopped");
    Ok(())
}
