//! API v0 endpoints.
//!
//! Version 0 signals an unstable API -- breaking changes are expected
//! until the monitor reaches 1.0.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use time::OffsetDateTime;
use utoipa_axum::{router::OpenApiRouter, routes};

use super::server::SharedState;
use crate::api_client::types::{CommandReply, CommandRequest, StatusReport, SummaryReport};
use crate::commands;
use crate::notify::messages;
use crate::summary::SummaryPeriod;

/// Build the v0 API routes with OpenAPI metadata.
pub fn routes() -> OpenApiRouter<SharedState> {
    OpenApiRouter::new()
        .routes(routes!(health))
        .routes(routes!(get_status))
        .routes(routes!(get_summary))
        .routes(routes!(post_command))
}

/// Health check endpoint.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = OK, description = "Server is running", body = String),
    ),
)]
async fn health() -> &'static str {
    "OK"
}

/// Return the current power state snapshot.
#[utoipa::path(
    get,
    path = "/status",
    tag = "state",
    responses(
        (status = OK, description = "Current power state", body = StatusReport),
    ),
)]
async fn get_status(State(state): State<SharedState>) -> Json<StatusReport> {
    let status = state
        .monitor
        .status(OffsetDateTime::now_utc().unix_timestamp());

    Json(StatusReport {
        state: status.current.map(|c| c.state),
        state_since: status.current.map(|c| c.state_since),
        state_duration_secs: status.state_duration_secs(),
        segment_start: status.current.map(|c| c.segment_start),
        pending_state: status.pending.map(|p| p.candidate_state),
        pending_since: status.pending.map(|p| p.candidate_since),
        unreachable_since: status.reachability.unreachable_since,
        last_error: status.reachability.last_error,
        uptime_secs: status.uptime_secs,
    })
}

/// Return totals for the last complete day, week or month.
#[utoipa::path(
    get,
    path = "/summary/{period}",
    tag = "state",
    params(
        ("period" = String, Path, description = "One of day, week, month"),
    ),
    responses(
        (status = OK, description = "Period summary", body = SummaryReport),
        (status = NOT_FOUND, description = "Unknown period"),
    ),
)]
async fn get_summary(
    State(state): State<SharedState>,
    Path(period): Path<String>,
) -> Result<Json<SummaryReport>, StatusCode> {
    let period: SummaryPeriod = period.parse().map_err(|_| StatusCode::NOT_FOUND)?;
    let summary = state.monitor.summary(period, OffsetDateTime::now_utc());
    let offset = state.monitor.aggregator().offset();

    Ok(Json(SummaryReport {
        period: period.to_string(),
        start: summary.start,
        end: summary.end,
        present_secs: summary.totals.present_secs,
        absent_secs: summary.totals.absent_secs,
        text: messages::summary(&summary, offset),
    }))
}

/// Answer a chat-style command such as `/status`.
#[utoipa::path(
    post,
    path = "/command",
    tag = "commands",
    request_body = CommandRequest,
    responses(
        (status = OK, description = "Reply text", body = CommandReply),
    ),
)]
async fn post_command(
    State(state): State<SharedState>,
    Json(req): Json<CommandRequest>,
) -> Json<CommandReply> {
    Json(CommandReply {
        text: commands::handle(&state.monitor, &req.text, OffsetDateTime::now_utc()),
    })
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, header};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::super::router;
    use super::*;
    use crate::monitor::testing::{Harness, harness, harness_with};
    use crate::store::{MemoryStore, StateRecord};

    fn app(h: &Harness) -> axum::Router {
        router(SharedState {
            monitor: h.monitor.clone(),
        })
    }

    async fn get(app: axum::Router, uri: &str) -> (StatusCode, Vec<u8>) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn health_is_ok() {
        let (status, body) = get(app(&harness()), "/api/v0/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"OK");
    }

    #[tokio::test]
    async fn status_reflects_restored_state() {
        let store = MemoryStore::with_contents(
            Some(StateRecord {
                online: Some(false),
                timestamp: Some(1_000),
                segment_start_time: Some(2_000),
                offline_since: Some(1_500),
                last_error: Some("request failed".into()),
                ..StateRecord::default()
            }),
            Vec::new(),
        );
        let h = harness_with(store);

        let (status, body) = get(app(&h), "/api/v0/status").await;
        assert_eq!(status, StatusCode::OK);

        let report: StatusReport = serde_json::from_slice(&body).unwrap();
        assert_eq!(report.state, Some(false));
        assert_eq!(report.state_since, Some(1_000));
        assert_eq!(report.segment_start, Some(2_000));
        assert_eq!(report.pending_state, None);
        assert_eq!(report.unreachable_since, Some(1_500));
        assert_eq!(report.last_error.as_deref(), Some("request failed"));
        assert!(report.state_duration_secs.unwrap() > 0);
    }

    #[tokio::test]
    async fn status_before_first_poll_is_empty() {
        let (_, body) = get(app(&harness()), "/api/v0/status").await;

        let report: StatusReport = serde_json::from_slice(&body).unwrap();
        assert_eq!(report.state, None);
        assert_eq!(report.state_duration_secs, None);
    }

    #[tokio::test]
    async fn summary_by_period() {
        let h = harness();

        let (status, body) = get(app(&h), "/api/v0/summary/week").await;
        assert_eq!(status, StatusCode::OK);

        let report: SummaryReport = serde_json::from_slice(&body).unwrap();
        assert_eq!(report.period, "week");
        assert_eq!(report.end - report.start, 7 * 86_400);
        assert!(report.text.starts_with("Weekly summary"));

        let (status, _) = get(app(&h), "/api/v0/summary/year").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn command_replies_with_text() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/v0/command")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"text": "/uptime"}"#))
            .unwrap();

        let response = app(&harness()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let reply: CommandReply = serde_json::from_slice(&body).unwrap();
        assert!(reply.text.starts_with("Monitor uptime: "));
    }

    #[tokio::test]
    async fn openapi_lists_routes() {
        let (status, body) = get(app(&harness()), "/api/v0/openapi.json").await;
        assert_eq!(status, StatusCode::OK);

        let doc: serde_json::Value = serde_json::from_slice(&body).unwrap();
        let paths = doc["paths"].as_object().unwrap();
        assert!(paths.contains_key("/api/v0/status"));
        assert!(paths.contains_key("/api/v0/summary/{period}"));
    }
}
