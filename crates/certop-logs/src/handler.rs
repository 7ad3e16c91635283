use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};

use certop_core::error_builder::ErrorBuilder;
use certop_core::problemdetails::Problem;

use crate::service::{LogKind, LogStore};

pub struct LogsState {
    pub store: Arc<LogStore>,
}

/// Tailed log content
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LogContentResponse {
    pub content: String,
}

/// Outcome of a log clear
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LogClearResponse {
    pub success: bool,
    pub message: String,
}

#[derive(OpenApi)]
#[openapi(
    paths(get_logs, clear_logs),
    components(schemas(LogContentResponse, LogClearResponse)),
    info(
        title = "Logs API",
        description = "Tail and clear the provisioning tool's log files.",
        version = "1.0.0"
    ),
    tags(
        (name = "Logs", description = "Log file endpoints")
    )
)]
pub struct LogsApiDoc;

pub fn configure_routes() -> Router<Arc<LogsState>> {
    Router::new()
        .route("/logs/{log_type}", get(get_logs))
        .route("/logs/{log_type}", delete(clear_logs))
}

fn parse_kind(log_type: &str) -> Result<LogKind, Problem> {
    log_type.parse::<LogKind>().map_err(|_| {
        ErrorBuilder::new(StatusCode::BAD_REQUEST)
            .type_("https://certop.dev/probs/invalid-log-type")
            .title("Invalid Log Type")
            .detail(format!("Unknown log type: {}", log_type))
            .build()
    })
}

/// Tail a log file
#[utoipa::path(
    tag = "Logs",
    get,
    path = "/logs/{log_type}",
    params(
        ("log_type" = String, Path, description = "One of: cert-manager, error, cron")
    ),
    responses(
        (status = 200, description = "Last 1000 log lines", body = LogContentResponse),
        (status = 400, description = "Unknown log type")
    )
)]
async fn get_logs(
    State(state): State<Arc<LogsState>>,
    Path(log_type): Path<String>,
) -> Result<impl IntoResponse, Problem> {
    let kind = parse_kind(&log_type)?;

    let content = match state.store.tail(kind).await {
        Ok(Some(content)) => content,
        Ok(None) => "Log file does not exist".to_string(),
        Err(e) => {
            tracing::error!("Failed to read {} log: {}", log_type, e);
            "Failed to read log file".to_string()
        }
    };

    Ok(Json(LogContentResponse { content }))
}

/// Clear a log file
#[utoipa::path(
    tag = "Logs",
    delete,
    path = "/logs/{log_type}",
    params(
        ("log_type" = String, Path, description = "One of: cert-manager, error, cron")
    ),
    responses(
        (status = 200, description = "Log cleared", body = LogClearResponse),
        (status = 400, description = "Unknown log type"),
        (status = 500, description = "Clear failed", body = LogClearResponse)
    )
)]
async fn clear_logs(
    State(state): State<Arc<LogsState>>,
    Path(log_type): Path<String>,
) -> Result<impl IntoResponse, Problem> {
    let kind = parse_kind(&log_type)?;

    match state.store.clear(kind).await {
        Ok(()) => Ok((
            StatusCode::OK,
            Json(LogClearResponse {
                success: true,
                message: "Log cleared successfully".to_string(),
            }),
        )),
        Err(e) => {
            tracing::error!("Failed to clear {} log: {}", log_type, e);
            Ok((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(LogClearResponse {
                    success: false,
                    message: e.to_string(),
                }),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum_test::TestServer;
    use certop_core::StorePaths;

    fn test_server(tmp: &tempfile::TempDir) -> TestServer {
        let paths = StorePaths::new(
            tmp.path().join("config"),
            tmp.path().join("data"),
            tmp.path().join("scripts"),
        );
        std::fs::create_dir_all(paths.log_dir()).unwrap();
        let state = Arc::new(LogsState {
            store: Arc::new(LogStore::new(paths)),
        });
        let app = Router::new().merge(configure_routes()).with_state(state);
        TestServer::new(app).unwrap()
    }

    #[tokio::test]
    async fn tails_existing_log() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join("data/logs")).unwrap();
        std::fs::write(
            tmp.path().join("data/logs/cron.log"),
            "renewal check started\n",
        )
        .unwrap();
        let server = test_server(&tmp);

        let response = server.get("/logs/cron").await;
        response.assert_status_ok();
        let body: LogContentResponse = response.json();
        assert_eq!(body.content, "renewal check started");
    }

    #[tokio::test]
    async fn missing_log_yields_friendly_message() {
        let tmp = tempfile::tempdir().unwrap();
        let server = test_server(&tmp);

        let response = server.get("/logs/error").await;
        response.assert_status_ok();
        let body: LogContentResponse = response.json();
        assert_eq!(body.content, "Log file does not exist");
    }

    #[tokio::test]
    async fn unknown_log_type_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let server = test_server(&tmp);

        server
            .get("/logs/access")
            .await
            .assert_status(StatusCode::BAD_REQUEST);
        server
            .delete("/logs/access")
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn clear_empties_the_log() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join("data/logs")).unwrap();
        std::fs::write(
            tmp.path().join("data/logs/cert-manager.log"),
            "old entries\n",
        )
        .unwrap();
        let server = test_server(&tmp);

        let response = server.delete("/logs/cert-manager").await;
        response.assert_status_ok();
        let body: LogClearResponse = response.json();
        assert!(body.success);

        let content =
            std::fs::read_to_string(tmp.path().join("data/logs/cert-manager.log")).unwrap();
        assert!(content.is_empty());
    }
}
