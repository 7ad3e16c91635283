use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};

use certop_core::error_builder::ErrorBuilder;
use certop_core::problemdetails::Problem;

use crate::models::ConfigKind;
use crate::service::{ConfigStore, ConfigStoreError};

pub struct ConfigState {
    pub store: Arc<ConfigStore>,
}

/// Raw text content of a configuration file
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ConfigContentResponse {
    pub content: String,
}

/// New content for a configuration file
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ConfigWriteRequest {
    #[serde(default)]
    pub content: String,
}

/// Outcome of a configuration write
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ConfigWriteResponse {
    pub success: bool,
    pub message: String,
}

#[derive(OpenApi)]
#[openapi(
    paths(get_config, save_config),
    components(schemas(ConfigContentResponse, ConfigWriteRequest, ConfigWriteResponse)),
    info(
        title = "Configuration API",
        description = "Read and write the YAML configuration files \
        (domains, DNS providers, servers, notifications).",
        version = "1.0.0"
    ),
    tags(
        (name = "Config", description = "Configuration file endpoints")
    )
)]
pub struct ConfigApiDoc;

pub fn configure_routes() -> Router<Arc<ConfigState>> {
    Router::new()
        .route("/config/{config_type}", get(get_config))
        .route("/config/{config_type}", post(save_config))
}

fn parse_kind(config_type: &str) -> Result<ConfigKind, Problem> {
    config_type.parse::<ConfigKind>().map_err(|_| {
        ErrorBuilder::new(StatusCode::BAD_REQUEST)
            .type_("https://certop.dev/probs/invalid-config-type")
            .title("Invalid Configuration Type")
            .detail(format!("Unknown configuration type: {}", config_type))
            .build()
    })
}

/// Read a configuration file
#[utoipa::path(
    tag = "Config",
    get,
    path = "/config/{config_type}",
    params(
        ("config_type" = String, Path, description = "One of: domains, dns, servers, notification")
    ),
    responses(
        (status = 200, description = "Raw configuration content", body = ConfigContentResponse),
        (status = 400, description = "Unknown configuration type")
    )
)]
async fn get_config(
    State(state): State<Arc<ConfigState>>,
    Path(config_type): Path<String>,
) -> Result<impl IntoResponse, Problem> {
    let kind = parse_kind(&config_type)?;

    let content = match state.store.read_raw(kind).await {
        Ok(content) => content,
        Err(ConfigStoreError::NotFound(_)) => "Configuration file does not exist".to_string(),
        Err(e) => {
            tracing::error!("Failed to read {} config: {}", config_type, e);
            format!("Failed to read configuration: {}", e)
        }
    };

    Ok(Json(ConfigContentResponse { content }))
}

/// Replace a configuration file
///
/// The content is validated as well-formed YAML before any mutation; the
/// previous file is kept as a timestamped backup.
#[utoipa::path(
    tag = "Config",
    post,
    path = "/config/{config_type}",
    params(
        ("config_type" = String, Path, description = "One of: domains, dns, servers, notification")
    ),
    request_body = ConfigWriteRequest,
    responses(
        (status = 200, description = "Configuration saved", body = ConfigWriteResponse),
        (status = 400, description = "Unknown type or invalid YAML", body = ConfigWriteResponse),
        (status = 500, description = "Write failed", body = ConfigWriteResponse)
    )
)]
async fn save_config(
    State(state): State<Arc<ConfigState>>,
    Path(config_type): Path<String>,
    Json(request): Json<ConfigWriteRequest>,
) -> Result<impl IntoResponse, Problem> {
    let kind = parse_kind(&config_type)?;

    match state.store.write_raw(kind, &request.content).await {
        Ok(()) => Ok((
            StatusCode::OK,
            Json(ConfigWriteResponse {
                success: true,
                message: "Configuration saved successfully".to_string(),
            }),
        )),
        Err(ConfigStoreError::InvalidYaml(detail)) => Ok((
            StatusCode::BAD_REQUEST,
            Json(ConfigWriteResponse {
                success: false,
                message: format!("Invalid YAML: {}", detail),
            }),
        )),
        Err(e) => {
            tracing::error!("Failed to save {} config: {}", config_type, e);
            Ok((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ConfigWriteResponse {
                    success: false,
                    message: e.to_string(),
                }),
            ))
        }
    }
}
