use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};

use certop_core::error_builder;
use certop_core::problemdetails::Problem;

use crate::inventory::{InventoryAggregator, ManualDomainEntry};
use crate::models::{CertKind, CertStatus, CertificateRecord};
use crate::orchestrator::{OperationOutcome, OrchestrationEngine, SystemStatus};

pub struct CertificatesState {
    pub engine: Arc<OrchestrationEngine>,
    pub inventory: Arc<InventoryAggregator>,
}

/// Aggregate counters for the dashboard view
#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardResponse {
    #[serde(rename = "totalCerts")]
    pub total_certs: usize,
    #[serde(rename = "healthyCerts")]
    pub healthy_certs: usize,
    #[serde(rename = "expiringCerts")]
    pub expiring_certs: usize,
    #[serde(rename = "systemStatus")]
    pub system_status: SystemStatus,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CertificateListResponse {
    pub success: bool,
    pub certificates: Vec<CertificateRecord>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCertificateRequest {
    #[serde(default)]
    pub domain: String,
    #[serde(rename = "certType", default = "default_cert_type")]
    pub cert_type: String,
    #[serde(rename = "dnsProvider", default = "default_dns_provider")]
    pub dns_provider: String,
}

fn default_cert_type() -> String {
    "single".to_string()
}

fn default_dns_provider() -> String {
    "aliyun".to_string()
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ManualDomainsResponse {
    pub domains: Vec<ManualDomainEntry>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        get_dashboard,
        list_certificates,
        create_certificate,
        renew_certificate,
        delete_certificate,
        download_certificate,
        list_manual_domains,
        download_manual_certificate
    ),
    components(schemas(
        DashboardResponse,
        CertificateListResponse,
        CreateCertificateRequest,
        ManualDomainsResponse,
        ManualDomainEntry,
        CertificateRecord,
        OperationOutcome,
        SystemStatus
    )),
    info(
        title = "Certificates API",
        description = "Certificate inventory, lifecycle operations and downloads.",
        version = "1.0.0"
    ),
    tags(
        (name = "Certificates", description = "Certificate lifecycle endpoints")
    )
)]
pub struct CertificatesApiDoc;

pub fn configure_routes() -> Router<Arc<CertificatesState>> {
    Router::new()
        .route("/dashboard", get(get_dashboard))
        .route("/certificates", get(list_certificates))
        .route("/certificates", post(create_certificate))
        .route("/certificates/manual", get(list_manual_domains))
        .route(
            "/certificates/manual/{domain}/download",
            get(download_manual_certificate),
        )
        .route("/certificates/{domain}/renew", post(renew_certificate))
        .route("/certificates/{domain}", delete(delete_certificate))
        .route("/certificates/{domain}/download", get(download_certificate))
}

fn outcome_response(outcome: OperationOutcome) -> impl IntoResponse {
    let status = if outcome.success {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(outcome))
}

/// Stream an archive and delete the on-disk tempfile once read.
async fn archive_response(
    archive: std::path::PathBuf,
    download_name: String,
) -> Result<impl IntoResponse, Problem> {
    let bytes = tokio::fs::read(&archive).await.map_err(|e| {
        tracing::error!(archive = %archive.display(), error = %e, "failed to read archive");
        error_builder::internal_server_error()
            .detail("Failed to read certificate archive")
            .build()
    })?;
    if let Err(e) = tokio::fs::remove_file(&archive).await {
        tracing::warn!(archive = %archive.display(), error = %e, "failed to remove archive tempfile");
    }

    Ok((
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", download_name),
            ),
        ],
        bytes,
    ))
}

/// Dashboard counters and system health
#[utoipa::path(
    tag = "Certificates",
    get,
    path = "/dashboard",
    responses(
        (status = 200, description = "Aggregate certificate counters", body = DashboardResponse)
    )
)]
async fn get_dashboard(State(state): State<Arc<CertificatesState>>) -> impl IntoResponse {
    let records = state.inventory.build_inventory().await;
    let healthy = records
        .iter()
        .filter(|r| r.status == CertStatus::Healthy)
        .count();
    let expiring = records.iter().filter(|r| r.status.is_expiring()).count();
    let system_status = state.engine.health_check().await;

    Json(DashboardResponse {
        total_certs: records.len(),
        healthy_certs: healthy,
        expiring_certs: expiring,
        system_status,
    })
}

/// List every configured domain's certificate state
#[utoipa::path(
    tag = "Certificates",
    get,
    path = "/certificates",
    responses(
        (status = 200, description = "Certificate inventory", body = CertificateListResponse)
    )
)]
async fn list_certificates(State(state): State<Arc<CertificatesState>>) -> impl IntoResponse {
    let certificates = state.inventory.build_inventory().await;
    Json(CertificateListResponse {
        success: true,
        certificates,
    })
}

/// Generate a new certificate
#[utoipa::path(
    tag = "Certificates",
    post,
    path = "/certificates",
    request_body = CreateCertificateRequest,
    responses(
        (status = 200, description = "Certificate generated", body = OperationOutcome),
        (status = 400, description = "Missing domain", body = OperationOutcome),
        (status = 500, description = "Generation failed", body = OperationOutcome)
    )
)]
async fn create_certificate(
    State(state): State<Arc<CertificatesState>>,
    Json(request): Json<CreateCertificateRequest>,
) -> impl IntoResponse {
    if request.domain.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(OperationOutcome::failed("Domain must not be empty")),
        )
            .into_response();
    }

    let kind = if request.cert_type == "wildcard" {
        CertKind::Wildcard
    } else {
        CertKind::Single
    };

    let outcome = state
        .engine
        .generate(&request.domain, kind, &request.dns_provider)
        .await;
    outcome_response(outcome).into_response()
}

/// Renew a certificate
#[utoipa::path(
    tag = "Certificates",
    post,
    path = "/certificates/{domain}/renew",
    params(("domain" = String, Path, description = "Domain to renew")),
    responses(
        (status = 200, description = "Certificate renewed", body = OperationOutcome),
        (status = 500, description = "Renewal failed", body = OperationOutcome)
    )
)]
async fn renew_certificate(
    State(state): State<Arc<CertificatesState>>,
    Path(domain): Path<String>,
) -> impl IntoResponse {
    outcome_response(state.engine.renew(&domain).await)
}

/// Delete a certificate and every store directory belonging to it
#[utoipa::path(
    tag = "Certificates",
    delete,
    path = "/certificates/{domain}",
    params(("domain" = String, Path, description = "Domain to delete")),
    responses(
        (status = 200, description = "Certificate deleted", body = OperationOutcome),
        (status = 500, description = "Nothing deleted", body = OperationOutcome)
    )
)]
async fn delete_certificate(
    State(state): State<Arc<CertificatesState>>,
    Path(domain): Path<String>,
) -> impl IntoResponse {
    outcome_response(state.engine.delete(&domain).await)
}

/// Download a certificate directory as a zip archive
#[utoipa::path(
    tag = "Certificates",
    get,
    path = "/certificates/{domain}/download",
    params(("domain" = String, Path, description = "Domain to download")),
    responses(
        (status = 200, description = "Zip archive", content_type = "application/zip"),
        (status = 404, description = "No certificate directory for this domain")
    )
)]
async fn download_certificate(
    State(state): State<Arc<CertificatesState>>,
    Path(domain): Path<String>,
) -> Result<impl IntoResponse, Problem> {
    let archive = state.engine.download(&domain).await.ok_or_else(|| {
        error_builder::not_found()
            .detail(format!("No certificate files found for {}", domain))
            .build()
    })?;
    archive_response(archive, format!("{}_certificate.zip", domain)).await
}

/// List subdomains requiring manual certificate deployment
#[utoipa::path(
    tag = "Certificates",
    get,
    path = "/certificates/manual",
    responses(
        (status = 200, description = "Manually deployed subdomains", body = ManualDomainsResponse)
    )
)]
async fn list_manual_domains(State(state): State<Arc<CertificatesState>>) -> impl IntoResponse {
    Json(ManualDomainsResponse {
        domains: state.inventory.list_manual_domains().await,
    })
}

/// Download the parent-domain certificate for a manually deployed subdomain
#[utoipa::path(
    tag = "Certificates",
    get,
    path = "/certificates/manual/{domain}/download",
    params(("domain" = String, Path, description = "Manually deployed subdomain")),
    responses(
        (status = 200, description = "Zip archive", content_type = "application/zip"),
        (status = 404, description = "Subdomain not configured for manual deployment")
    )
)]
async fn download_manual_certificate(
    State(state): State<Arc<CertificatesState>>,
    Path(domain): Path<String>,
) -> Result<impl IntoResponse, Problem> {
    let parent = state
        .inventory
        .find_manual_parent(&domain)
        .await
        .ok_or_else(|| {
            error_builder::not_found()
                .detail(format!(
                    "No manual deployment configuration found for {}",
                    domain
                ))
                .build()
        })?;

    let archive = state.engine.download(&parent).await.ok_or_else(|| {
        error_builder::not_found()
            .detail(format!("No certificate files found for {}", parent))
            .build()
    })?;
    archive_response(archive, format!("{}_certificates.zip", domain)).await
}
