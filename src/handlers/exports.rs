use axum::{
    body::Body,
    extract::State,
    http::header,
    response::Response,
    routing::post,
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::error;
use utoipa::ToSchema;

use crate::{
    errors::ServiceError,
    reports::{self, ReportFilters},
    AppState,
};

const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
const PDF_MIME: &str = "application/pdf";

/// Build the export Router scoped under `/api/v1/export`.
pub fn export_routes() -> Router<AppState> {
    Router::new()
        .route("/excel", post(export_excel))
        .route("/pdf", post(export_pdf))
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ExportRequest {
    #[serde(default)]
    pub filters: ReportFilters,
}

fn attachment(bytes: Vec<u8>, extension: &str, mime: &str) -> Result<Response, ServiceError> {
    let filename = format!(
        "crash-reports-{}.{}",
        Utc::now().format("%Y-%m-%d"),
        extension
    );

    Response::builder()
        .header(header::CONTENT_TYPE, mime)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        )
        .body(Body::from(bytes))
        .map_err(|e| ServiceError::InternalError(e.to_string()))
}

/// Export the filtered crash reports as a two-sheet workbook. Unlike the
/// dashboard aggregates, a failure here is surfaced as an explicit 500:
/// the caller asked for a file, so silent degradation would mislead.
#[utoipa::path(
    post,
    path = "/api/v1/export/excel",
    request_body = ExportRequest,
    responses(
        (status = 200, description = "Workbook attachment", content_type = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
        (status = 500, description = "Export failed", body = crate::errors::ErrorResponse)
    ),
    tag = "Exports"
)]
pub async fn export_excel(
    State(state): State<AppState>,
    Json(request): Json<ExportRequest>,
) -> Result<Response, ServiceError> {
    let bytes = async {
        let rows = reports::fetch_filtered(&state.db, &request.filters).await?;
        reports::excel::render_workbook(&rows)
    }
    .await
    .map_err(|e| match e {
        ServiceError::InvalidInput(_) => e,
        other => {
            error!("excel export failed: {}", other);
            ServiceError::ExportError("Failed to generate Excel file".to_string())
        }
    })?;

    attachment(bytes, "xlsx", XLSX_MIME)
}

/// Export the filtered crash reports as a paginated PDF document.
#[utoipa::path(
    post,
    path = "/api/v1/export/pdf",
    request_body = ExportRequest,
    responses(
        (status = 200, description = "Document attachment", content_type = "application/pdf"),
        (status = 500, description = "Export failed", body = crate::errors::ErrorResponse)
    ),
    tag = "Exports"
)]
pub async fn export_pdf(
    State(state): State<AppState>,
    Json(request): Json<ExportRequest>,
) -> Result<Response, ServiceError> {
    let bytes = async {
        let rows = reports::fetch_filtered(&state.db, &request.filters).await?;
        reports::pdf::render_document(&rows, Utc::now())
    }
    .await
    .map_err(|e| match e {
        ServiceError::InvalidInput(_) => e,
        other => {
            error!("pdf export failed: {}", other);
            ServiceError::ExportError("Failed to generate PDF file".to_string())
        }
    })?;

    attachment(bytes, "pdf", PDF_MIME)
}
