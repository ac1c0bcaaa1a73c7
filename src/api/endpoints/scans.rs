//! Health-scan endpoints.
//!
//! - `POST /api/scans/analyze`: analyze one photo
//! - `GET /api/scans`: owner's scans, newest first
//! - `GET /api/scans/:id`: one live scan
//! - `DELETE /api/scans/:id`: soft delete
//! - `POST /api/scans/:id/restore`: undo a soft delete

use axum::extract::{Path, Query, State};
use axum::Extension;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, OwnerContext};
use crate::models::ScanRecord;
use crate::scan::{AnalysisReport, ImageBuffer};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub scan_type: String,
    /// Data URL or bare base64.
    pub image: Option<String>,
    pub mime_type: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    #[serde(default)]
    pub include_deleted: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScansResponse {
    pub scans: Vec<ScanRecord>,
    pub total: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedResponse {
    pub id: Uuid,
    pub deleted: bool,
}

/// `POST /api/scans/analyze`
pub async fn analyze(
    State(ctx): State<ApiContext>,
    Extension(owner): Extension<OwnerContext>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<AnalysisReport>, ApiError> {
    let encoded = req
        .image
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::BadRequest("No image uploaded".into()))?;

    let image = ImageBuffer::from_data_url(encoded, req.mime_type.as_deref())?;
    let report = ctx
        .orchestrator
        .analyze(&owner.owner_id, &req.scan_type, image)
        .await?;
    Ok(Json(report))
}

/// `GET /api/scans?includeDeleted=`
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(owner): Extension<OwnerContext>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ScansResponse>, ApiError> {
    let scans = ctx.store.list(&owner.owner_id, query.include_deleted)?;
    Ok(Json(ScansResponse {
        total: scans.len(),
        scans,
    }))
}

/// `GET /api/scans/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Extension(owner): Extension<OwnerContext>,
    Path(id): Path<String>,
) -> Result<Json<ScanRecord>, ApiError> {
    let id = parse_id(&id)?;
    ctx.store
        .get(&owner.owner_id, &id)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Scan {id} not found")))
}

/// `DELETE /api/scans/:id`
pub async fn delete(
    State(ctx): State<ApiContext>,
    Extension(owner): Extension<OwnerContext>,
    Path(id): Path<String>,
) -> Result<Json<DeletedResponse>, ApiError> {
    let id = parse_id(&id)?;
    ctx.store.soft_delete(&owner.owner_id, &id)?;
    tracing::info!(owner = %owner.owner_id, scan_id = %id, "Scan soft-deleted");
    Ok(Json(DeletedResponse { id, deleted: true }))
}

/// `POST /api/scans/:id/restore`
pub async fn restore(
    State(ctx): State<ApiContext>,
    Extension(owner): Extension<OwnerContext>,
    Path(id): Path<String>,
) -> Result<Json<ScanRecord>, ApiError> {
    let id = parse_id(&id)?;
    let record = ctx.store.restore(&owner.owner_id, &id)?;
    tracing::info!(owner = %owner.owner_id, scan_id = %id, "Scan restored");
    Ok(Json(record))
}

fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest("Invalid scan ID".into()))
}
