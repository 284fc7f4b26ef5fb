//! Routes for the form entry lifecycle. These are the only server-validated
//! writes to form entries; each one acts with the caller's own access scope.

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::Json as ResponseJson,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use db::models::form_entry::FormEntryStatus;
use serde::{Deserialize, Serialize};
use services::services::form_lifecycle::{FormEntryView, FormLifecycleService, StartFormEntry};
use ts_rs::TS;
use uuid::Uuid;

use crate::{AppState, error::ApiError, extract::AuthenticatedCaller};

#[derive(Debug, Clone, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct SaveFormRequest {
    pub entry_id: Uuid,
    pub answers: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct DeleteFormRequest {
    pub entry_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct StartFormResponse {
    pub entry_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct SaveFormResponse {
    pub id: Uuid,
    pub status: FormEntryStatus,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct SubmitFormResponse {
    pub id: Uuid,
    pub status: FormEntryStatus,
    pub submitted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct DeleteFormResponse {
    pub ok: bool,
}

/// POST /api/forms/start
/// Create a draft entry for a young person from a published blueprint
pub async fn start_form(
    State(state): State<AppState>,
    AuthenticatedCaller(caller): AuthenticatedCaller,
    payload: Result<Json<StartFormEntry>, JsonRejection>,
) -> Result<(StatusCode, ResponseJson<StartFormResponse>), ApiError> {
    let Json(payload) = payload?;
    let service = FormLifecycleService::new(state.db().pool.clone());
    let entry = service.start(&caller, &payload).await?;
    Ok((
        StatusCode::CREATED,
        ResponseJson(StartFormResponse { entry_id: entry.id }),
    ))
}

/// POST /api/forms/save
pub async fn save_form(
    State(state): State<AppState>,
    AuthenticatedCaller(caller): AuthenticatedCaller,
    payload: Result<Json<SaveFormRequest>, JsonRejection>,
) -> Result<ResponseJson<SaveFormResponse>, ApiError> {
    let Json(payload) = payload?;
    let service = FormLifecycleService::new(state.db().pool.clone());
    let entry = service.save(&caller, payload.entry_id, &payload.answers).await?;
    Ok(ResponseJson(SaveFormResponse {
        id: entry.id,
        status: entry.status,
        updated_at: entry.updated_at,
    }))
}

/// POST /api/forms/submit
/// Submit a draft; manager-level callers lock it instead
pub async fn submit_form(
    State(state): State<AppState>,
    AuthenticatedCaller(caller): AuthenticatedCaller,
    payload: Result<Json<SaveFormRequest>, JsonRejection>,
) -> Result<ResponseJson<SubmitFormResponse>, ApiError> {
    let Json(payload) = payload?;
    let service = FormLifecycleService::new(state.db().pool.clone());
    let entry = service.submit(&caller, payload.entry_id, &payload.answers).await?;
    Ok(ResponseJson(SubmitFormResponse {
        id: entry.id,
        status: entry.status,
        submitted_at: entry.submitted_at,
    }))
}

/// POST /api/forms/delete
/// Cancel a draft. The row and its answers are kept.
pub async fn delete_form(
    State(state): State<AppState>,
    AuthenticatedCaller(caller): AuthenticatedCaller,
    payload: Result<Json<DeleteFormRequest>, JsonRejection>,
) -> Result<ResponseJson<DeleteFormResponse>, ApiError> {
    let Json(payload) = payload?;
    let service = FormLifecycleService::new(state.db().pool.clone());
    service.delete(&caller, payload.entry_id).await?;
    Ok(ResponseJson(DeleteFormResponse { ok: true }))
}

/// GET /api/forms/{entry_id}
pub async fn get_form(
    State(state): State<AppState>,
    AuthenticatedCaller(caller): AuthenticatedCaller,
    Path(entry_id): Path<Uuid>,
) -> Result<ResponseJson<FormEntryView>, ApiError> {
    let service = FormLifecycleService::new(state.db().pool.clone());
    let entry = service.get(&caller, entry_id).await?;
    Ok(ResponseJson(entry.into()))
}

pub fn router() -> Router<AppState> {
    Router::new().nest(
        "/forms",
        Router::new()
            .route("/start", post(start_form))
            .route("/save", post(save_form))
            .route("/submit", post(submit_form))
            .route("/delete", post(delete_form))
            .route("/{entry_id}", get(get_form)),
    )
}
