use axum::{Router, extract::State, response::Json as ResponseJson, routing::get};
use serde::Serialize;

use crate::{AppState, error::ApiError};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> Result<ResponseJson<HealthResponse>, ApiError> {
    sqlx::query_scalar::<_, i64>("SELECT 1")
        .fetch_one(&state.db().pool)
        .await?;
    Ok(ResponseJson(HealthResponse { status: "ok" }))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
