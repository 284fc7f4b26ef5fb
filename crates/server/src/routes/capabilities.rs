//! Capability set of the current caller, used to drive navigation and page visibility.

use axum::{
    Router,
    extract::{Query, State, rejection::QueryRejection},
    response::Json as ResponseJson,
    routing::get,
};
use serde::Deserialize;
use services::services::visibility::{Capabilities, VisibilityResolver};
use uuid::Uuid;

use crate::{AppState, error::ApiError, extract::AuthenticatedCaller};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilitiesQuery {
    pub company_id: Option<Uuid>,
}

/// GET /api/me/capabilities
pub async fn get_capabilities(
    State(state): State<AppState>,
    AuthenticatedCaller(caller): AuthenticatedCaller,
    query: Result<Query<CapabilitiesQuery>, QueryRejection>,
) -> Result<ResponseJson<Capabilities>, ApiError> {
    let Query(query) = query?;
    let capabilities =
        VisibilityResolver::resolve_for(&state.db().pool, &caller, query.company_id).await?;
    Ok(ResponseJson(capabilities))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/me/capabilities", get(get_capabilities))
}
