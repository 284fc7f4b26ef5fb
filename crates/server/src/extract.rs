use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use db::models::access::Caller;

use crate::{AppState, error::ApiError};

/// The caller behind the request's bearer token. Rejects with 401.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedCaller(pub Caller);

impl FromRequestParts<AppState> for AuthenticatedCaller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());
        let caller = state.auth().authenticate(header)?;
        Ok(AuthenticatedCaller(caller))
    }
}
