//! Turns an `Authorization` header into the caller every query is scoped by.

use db::models::access::Caller;
use thiserror::Error;
use tracing::debug;
use utils::jwt::{self, JwtError};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing bearer token")]
    MissingToken,
    #[error("invalid bearer token")]
    InvalidToken(#[from] JwtError),
}

#[derive(Clone)]
pub struct Authenticator {
    secret: String,
}

impl Authenticator {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    pub fn authenticate(&self, authorization: Option<&str>) -> Result<Caller, AuthError> {
        let token = bearer_token(authorization)?;
        let claims = jwt::verify(&self.secret, token).inspect_err(|e| {
            debug!(error = %e, "Rejected bearer token");
        })?;
        Ok(Caller::new(claims.sub))
    }
}

/// Extract the token from a `Bearer <token>` header value. The scheme is case-insensitive.
pub fn bearer_token(authorization: Option<&str>) -> Result<&str, AuthError> {
    let value = authorization.ok_or(AuthError::MissingToken)?.trim();
    let (scheme, token) = value.split_once(' ').ok_or(AuthError::MissingToken)?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(AuthError::MissingToken);
    }
    Ok(token)
}
