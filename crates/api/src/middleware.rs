use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use storefront_auth::{JwtValidator, TokenType};

use crate::app::errors;
use crate::context::IdentityContext;

#[derive(Clone)]
pub struct AuthState {
    pub jwt: Arc<dyn JwtValidator>,
}

/// Resolve the caller's identity from `Authorization: Bearer <access token>`.
///
/// No header means anonymous. A header that is present but malformed, expired,
/// badly signed or carrying a refresh token is rejected with 401 here.
pub async fn identity_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, Response> {
    let identity = match extract_bearer(req.headers())? {
        None => None,
        Some(token) => {
            let claims = state.jwt.validate(token, Utc::now()).map_err(|e| {
                tracing::debug!(error = %e, "rejected bearer token");
                invalid_token()
            })?;
            if claims.token_type != TokenType::Access {
                return Err(invalid_token());
            }
            Some(IdentityContext::new(claims.sub, claims.username))
        }
    };

    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}

fn extract_bearer(headers: &HeaderMap) -> Result<Option<&str>, Response> {
    let Some(header) = headers.get(axum::http::header::AUTHORIZATION) else {
        return Ok(None);
    };

    let header = header.to_str().map_err(|_| invalid_token())?;
    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(invalid_token)?
        .trim();
    if token.is_empty() {
        return Err(invalid_token());
    }

    Ok(Some(token))
}

fn invalid_token() -> Response {
    errors::json_error(
        StatusCode::UNAUTHORIZED,
        "token_not_valid",
        "Given token not valid for any token type",
    )
}
