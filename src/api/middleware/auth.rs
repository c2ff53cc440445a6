//! Bearer token authentication middleware

use std::sync::Arc;

use axum::{
    Json,
    body::Body,
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::debug;

/// Routes reachable without a token
const OPEN_PATHS: &[&str] = &["/api/v1/health"];

/// Rejects requests that do not carry `Authorization: Bearer <token>`
pub async fn require_token(
    State(expected): State<Arc<str>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    if OPEN_PATHS.contains(&request.uri().path()) {
        return Ok(next.run(request).await);
    }

    let presented = bearer_token(request.headers())?;
    if presented != &*expected {
        debug!("rejected request to {} with a wrong token", request.uri().path());
        return Err(AuthError::WrongToken);
    }

    Ok(next.run(request).await)
}

/// Token of a `Bearer` authorization header. The scheme is matched
/// case-insensitively.
fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::Missing)?
        .to_str()
        .map_err(|_| AuthError::Malformed)?;

    match value.trim().split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() => {
            Ok(token.trim())
        }
        _ => Err(AuthError::Malformed),
    }
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("missing Authorization header")]
    Missing,

    #[error("expected 'Authorization: Bearer <token>'")]
    Malformed,

    #[error("invalid token")]
    WrongToken,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match self {
            AuthError::Missing | AuthError::Malformed => StatusCode::UNAUTHORIZED,
            AuthError::WrongToken => StatusCode::FORBIDDEN,
        };

        let mut response = (status, Json(json!({ "error": self.to_string() }))).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}
