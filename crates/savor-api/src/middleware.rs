use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use crate::auth::{AppState, AuthError};
use crate::error::ApiError;

/// Resolve the bearer token and stash the caller's `Identity` in the
/// request extensions. Runs before any write handler.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::Unauthorized)?;

    let identity = state.identity.resolve(token)?;

    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}
