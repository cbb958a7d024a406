//! Bearer-token authentication middleware.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use uuid::Uuid;

use crate::error::AppError;
use crate::security::jwt;
use crate::state::AppState;

/// Identity resolved from a valid access token, available to handlers
/// through request extensions.
#[derive(Debug, Clone)]
pub struct AuthedUser {
    pub id: Uuid,
    pub username: String,
}

/// Extract and verify the bearer token, then stash the caller's identity
/// in request extensions. Routes behind this layer can rely on
/// `Extension<AuthedUser>` being present.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AppError::Unauthorized)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AppError::Unauthorized)?;

    let claims = jwt::verify_token(token, &state.config.jwt_secret)?;

    req.extensions_mut().insert(AuthedUser {
        id: claims.sub,
        username: claims.username,
    });

    Ok(next.run(req).await)
}
