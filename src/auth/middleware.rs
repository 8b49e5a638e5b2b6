use axum::{
    Json,
    body::Body,
    extract::State,
    http::{Request, StatusCode, header},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use super::Claims;
use crate::gateway::{
    state::AppState,
    types::{ApiResponse, error_codes},
};

type Rejection = (StatusCode, Json<ApiResponse<()>>);

pub async fn jwt_auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, Rejection> {
    // 1. Extract Authorization header
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or((
            StatusCode::UNAUTHORIZED,
            Json(ApiResponse::<()>::error(
                error_codes::MISSING_AUTH,
                "Missing Authorization header",
            )),
        ))?;

    let Some(token) = auth_header.strip_prefix("Bearer ") else {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(ApiResponse::<()>::error(
                error_codes::AUTH_FAILED,
                "Invalid token format",
            )),
        ));
    };

    // 2. Verify token and inject claims
    match state.auth.verify_token(token) {
        Ok(claims) => {
            request.extensions_mut().insert(claims);
            Ok(next.run(request).await)
        }
        Err(e) => {
            tracing::debug!(error = %e, "Token rejected");
            Err((
                StatusCode::UNAUTHORIZED,
                Json(ApiResponse::<()>::error(
                    error_codes::AUTH_FAILED,
                    "Invalid or expired token",
                )),
            ))
        }
    }
}

/// Runs after `jwt_auth_middleware`; rejects roles that may only read
pub async fn require_placement_role(
    request: Request<Body>,
    next: Next,
) -> Result<Response, Rejection> {
    let claims = request.extensions().get::<Claims>().ok_or((
        StatusCode::UNAUTHORIZED,
        Json(ApiResponse::<()>::error(
            error_codes::MISSING_AUTH,
            "Missing caller identity",
        )),
    ))?;

    if !claims.role.can_modify_placement() {
        tracing::warn!(sub = %claims.sub, role = ?claims.role, "Placement change refused for role");
        return Err((
            StatusCode::FORBIDDEN,
            Json(ApiResponse::<()>::error(
                error_codes::FORBIDDEN,
                "Role not permitted to change student placement",
            )),
        ));
    }

    Ok(next.run(request).await)
}
