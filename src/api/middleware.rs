//! Bearer-token authorizer for the protected routes.

use axum::extract::{Request, State};
use axum::http::{StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use super::state::AppState;
use crate::service::ServiceError;

/// Authenticated user id, injected into request extensions by [`authorize`].
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub i64);

pub async fn authorize(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    if header.is_empty() {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let token = header.strip_prefix("Bearer ").unwrap_or(header);
    match state.auth.authenticate(token).await {
        Ok(user) => {
            request.extensions_mut().insert(CurrentUser(user.id));
            next.run(request).await
        }
        Err(ServiceError::TokenExpired) => {
            (StatusCode::UNAUTHORIZED, "token expired").into_response()
        }
        Err(_) => StatusCode::UNAUTHORIZED.into_response(),
    }
}
