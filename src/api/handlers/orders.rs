//! Order upload and listing.

use axum::Extension;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};

use super::internal_error;
use crate::api::dto::OrderItem;
use crate::api::middleware::CurrentUser;
use crate::api::state::AppState;
use crate::service::ServiceError;

/// The body is the raw order number: decimal digits, nothing else.
pub async fn upload(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    body: String,
) -> Response {
    let number = body.trim();
    if number.is_empty() || !number.bytes().all(|b| b.is_ascii_digit()) {
        return (StatusCode::BAD_REQUEST, "invalid request format").into_response();
    }

    match state.orders.upload(user_id, number).await {
        Ok(()) => StatusCode::ACCEPTED.into_response(),
        Err(ServiceError::UploadedBySameUser) => StatusCode::OK.into_response(),
        Err(ServiceError::UploadedByAnotherUser) => {
            (StatusCode::CONFLICT, "order already uploaded by another user").into_response()
        }
        Err(ServiceError::InvalidOrderNumber) => {
            (StatusCode::UNPROCESSABLE_ENTITY, "invalid order number").into_response()
        }
        Err(_) => internal_error(),
    }
}

pub async fn list(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
) -> Response {
    match state.orders.list(user_id).await {
        Ok(orders) if orders.is_empty() => StatusCode::NO_CONTENT.into_response(),
        Ok(orders) => {
            let items: Vec<OrderItem> = orders.into_iter().map(OrderItem::from).collect();
            Json(items).into_response()
        }
        Err(_) => internal_error(),
    }
}
