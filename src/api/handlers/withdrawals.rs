//! Point withdrawal and withdrawal history.

use axum::Extension;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};

use super::internal_error;
use crate::api::dto::{WithdrawRequest, WithdrawalItem};
use crate::api::middleware::CurrentUser;
use crate::api::state::AppState;
use crate::service::ServiceError;

pub async fn withdraw(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    payload: Result<Json<WithdrawRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            return (StatusCode::BAD_REQUEST, rejection.body_text()).into_response();
        }
    };

    match state
        .withdrawals
        .withdraw(user_id, &request.order, request.sum)
        .await
    {
        Ok(()) => StatusCode::OK.into_response(),
        Err(ServiceError::InsufficientFunds) => {
            (StatusCode::PAYMENT_REQUIRED, "insufficient funds in the account").into_response()
        }
        Err(ServiceError::InvalidSum) => {
            (StatusCode::UNPROCESSABLE_ENTITY, "sum must be positive").into_response()
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
    match state.withdrawals.list(user_id).await {
        Ok(withdrawals) if withdrawals.is_empty() => StatusCode::NO_CONTENT.into_response(),
        Ok(withdrawals) => {
            let items: Vec<WithdrawalItem> =
                withdrawals.into_iter().map(WithdrawalItem::from).collect();
            Json(items).into_response()
        }
        Err(_) => internal_error(),
    }
}
