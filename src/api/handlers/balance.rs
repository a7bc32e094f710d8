//! Balance read.

use axum::Extension;
use axum::extract::State;
use axum::response::{IntoResponse, Json, Response};

use super::internal_error;
use crate::api::dto::BalanceResponse;
use crate::api::middleware::CurrentUser;
use crate::api::state::AppState;

pub async fn user_balance(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
) -> Response {
    match state.balance.user_balance(user_id).await {
        Ok(balance) => Json(BalanceResponse::from(balance)).into_response(),
        Err(_) => internal_error(),
    }
}
