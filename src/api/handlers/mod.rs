pub mod auth;
pub mod balance;
pub mod info;
pub mod orders;
pub mod withdrawals;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Uniform body for every fault the API cannot classify.
pub(crate) fn internal_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "oops, something went wrong").into_response()
}
