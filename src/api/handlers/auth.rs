//! Registration and login. Both return the fresh token in the
//! `Authorization` response header.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};

use super::internal_error;
use crate::api::dto::Credentials;
use crate::api::state::AppState;
use crate::service::ServiceError;

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Response {
    let Json(credentials) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            return (StatusCode::BAD_REQUEST, rejection.body_text()).into_response();
        }
    };

    match state
        .auth
        .register(&credentials.login, &credentials.password)
        .await
    {
        Ok(token) => bearer_ok(&token),
        Err(err @ ServiceError::InvalidCredentials(_)) => {
            (StatusCode::BAD_REQUEST, err.to_string()).into_response()
        }
        Err(ServiceError::UserAlreadyExists) => {
            (StatusCode::CONFLICT, "login already taken").into_response()
        }
        Err(_) => internal_error(),
    }
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Response {
    let Json(credentials) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            return (StatusCode::BAD_REQUEST, rejection.body_text()).into_response();
        }
    };

    match state
        .auth
        .login(&credentials.login, &credentials.password)
        .await
    {
        Ok(token) => bearer_ok(&token),
        Err(ServiceError::InvalidCredentials(_)) => {
            (StatusCode::UNAUTHORIZED, "invalid login or password").into_response()
        }
        Err(_) => internal_error(),
    }
}

fn bearer_ok(token: &str) -> Response {
    (
        StatusCode::OK,
        [(header::AUTHORIZATION, format!("Bearer {token}"))],
    )
        .into_response()
}
