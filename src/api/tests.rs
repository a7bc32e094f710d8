//! Router-level tests: every documented status code, driven through the real
//! middleware stack with the in-memory ledger.

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use rust_decimal::Decimal;
use tower::ServiceExt;

use super::{AppState, router};
use crate::store::mock::MockLedger;

const NUMBER: &str = "5062821234567892";
const OTHER_NUMBER: &str = "5062821234567819";

fn app() -> (Arc<MockLedger>, Router) {
    let ledger = Arc::new(MockLedger::new());
    let state = AppState::new(ledger.clone(), "test-secret");
    (ledger, router(state))
}

async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

fn json_request(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_owned()))
        .unwrap()
}

fn authed_json_request(uri: &str, token: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, token)
        .body(Body::from(body.to_owned()))
        .unwrap()
}

fn upload_request(token: &str, number: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/user/orders")
        .header(header::AUTHORIZATION, token)
        .body(Body::from(number.to_owned()))
        .unwrap()
}

fn get_request(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header(header::AUTHORIZATION, token)
        .body(Body::empty())
        .unwrap()
}

/// Registers a user and returns the bearer header value.
async fn register(app: &Router, login: &str) -> String {
    let response = send(
        app,
        json_request(
            "/api/user/register",
            &format!(r#"{{"login":"{login}","password":"pw"}}"#),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    response.headers()[header::AUTHORIZATION]
        .to_str()
        .unwrap()
        .to_owned()
}

async fn body_json(response: Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn register_returns_token_in_authorization_header() {
    let (_, app) = app();
    let token = register(&app, "alice").await;
    assert!(token.starts_with("Bearer "));
}

#[tokio::test]
async fn register_duplicate_login_is_conflict() {
    let (_, app) = app();
    register(&app, "bob").await;

    let response = send(
        &app,
        json_request("/api/user/register", r#"{"login":"bob","password":"pw"}"#),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn register_rejects_bad_payloads() {
    let (_, app) = app();

    let empty_login = send(
        &app,
        json_request("/api/user/register", r#"{"login":"  ","password":"pw"}"#),
    )
    .await;
    assert_eq!(empty_login.status(), StatusCode::BAD_REQUEST);

    let malformed = send(&app, json_request("/api/user/register", "{not json")).await;
    assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_succeeds_with_the_registered_credentials_only() {
    let (_, app) = app();
    register(&app, "carol").await;

    let ok = send(
        &app,
        json_request("/api/user/login", r#"{"login":"carol","password":"pw"}"#),
    )
    .await;
    assert_eq!(ok.status(), StatusCode::OK);
    assert!(ok.headers().contains_key(header::AUTHORIZATION));

    let wrong = send(
        &app,
        json_request("/api/user/login", r#"{"login":"carol","password":"nope"}"#),
    )
    .await;
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn protected_routes_require_a_valid_token() {
    let (_, app) = app();

    let missing = send(
        &app,
        Request::builder()
            .method("GET")
            .uri("/api/user/orders")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

    let garbage = send(&app, get_request("/api/user/orders", "Bearer garbage")).await;
    assert_eq!(garbage.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn order_upload_covers_every_documented_status() {
    let (_, app) = app();
    let token = register(&app, "dave").await;
    let other = register(&app, "erin").await;

    let accepted = send(&app, upload_request(&token, NUMBER)).await;
    assert_eq!(accepted.status(), StatusCode::ACCEPTED);

    let repeated = send(&app, upload_request(&token, NUMBER)).await;
    assert_eq!(repeated.status(), StatusCode::OK);

    let foreign = send(&app, upload_request(&other, NUMBER)).await;
    assert_eq!(foreign.status(), StatusCode::CONFLICT);

    let luhn_invalid = send(&app, upload_request(&token, "5062821234567899")).await;
    assert_eq!(luhn_invalid.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let not_a_number = send(&app, upload_request(&token, "order#1")).await;
    assert_eq!(not_a_number.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn order_list_is_204_until_something_is_uploaded() {
    let (_, app) = app();
    let token = register(&app, "frank").await;

    let empty = send(&app, get_request("/api/user/orders", &token)).await;
    assert_eq!(empty.status(), StatusCode::NO_CONTENT);

    send(&app, upload_request(&token, NUMBER)).await;
    let listed = send(&app, get_request("/api/user/orders", &token)).await;
    assert_eq!(listed.status(), StatusCode::OK);

    let json = body_json(listed).await;
    assert_eq!(json[0]["number"], NUMBER);
    assert_eq!(json[0]["status"], "NEW");
    assert!(json[0].get("accrual").is_none());
    assert!(json[0].get("uploaded_at").is_some());
}

#[tokio::test]
async fn balance_reports_current_and_withdrawn() {
    let (ledger, app) = app();
    let token = register(&app, "grace").await;
    ledger.set_balance(1, Decimal::new(5005, 1));

    let response = send(&app, get_request("/api/user/balance", &token)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["current"], serde_json::json!(500.5));
    assert_eq!(json["withdrawn"], serde_json::json!(0.0));
}

#[tokio::test]
async fn withdraw_covers_every_documented_status() {
    let (ledger, app) = app();
    let token = register(&app, "heidi").await;
    ledger.set_balance(1, Decimal::from(100));

    let insufficient = send(
        &app,
        authed_json_request(
            "/api/user/balance/withdraw",
            &token,
            &format!(r#"{{"order":"{NUMBER}","sum":200}}"#),
        ),
    )
    .await;
    assert_eq!(insufficient.status(), StatusCode::PAYMENT_REQUIRED);

    let bad_sum = send(
        &app,
        authed_json_request(
            "/api/user/balance/withdraw",
            &token,
            &format!(r#"{{"order":"{NUMBER}","sum":0}}"#),
        ),
    )
    .await;
    assert_eq!(bad_sum.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let bad_number = send(
        &app,
        authed_json_request(
            "/api/user/balance/withdraw",
            &token,
            r#"{"order":"5062821234567899","sum":10}"#,
        ),
    )
    .await;
    assert_eq!(bad_number.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let ok = send(
        &app,
        authed_json_request(
            "/api/user/balance/withdraw",
            &token,
            &format!(r#"{{"order":"{OTHER_NUMBER}","sum":40.5}}"#),
        ),
    )
    .await;
    assert_eq!(ok.status(), StatusCode::OK);

    let balance = body_json(send(&app, get_request("/api/user/balance", &token)).await).await;
    assert_eq!(balance["current"], serde_json::json!(59.5));
    assert_eq!(balance["withdrawn"], serde_json::json!(40.5));
}

#[tokio::test]
async fn withdrawals_list_is_204_until_something_is_withdrawn() {
    let (ledger, app) = app();
    let token = register(&app, "ivan").await;

    let empty = send(&app, get_request("/api/user/withdrawals", &token)).await;
    assert_eq!(empty.status(), StatusCode::NO_CONTENT);

    ledger.set_balance(1, Decimal::from(100));
    send(
        &app,
        authed_json_request(
            "/api/user/balance/withdraw",
            &token,
            &format!(r#"{{"order":"{NUMBER}","sum":25}}"#),
        ),
    )
    .await;

    let listed = send(&app, get_request("/api/user/withdrawals", &token)).await;
    assert_eq!(listed.status(), StatusCode::OK);

    let json = body_json(listed).await;
    assert_eq!(json[0]["order"], NUMBER);
    assert_eq!(json[0]["sum"], serde_json::json!(25.0));
    assert!(json[0].get("processed_at").is_some());
}

#[tokio::test]
async fn json_responses_are_gzip_compressed_when_requested() {
    let (_, app) = app();
    let token = register(&app, "judy").await;
    send(&app, upload_request(&token, NUMBER)).await;

    let mut request = get_request("/api/user/orders", &token);
    request
        .headers_mut()
        .insert(header::ACCEPT_ENCODING, "gzip".parse().unwrap());

    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::CONTENT_ENCODING)
            .and_then(|v| v.to_str().ok()),
        Some("gzip")
    );
}
