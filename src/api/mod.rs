//! HTTP surface: routing, authorization middleware, gzip and request
//! logging. Handlers translate service errors into the documented status
//! codes and plain-text bodies.

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod state;

#[cfg(test)]
mod tests;

use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use tower_http::compression::CompressionLayer;
use tower_http::decompression::RequestDecompressionLayer;
use tower_http::trace::TraceLayer;

pub use state::AppState;

pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route(
            "/api/user/orders",
            post(handlers::orders::upload).get(handlers::orders::list),
        )
        .route("/api/user/balance", get(handlers::balance::user_balance))
        .route(
            "/api/user/balance/withdraw",
            post(handlers::withdrawals::withdraw),
        )
        .route("/api/user/withdrawals", get(handlers::withdrawals::list))
        .route_layer(from_fn_with_state(state.clone(), middleware::authorize));

    Router::new()
        .route("/", get(handlers::info::index))
        .route("/api/user/register", post(handlers::auth::register))
        .route("/api/user/login", post(handlers::auth::login))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(RequestDecompressionLayer::new())
        .layer(CompressionLayer::new())
        .with_state(state)
}
