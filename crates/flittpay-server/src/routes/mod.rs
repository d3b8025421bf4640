//! API routes for the flittpay server.

pub mod balance;
pub mod payment;

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::state::AppState;

/// Creates the main router with all routes mounted.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .nest("/api", api_routes(state))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Creates the `/api` routes.
fn api_routes(state: AppState) -> Router {
    Router::new()
        .nest("/balance", balance::router(state.clone()))
        .nest("/payment", payment::router(state))
}

async fn root() -> &'static str {
    "API is running..."
}
