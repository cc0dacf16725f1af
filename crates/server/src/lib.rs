pub mod api;
pub mod bootstrap;
pub mod error;
pub mod functions;
pub mod health;
pub mod state;

use axum::Router;
use parley_db::DbPool;
use tower_http::cors::{Any, CorsLayer};

pub use state::AppState;

/// Full HTTP surface: model functions, store REST API and health, behind permissive CORS.
/// `OPTIONS` pre-flight requests are answered by the CORS layer with an empty 200.
pub fn app(state: AppState, db_pool: DbPool) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .merge(functions::router())
        .merge(api::router())
        .with_state(state)
        .merge(health::router(db_pool))
        .layer(cors)
}
