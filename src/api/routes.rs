use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::server::{api_key_auth, AppState};

use super::health::health;
use super::mail::{render, send};

pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health
        .route("/health", get(health))
        // Mailing endpoints
        .nest(
            "/api/v1",
            Router::new()
                .route("/render", post(render))
                .route("/send", post(send))
                .route_layer(middleware::from_fn_with_state(state, api_key_auth)),
        )
}
