use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};

use shared_config::AppConfig;

use crate::handlers;

pub fn auth_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/{role}/login", post(handlers::login))
        .route("/validate/{role}", get(handlers::validate_token))
        .with_state(state)
}
