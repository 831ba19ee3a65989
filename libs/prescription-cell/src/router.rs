use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};

use shared_config::AppConfig;

use crate::handlers;

pub fn prescription_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", post(handlers::save_prescription))
        .route("/{appointment_id}", get(handlers::get_prescription))
        .with_state(state)
}
