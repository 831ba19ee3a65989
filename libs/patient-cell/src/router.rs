use std::sync::Arc;
use axum::{routing::{get, post}, Router};
use shared_config::AppConfig;

use crate::handlers::*;

pub fn create_patient_router(config: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", post(create_patient))
        .route("/me", get(get_patient_profile))
        .route("/me/appointments", get(get_patient_appointments))
        .with_state(config)
}
