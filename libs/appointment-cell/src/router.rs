// libs/appointment-cell/src/router.rs
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};

use shared_config::AppConfig;

use crate::handlers;

pub fn appointment_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", post(handlers::book_appointment))
        // The segment is a date for the doctor's day view and an id otherwise.
        .route(
            "/{key}",
            get(handlers::get_doctor_appointments)
                .put(handlers::update_appointment)
                .delete(handlers::cancel_appointment),
        )
        .with_state(state)
}
