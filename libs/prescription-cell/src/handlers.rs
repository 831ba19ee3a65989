use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde_json::{json, Value};

use auth_cell::authorize_request;
use shared_config::AppConfig;
use shared_models::auth::Role;
use shared_models::error::AppError;

use crate::models::CreatePrescriptionRequest;
use crate::services::PrescriptionService;

#[axum::debug_handler]
pub async fn save_prescription(
    State(state): State<Arc<AppConfig>>,
    headers: HeaderMap,
    Json(request): Json<CreatePrescriptionRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    authorize_request(&state, &headers, Role::Doctor).await?;

    let prescription = PrescriptionService::new(&state).save_prescription(request).await?;

    Ok((StatusCode::CREATED, Json(json!({
        "message": "Prescription saved successfully",
        "prescription": prescription
    }))))
}

#[axum::debug_handler]
pub async fn get_prescription(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    authorize_request(&state, &headers, Role::Doctor).await?;

    let prescription = PrescriptionService::new(&state).get_prescription(appointment_id).await?;

    Ok(Json(json!({ "prescription": prescription })))
}
