use std::sync::Arc;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use serde_json::{json, Value};

use auth_cell::authorize_request;
use shared_config::AppConfig;
use shared_models::auth::Role;
use shared_models::error::AppError;

use crate::models::CreatePatientRequest;
use crate::services::PatientService;

#[axum::debug_handler]
pub async fn create_patient(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<CreatePatientRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let patient = PatientService::new(&config).create_patient(request).await?;

    Ok((StatusCode::CREATED, Json(json!({
        "message": "Signup successful",
        "patient": patient
    }))))
}

#[axum::debug_handler]
pub async fn get_patient_profile(
    State(config): State<Arc<AppConfig>>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    let user = authorize_request(&config, &headers, Role::Patient).await?;

    let patient = PatientService::new(&config).get_patient(user.id).await?;

    Ok(Json(json!({ "patient": patient })))
}

#[axum::debug_handler]
pub async fn get_patient_appointments(
    State(config): State<Arc<AppConfig>>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    let user = authorize_request(&config, &headers, Role::Patient).await?;

    let appointments = PatientService::new(&config)
        .get_patient_appointments(user.id)
        .await?;

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len()
    })))
}
