use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::NaiveDate;
use serde_json::{json, Value};

use auth_cell::{authorize_request, TokenService};
use shared_config::AppConfig;
use shared_models::auth::Role;
use shared_models::error::AppError;
use shared_utils::extractor::extract_bearer_token;

use crate::models::{CreateDoctorRequest, DoctorAvailabilityResponse, DoctorFilter, UpdateDoctorRequest};
use crate::services::{AvailabilityService, DoctorService};

// ==============================================================================
// PUBLIC HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_doctors(
    State(state): State<Arc<AppConfig>>,
) -> Result<Json<Value>, AppError> {
    let doctors = DoctorService::new(&state).list_doctors().await?;

    Ok(Json(json!({
        "doctors": doctors,
        "total": doctors.len()
    })))
}

#[axum::debug_handler]
pub async fn get_doctor(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let doctor = DoctorService::new(&state).get_doctor(doctor_id).await?;

    Ok(Json(json!(doctor)))
}

#[axum::debug_handler]
pub async fn filter_doctors(
    State(state): State<Arc<AppConfig>>,
    Query(filter): Query<DoctorFilter>,
) -> Result<Json<Value>, AppError> {
    let doctors = DoctorService::new(&state).filter_doctors(filter).await?;

    Ok(Json(json!({
        "doctors": doctors,
        "total": doctors.len()
    })))
}

// ==============================================================================
// PROTECTED HANDLERS
// ==============================================================================

/// Free slots for a doctor on a date; the caller's token must be valid for
/// the role named in the path.
#[axum::debug_handler]
pub async fn get_doctor_availability(
    State(state): State<Arc<AppConfig>>,
    Path((role, doctor_id, date)): Path<(String, i64, NaiveDate)>,
    headers: HeaderMap,
) -> Result<Json<DoctorAvailabilityResponse>, AppError> {
    let token = extract_bearer_token(&headers)?;

    if !TokenService::new(&state)?.validate(&token, &role).await {
        return Err(AppError::Auth("Invalid or unauthorized token".to_string()));
    }

    let availability = AvailabilityService::new(&state).availability(doctor_id, date).await?;

    Ok(Json(DoctorAvailabilityResponse {
        doctor_id,
        date,
        availability,
    }))
}

#[axum::debug_handler]
pub async fn create_doctor(
    State(state): State<Arc<AppConfig>>,
    headers: HeaderMap,
    Json(request): Json<CreateDoctorRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    authorize_request(&state, &headers, Role::Admin).await?;

    let doctor = DoctorService::new(&state).save_doctor(request).await?;

    Ok((StatusCode::CREATED, Json(json!({
        "message": "Doctor added to db",
        "doctor": doctor
    }))))
}

#[axum::debug_handler]
pub async fn update_doctor(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<i64>,
    headers: HeaderMap,
    Json(request): Json<UpdateDoctorRequest>,
) -> Result<Json<Value>, AppError> {
    authorize_request(&state, &headers, Role::Admin).await?;

    let doctor = DoctorService::new(&state).update_doctor(doctor_id, request).await?;

    Ok(Json(json!({
        "message": "Doctor updated",
        "doctor": doctor
    })))
}

#[axum::debug_handler]
pub async fn delete_doctor(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    authorize_request(&state, &headers, Role::Admin).await?;

    DoctorService::new(&state).delete_doctor(doctor_id).await?;

    Ok(Json(json!({ "message": "Doctor deleted successfully" })))
}
