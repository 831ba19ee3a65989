// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::NaiveDate;
use serde_json::{json, Value};

use auth_cell::authorize_request;
use shared_config::AppConfig;
use shared_models::auth::Role;
use shared_models::error::AppError;

use crate::models::{BookAppointmentRequest, DoctorAppointmentsQuery, UpdateAppointmentRequest};
use crate::services::AppointmentService;

// ==============================================================================
// PATIENT HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<AppConfig>>,
    headers: HeaderMap,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let patient = authorize_request(&state, &headers, Role::Patient).await?;

    let appointment = AppointmentService::new(&state)
        .book_appointment(patient.id, request)
        .await?;

    Ok((StatusCode::CREATED, Json(json!({
        "message": "Appointment booked successfully",
        "appointment": appointment
    }))))
}

#[axum::debug_handler]
pub async fn update_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<i64>,
    headers: HeaderMap,
    Json(request): Json<UpdateAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let patient = authorize_request(&state, &headers, Role::Patient).await?;

    let appointment = AppointmentService::new(&state)
        .update_appointment(appointment_id, patient.id, request)
        .await?;

    Ok(Json(json!({
        "message": "Appointment updated successfully",
        "appointment": appointment
    })))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    let patient = authorize_request(&state, &headers, Role::Patient).await?;

    AppointmentService::new(&state)
        .cancel_appointment(appointment_id, patient.id)
        .await?;

    Ok(Json(json!({ "message": "Appointment cancelled successfully" })))
}

// ==============================================================================
// DOCTOR HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn get_doctor_appointments(
    State(state): State<Arc<AppConfig>>,
    Path(date): Path<NaiveDate>,
    Query(query): Query<DoctorAppointmentsQuery>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    let doctor = authorize_request(&state, &headers, Role::Doctor).await?;

    let appointments = AppointmentService::new(&state)
        .get_doctor_appointments(doctor.id, date, query.patient_name.as_deref())
        .await?;

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len()
    })))
}
