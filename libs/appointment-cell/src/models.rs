// libs/appointment-cell/src/models.rs
use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use doctor_cell::DoctorError;
use shared_models::error::AppError;

pub const APPOINTMENT_COLUMNS: &str = "id,doctor_id,patient_id,appointment_time,status";

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    #[default]
    Scheduled,
    Completed,
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Scheduled => write!(f, "scheduled"),
            AppointmentStatus::Completed => write!(f, "completed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: i64,
    pub doctor_id: i64,
    pub patient_id: i64,
    pub appointment_time: NaiveDateTime,
    #[serde(default)]
    pub status: AppointmentStatus,
}

/// Patient columns embedded in a doctor's day view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientSummary {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// Doctor columns embedded in a patient's own appointment list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoctorSummary {
    pub id: i64,
    pub name: String,
    pub specialty: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoctorAppointment {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub patient: PatientSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientAppointment {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub doctor: DoctorSummary,
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub doctor_id: i64,
    pub appointment_time: NaiveDateTime,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateAppointmentRequest {
    pub appointment_time: Option<NaiveDateTime>,
    pub status: Option<AppointmentStatus>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DoctorAppointmentsQuery {
    pub patient_name: Option<String>,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Error)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Doctor is not available at {0}")]
    SlotNotAvailable(NaiveDateTime),

    #[error("Unauthorized to modify this appointment")]
    NotOwner,

    #[error(transparent)]
    Doctor(#[from] DoctorError),

    #[error(transparent)]
    Database(#[from] anyhow::Error),
}

impl From<AppointmentError> for AppError {
    fn from(err: AppointmentError) -> Self {
        match err {
            AppointmentError::NotFound => AppError::BadRequest(err.to_string()),
            AppointmentError::SlotNotAvailable(_) => AppError::Conflict(err.to_string()),
            AppointmentError::NotOwner => AppError::Forbidden(err.to_string()),
            AppointmentError::Doctor(e) => e.into(),
            AppointmentError::Database(e) => AppError::Database(e.to_string()),
        }
    }
}
