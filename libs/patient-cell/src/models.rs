use serde::{Deserialize, Serialize};
use thiserror::Error;

use appointment_cell::AppointmentError;
use shared_models::error::AppError;

/// Columns of `patients` returned to callers; never the password hash.
pub const PATIENT_COLUMNS: &str = "id,name,email,phone,address";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePatientRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: String,
    pub address: String,
}

impl CreatePatientRequest {
    pub fn validate(&self) -> Result<(), PatientError> {
        if self.name.trim().is_empty() {
            return Err(PatientError::ValidationError("Name is required".to_string()));
        }
        if !self.email.contains('@') {
            return Err(PatientError::ValidationError(format!("Invalid email address: {}", self.email)));
        }
        if self.phone.len() != 10 || !self.phone.chars().all(|c| c.is_ascii_digit()) {
            return Err(PatientError::ValidationError("Phone number must be 10 digits".to_string()));
        }
        if self.password.len() < 6 {
            return Err(PatientError::ValidationError("Password must be at least 6 characters".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum PatientError {
    #[error("Patient not found")]
    NotFound,

    #[error("Patient with email {email} or phone {phone} already exists")]
    AlreadyExists { email: String, phone: String },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Password hashing failed: {0}")]
    Password(String),

    #[error(transparent)]
    Appointment(#[from] AppointmentError),

    #[error(transparent)]
    Database(#[from] anyhow::Error),
}

impl From<PatientError> for AppError {
    fn from(err: PatientError) -> Self {
        match err {
            PatientError::NotFound => AppError::NotFound(err.to_string()),
            PatientError::AlreadyExists { .. } => AppError::Conflict(err.to_string()),
            PatientError::ValidationError(_) => AppError::ValidationError(err.to_string()),
            PatientError::Password(_) => AppError::Internal(err.to_string()),
            PatientError::Appointment(e) => e.into(),
            PatientError::Database(e) => AppError::Database(e.to_string()),
        }
    }
}
