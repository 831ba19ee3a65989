use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_models::error::AppError;

pub const PRESCRIPTION_COLUMNS: &str = "id,patient_name,appointment_id,medication,dosage,doctor_notes";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prescription {
    pub id: i64,
    pub patient_name: String,
    pub appointment_id: i64,
    pub medication: String,
    pub dosage: String,
    pub doctor_notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePrescriptionRequest {
    pub patient_name: String,
    pub appointment_id: i64,
    pub medication: String,
    pub dosage: String,
    #[serde(default)]
    pub doctor_notes: Option<String>,
}

fn check_length(field: &str, value: &str, min: usize, max: usize) -> Result<(), PrescriptionError> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(PrescriptionError::ValidationError(format!(
            "{} must be between {} and {} characters",
            field, min, max
        )));
    }
    Ok(())
}

impl CreatePrescriptionRequest {
    pub fn validate(&self) -> Result<(), PrescriptionError> {
        check_length("patient_name", &self.patient_name, 3, 100)?;
        check_length("medication", &self.medication, 3, 100)?;
        check_length("dosage", &self.dosage, 3, 20)?;
        if let Some(notes) = &self.doctor_notes {
            check_length("doctor_notes", notes, 0, 200)?;
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum PrescriptionError {
    #[error("No prescription found for this appointment")]
    NotFound,

    #[error("A prescription already exists for appointment {0}")]
    AlreadyExists(i64),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error(transparent)]
    Database(#[from] anyhow::Error),
}

impl From<PrescriptionError> for AppError {
    fn from(err: PrescriptionError) -> Self {
        match err {
            PrescriptionError::NotFound => AppError::NotFound(err.to_string()),
            PrescriptionError::AlreadyExists(_) => AppError::Conflict(err.to_string()),
            PrescriptionError::ValidationError(_) => AppError::ValidationError(err.to_string()),
            PrescriptionError::Database(e) => AppError::Database(e.to_string()),
        }
    }
}
