use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_models::error::AppError;

/// Columns of `doctors` safe to return to callers. The password hash is
/// only ever read by the login lookup.
pub const DOCTOR_COLUMNS: &str = "id,name,specialty,email,phone,available_times";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Doctor {
    pub id: i64,
    pub name: String,
    pub specialty: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    available_times: Vec<String>,
}

impl Doctor {
    pub fn new(
        id: i64,
        name: impl Into<String>,
        specialty: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
        available_times: Vec<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            specialty: specialty.into(),
            email: email.into(),
            phone: phone.into(),
            available_times,
        }
    }

    /// The doctor's recurring daily slots, in their configured order.
    pub fn available_times(&self) -> &[String] {
        &self.available_times
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDoctorRequest {
    pub name: String,
    pub specialty: String,
    pub email: String,
    pub password: String,
    pub phone: String,
    #[serde(default)]
    pub available_times: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateDoctorRequest {
    pub name: Option<String>,
    pub specialty: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub phone: Option<String>,
    pub available_times: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DoctorFilter {
    pub name: Option<String>,
    pub specialty: Option<String>,
    pub time: Option<String>,
}

impl DoctorFilter {
    /// Name is a case-insensitive substring match, specialty a
    /// case-insensitive exact match. Absent or empty criteria match all.
    pub fn matches(&self, doctor: &Doctor) -> bool {
        let name_matches = match self.name.as_deref().filter(|n| !n.is_empty()) {
            Some(name) => doctor.name.to_lowercase().contains(&name.to_lowercase()),
            None => true,
        };
        let specialty_matches = match self.specialty.as_deref().filter(|s| !s.is_empty()) {
            Some(specialty) => doctor.specialty.to_lowercase() == specialty.to_lowercase(),
            None => true,
        };

        name_matches && specialty_matches
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookedTime {
    pub appointment_time: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct DoctorAvailabilityResponse {
    pub doctor_id: i64,
    pub date: NaiveDate,
    pub availability: Vec<String>,
}

/// Half of the day a slot starts in; the split is at 12:00.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayPeriod {
    Am,
    Pm,
}

impl DayPeriod {
    pub fn includes_hour(&self, hour: u32) -> bool {
        match self {
            DayPeriod::Am => hour < 12,
            DayPeriod::Pm => hour >= 12,
        }
    }
}

impl FromStr for DayPeriod {
    type Err = DoctorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("am") {
            Ok(DayPeriod::Am)
        } else if s.eq_ignore_ascii_case("pm") {
            Ok(DayPeriod::Pm)
        } else {
            Err(DoctorError::InvalidPeriod(s.to_string()))
        }
    }
}

impl fmt::Display for DayPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DayPeriod::Am => write!(f, "AM"),
            DayPeriod::Pm => write!(f, "PM"),
        }
    }
}

#[derive(Debug, Error)]
pub enum DoctorError {
    #[error("Doctor not found")]
    NotFound,

    #[error("Doctor with email {0} already exists")]
    AlreadyExists(String),

    #[error("Malformed time slot '{0}', expected H[H]:MM[:SS]")]
    MalformedSlot(String),

    #[error("Unknown time of day '{0}', expected AM or PM")]
    InvalidPeriod(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Password hashing failed: {0}")]
    Password(String),

    #[error(transparent)]
    Database(#[from] anyhow::Error),
}

impl From<DoctorError> for AppError {
    fn from(err: DoctorError) -> Self {
        match err {
            DoctorError::NotFound => AppError::NotFound(err.to_string()),
            DoctorError::AlreadyExists(_) => AppError::Conflict(err.to_string()),
            DoctorError::MalformedSlot(_) => AppError::UnprocessableEntity(err.to_string()),
            DoctorError::InvalidPeriod(_) | DoctorError::ValidationError(_) => {
                AppError::ValidationError(err.to_string())
            }
            DoctorError::Password(_) => AppError::Internal(err.to_string()),
            DoctorError::Database(e) => AppError::Database(e.to_string()),
        }
    }
}
