use anyhow::anyhow;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;

use appointment_cell::{AppointmentService, PatientAppointment};
use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_utils::password::hash_password;

use crate::models::{CreatePatientRequest, Patient, PatientError, PATIENT_COLUMNS};

/// Wraps a value in double quotes for a PostgREST logic tree so `,`, `.`
/// and parentheses inside it are not read as syntax.
fn quote_filter_value(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

pub struct PatientService {
    supabase: SupabaseClient,
    appointments: AppointmentService,
}

impl PatientService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            appointments: AppointmentService::new(config),
        }
    }

    /// Registers a patient. Email and phone must both be unused.
    pub async fn create_patient(&self, request: CreatePatientRequest) -> Result<Patient, PatientError> {
        debug!("Creating new patient profile for: {}", request.email);

        request.validate()?;

        let existing_check_path = format!(
            "/rest/v1/patients?or=(email.eq.{},phone.eq.{})&select=id",
            urlencoding::encode(&quote_filter_value(&request.email)),
            urlencoding::encode(&quote_filter_value(&request.phone)),
        );
        let existing: Vec<Value> = self.supabase.request(Method::GET, &existing_check_path, None).await?;

        if !existing.is_empty() {
            return Err(PatientError::AlreadyExists {
                email: request.email,
                phone: request.phone,
            });
        }

        let password_hash = hash_password(&request.password)
            .map_err(|e| PatientError::Password(e.to_string()))?;

        let patient_data = json!({
            "name": request.name,
            "email": request.email,
            "password": password_hash,
            "phone": request.phone,
            "address": request.address,
        });

        let path = format!("/rest/v1/patients?select={}", PATIENT_COLUMNS);
        let result: Vec<Patient> = self.supabase.write(Method::POST, &path, Some(patient_data)).await?;

        let patient = result.into_iter().next().ok_or_else(|| anyhow!("Failed to create patient profile"))?;
        debug!("Patient profile created successfully with ID: {}", patient.id);

        Ok(patient)
    }

    pub async fn get_patient(&self, patient_id: i64) -> Result<Patient, PatientError> {
        debug!("Fetching patient profile: {}", patient_id);

        let path = format!("/rest/v1/patients?id=eq.{}&select={}", patient_id, PATIENT_COLUMNS);
        let result: Vec<Patient> = self.supabase.request(Method::GET, &path, None).await?;

        result.into_iter().next().ok_or(PatientError::NotFound)
    }

    pub async fn get_patient_appointments(&self, patient_id: i64) -> Result<Vec<PatientAppointment>, PatientError> {
        self.get_patient(patient_id).await?;

        Ok(self.appointments.get_patient_appointments(patient_id).await?)
    }
}
