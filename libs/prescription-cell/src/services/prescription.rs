use anyhow::anyhow;
use reqwest::Method;
use serde_json::json;
use tracing::{debug, info};

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{CreatePrescriptionRequest, Prescription, PrescriptionError, PRESCRIPTION_COLUMNS};

pub struct PrescriptionService {
    supabase: SupabaseClient,
}

impl PrescriptionService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    async fn find_by_appointment(&self, appointment_id: i64) -> Result<Option<Prescription>, PrescriptionError> {
        let path = format!(
            "/rest/v1/prescriptions?appointment_id=eq.{}&select={}",
            appointment_id, PRESCRIPTION_COLUMNS
        );
        let result: Vec<Prescription> = self.supabase.request(Method::GET, &path, None).await?;

        Ok(result.into_iter().next())
    }

    /// One prescription per appointment.
    pub async fn save_prescription(&self, request: CreatePrescriptionRequest) -> Result<Prescription, PrescriptionError> {
        debug!("Saving prescription for appointment {}", request.appointment_id);

        request.validate()?;

        if self.find_by_appointment(request.appointment_id).await?.is_some() {
            return Err(PrescriptionError::AlreadyExists(request.appointment_id));
        }

        let path = format!("/rest/v1/prescriptions?select={}", PRESCRIPTION_COLUMNS);
        let created: Vec<Prescription> = self.supabase.write(Method::POST, &path, Some(json!(request))).await?;

        let prescription = created
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("Failed to save prescription"))?;

        info!("Prescription {} saved for appointment {}", prescription.id, prescription.appointment_id);
        Ok(prescription)
    }

    pub async fn get_prescription(&self, appointment_id: i64) -> Result<Prescription, PrescriptionError> {
        debug!("Fetching prescription for appointment {}", appointment_id);

        self.find_by_appointment(appointment_id)
            .await?
            .ok_or(PrescriptionError::NotFound)
    }
}
