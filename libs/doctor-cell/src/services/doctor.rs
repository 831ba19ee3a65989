use anyhow::anyhow;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_utils::password::hash_password;

use crate::models::{
    CreateDoctorRequest, Doctor, DoctorError, DoctorFilter, UpdateDoctorRequest, DOCTOR_COLUMNS,
};
use crate::services::availability::{filter_by_am_pm, validate_slots};

const MIN_PASSWORD_LENGTH: usize = 6;

fn validate_password(password: &str) -> Result<(), DoctorError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(DoctorError::ValidationError(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

pub struct DoctorService {
    supabase: SupabaseClient,
}

impl DoctorService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn list_doctors(&self) -> Result<Vec<Doctor>, DoctorError> {
        debug!("Listing all doctors");

        let path = format!("/rest/v1/doctors?select={}&order=id.asc", DOCTOR_COLUMNS);
        Ok(self.supabase.request(Method::GET, &path, None).await?)
    }

    pub async fn find_doctor(&self, doctor_id: i64) -> Result<Option<Doctor>, DoctorError> {
        let path = format!("/rest/v1/doctors?id=eq.{}&select={}", doctor_id, DOCTOR_COLUMNS);
        let result: Vec<Doctor> = self.supabase.request(Method::GET, &path, None).await?;

        Ok(result.into_iter().next())
    }

    pub async fn get_doctor(&self, doctor_id: i64) -> Result<Doctor, DoctorError> {
        self.find_doctor(doctor_id).await?.ok_or(DoctorError::NotFound)
    }

    async fn email_taken(&self, email: &str) -> Result<bool, DoctorError> {
        let path = format!("/rest/v1/doctors?email=eq.{}&select=id", urlencoding::encode(email));
        let existing: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;

        Ok(!existing.is_empty())
    }

    pub async fn save_doctor(&self, request: CreateDoctorRequest) -> Result<Doctor, DoctorError> {
        debug!("Creating doctor profile for: {}", request.email);

        validate_slots(&request.available_times)?;
        validate_password(&request.password)?;

        if self.email_taken(&request.email).await? {
            return Err(DoctorError::AlreadyExists(request.email));
        }

        let password_hash = hash_password(&request.password)
            .map_err(|e| DoctorError::Password(e.to_string()))?;

        let doctor_data = json!({
            "name": request.name,
            "specialty": request.specialty,
            "email": request.email,
            "password": password_hash,
            "phone": request.phone,
            "available_times": request.available_times,
        });

        let path = format!("/rest/v1/doctors?select={}", DOCTOR_COLUMNS);
        let created: Vec<Doctor> = self.supabase.write(Method::POST, &path, Some(doctor_data)).await?;

        let doctor = created.into_iter().next().ok_or_else(|| anyhow!("Failed to create doctor profile"))?;
        debug!("Doctor profile created with ID: {}", doctor.id);

        Ok(doctor)
    }

    pub async fn update_doctor(&self, doctor_id: i64, request: UpdateDoctorRequest) -> Result<Doctor, DoctorError> {
        debug!("Updating doctor profile: {}", doctor_id);

        let current = self.get_doctor(doctor_id).await?;

        let mut update_data = serde_json::Map::new();

        if let Some(name) = request.name {
            update_data.insert("name".to_string(), json!(name));
        }
        if let Some(specialty) = request.specialty {
            update_data.insert("specialty".to_string(), json!(specialty));
        }
        if let Some(email) = request.email {
            if email != current.email && self.email_taken(&email).await? {
                return Err(DoctorError::AlreadyExists(email));
            }
            update_data.insert("email".to_string(), json!(email));
        }
        if let Some(phone) = request.phone {
            update_data.insert("phone".to_string(), json!(phone));
        }
        if let Some(times) = request.available_times {
            validate_slots(&times)?;
            update_data.insert("available_times".to_string(), json!(times));
        }
        if let Some(password) = request.password {
            validate_password(&password)?;
            let hash = hash_password(&password).map_err(|e| DoctorError::Password(e.to_string()))?;
            update_data.insert("password".to_string(), json!(hash));
        }

        if update_data.is_empty() {
            return Ok(current);
        }

        let path = format!("/rest/v1/doctors?id=eq.{}&select={}", doctor_id, DOCTOR_COLUMNS);
        let updated: Vec<Doctor> = self.supabase
            .write(Method::PATCH, &path, Some(Value::Object(update_data)))
            .await?;

        updated.into_iter().next().ok_or(DoctorError::NotFound)
    }

    /// Removes the doctor together with every appointment booked with them.
    pub async fn delete_doctor(&self, doctor_id: i64) -> Result<(), DoctorError> {
        debug!("Deleting doctor: {}", doctor_id);

        self.get_doctor(doctor_id).await?;

        let appointments_path = format!("/rest/v1/appointments?doctor_id=eq.{}", doctor_id);
        self.supabase.execute(Method::DELETE, &appointments_path, None).await?;

        let doctor_path = format!("/rest/v1/doctors?id=eq.{}", doctor_id);
        self.supabase.execute(Method::DELETE, &doctor_path, None).await?;

        Ok(())
    }

    /// Name and specialty are compared here rather than in a PostgREST
    /// `ilike` pattern, so `%`, `_` and `*` in the input are literal.
    pub async fn filter_doctors(&self, filter: DoctorFilter) -> Result<Vec<Doctor>, DoctorError> {
        debug!("Filtering doctors with: {:?}", filter);

        let doctors: Vec<Doctor> = self
            .list_doctors()
            .await?
            .into_iter()
            .filter(|doctor| filter.matches(doctor))
            .collect();

        match filter.time.as_deref().filter(|t| !t.is_empty()) {
            Some(period) => filter_by_am_pm(doctors, period),
            None => Ok(doctors),
        }
    }
}
