// libs/appointment-cell/src/services/booking.rs
use anyhow::anyhow;
use chrono::{NaiveDate, NaiveDateTime, Timelike};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info};

use doctor_cell::{parse_slot, AvailabilityService};
use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{
    Appointment, AppointmentError, AppointmentStatus, BookAppointmentRequest, DoctorAppointment,
    PatientAppointment, UpdateAppointmentRequest, APPOINTMENT_COLUMNS,
};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

pub struct AppointmentService {
    supabase: SupabaseClient,
    availability: AvailabilityService,
}

impl AppointmentService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            availability: AvailabilityService::new(config),
        }
    }

    pub async fn find_appointment(&self, appointment_id: i64) -> Result<Option<Appointment>, AppointmentError> {
        let path = format!("/rest/v1/appointments?id=eq.{}&select={}", appointment_id, APPOINTMENT_COLUMNS);
        let result: Vec<Appointment> = self.supabase.request(Method::GET, &path, None).await?;

        Ok(result.into_iter().next())
    }

    /// Fetches an appointment and checks it belongs to `patient_id`.
    async fn owned_appointment(&self, appointment_id: i64, patient_id: i64) -> Result<Appointment, AppointmentError> {
        let appointment = self
            .find_appointment(appointment_id)
            .await?
            .ok_or(AppointmentError::NotFound)?;

        if appointment.patient_id != patient_id {
            return Err(AppointmentError::NotOwner);
        }

        Ok(appointment)
    }

    /// The requested time of day must be one of the doctor's free slots on
    /// that date. An unknown doctor has no free slots.
    async fn ensure_available(&self, doctor_id: i64, time: NaiveDateTime) -> Result<(), AppointmentError> {
        let free = self.availability.availability(doctor_id, time.date()).await?;
        let requested = time.time().with_nanosecond(0).unwrap_or_else(|| time.time());

        for slot in &free {
            if parse_slot(slot)? == requested {
                return Ok(());
            }
        }

        Err(AppointmentError::SlotNotAvailable(time))
    }

    pub async fn book_appointment(
        &self,
        patient_id: i64,
        request: BookAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Booking appointment for patient {} with doctor {} at {}",
               patient_id, request.doctor_id, request.appointment_time);

        self.ensure_available(request.doctor_id, request.appointment_time).await?;

        let appointment_data = json!({
            "doctor_id": request.doctor_id,
            "patient_id": patient_id,
            "appointment_time": request.appointment_time.format(TIMESTAMP_FORMAT).to_string(),
            "status": AppointmentStatus::Scheduled,
        });

        let path = format!("/rest/v1/appointments?select={}", APPOINTMENT_COLUMNS);
        let created: Vec<Appointment> = self.supabase.write(Method::POST, &path, Some(appointment_data)).await?;

        let appointment = created
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("Failed to create appointment"))?;

        info!("Appointment {} booked", appointment.id);
        Ok(appointment)
    }

    /// Moving an appointment to a new time requires that time to be free.
    pub async fn update_appointment(
        &self,
        appointment_id: i64,
        patient_id: i64,
        request: UpdateAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Updating appointment: {}", appointment_id);

        let current = self.owned_appointment(appointment_id, patient_id).await?;

        let mut update_data = serde_json::Map::new();

        if let Some(time) = request.appointment_time {
            if time != current.appointment_time {
                self.ensure_available(current.doctor_id, time).await?;
            }
            update_data.insert("appointment_time".to_string(), json!(time.format(TIMESTAMP_FORMAT).to_string()));
        }
        if let Some(status) = request.status {
            update_data.insert("status".to_string(), json!(status));
        }

        if update_data.is_empty() {
            return Ok(current);
        }

        let path = format!("/rest/v1/appointments?id=eq.{}&select={}", appointment_id, APPOINTMENT_COLUMNS);
        let updated: Vec<Appointment> = self.supabase
            .write(Method::PATCH, &path, Some(Value::Object(update_data)))
            .await?;

        updated.into_iter().next().ok_or(AppointmentError::NotFound)
    }

    /// Deletes the appointment; only the patient who booked it may cancel.
    pub async fn cancel_appointment(&self, appointment_id: i64, patient_id: i64) -> Result<(), AppointmentError> {
        debug!("Cancelling appointment {} for patient {}", appointment_id, patient_id);

        self.owned_appointment(appointment_id, patient_id).await?;

        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        self.supabase.execute(Method::DELETE, &path, None).await?;

        info!("Appointment {} cancelled", appointment_id);
        Ok(())
    }

    /// A doctor's appointments on `date`, optionally narrowed to patients
    /// whose name contains `patient_name` (case-insensitive).
    pub async fn get_doctor_appointments(
        &self,
        doctor_id: i64,
        date: NaiveDate,
        patient_name: Option<&str>,
    ) -> Result<Vec<DoctorAppointment>, AppointmentError> {
        debug!("Fetching appointments for doctor {} on {}", doctor_id, date);

        let start = date.and_time(chrono::NaiveTime::MIN);
        let end = date
            .and_hms_opt(23, 59, 59)
            .ok_or_else(|| anyhow!("No end of day for {}", date))?;

        let path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&appointment_time=gte.{}&appointment_time=lte.{}&select={},patient:patients(id,name,email,phone)&order=appointment_time.asc",
            doctor_id,
            start.format(TIMESTAMP_FORMAT),
            end.format(TIMESTAMP_FORMAT),
            APPOINTMENT_COLUMNS,
        );
        let appointments: Vec<DoctorAppointment> = self.supabase.request(Method::GET, &path, None).await?;

        let Some(needle) = patient_name.map(str::to_lowercase).filter(|n| !n.is_empty()) else {
            return Ok(appointments);
        };

        Ok(appointments
            .into_iter()
            .filter(|a| a.patient.name.to_lowercase().contains(&needle))
            .collect())
    }

    pub async fn get_patient_appointments(&self, patient_id: i64) -> Result<Vec<PatientAppointment>, AppointmentError> {
        debug!("Fetching appointments for patient {}", patient_id);

        let path = format!(
            "/rest/v1/appointments?patient_id=eq.{}&select={},doctor:doctors(id,name,specialty)&order=appointment_time.asc",
            patient_id, APPOINTMENT_COLUMNS,
        );

        Ok(self.supabase.request(Method::GET, &path, None).await?)
    }
}
