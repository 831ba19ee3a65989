// libs/doctor-cell/src/services/availability.rs

use std::collections::HashSet;
use std::sync::OnceLock;

use anyhow::anyhow;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use regex::Regex;
use reqwest::Method;
use tracing::debug;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{BookedTime, DayPeriod, Doctor, DoctorError};
use crate::services::doctor::DoctorService;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

fn slot_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(\d{1,2}):(\d{2})(?::(\d{2}))?$").expect("slot pattern compiles")
    })
}

/// Parses a slot string of the form `H[H]:MM[:SS]`.
pub fn parse_slot(slot: &str) -> Result<NaiveTime, DoctorError> {
    let malformed = || DoctorError::MalformedSlot(slot.to_string());

    let captures = slot_pattern().captures(slot).ok_or_else(malformed)?;
    let field = |index: usize| -> Result<u32, DoctorError> {
        captures
            .get(index)
            .map_or(Ok(0), |m| m.as_str().parse().map_err(|_| malformed()))
    };

    NaiveTime::from_hms_opt(field(1)?, field(2)?, field(3)?).ok_or_else(malformed)
}

/// Checks every slot in the list, used before slots are stored.
pub fn validate_slots(slots: &[String]) -> Result<(), DoctorError> {
    slots.iter().try_for_each(|slot| parse_slot(slot).map(|_| ()))
}

fn time_of_day(timestamp: &NaiveDateTime) -> NaiveTime {
    // Sub-second precision from storage never names a distinct slot.
    NaiveTime::from_hms_opt(timestamp.hour(), timestamp.minute(), timestamp.second())
        .unwrap_or(NaiveTime::MIN)
}

/// The slots not taken by any of `booked`, in the doctor's original order.
pub fn available_slots(slots: &[String], booked: &[NaiveDateTime]) -> Result<Vec<String>, DoctorError> {
    let booked: HashSet<NaiveTime> = booked.iter().map(time_of_day).collect();

    let mut free = Vec::with_capacity(slots.len());
    for slot in slots {
        if !booked.contains(&parse_slot(slot)?) {
            free.push(slot.clone());
        }
    }

    Ok(free)
}

/// Keeps doctors with at least one slot in the requested half of the day.
pub fn filter_by_am_pm(doctors: Vec<Doctor>, period: &str) -> Result<Vec<Doctor>, DoctorError> {
    let period: DayPeriod = period.parse()?;

    let mut matching = Vec::new();
    for doctor in doctors {
        let hours = doctor
            .available_times()
            .iter()
            .map(|slot| parse_slot(slot).map(|time| time.hour()))
            .collect::<Result<Vec<_>, _>>()?;

        if hours.into_iter().any(|hour| period.includes_hour(hour)) {
            matching.push(doctor);
        }
    }

    Ok(matching)
}

pub struct AvailabilityService {
    supabase: SupabaseClient,
    doctors: DoctorService,
}

impl AvailabilityService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            doctors: DoctorService::new(config),
        }
    }

    /// Free slots for `doctor_id` on `date`. A missing doctor has no
    /// availability rather than being an error.
    pub async fn availability(&self, doctor_id: i64, date: NaiveDate) -> Result<Vec<String>, DoctorError> {
        debug!("Calculating availability for doctor {} on {}", doctor_id, date);

        let Some(doctor) = self.doctors.find_doctor(doctor_id).await? else {
            debug!("Doctor {} not found, no availability", doctor_id);
            return Ok(Vec::new());
        };

        let booked = self.booked_times(doctor_id, date).await?;
        available_slots(doctor.available_times(), &booked)
    }

    async fn booked_times(&self, doctor_id: i64, date: NaiveDate) -> Result<Vec<NaiveDateTime>, DoctorError> {
        let start = date.and_time(NaiveTime::MIN);
        let end = date
            .and_hms_opt(23, 59, 59)
            .ok_or_else(|| anyhow!("No end of day for {}", date))?;

        let path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&appointment_time=gte.{}&appointment_time=lte.{}&select=appointment_time",
            doctor_id,
            start.format(TIMESTAMP_FORMAT),
            end.format(TIMESTAMP_FORMAT),
        );
        let rows: Vec<BookedTime> = self.supabase.request(Method::GET, &path, None).await?;

        Ok(rows.into_iter().map(|row| row.appointment_time).collect())
    }
}
