pub mod doctor;
pub mod availability;

pub use doctor::DoctorService;
pub use availability::{AvailabilityService, available_slots, filter_by_am_pm, parse_slot};
