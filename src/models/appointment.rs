use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::taxpro::ComplexityLevel;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentType {
    Virtual,
    InPerson,
}

impl AppointmentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentType::Virtual => "virtual",
            AppointmentType::InPerson => "in_person",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "in_person" | "in-person" | "office" => AppointmentType::InPerson,
            _ => AppointmentType::Virtual,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: String,
    pub client_id: String,
    pub tax_pro_id: String,
    pub scheduled_time: NaiveDateTime,
    pub duration_minutes: u32,
    pub appointment_type: AppointmentType,
    pub estimated_complexity: ComplexityLevel,
    pub status: AppointmentStatus,
    pub created_at: NaiveDateTime,
}
