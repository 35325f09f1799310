use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reminder {
    pub id: String,
    pub client_id: String,
    pub appointment_id: Option<String>,
    pub message: String,
    pub scheduled_time: NaiveDateTime,
    pub sent: bool,
    pub sent_at: Option<NaiveDateTime>,
}
