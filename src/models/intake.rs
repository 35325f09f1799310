use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One client's progress through the fixed intake question script.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntakeSession {
    pub id: String,
    pub client_id: String,
    pub step_index: usize,
    pub answers: Vec<String>,
    pub created_at: NaiveDateTime,
    pub last_activity: NaiveDateTime,
}

impl IntakeSession {
    pub fn new(client_id: String) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            client_id,
            step_index: 0,
            answers: vec![],
            created_at: now,
            last_activity: now,
        }
    }
}
