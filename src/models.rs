use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub session_ttl_hours: i64,
}

/* -------------------------
   API DTOs
--------------------------*/

#[derive(Debug, Serialize)]
pub struct ApiOk<T> {
    pub data: T,
}

#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub data: OkData,
}

#[derive(Debug, Serialize)]
pub struct OkData {
    pub ok: bool,
}

#[derive(Debug, Serialize)]
pub struct UserProfile {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct SessionInfo {
    pub session_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/* -------------------------
   DB Row Models
--------------------------*/

/// Appointment lifecycle. Any status may be overwritten by any other;
/// `cancelled` rows stay in the table but stop counting against their slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "appointment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    New,
    Assigned,
    Done,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AppointmentRow {
    pub id: Uuid,

    pub patient_name: String,
    pub birth_date: NaiveDate,
    pub age: i32,
    pub gender: String,
    pub marital_status: String,

    pub phone: String,
    pub commercial_phone: Option<String>,
    pub address: String,
    pub neighborhood: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub emergency_contact: String,

    pub education: String,
    pub profession: String,
    pub clinical_diagnosis: Option<String>,
    /// Symptom names copied from the catalog at booking time, not foreign keys.
    pub symptoms: Vec<String>,
    pub symptoms_description: Option<String>,
    pub has_insurance: bool,
    pub insurance_description: Option<String>,

    pub selected_date: NaiveDate,
    pub selected_time: String,
    pub status: AppointmentStatus,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    pub user_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SymptomRow {
    pub id: Uuid,
    pub name: String,
    pub active: bool,
    pub symptom_index: i32,
}

#[derive(Debug, sqlx::FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_lowercase() {
        let s = serde_json::to_string(&AppointmentStatus::Cancelled).unwrap();
        assert_eq!(s, "\"cancelled\"");

        let parsed: AppointmentStatus = serde_json::from_str("\"assigned\"").unwrap();
        assert_eq!(parsed, AppointmentStatus::Assigned);
    }

    #[test]
    fn status_rejects_unknown_value() {
        assert!(serde_json::from_str::<AppointmentStatus>("\"archived\"").is_err());
    }
}
