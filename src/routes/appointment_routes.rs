// src/routes/appointment_routes.rs

use axum::{
    extract::{Path, Query, State},
    routing::{get, patch},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::ApiError,
    middleware::auth_context::AuthContext,
    models::{ApiOk, AppState, AppointmentRow, AppointmentStatus, OkData, OkResponse},
    slots,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/appointments", get(list_appointments).post(create_appointment))
        .route("/appointments/available", get(get_available_times))
        .route("/appointments/ping", get(ping))
        .route(
            "/appointments/{appointment_id}",
            get(get_appointment).delete(delete_appointment),
        )
        .route("/appointments/{appointment_id}/status", patch(update_status))
}

const APPOINTMENT_COLUMNS: &str = r#"
    id,
    patient_name, birth_date, age, gender, marital_status,
    phone, commercial_phone, address, neighborhood, city, state, zip_code, emergency_contact,
    education, profession, clinical_diagnosis, symptoms, symptoms_description,
    has_insurance, insurance_description,
    selected_date, selected_time, status,
    created_at, updated_at, user_id
"#;

/* ============================================================
   GET /appointments/ping  (frontend warmup, no auth)
   ============================================================ */

pub async fn ping() -> Json<OkResponse> {
    Json(OkResponse {
        data: OkData { ok: true },
    })
}

/* ============================================================
   GET /appointments/available?date=YYYY-MM-DD  (no auth: the
   booking form queries this before the patient has a session)
   ============================================================ */

#[derive(Debug, Deserialize)]
pub struct AvailableQuery {
    pub date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AvailableTimesDto {
    pub available_times: Vec<&'static str>,
}

pub async fn get_available_times(
    State(state): State<AppState>,
    Query(q): Query<AvailableQuery>,
) -> Result<Json<ApiOk<AvailableTimesDto>>, ApiError> {
    let Some(date_param) = q.date else {
        return Err(ApiError::BadRequest(
            "VALIDATION_ERROR",
            "date query param is required".into(),
        ));
    };

    let date = NaiveDate::parse_from_str(date_param.trim(), "%Y-%m-%d").map_err(|_| {
        ApiError::BadRequest("VALIDATION_ERROR", "date must be YYYY-MM-DD".into())
    })?;

    // Past dates and weekends are a frontend policy, not enforced here.
    let booked: Vec<String> = sqlx::query_scalar(
        r#"
        SELECT selected_time
        FROM appointments
        WHERE selected_date = $1
          AND status <> 'cancelled'
        "#,
    )
    .bind(date)
    .fetch_all(&state.db)
    .await
    .map_err(ApiError::db)?;

    Ok(Json(ApiOk {
        data: AvailableTimesDto {
            available_times: slots::available_times(&booked),
        },
    }))
}

/* ============================================================
   POST /appointments  (create)
   ============================================================ */

#[derive(Debug, Deserialize)]
pub struct CreateAppointmentRequest {
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
    pub symptoms: Option<Vec<String>>,
    pub symptoms_description: Option<String>,
    pub has_insurance: bool,
    pub insurance_description: Option<String>,

    pub selected_date: NaiveDate,
    pub selected_time: String,
}

const GENDERS: [&str; 2] = ["masculine", "feminine"];
const MARITAL_STATUSES: [&str; 4] = ["single", "married", "divorced", "widowed"];
const EDUCATION_LEVELS: [&str; 7] = [
    "elementary",
    "middle",
    "high",
    "technical",
    "undergraduate",
    "graduate",
    "postgraduate",
];

fn invalid(msg: &str) -> ApiError {
    ApiError::BadRequest("VALIDATION_ERROR", msg.to_string())
}

/// Brazilian CEP: "12345-678".
fn is_valid_zip(zip: &str) -> bool {
    let bytes = zip.as_bytes();
    bytes.len() == 9
        && bytes[..5].iter().all(u8::is_ascii_digit)
        && bytes[5] == b'-'
        && bytes[6..].iter().all(u8::is_ascii_digit)
}

fn validate_draft(req: &CreateAppointmentRequest) -> Result<(), ApiError> {
    let name_len = req.patient_name.trim().chars().count();
    if name_len < 2 {
        return Err(invalid("Nome deve ter pelo menos 2 caracteres"));
    }
    if name_len > 100 {
        return Err(invalid("Nome muito longo"));
    }
    if req.age < 1 {
        return Err(invalid("Idade deve ser maior que 0"));
    }
    if req.age > 150 {
        return Err(invalid("Idade inválida"));
    }
    if !GENDERS.contains(&req.gender.as_str()) {
        return Err(invalid("Selecione o sexo"));
    }
    if !MARITAL_STATUSES.contains(&req.marital_status.as_str()) {
        return Err(invalid("Selecione o estado civil"));
    }

    if req.phone.chars().count() < 10 {
        return Err(invalid("Telefone deve ter pelo menos 10 dígitos"));
    }
    if let Some(commercial) = &req.commercial_phone {
        if commercial.chars().count() < 10 {
            return Err(invalid("Telefone deve ter pelo menos 10 dígitos"));
        }
    }
    if !(5..=100).contains(&req.address.trim().chars().count()) {
        return Err(invalid("Endereço deve ter entre 5 e 100 caracteres"));
    }
    if !(2..=100).contains(&req.neighborhood.trim().chars().count()) {
        return Err(invalid("Bairro deve ter entre 2 e 100 caracteres"));
    }
    if !(2..=100).contains(&req.city.trim().chars().count()) {
        return Err(invalid("Cidade deve ter entre 2 e 100 caracteres"));
    }
    if req.state.trim().is_empty() {
        return Err(invalid("Selecione o estado"));
    }
    if !is_valid_zip(&req.zip_code) {
        return Err(invalid("Formato de CEP inválido"));
    }
    if !(1..=100).contains(&req.emergency_contact.trim().chars().count()) {
        return Err(invalid("Contato de emergência é obrigatório"));
    }

    if !EDUCATION_LEVELS.contains(&req.education.as_str()) {
        return Err(invalid("Selecione a escolaridade"));
    }
    if !(1..=100).contains(&req.profession.trim().chars().count()) {
        return Err(invalid("Profissão é obrigatória"));
    }
    if let Some(diagnosis) = &req.clinical_diagnosis {
        if diagnosis.chars().count() > 400 {
            return Err(invalid("Diagnóstico clínico muito longo"));
        }
    }
    if let Some(desc) = &req.symptoms_description {
        if desc.chars().count() > 100 {
            return Err(invalid("Descrição dos sintomas muito longa"));
        }
    }
    if let Some(desc) = &req.insurance_description {
        if desc.chars().count() > 100 {
            return Err(invalid("Descrição do plano de saúde muito longa"));
        }
    }

    if !slots::is_slot_time(&req.selected_time) {
        return Err(invalid("Selecione um horário"));
    }

    Ok(())
}

pub async fn create_appointment(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<CreateAppointmentRequest>,
) -> Result<Json<ApiOk<AppointmentRow>>, ApiError> {
    validate_draft(&req)?;

    // No pre-select: the partial unique index on
    // (selected_date, selected_time) WHERE status <> 'cancelled'
    // is the conflict check, so two concurrent bookings can't both land.
    let row: AppointmentRow = sqlx::query_as::<_, AppointmentRow>(&format!(
        r#"
        INSERT INTO appointments (
          id,
          patient_name, birth_date, age, gender, marital_status,
          phone, commercial_phone, address, neighborhood, city, state, zip_code, emergency_contact,
          education, profession, clinical_diagnosis, symptoms, symptoms_description,
          has_insurance, insurance_description,
          selected_date, selected_time, status,
          created_at, updated_at, user_id
        )
        VALUES (
          $1,
          $2, $3, $4, $5, $6,
          $7, $8, $9, $10, $11, $12, $13, $14,
          $15, $16, $17, $18, $19,
          $20, $21,
          $22, $23, 'new',
          now(), now(), $24
        )
        RETURNING {APPOINTMENT_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(req.patient_name.trim())
    .bind(req.birth_date)
    .bind(req.age)
    .bind(&req.gender)
    .bind(&req.marital_status)
    .bind(&req.phone)
    .bind(req.commercial_phone.as_deref())
    .bind(req.address.trim())
    .bind(req.neighborhood.trim())
    .bind(req.city.trim())
    .bind(req.state.trim())
    .bind(&req.zip_code)
    .bind(req.emergency_contact.trim())
    .bind(&req.education)
    .bind(req.profession.trim())
    .bind(req.clinical_diagnosis.as_deref())
    .bind(req.symptoms.unwrap_or_default())
    .bind(req.symptoms_description.as_deref())
    .bind(req.has_insurance)
    .bind(req.insurance_description.as_deref())
    .bind(req.selected_date)
    .bind(&req.selected_time)
    .bind(auth.user_id)
    .fetch_one(&state.db)
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => ApiError::Conflict(
            "SLOT_TAKEN",
            "Horário já está ocupado para esta data.".into(),
        ),
        _ => ApiError::db(e),
    })?;

    Ok(Json(ApiOk { data: row }))
}

/* ============================================================
   GET /appointments  (dashboard list, newest first)
   ============================================================ */

pub async fn list_appointments(
    State(state): State<AppState>,
    _auth: AuthContext,
) -> Result<Json<ApiOk<Vec<AppointmentRow>>>, ApiError> {
    let rows: Vec<AppointmentRow> = sqlx::query_as::<_, AppointmentRow>(&format!(
        r#"
        SELECT {APPOINTMENT_COLUMNS}
        FROM appointments
        ORDER BY created_at DESC
        "#
    ))
    .fetch_all(&state.db)
    .await
    .map_err(ApiError::db)?;

    Ok(Json(ApiOk { data: rows }))
}

/* ============================================================
   GET /appointments/{id}  (success + print pages)
   ============================================================ */

pub async fn get_appointment(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<ApiOk<AppointmentRow>>, ApiError> {
    let row: AppointmentRow = sqlx::query_as::<_, AppointmentRow>(&format!(
        r#"
        SELECT {APPOINTMENT_COLUMNS}
        FROM appointments
        WHERE id = $1
        "#
    ))
    .bind(appointment_id)
    .fetch_optional(&state.db)
    .await
    .map_err(ApiError::db)?
    .ok_or_else(|| ApiError::NotFound("NOT_FOUND", "Agendamento não encontrado.".into()))?;

    Ok(Json(ApiOk { data: row }))
}

/* ============================================================
   PATCH /appointments/{id}/status
   ============================================================ */

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: AppointmentStatus,
}

/// Unconditional overwrite: the dashboard dropdown may move an appointment
/// to any status, including back out of `cancelled` (which re-occupies the
/// slot, or trips the unique index if the slot was re-booked meanwhile).
pub async fn update_status(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(appointment_id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<ApiOk<AppointmentRow>>, ApiError> {
    let row: Option<AppointmentRow> = sqlx::query_as::<_, AppointmentRow>(&format!(
        r#"
        UPDATE appointments
        SET status = $2,
            updated_at = now()
        WHERE id = $1
        RETURNING {APPOINTMENT_COLUMNS}
        "#
    ))
    .bind(appointment_id)
    .bind(req.status)
    .fetch_optional(&state.db)
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => ApiError::Conflict(
            "SLOT_TAKEN",
            "Horário já está ocupado para esta data.".into(),
        ),
        _ => ApiError::db(e),
    })?;

    let Some(row) = row else {
        return Err(ApiError::NotFound(
            "NOT_FOUND",
            "Agendamento não encontrado.".into(),
        ));
    };

    Ok(Json(ApiOk { data: row }))
}

/* ============================================================
   DELETE /appointments/{id}  (hard delete)
   ============================================================ */

#[derive(Debug, Serialize)]
pub struct DeletedDto {
    pub deleted_id: Uuid,
}

pub async fn delete_appointment(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<ApiOk<DeletedDto>>, ApiError> {
    let deleted: Option<Uuid> = sqlx::query_scalar(
        r#"
        DELETE FROM appointments
        WHERE id = $1
        RETURNING id
        "#,
    )
    .bind(appointment_id)
    .fetch_optional(&state.db)
    .await
    .map_err(ApiError::db)?;

    let Some(deleted_id) = deleted else {
        return Err(ApiError::NotFound(
            "NOT_FOUND",
            "Agendamento não encontrado.".into(),
        ));
    };

    Ok(Json(ApiOk {
        data: DeletedDto { deleted_id },
    }))
}

/* ============================================================
   Tests
   ============================================================ */

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> CreateAppointmentRequest {
        CreateAppointmentRequest {
            patient_name: "Maria Souza".into(),
            birth_date: NaiveDate::from_ymd_opt(1980, 5, 12).unwrap(),
            age: 44,
            gender: "feminine".into(),
            marital_status: "married".into(),
            phone: "11987654321".into(),
            commercial_phone: None,
            address: "Rua das Flores, 123".into(),
            neighborhood: "Centro".into(),
            city: "São Paulo".into(),
            state: "SP".into(),
            zip_code: "01310-100".into(),
            emergency_contact: "João Souza 11912345678".into(),
            education: "high".into(),
            profession: "Professora".into(),
            clinical_diagnosis: None,
            symptoms: Some(vec!["Dor lombar".into()]),
            symptoms_description: Some("Dor ao levantar".into()),
            has_insurance: false,
            insurance_description: None,
            selected_date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            selected_time: "09:00".into(),
        }
    }

    #[test]
    fn reference_draft_passes_validation() {
        assert!(validate_draft(&draft()).is_ok());
    }

    #[test]
    fn short_name_is_rejected() {
        let mut d = draft();
        d.patient_name = "M".into();
        assert!(validate_draft(&d).is_err());
    }

    #[test]
    fn age_bounds_are_enforced() {
        let mut d = draft();
        d.age = 0;
        assert!(validate_draft(&d).is_err());
        d.age = 151;
        assert!(validate_draft(&d).is_err());
        d.age = 150;
        assert!(validate_draft(&d).is_ok());
    }

    #[test]
    fn off_grid_time_is_rejected() {
        let mut d = draft();
        d.selected_time = "12:30".into();
        assert!(validate_draft(&d).is_err());
    }

    #[test]
    fn unknown_enum_strings_are_rejected() {
        let mut d = draft();
        d.gender = "other".into();
        assert!(validate_draft(&d).is_err());

        let mut d = draft();
        d.education = "phd".into();
        assert!(validate_draft(&d).is_err());
    }

    #[test]
    fn zip_format() {
        assert!(is_valid_zip("01310-100"));
        assert!(!is_valid_zip("01310100"));
        assert!(!is_valid_zip("0131-0100"));
        assert!(!is_valid_zip("abcde-fgh"));
        assert!(!is_valid_zip("01310-1000"));
    }

    #[test]
    fn commercial_phone_is_optional_but_checked_when_present() {
        let mut d = draft();
        d.commercial_phone = Some("123".into());
        assert!(validate_draft(&d).is_err());
        d.commercial_phone = Some("1133334444".into());
        assert!(validate_draft(&d).is_ok());
    }
}
