// src/routes/symptom_routes.rs

use axum::{
    extract::{Path, Query, State},
    routing::{get, patch, put},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::ApiError,
    middleware::auth_context::AuthContext,
    models::{ApiOk, AppState, OkData, OkResponse, SymptomRow},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/symptoms", get(list_symptoms).post(add_symptom))
        .route("/symptoms/order", put(reorder_symptoms))
        .route(
            "/symptoms/{symptom_id}",
            patch(toggle_symptom).delete(delete_symptom),
        )
}

/* ============================================================
   GET /symptoms?active_only=bool
   ============================================================ */

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub active_only: Option<bool>,
}

/// Catalog in display order. Inactive entries keep their index, so the
/// active-only view preserves relative order across the gaps; `id` breaks
/// ties left behind by deletes (see `add_symptom`).
pub async fn list_symptoms(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<Json<ApiOk<Vec<SymptomRow>>>, ApiError> {
    let rows: Vec<SymptomRow> = if q.active_only.unwrap_or(false) {
        sqlx::query_as::<_, SymptomRow>(
            r#"
            SELECT id, name, active, symptom_index
            FROM symptoms
            WHERE active = true
            ORDER BY symptom_index ASC, id ASC
            "#,
        )
        .fetch_all(&state.db)
        .await
        .map_err(ApiError::db)?
    } else {
        sqlx::query_as::<_, SymptomRow>(
            r#"
            SELECT id, name, active, symptom_index
            FROM symptoms
            ORDER BY symptom_index ASC, id ASC
            "#,
        )
        .fetch_all(&state.db)
        .await
        .map_err(ApiError::db)?
    };

    Ok(Json(ApiOk { data: rows }))
}

/* ============================================================
   POST /symptoms  (append to end of list)
   ============================================================ */

#[derive(Debug, Deserialize)]
pub struct AddSymptomRequest {
    pub name: String,
}

pub async fn add_symptom(
    State(state): State<AppState>,
    _auth: AuthContext,
    Json(req): Json<AddSymptomRequest>,
) -> Result<Json<ApiOk<SymptomRow>>, ApiError> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest(
            "VALIDATION_ERROR",
            "Nome do sintoma é obrigatório".into(),
        ));
    }

    // New entries go to the end of the list: index = current row count,
    // assigned inside the insert so no read-then-write window. After a
    // delete the count can collide with a surviving index; ordering stays
    // deterministic through the (symptom_index, id) sort in the list query.
    let row: SymptomRow = sqlx::query_as::<_, SymptomRow>(
        r#"
        INSERT INTO symptoms (id, name, active, symptom_index)
        VALUES ($1, $2, true, (SELECT count(*) FROM symptoms))
        RETURNING id, name, active, symptom_index
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .fetch_one(&state.db)
    .await
    .map_err(ApiError::db)?;

    Ok(Json(ApiOk { data: row }))
}

/* ============================================================
   PATCH /symptoms/{id}  (toggle active flag)
   ============================================================ */

#[derive(Debug, Deserialize)]
pub struct ToggleSymptomRequest {
    pub active: bool,
}

/// Idempotent: toggling an id that no longer exists is a no-op, because the
/// list UI fires these optimistically and a concurrent delete must not turn
/// a checkbox click into an error toast.
pub async fn toggle_symptom(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(symptom_id): Path<Uuid>,
    Json(req): Json<ToggleSymptomRequest>,
) -> Result<Json<OkResponse>, ApiError> {
    sqlx::query(
        r#"
        UPDATE symptoms
        SET active = $2
        WHERE id = $1
        "#,
    )
    .bind(symptom_id)
    .bind(req.active)
    .execute(&state.db)
    .await
    .map_err(ApiError::db)?;

    Ok(Json(OkResponse {
        data: OkData { ok: true },
    }))
}

/* ============================================================
   PUT /symptoms/order  (drag-and-drop result, full id list)
   ============================================================ */

#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub ids: Vec<Uuid>,
}

/// Position in the submitted list becomes the symptom_index.
pub fn sequence_assignments(ids: &[Uuid]) -> impl Iterator<Item = (Uuid, i32)> + '_ {
    ids.iter().enumerate().map(|(i, id)| (*id, i as i32))
}

/// One transaction for the whole batch: a failure mid-way must not leave the
/// catalog half-reordered.
pub async fn reorder_symptoms(
    State(state): State<AppState>,
    _auth: AuthContext,
    Json(req): Json<ReorderRequest>,
) -> Result<Json<OkResponse>, ApiError> {
    let mut tx = state.db.begin().await.map_err(ApiError::db)?;

    for (id, index) in sequence_assignments(&req.ids) {
        sqlx::query(
            r#"
            UPDATE symptoms
            SET symptom_index = $2
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(index)
        .execute(&mut *tx)
        .await
        .map_err(ApiError::db)?;
    }

    tx.commit().await.map_err(ApiError::db)?;

    Ok(Json(OkResponse {
        data: OkData { ok: true },
    }))
}

/* ============================================================
   DELETE /symptoms/{id}  (hard delete, indices keep their gap)
   ============================================================ */

pub async fn delete_symptom(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(symptom_id): Path<Uuid>,
) -> Result<Json<OkResponse>, ApiError> {
    let deleted: Option<Uuid> = sqlx::query_scalar(
        r#"
        DELETE FROM symptoms
        WHERE id = $1
        RETURNING id
        "#,
    )
    .bind(symptom_id)
    .fetch_optional(&state.db)
    .await
    .map_err(ApiError::db)?;

    if deleted.is_none() {
        return Err(ApiError::NotFound(
            "NOT_FOUND",
            "Sintoma não encontrado.".into(),
        ));
    }

    Ok(Json(OkResponse {
        data: OkData { ok: true },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_assignments_follow_caller_order() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();

        let assigned: Vec<(Uuid, i32)> = sequence_assignments(&[c, a, b]).collect();
        assert_eq!(assigned, vec![(c, 0), (a, 1), (b, 2)]);
    }

    #[test]
    fn sequence_assignments_empty_list() {
        assert_eq!(sequence_assignments(&[]).count(), 0);
    }
}
