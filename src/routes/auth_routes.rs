use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use chrono::{DateTime, Duration, Utc};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    auth::{generate_access_token, hash_access_token, hash_password, verify_password},
    error::ApiError,
    middleware::auth_context::AuthContext,
    models::{AppState, OkData, OkResponse, SessionInfo, UserProfile, UserRow},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/me", get(me))
        .route("/logout", post(logout))
}

/* ============================================================
   DTOs
   ============================================================ */

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub data: SessionResponseData,
}

#[derive(Debug, Serialize)]
pub struct SessionResponseData {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserProfile,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub data: MeResponseData,
}

#[derive(Debug, Serialize)]
pub struct MeResponseData {
    pub user: UserProfile,
    pub session: SessionInfo,
}

/* ============================================================
   Session creation (shared by signup + login)
   ============================================================ */

async fn open_session(
    state: &AppState,
    user: &UserRow,
) -> Result<SessionResponseData, ApiError> {
    let access_token = generate_access_token();
    let token_hash = hash_access_token(&access_token);
    let expires_at = Utc::now() + Duration::hours(state.session_ttl_hours);

    let stored_expiry: DateTime<Utc> = sqlx::query_scalar(
        r#"
        INSERT INTO session (id, user_id, token_hash, expires_at, created_at)
        VALUES ($1, $2, $3, $4, now())
        RETURNING expires_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user.id)
    .bind(&token_hash)
    .bind(expires_at)
    .fetch_one(&state.db)
    .await
    .map_err(ApiError::db)?;

    Ok(SessionResponseData {
        access_token,
        expires_at: stored_expiry,
        user: UserProfile {
            user_id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
        },
    })
}

/* ============================================================
   POST /auth/signup
   ============================================================ */

pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let name = req.name.trim();
    let email = req.email.trim().to_lowercase();

    if name.is_empty() {
        return Err(ApiError::BadRequest(
            "VALIDATION_ERROR",
            "Nome é obrigatório".into(),
        ));
    }
    // No full RFC parse; the confirmation e-mail is the real check.
    if !email.contains('@') || email.starts_with('@') || email.ends_with('@') {
        return Err(ApiError::BadRequest(
            "VALIDATION_ERROR",
            "E-mail inválido".into(),
        ));
    }
    if req.password.chars().count() < 8 {
        return Err(ApiError::BadRequest(
            "VALIDATION_ERROR",
            "Senha deve ter pelo menos 8 caracteres".into(),
        ));
    }

    let password_hash = hash_password(&req.password).map_err(ApiError::Internal)?;

    let user: UserRow = sqlx::query_as::<_, UserRow>(
        r#"
        INSERT INTO app_user (id, name, email, password_hash, created_at, updated_at)
        VALUES ($1, $2, $3, $4, now(), now())
        RETURNING id, name, email, password_hash
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(&email)
    .bind(&password_hash)
    .fetch_one(&state.db)
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            ApiError::Conflict("EMAIL_TAKEN", "E-mail já cadastrado.".into())
        }
        _ => ApiError::db(e),
    })?;

    let data = open_session(&state, &user).await?;
    Ok(Json(SessionResponse { data }))
}

/* ============================================================
   POST /auth/login
   ============================================================ */

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let email = req.email.trim().to_lowercase();
    if email.is_empty() || req.password.is_empty() {
        return Err(ApiError::BadRequest(
            "VALIDATION_ERROR",
            "E-mail e senha são obrigatórios".into(),
        ));
    }

    let user: UserRow = sqlx::query_as::<_, UserRow>(
        r#"
        SELECT id, name, email, password_hash
        FROM app_user
        WHERE email = $1
        "#,
    )
    .bind(&email)
    .fetch_optional(&state.db)
    .await
    .map_err(ApiError::db)?
    .ok_or_else(ApiError::invalid_credentials)?;

    if !verify_password(&req.password, &user.password_hash) {
        return Err(ApiError::invalid_credentials());
    }

    let data = open_session(&state, &user).await?;
    Ok(Json(SessionResponse { data }))
}

/* ============================================================
   GET /auth/me
   ============================================================ */

pub async fn me(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<MeResponse>, ApiError> {
    let user: UserRow = sqlx::query_as::<_, UserRow>(
        r#"
        SELECT id, name, email, password_hash
        FROM app_user
        WHERE id = $1
        "#,
    )
    .bind(auth.user_id)
    .fetch_optional(&state.db)
    .await
    .map_err(ApiError::db)?
    .ok_or_else(ApiError::session_expired)?;

    let expires_at: DateTime<Utc> = sqlx::query_scalar(
        r#"
        SELECT expires_at
        FROM session
        WHERE id = $1
          AND expires_at > now()
        "#,
    )
    .bind(auth.session_id)
    .fetch_optional(&state.db)
    .await
    .map_err(ApiError::db)?
    .ok_or_else(ApiError::session_expired)?;

    Ok(Json(MeResponse {
        data: MeResponseData {
            user: UserProfile {
                user_id: user.id,
                name: user.name,
                email: user.email,
            },
            session: SessionInfo {
                session_id: auth.session_id,
                expires_at,
            },
        },
    }))
}

/* ============================================================
   POST /auth/logout  (drop the calling session)
   ============================================================ */

pub async fn logout(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<OkResponse>, ApiError> {
    sqlx::query(
        r#"
        DELETE FROM session
        WHERE id = $1
        "#,
    )
    .bind(auth.session_id)
    .execute(&state.db)
    .await
    .map_err(ApiError::db)?;

    Ok(Json(OkResponse {
        data: OkData { ok: true },
    }))
}
