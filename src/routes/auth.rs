use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use sqlx::SqlitePool;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::app::AppState;
use crate::authz::Role;
use crate::errors::{AppError, AppResult};
use crate::jwt::AuthUser;
use crate::models::user::{AuthResponse, DbUser, LoginRequest, RegisterRequest, User, UserStatus};
use crate::subscription::{SubscriptionPlan, SubscriptionStatus};
use crate::utils::{hash_password, is_valid_email, utc_now, verify_password};

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    message: String,
}

#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 409, description = "Email already in use")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    if !is_valid_email(&payload.email) {
        return Err(AppError::bad_request("adresă de email invalidă"));
    }
    ensure_email_available(&state.pool, &payload.email).await?;

    let password_hash = hash_password(&payload.password)?;
    let now = utc_now();
    let user_id = Uuid::new_v4();
    let role = if payload.craftsman.is_some() {
        Role::Craftsman
    } else {
        Role::Customer
    };

    let mut tx = state.pool.begin().await?;

    sqlx::query(
        "INSERT INTO users (id, name, email, password_hash, role, status, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(user_id)
    .bind(&payload.name)
    .bind(&payload.email)
    .bind(password_hash)
    .bind(role.as_str())
    .bind(UserStatus::Active.as_str())
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await
    .map_err(|err| AppError::on_conflict(err, "adresa de email este deja folosită"))?;

    if let Some(profile) = &payload.craftsman {
        let plan = profile.subscription_plan.unwrap_or(SubscriptionPlan::Basic);
        sqlx::query(
            "INSERT INTO craftsmen (id, user_id, business_name, description, phone, county, city, category, experience_years, subscription_status, subscription_plan, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&profile.business_name)
        .bind(&profile.description)
        .bind(&profile.phone)
        .bind(&profile.county)
        .bind(&profile.city)
        .bind(&profile.category)
        .bind(profile.experience_years.unwrap_or(0))
        .bind(SubscriptionStatus::Inactive.as_str())
        .bind(plan.as_str())
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    let db_user = fetch_user_by_id(&state.pool, user_id).await?;
    let user: User = db_user.try_into()?;
    let token = state.jwt.encode(user.id, user.role)?;

    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}

#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Account suspended or deactivated")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let db_user = sqlx::query_as::<_, DbUser>(
        "SELECT id, name, email, password_hash, role, status, email_verified_at, last_login, created_at, updated_at FROM users WHERE email = ?",
    )
    .bind(&payload.email)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| AppError::unauthorized("date de autentificare invalide"))?;

    let password_hash = db_user
        .password_hash
        .as_deref()
        .ok_or_else(|| AppError::unauthorized("date de autentificare invalide"))?;
    if !verify_password(&payload.password, password_hash)? {
        return Err(AppError::unauthorized("date de autentificare invalide"));
    }

    match UserStatus::parse(&db_user.status) {
        Some(UserStatus::Active) => {}
        Some(UserStatus::Suspended) => return Err(AppError::forbidden("contul este suspendat")),
        Some(UserStatus::Inactive) => return Err(AppError::forbidden("contul este dezactivat")),
        None => return Err(AppError::internal("unknown status in database")),
    }

    let now = utc_now();
    sqlx::query("UPDATE users SET last_login = ? WHERE id = ?")
        .bind(now)
        .bind(db_user.id)
        .execute(&state.pool)
        .await?;

    let mut user: User = db_user.try_into()?;
    user.last_login = Some(now);
    let token = state.jwt.encode(user.id, user.role)?;

    Ok(Json(AuthResponse { token, user }))
}

#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "Auth",
    responses((status = 200, description = "Current user", body = User)),
    security(("bearerAuth" = []))
)]
pub async fn me(State(state): State<AppState>, auth: AuthUser) -> AppResult<Json<User>> {
    let db_user = fetch_user_by_id(&state.pool, auth.user_id).await?;
    let user: User = db_user.try_into()?;
    Ok(Json(user))
}

#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "Auth",
    responses((status = 200, description = "Logout acknowledged")),
    security(("bearerAuth" = []))
)]
pub async fn logout(_auth: AuthUser) -> AppResult<Json<MessageResponse>> {
    // Sessions are stateless tokens; logout is an acknowledgement and the
    // client drops its copy.
    Ok(Json(MessageResponse {
        message: "Deconectat".to_string(),
    }))
}

async fn ensure_email_available(pool: &SqlitePool, email: &str) -> AppResult<()> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM users WHERE email = ?")
        .bind(email)
        .fetch_one(pool)
        .await?;

    if count > 0 {
        return Err(AppError::conflict("adresa de email este deja folosită"));
    }

    Ok(())
}

pub(crate) async fn fetch_user_by_id(pool: &SqlitePool, user_id: Uuid) -> AppResult<DbUser> {
    sqlx::query_as::<_, DbUser>(
        "SELECT id, name, email, password_hash, role, status, email_verified_at, last_login, created_at, updated_at FROM users WHERE id = ?",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::not_found("utilizatorul nu a fost găsit"))
}
