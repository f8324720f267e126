use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::app::AppState;
use crate::audit::{self, AuditAction};
use crate::authz::{authorize, ensure_not_protected, ensure_not_self, Capability};
use crate::errors::{AppError, AppResult};
use crate::jwt::AuthUser;
use crate::models::user::{DbUser, TeamMemberCreateRequest, TeamMemberUpdateRequest, User, UserStatus};
use crate::routes::auth::fetch_user_by_id;
use crate::utils::{hash_password, is_valid_email, utc_now};

#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteResponse {
    pub success: bool,
}

const STAFF_ROLES: &str = "('super_admin', 'admin', 'moderator', 'support', 'collaborator')";

#[utoipa::path(
    get,
    path = "/admin/team",
    operation_id = "list_team",
    tag = "Admin",
    responses(
        (status = 200, description = "Back-office accounts", body = [User]),
        (status = 401, description = "Unauthenticated"),
        (status = 403, description = "Missing capability")
    ),
    security(("bearerAuth" = []))
)]
pub async fn list(State(state): State<AppState>, auth: AuthUser) -> AppResult<Json<Vec<User>>> {
    authorize(auth.role, Capability::ViewUsers)?;

    let sql = format!(
        "SELECT id, name, email, password_hash, role, status, email_verified_at, last_login, created_at, updated_at \
         FROM users WHERE role IN {STAFF_ROLES} ORDER BY created_at ASC"
    );
    let rows = sqlx::query_as::<_, DbUser>(&sql).fetch_all(&state.pool).await?;

    let members: Vec<User> = rows
        .into_iter()
        .map(User::try_from)
        .collect::<Result<_, _>>()?;

    Ok(Json(members))
}

#[utoipa::path(
    post,
    path = "/admin/team",
    tag = "Admin",
    request_body = TeamMemberCreateRequest,
    responses(
        (status = 201, description = "Team member created", body = User),
        (status = 400, description = "Not a staff role"),
        (status = 403, description = "Missing capability or protected role"),
        (status = 409, description = "Email already in use")
    ),
    security(("bearerAuth" = []))
)]
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<TeamMemberCreateRequest>,
) -> AppResult<(StatusCode, Json<User>)> {
    authorize(auth.role, Capability::EditUsers)?;
    if !payload.role.is_staff() {
        return Err(AppError::bad_request("rolul nu este un rol de echipă"));
    }
    // Nobody hands out an account above their own tier.
    ensure_not_protected(auth.role, payload.role)?;
    if !is_valid_email(&payload.email) {
        return Err(AppError::bad_request("adresă de email invalidă"));
    }

    let password_hash = hash_password(&payload.password)?;
    let now = utc_now();
    let user_id = Uuid::new_v4();

    let mut tx = state.pool.begin().await?;

    sqlx::query(
        "INSERT INTO users (id, name, email, password_hash, role, status, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(user_id)
    .bind(&payload.name)
    .bind(&payload.email)
    .bind(password_hash)
    .bind(payload.role.as_str())
    .bind(UserStatus::Active.as_str())
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await
    .map_err(|err| AppError::on_conflict(err, "adresa de email este deja folosită"))?;

    audit::record(
        &mut tx,
        auth.user_id,
        AuditAction::TeamMemberCreated,
        format!("Cont de echipă creat pentru {} ({})", payload.name, payload.role.as_str()),
    )
    .await?;

    tx.commit().await?;

    let user: User = fetch_user_by_id(&state.pool, user_id).await?.try_into()?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[utoipa::path(
    put,
    path = "/admin/team/{id}",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "Team member id")),
    request_body = TeamMemberUpdateRequest,
    responses(
        (status = 200, description = "Team member updated", body = User),
        (status = 400, description = "Self-modification"),
        (status = 403, description = "Missing capability or protected target"),
        (status = 404, description = "Team member not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<TeamMemberUpdateRequest>,
) -> AppResult<Json<User>> {
    authorize(auth.role, Capability::EditUsers)?;
    ensure_not_self(auth.user_id, id)?;

    let target = fetch_team_member(&state, id).await?;
    ensure_not_protected(auth.role, target.role)?;

    let name = payload.name.unwrap_or_else(|| target.name.clone());
    let role = payload.role.unwrap_or(target.role);
    let status = payload.status.unwrap_or(target.status);

    if !role.is_staff() {
        return Err(AppError::bad_request("rolul nu este un rol de echipă"));
    }
    // Promotions are capped at the actor's own tier as well.
    ensure_not_protected(auth.role, role)?;

    let now = utc_now();
    let mut tx = state.pool.begin().await?;

    sqlx::query("UPDATE users SET name = ?, role = ?, status = ?, updated_at = ? WHERE id = ?")
        .bind(&name)
        .bind(role.as_str())
        .bind(status.as_str())
        .bind(now)
        .bind(id)
        .execute(&mut *tx)
        .await?;

    audit::record(
        &mut tx,
        auth.user_id,
        AuditAction::TeamMemberUpdated,
        format!("Contul de echipă {} a fost actualizat", target.email),
    )
    .await?;

    tx.commit().await?;

    let user: User = fetch_user_by_id(&state.pool, id).await?.try_into()?;
    Ok(Json(user))
}

#[utoipa::path(
    delete,
    path = "/admin/team/{id}",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "Team member id")),
    responses(
        (status = 200, description = "Team member deleted", body = DeleteResponse),
        (status = 400, description = "Self-deletion"),
        (status = 403, description = "Missing capability or protected target"),
        (status = 404, description = "Team member not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn remove(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<DeleteResponse>> {
    authorize(auth.role, Capability::EditUsers)?;
    ensure_not_self(auth.user_id, id)?;

    let target = fetch_team_member(&state, id).await?;
    ensure_not_protected(auth.role, target.role)?;

    let mut tx = state.pool.begin().await?;

    // Hard delete; the craftsman extension (if any) goes with it via FK
    // cascade. Sessions are stateless tokens, so nothing else to sweep.
    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    audit::record(
        &mut tx,
        auth.user_id,
        AuditAction::TeamMemberDeleted,
        format!("Contul de echipă {} a fost șters", target.email),
    )
    .await?;

    tx.commit().await?;

    Ok(Json(DeleteResponse { success: true }))
}

async fn fetch_team_member(state: &AppState, id: Uuid) -> AppResult<User> {
    let user: User = fetch_user_by_id(&state.pool, id).await?.try_into()?;
    if !user.role.is_staff() {
        return Err(AppError::not_found("contul de echipă nu a fost găsit"));
    }
    Ok(user)
}
