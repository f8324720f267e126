use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::app::AppState;
use crate::audit::{self, AuditAction};
use crate::authz::{authorize, ensure_not_protected, Capability};
use crate::errors::{AppError, AppResult};
use crate::jwt::AuthUser;
use crate::models::pagination::{PageMeta, PageQuery};
use crate::models::user::{
    DbUser, StatusUpdateRequest, StatusUpdateResponse, User, UserListQuery, UserStatus,
};
use crate::routes::auth::fetch_user_by_id;
use crate::utils::utc_now;

#[derive(Debug, Serialize, ToSchema)]
pub struct UserListResponse {
    pub users: Vec<User>,
    pub pagination: PageMeta,
}

#[utoipa::path(
    get,
    path = "/admin/users",
    operation_id = "list_users",
    tag = "Admin",
    params(
        ("page" = Option<i64>, Query, description = "1-indexed page"),
        ("limit" = Option<i64>, Query, description = "Page size"),
        ("role" = Option<String>, Query, description = "Filter by role"),
        ("status" = Option<String>, Query, description = "Filter by account status"),
        ("search" = Option<String>, Query, description = "Search in name and email"),
    ),
    responses(
        (status = 200, description = "User accounts", body = UserListResponse),
        (status = 401, description = "Unauthenticated"),
        (status = 403, description = "Missing capability")
    ),
    security(("bearerAuth" = []))
)]
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<UserListQuery>,
) -> AppResult<Json<UserListResponse>> {
    authorize(auth.role, Capability::ViewUsers)?;

    let page = PageQuery { page: query.page, limit: query.limit };
    let pattern = query.search.as_ref().map(|s| format!("%{s}%"));

    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(1) FROM users \
         WHERE (? IS NULL OR role = ?) \
           AND (? IS NULL OR status = ?) \
           AND (? IS NULL OR name LIKE ? OR email LIKE ?)",
    )
    .bind(&query.role)
    .bind(&query.role)
    .bind(&query.status)
    .bind(&query.status)
    .bind(&pattern)
    .bind(&pattern)
    .bind(&pattern)
    .fetch_one(&state.pool)
    .await?;

    let rows = sqlx::query_as::<_, DbUser>(
        "SELECT id, name, email, password_hash, role, status, email_verified_at, last_login, created_at, updated_at \
         FROM users \
         WHERE (? IS NULL OR role = ?) \
           AND (? IS NULL OR status = ?) \
           AND (? IS NULL OR name LIKE ? OR email LIKE ?) \
         ORDER BY created_at DESC LIMIT ? OFFSET ?",
    )
    .bind(&query.role)
    .bind(&query.role)
    .bind(&query.status)
    .bind(&query.status)
    .bind(&pattern)
    .bind(&pattern)
    .bind(&pattern)
    .bind(page.limit())
    .bind(page.offset())
    .fetch_all(&state.pool)
    .await?;

    let users: Vec<User> = rows
        .into_iter()
        .map(User::try_from)
        .collect::<Result<_, _>>()?;

    Ok(Json(UserListResponse {
        users,
        pagination: PageMeta::new(total, page.page(), page.limit()),
    }))
}

#[utoipa::path(
    put,
    path = "/admin/users/{id}/status",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "User id")),
    request_body = StatusUpdateRequest,
    responses(
        (status = 200, description = "Status updated", body = StatusUpdateResponse),
        (status = 400, description = "Invalid status value"),
        (status = 403, description = "Missing capability or protected target"),
        (status = 404, description = "User not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn update_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<StatusUpdateRequest>,
) -> AppResult<Json<StatusUpdateResponse>> {
    authorize(auth.role, Capability::EditUsers)?;

    // Validate before touching the repository.
    let status = UserStatus::parse(&payload.status)
        .ok_or_else(|| AppError::bad_request("status invalid"))?;

    let target: User = fetch_user_by_id(&state.pool, id).await?.try_into()?;
    ensure_not_protected(auth.role, target.role)?;

    let now = utc_now();
    let mut tx = state.pool.begin().await?;

    sqlx::query("UPDATE users SET status = ?, updated_at = ? WHERE id = ?")
        .bind(status.as_str())
        .bind(now)
        .bind(id)
        .execute(&mut *tx)
        .await?;

    audit::record(
        &mut tx,
        auth.user_id,
        AuditAction::UserStatusUpdated,
        format!("Statusul contului {} a fost schimbat în {}", target.email, status.as_str()),
    )
    .await?;

    tx.commit().await?;

    let user: User = fetch_user_by_id(&state.pool, id).await?.try_into()?;
    Ok(Json(StatusUpdateResponse {
        message: "Statusul utilizatorului a fost actualizat".to_string(),
        user,
    }))
}
