use axum::extract::{Query, State};
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::app::AppState;
use crate::audit::{self, ActivityEntry};
use crate::authz::{authorize, Capability};
use crate::errors::AppResult;
use crate::jwt::AuthUser;
use crate::models::pagination::{PageMeta, PageQuery};

#[derive(Debug, Serialize, ToSchema)]
pub struct ActivityLogResponse {
    pub entries: Vec<ActivityEntry>,
    pub pagination: PageMeta,
}

#[utoipa::path(
    get,
    path = "/admin/logs",
    operation_id = "list_activity_log",
    tag = "Admin",
    params(
        ("page" = Option<i64>, Query, description = "1-indexed page"),
        ("limit" = Option<i64>, Query, description = "Page size"),
    ),
    responses(
        (status = 200, description = "Audit entries, newest first", body = ActivityLogResponse),
        (status = 401, description = "Unauthenticated"),
        (status = 403, description = "Missing capability")
    ),
    security(("bearerAuth" = []))
)]
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(page): Query<PageQuery>,
) -> AppResult<Json<ActivityLogResponse>> {
    authorize(auth.role, Capability::ViewLogs)?;

    let (entries, total) = audit::list(&state.pool, page.page(), page.limit()).await?;

    Ok(Json(ActivityLogResponse {
        entries,
        pagination: PageMeta::new(total, page.page(), page.limit()),
    }))
}
