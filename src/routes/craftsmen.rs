use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::app::AppState;
use crate::audit::{self, AuditAction};
use crate::authz::{authorize, Capability, Role};
use crate::errors::{AppError, AppResult};
use crate::jwt::AuthUser;
use crate::models::craftsman::{
    AdminCraftsmenQuery, Craftsman, CraftsmanActionResponse, CraftsmanProfile, CraftsmanWithUser,
    DbCraftsman, DirectoryQuery,
};
use crate::models::pagination::{PageMeta, PageQuery};
use crate::models::user::{User, UserStatus};
use crate::subscription;
use crate::utils::utc_now;

const CRAFTSMAN_COLUMNS: &str = "c.id, c.user_id, c.business_name, c.description, c.phone, c.county, c.city, c.category, c.experience_years, c.rating, c.review_count, c.verified, c.subscription_status, c.subscription_plan, c.subscription_start_date, c.subscription_end_date, c.created_at, c.updated_at";

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryResponse {
    pub craftsmen: Vec<CraftsmanProfile>,
    pub pagination: PageMeta,
}

#[derive(FromRow)]
struct DbProfileRow {
    id: Uuid,
    user_id: Uuid,
    business_name: String,
    description: Option<String>,
    phone: Option<String>,
    county: Option<String>,
    city: Option<String>,
    category: Option<String>,
    experience_years: i64,
    rating: f64,
    review_count: i64,
    verified: bool,
    subscription_status: String,
    subscription_plan: String,
    subscription_start_date: Option<DateTime<Utc>>,
    subscription_end_date: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    name: String,
}

impl DbProfileRow {
    fn into_parts(self) -> (DbCraftsman, String) {
        let name = self.name;
        let craftsman = DbCraftsman {
            id: self.id,
            user_id: self.user_id,
            business_name: self.business_name,
            description: self.description,
            phone: self.phone,
            county: self.county,
            city: self.city,
            category: self.category,
            experience_years: self.experience_years,
            rating: self.rating,
            review_count: self.review_count,
            verified: self.verified,
            subscription_status: self.subscription_status,
            subscription_plan: self.subscription_plan,
            subscription_start_date: self.subscription_start_date,
            subscription_end_date: self.subscription_end_date,
            created_at: self.created_at,
            updated_at: self.updated_at,
        };
        (craftsman, name)
    }
}

// Only craftsmen whose paid window is still open are listable; the date
// predicate is the SQL form of the lazy-expiry rule.
const LISTABLE: &str = "c.verified = 1 AND c.subscription_status = 'ACTIVE' AND c.subscription_end_date >= ? AND u.status = 'ACTIVE'";

#[utoipa::path(
    get,
    path = "/craftsmen",
    tag = "Craftsmen",
    params(
        ("county" = Option<String>, Query, description = "Filter by county"),
        ("category" = Option<String>, Query, description = "Filter by trade category"),
        ("search" = Option<String>, Query, description = "Search in business name and description"),
        ("page" = Option<i64>, Query, description = "1-indexed page"),
        ("limit" = Option<i64>, Query, description = "Page size"),
    ),
    responses((status = 200, description = "Public craftsman directory", body = DirectoryResponse))
)]
pub async fn list_public(
    State(state): State<AppState>,
    Query(query): Query<DirectoryQuery>,
) -> AppResult<Json<DirectoryResponse>> {
    let page = PageQuery { page: query.page, limit: query.limit };
    let now = utc_now();
    let pattern = query.search.as_ref().map(|s| format!("%{s}%"));

    let count_sql = format!(
        "SELECT COUNT(1) FROM craftsmen c INNER JOIN users u ON u.id = c.user_id \
         WHERE {LISTABLE} \
           AND (? IS NULL OR c.county = ?) \
           AND (? IS NULL OR c.category = ?) \
           AND (? IS NULL OR c.business_name LIKE ? OR c.description LIKE ?)"
    );
    let total: i64 = sqlx::query_scalar(&count_sql)
        .bind(now)
        .bind(&query.county)
        .bind(&query.county)
        .bind(&query.category)
        .bind(&query.category)
        .bind(&pattern)
        .bind(&pattern)
        .bind(&pattern)
        .fetch_one(&state.pool)
        .await?;

    let list_sql = format!(
        "SELECT {CRAFTSMAN_COLUMNS}, u.name as name \
         FROM craftsmen c INNER JOIN users u ON u.id = c.user_id \
         WHERE {LISTABLE} \
           AND (? IS NULL OR c.county = ?) \
           AND (? IS NULL OR c.category = ?) \
           AND (? IS NULL OR c.business_name LIKE ? OR c.description LIKE ?) \
         ORDER BY c.rating DESC, c.review_count DESC LIMIT ? OFFSET ?"
    );
    let rows = sqlx::query_as::<_, DbProfileRow>(&list_sql)
        .bind(now)
        .bind(&query.county)
        .bind(&query.county)
        .bind(&query.category)
        .bind(&query.category)
        .bind(&pattern)
        .bind(&pattern)
        .bind(&pattern)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&state.pool)
        .await?;

    let mut craftsmen = Vec::with_capacity(rows.len());
    for row in rows {
        let (db, name) = row.into_parts();
        let craftsman: Craftsman = db.try_into()?;
        craftsmen.push(CraftsmanProfile::from_parts(craftsman, name));
    }

    Ok(Json(DirectoryResponse {
        craftsmen,
        pagination: PageMeta::new(total, page.page(), page.limit()),
    }))
}

#[utoipa::path(
    get,
    path = "/craftsmen/{id}",
    tag = "Craftsmen",
    params(("id" = Uuid, Path, description = "Craftsman id")),
    responses(
        (status = 200, description = "Public craftsman profile", body = CraftsmanProfile),
        (status = 404, description = "Craftsman not found or not listable")
    )
)]
pub async fn get_public(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<CraftsmanProfile>> {
    let now = utc_now();
    let sql = format!(
        "SELECT {CRAFTSMAN_COLUMNS}, u.name as name \
         FROM craftsmen c INNER JOIN users u ON u.id = c.user_id \
         WHERE c.id = ? AND {LISTABLE}"
    );
    let row = sqlx::query_as::<_, DbProfileRow>(&sql)
        .bind(id)
        .bind(now)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| AppError::not_found("meșterul nu a fost găsit"))?;

    let (db, name) = row.into_parts();
    let craftsman: Craftsman = db.try_into()?;
    Ok(Json(CraftsmanProfile::from_parts(craftsman, name)))
}

#[utoipa::path(
    get,
    path = "/admin/craftsmen",
    tag = "Admin",
    params(
        ("subscription_status" = Option<String>, Query, description = "Filter by effective subscription status"),
        ("verified" = Option<bool>, Query, description = "Filter by verification flag"),
    ),
    responses(
        (status = 200, description = "All craftsmen with their user accounts", body = [CraftsmanWithUser]),
        (status = 401, description = "Unauthenticated"),
        (status = 403, description = "Missing capability")
    ),
    security(("bearerAuth" = []))
)]
pub async fn list_admin(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<AdminCraftsmenQuery>,
) -> AppResult<Json<Vec<CraftsmanWithUser>>> {
    authorize(auth.role, Capability::ViewCraftsmen)?;

    let rows = sqlx::query_as::<_, DbAdminRow>(
        "SELECT c.id, c.user_id, c.business_name, c.description, c.phone, c.county, c.city, c.category, \
                c.experience_years, c.rating, c.review_count, c.verified, c.subscription_status, \
                c.subscription_plan, c.subscription_start_date, c.subscription_end_date, c.created_at, c.updated_at, \
                u.name as user_name, u.email as user_email, u.role as user_role, u.status as user_status, \
                u.email_verified_at as user_email_verified_at, u.last_login as user_last_login, \
                u.created_at as user_created_at, u.updated_at as user_updated_at \
         FROM craftsmen c INNER JOIN users u ON u.id = c.user_id \
         ORDER BY c.created_at DESC",
    )
    .fetch_all(&state.pool)
    .await?;

    let now = utc_now();
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let entry = row.into_entry(now)?;
        out.push(entry);
    }

    // Effective-status and verification filters apply to the lazy view, so
    // they run after expiry is folded in.
    if let Some(status) = &query.subscription_status {
        let wanted = subscription::SubscriptionStatus::parse(status)
            .ok_or_else(|| AppError::bad_request("status de abonament invalid"))?;
        out.retain(|entry| entry.craftsman.subscription_status == wanted);
    }
    if let Some(verified) = query.verified {
        out.retain(|entry| entry.craftsman.verified == verified);
    }

    Ok(Json(out))
}

#[utoipa::path(
    patch,
    path = "/admin/craftsmen/{id}/approve",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "Craftsman id")),
    responses(
        (status = 200, description = "Craftsman approved and subscription activated", body = CraftsmanActionResponse),
        (status = 401, description = "Unauthenticated"),
        (status = 403, description = "Missing capability"),
        (status = 404, description = "Craftsman not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn approve(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<CraftsmanActionResponse>> {
    authorize(auth.role, Capability::EditCraftsmen)?;

    let now = utc_now();
    let activation = subscription::approve(now);

    let mut tx = state.pool.begin().await?;

    let target = fetch_craftsman_tx(&mut tx, id).await?;

    sqlx::query(
        "UPDATE craftsmen SET verified = ?, subscription_status = ?, subscription_start_date = ?, subscription_end_date = ?, updated_at = ? WHERE id = ?",
    )
    .bind(activation.verified)
    .bind(activation.status.as_str())
    .bind(activation.start)
    .bind(activation.end)
    .bind(now)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    audit::record(
        &mut tx,
        auth.user_id,
        AuditAction::CraftsmanApproved,
        format!("Meșterul \"{}\" a fost aprobat", target.business_name),
    )
    .await?;

    tx.commit().await?;

    let craftsman: Craftsman = fetch_craftsman(&state.pool, id).await?.try_into()?;
    Ok(Json(CraftsmanActionResponse {
        success: true,
        message: "Meșterul a fost aprobat și abonamentul activat".to_string(),
        craftsman,
    }))
}

#[utoipa::path(
    patch,
    path = "/admin/craftsmen/{id}/reject",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "Craftsman id")),
    responses(
        (status = 200, description = "Craftsman rejected", body = CraftsmanActionResponse),
        (status = 401, description = "Unauthenticated"),
        (status = 403, description = "Missing capability"),
        (status = 404, description = "Craftsman not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn reject(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<CraftsmanActionResponse>> {
    authorize(auth.role, Capability::EditCraftsmen)?;

    let rejection = subscription::reject();
    let now = utc_now();

    let mut tx = state.pool.begin().await?;

    let target = fetch_craftsman_tx(&mut tx, id).await?;

    sqlx::query("UPDATE craftsmen SET verified = ?, subscription_status = ?, updated_at = ? WHERE id = ?")
        .bind(rejection.verified)
        .bind(rejection.status.as_str())
        .bind(now)
        .bind(id)
        .execute(&mut *tx)
        .await?;

    audit::record(
        &mut tx,
        auth.user_id,
        AuditAction::CraftsmanRejected,
        format!("Meșterul \"{}\" a fost respins", target.business_name),
    )
    .await?;

    tx.commit().await?;

    let craftsman: Craftsman = fetch_craftsman(&state.pool, id).await?.try_into()?;
    Ok(Json(CraftsmanActionResponse {
        success: true,
        message: "Meșterul a fost respins".to_string(),
        craftsman,
    }))
}

async fn fetch_craftsman(pool: &SqlitePool, id: Uuid) -> AppResult<DbCraftsman> {
    let sql = format!("SELECT {CRAFTSMAN_COLUMNS} FROM craftsmen c WHERE c.id = ?");
    sqlx::query_as::<_, DbCraftsman>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("meșterul nu a fost găsit"))
}

async fn fetch_craftsman_tx(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    id: Uuid,
) -> AppResult<DbCraftsman> {
    let sql = format!("SELECT {CRAFTSMAN_COLUMNS} FROM craftsmen c WHERE c.id = ?");
    sqlx::query_as::<_, DbCraftsman>(&sql)
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::not_found("meșterul nu a fost găsit"))
}

#[derive(FromRow)]
struct DbAdminRow {
    id: Uuid,
    user_id: Uuid,
    business_name: String,
    description: Option<String>,
    phone: Option<String>,
    county: Option<String>,
    city: Option<String>,
    category: Option<String>,
    experience_years: i64,
    rating: f64,
    review_count: i64,
    verified: bool,
    subscription_status: String,
    subscription_plan: String,
    subscription_start_date: Option<DateTime<Utc>>,
    subscription_end_date: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    user_name: String,
    user_email: String,
    user_role: String,
    user_status: String,
    user_email_verified_at: Option<DateTime<Utc>>,
    user_last_login: Option<DateTime<Utc>>,
    user_created_at: DateTime<Utc>,
    user_updated_at: DateTime<Utc>,
}

impl DbAdminRow {
    fn into_entry(self, now: DateTime<Utc>) -> AppResult<CraftsmanWithUser> {
        let role = Role::parse(&self.user_role)
            .ok_or_else(|| AppError::internal(format!("unknown role in database: {}", self.user_role)))?;
        let status = UserStatus::parse(&self.user_status)
            .ok_or_else(|| AppError::internal(format!("unknown status in database: {}", self.user_status)))?;

        let user = User {
            id: self.user_id,
            name: self.user_name,
            email: self.user_email,
            role,
            status,
            email_verified_at: self.user_email_verified_at,
            last_login: self.user_last_login,
            created_at: self.user_created_at,
            updated_at: self.user_updated_at,
        };

        let db = DbCraftsman {
            id: self.id,
            user_id: self.user_id,
            business_name: self.business_name,
            description: self.description,
            phone: self.phone,
            county: self.county,
            city: self.city,
            category: self.category,
            experience_years: self.experience_years,
            rating: self.rating,
            review_count: self.review_count,
            verified: self.verified,
            subscription_status: self.subscription_status,
            subscription_plan: self.subscription_plan,
            subscription_start_date: self.subscription_start_date,
            subscription_end_date: self.subscription_end_date,
            created_at: self.created_at,
            updated_at: self.updated_at,
        };
        let craftsman: Craftsman = db.try_into()?;

        Ok(CraftsmanWithUser {
            craftsman: craftsman.apply_expiry(now),
            user,
        })
    }
}
