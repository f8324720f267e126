use axum::extract::State;
use axum::Json;
use serde::Serialize;
use sqlx::SqlitePool;
use utoipa::ToSchema;

use crate::app::AppState;
use crate::authz::{authorize, Capability};
use crate::errors::AppResult;
use crate::jwt::AuthUser;
use crate::utils::utc_now;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub total_users: i64,
    pub total_craftsmen: i64,
    pub verified_craftsmen: i64,
    pub active_subscriptions: i64,
    pub expired_subscriptions: i64,
    pub published_posts: i64,
    pub newsletter_subscribers: i64,
}

#[utoipa::path(
    get,
    path = "/admin/dashboard",
    tag = "Admin",
    responses(
        (status = 200, description = "Back-office overview counts", body = DashboardResponse),
        (status = 401, description = "Unauthenticated"),
        (status = 403, description = "Missing capability")
    ),
    security(("bearerAuth" = []))
)]
pub async fn overview(State(state): State<AppState>, auth: AuthUser) -> AppResult<Json<DashboardResponse>> {
    authorize(auth.role, Capability::ViewAnalytics)?;

    let now = utc_now();
    let pool = &state.pool;

    // Counts use the effective view: a lapsed ACTIVE row counts as expired.
    let active_subscriptions: i64 = sqlx::query_scalar(
        "SELECT COUNT(1) FROM craftsmen WHERE subscription_status = 'ACTIVE' AND subscription_end_date >= ?",
    )
    .bind(now)
    .fetch_one(pool)
    .await?;

    let expired_subscriptions: i64 = sqlx::query_scalar(
        "SELECT COUNT(1) FROM craftsmen WHERE subscription_status = 'EXPIRED' \
            OR (subscription_status = 'ACTIVE' AND subscription_end_date < ?)",
    )
    .bind(now)
    .fetch_one(pool)
    .await?;

    Ok(Json(DashboardResponse {
        total_users: count(pool, "SELECT COUNT(1) FROM users").await?,
        total_craftsmen: count(pool, "SELECT COUNT(1) FROM craftsmen").await?,
        verified_craftsmen: count(pool, "SELECT COUNT(1) FROM craftsmen WHERE verified = 1").await?,
        active_subscriptions,
        expired_subscriptions,
        published_posts: count(pool, "SELECT COUNT(1) FROM blog_posts WHERE published = 1").await?,
        newsletter_subscribers: count(pool, "SELECT COUNT(1) FROM newsletter WHERE subscribed = 1").await?,
    }))
}

async fn count(pool: &SqlitePool, sql: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(sql).fetch_one(pool).await
}
