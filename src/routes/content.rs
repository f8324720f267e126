use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use sqlx::{Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

use crate::app::AppState;
use crate::audit::{self, AuditAction};
use crate::authz::{authorize, Capability};
use crate::errors::{AppError, AppResult};
use crate::jwt::AuthUser;
use crate::models::blog::{
    ArticleActionResponse, ArticleCreateRequest, ArticleUpdateRequest, BlogCategory, BlogPost,
    CategoryCreateRequest, CategoryUpdateRequest, DbBlogPost, ToggleRequest,
};
use crate::routes::team::DeleteResponse;
use crate::utils::{slugify, utc_now};

const POST_COLUMNS: &str = "id, title, slug, excerpt, content, published, published_at, featured, category_id, author_id, created_at, updated_at";

// =============================================================================
// ARTICLES
// =============================================================================

#[utoipa::path(
    get,
    path = "/admin/content/articles",
    tag = "Admin",
    responses(
        (status = 200, description = "All articles, drafts included", body = [BlogPost]),
        (status = 403, description = "Missing capability")
    ),
    security(("bearerAuth" = []))
)]
pub async fn list_articles(State(state): State<AppState>, auth: AuthUser) -> AppResult<Json<Vec<BlogPost>>> {
    authorize(auth.role, Capability::ViewContent)?;

    let sql = format!("SELECT {POST_COLUMNS} FROM blog_posts ORDER BY created_at DESC");
    let rows = sqlx::query_as::<_, DbBlogPost>(&sql).fetch_all(&state.pool).await?;

    let mut posts = Vec::with_capacity(rows.len());
    for row in rows {
        let tags = fetch_tags(&state.pool, row.id).await?;
        posts.push(row.into_post(tags));
    }

    Ok(Json(posts))
}

#[utoipa::path(
    post,
    path = "/admin/content/articles",
    tag = "Admin",
    request_body = ArticleCreateRequest,
    responses(
        (status = 201, description = "Article created", body = BlogPost),
        (status = 403, description = "Missing capability"),
        (status = 409, description = "Slug already in use")
    ),
    security(("bearerAuth" = []))
)]
pub async fn create_article(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<ArticleCreateRequest>,
) -> AppResult<(StatusCode, Json<BlogPost>)> {
    authorize(auth.role, Capability::EditContent)?;

    let slug = payload.slug.clone().unwrap_or_else(|| slugify(&payload.title));
    if slug.is_empty() {
        return Err(AppError::bad_request("titlul nu produce un slug valid"));
    }

    let now = utc_now();
    let id = Uuid::new_v4();
    let published_at = payload.published.then_some(now);

    let mut tx = state.pool.begin().await?;

    sqlx::query(
        "INSERT INTO blog_posts (id, title, slug, excerpt, content, published, published_at, featured, category_id, author_id, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(&payload.title)
    .bind(&slug)
    .bind(&payload.excerpt)
    .bind(&payload.content)
    .bind(payload.published)
    .bind(published_at)
    .bind(payload.featured)
    .bind(payload.category_id)
    .bind(auth.user_id)
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await
    .map_err(|err| AppError::on_conflict(err, "slug-ul este deja folosit"))?;

    replace_tags(&mut tx, id, &payload.tags).await?;

    audit::record(
        &mut tx,
        auth.user_id,
        AuditAction::ArticleCreated,
        format!("Articolul \"{}\" a fost creat", payload.title),
    )
    .await?;

    tx.commit().await?;

    let post = fetch_post(&state.pool, id).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

#[utoipa::path(
    put,
    path = "/admin/content/articles/{id}",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "Article id")),
    request_body = ArticleUpdateRequest,
    responses(
        (status = 200, description = "Article updated", body = BlogPost),
        (status = 403, description = "Missing capability"),
        (status = 404, description = "Article not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn update_article(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ArticleUpdateRequest>,
) -> AppResult<Json<BlogPost>> {
    authorize(auth.role, Capability::EditContent)?;

    let current = fetch_db_post(&state.pool, id).await?;

    let title = payload.title.unwrap_or(current.title);
    let slug = payload.slug.unwrap_or(current.slug);
    let excerpt = payload.excerpt.or(current.excerpt);
    let content = payload.content.unwrap_or(current.content);
    let category_id = payload.category_id.or(current.category_id);
    let featured = payload.featured.unwrap_or(current.featured);

    let now = utc_now();
    let mut tx = state.pool.begin().await?;

    sqlx::query(
        "UPDATE blog_posts SET title = ?, slug = ?, excerpt = ?, content = ?, category_id = ?, featured = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&title)
    .bind(&slug)
    .bind(&excerpt)
    .bind(&content)
    .bind(category_id)
    .bind(featured)
    .bind(now)
    .bind(id)
    .execute(&mut *tx)
    .await
    .map_err(|err| AppError::on_conflict(err, "slug-ul este deja folosit"))?;

    if let Some(tags) = &payload.tags {
        replace_tags(&mut tx, id, tags).await?;
    }

    audit::record(
        &mut tx,
        auth.user_id,
        AuditAction::ArticleUpdated,
        format!("Articolul \"{title}\" a fost actualizat"),
    )
    .await?;

    tx.commit().await?;

    let post = fetch_post(&state.pool, id).await?;
    Ok(Json(post))
}

#[utoipa::path(
    delete,
    path = "/admin/content/articles/{id}",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "Article id")),
    responses(
        (status = 200, description = "Article deleted", body = DeleteResponse),
        (status = 403, description = "Missing capability"),
        (status = 404, description = "Article not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn delete_article(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<DeleteResponse>> {
    authorize(auth.role, Capability::EditContent)?;

    let current = fetch_db_post(&state.pool, id).await?;

    let mut tx = state.pool.begin().await?;

    sqlx::query("DELETE FROM blog_posts WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    audit::record(
        &mut tx,
        auth.user_id,
        AuditAction::ArticleDeleted,
        format!("Articolul \"{}\" a fost șters", current.title),
    )
    .await?;

    tx.commit().await?;

    Ok(Json(DeleteResponse { success: true }))
}

#[utoipa::path(
    patch,
    path = "/admin/content/articles/{id}/toggle",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "Article id")),
    request_body = ToggleRequest,
    responses(
        (status = 200, description = "Publication state set", body = ArticleActionResponse),
        (status = 403, description = "Missing capability"),
        (status = 404, description = "Article not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn toggle_article(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    payload: Option<Json<ToggleRequest>>,
) -> AppResult<Json<ArticleActionResponse>> {
    authorize(auth.role, Capability::EditContent)?;

    let current = fetch_db_post(&state.pool, id).await?;
    let target = payload
        .and_then(|Json(body)| body.published)
        .unwrap_or(!current.published);

    let now = utc_now();
    // First unpublished -> published transition stamps the timestamp;
    // unpublishing clears it; re-setting the same value leaves it alone.
    let published_at = match (current.published, target) {
        (false, true) => Some(now),
        (_, false) => None,
        (true, true) => current.published_at,
    };

    let mut tx = state.pool.begin().await?;

    sqlx::query("UPDATE blog_posts SET published = ?, published_at = ?, updated_at = ? WHERE id = ?")
        .bind(target)
        .bind(published_at)
        .bind(now)
        .bind(id)
        .execute(&mut *tx)
        .await?;

    let (action, message) = if target {
        (AuditAction::ArticlePublished, "Articolul a fost publicat")
    } else {
        (AuditAction::ArticleUnpublished, "Articolul a fost retras")
    };

    audit::record(
        &mut tx,
        auth.user_id,
        action,
        format!("Articolul \"{}\": {}", current.title, message),
    )
    .await?;

    tx.commit().await?;

    let article = fetch_post(&state.pool, id).await?;
    Ok(Json(ArticleActionResponse {
        success: true,
        message: message.to_string(),
        article,
    }))
}

// =============================================================================
// CATEGORIES
// =============================================================================

#[utoipa::path(
    get,
    path = "/admin/content/categories",
    operation_id = "list_admin_categories",
    tag = "Admin",
    responses(
        (status = 200, description = "Blog categories", body = [BlogCategory]),
        (status = 403, description = "Missing capability")
    ),
    security(("bearerAuth" = []))
)]
pub async fn list_categories(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<Vec<BlogCategory>>> {
    authorize(auth.role, Capability::ViewContent)?;

    let categories = sqlx::query_as::<_, BlogCategory>(
        "SELECT id, name, slug, description, color, icon, created_at, updated_at FROM blog_categories ORDER BY name",
    )
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(categories))
}

#[utoipa::path(
    post,
    path = "/admin/content/categories",
    tag = "Admin",
    request_body = CategoryCreateRequest,
    responses(
        (status = 201, description = "Category created", body = BlogCategory),
        (status = 403, description = "Missing capability"),
        (status = 409, description = "Slug already in use")
    ),
    security(("bearerAuth" = []))
)]
pub async fn create_category(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CategoryCreateRequest>,
) -> AppResult<(StatusCode, Json<BlogCategory>)> {
    authorize(auth.role, Capability::EditContent)?;

    let slug = payload.slug.clone().unwrap_or_else(|| slugify(&payload.name));
    if slug.is_empty() {
        return Err(AppError::bad_request("numele nu produce un slug valid"));
    }

    let now = utc_now();
    let id = Uuid::new_v4();

    let mut tx = state.pool.begin().await?;

    sqlx::query(
        "INSERT INTO blog_categories (id, name, slug, description, color, icon, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(&payload.name)
    .bind(&slug)
    .bind(&payload.description)
    .bind(&payload.color)
    .bind(&payload.icon)
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await
    .map_err(|err| AppError::on_conflict(err, "slug-ul este deja folosit"))?;

    audit::record(
        &mut tx,
        auth.user_id,
        AuditAction::CategoryCreated,
        format!("Categoria \"{}\" a fost creată", payload.name),
    )
    .await?;

    tx.commit().await?;

    let category = fetch_category(&state.pool, id).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

#[utoipa::path(
    put,
    path = "/admin/content/categories/{id}",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "Category id")),
    request_body = CategoryUpdateRequest,
    responses(
        (status = 200, description = "Category updated", body = BlogCategory),
        (status = 403, description = "Missing capability"),
        (status = 404, description = "Category not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn update_category(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CategoryUpdateRequest>,
) -> AppResult<Json<BlogCategory>> {
    authorize(auth.role, Capability::EditContent)?;

    let current = fetch_category(&state.pool, id).await?;

    let name = payload.name.unwrap_or(current.name);
    let description = payload.description.or(current.description);
    let color = payload.color.or(current.color);
    let icon = payload.icon.or(current.icon);

    let now = utc_now();
    let mut tx = state.pool.begin().await?;

    sqlx::query("UPDATE blog_categories SET name = ?, description = ?, color = ?, icon = ?, updated_at = ? WHERE id = ?")
        .bind(&name)
        .bind(&description)
        .bind(&color)
        .bind(&icon)
        .bind(now)
        .bind(id)
        .execute(&mut *tx)
        .await?;

    audit::record(
        &mut tx,
        auth.user_id,
        AuditAction::CategoryUpdated,
        format!("Categoria \"{name}\" a fost actualizată"),
    )
    .await?;

    tx.commit().await?;

    let category = fetch_category(&state.pool, id).await?;
    Ok(Json(category))
}

#[utoipa::path(
    delete,
    path = "/admin/content/categories/{id}",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "Category id")),
    responses(
        (status = 200, description = "Category deleted", body = DeleteResponse),
        (status = 403, description = "Missing capability"),
        (status = 404, description = "Category not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn delete_category(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<DeleteResponse>> {
    authorize(auth.role, Capability::EditContent)?;

    let current = fetch_category(&state.pool, id).await?;

    let mut tx = state.pool.begin().await?;

    sqlx::query("DELETE FROM blog_categories WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    audit::record(
        &mut tx,
        auth.user_id,
        AuditAction::CategoryDeleted,
        format!("Categoria \"{}\" a fost ștearsă", current.name),
    )
    .await?;

    tx.commit().await?;

    Ok(Json(DeleteResponse { success: true }))
}

// =============================================================================
// HELPERS
// =============================================================================

pub(crate) async fn fetch_db_post(pool: &SqlitePool, id: Uuid) -> AppResult<DbBlogPost> {
    let sql = format!("SELECT {POST_COLUMNS} FROM blog_posts WHERE id = ?");
    sqlx::query_as::<_, DbBlogPost>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("articolul nu a fost găsit"))
}

pub(crate) async fn fetch_post(pool: &SqlitePool, id: Uuid) -> AppResult<BlogPost> {
    let db = fetch_db_post(pool, id).await?;
    let tags = fetch_tags(pool, db.id).await?;
    Ok(db.into_post(tags))
}

pub(crate) async fn fetch_tags(pool: &SqlitePool, post_id: Uuid) -> AppResult<Vec<String>> {
    let tags = sqlx::query_scalar::<_, String>(
        "SELECT t.name FROM blog_tags t INNER JOIN blog_post_tags pt ON pt.tag_id = t.id WHERE pt.post_id = ? ORDER BY t.name",
    )
    .bind(post_id)
    .fetch_all(pool)
    .await?;
    Ok(tags)
}

async fn replace_tags(
    tx: &mut Transaction<'_, Sqlite>,
    post_id: Uuid,
    tags: &[String],
) -> AppResult<()> {
    sqlx::query("DELETE FROM blog_post_tags WHERE post_id = ?")
        .bind(post_id)
        .execute(&mut **tx)
        .await?;

    let now = utc_now();
    for tag in tags {
        let tag = tag.trim();
        if tag.is_empty() {
            continue;
        }

        sqlx::query("INSERT OR IGNORE INTO blog_tags (id, name, created_at) VALUES (?, ?, ?)")
            .bind(Uuid::new_v4())
            .bind(tag)
            .bind(now)
            .execute(&mut **tx)
            .await?;

        let tag_id: Uuid = sqlx::query_scalar("SELECT id FROM blog_tags WHERE name = ?")
            .bind(tag)
            .fetch_one(&mut **tx)
            .await?;

        sqlx::query("INSERT OR IGNORE INTO blog_post_tags (post_id, tag_id) VALUES (?, ?)")
            .bind(post_id)
            .bind(tag_id)
            .execute(&mut **tx)
            .await?;
    }

    Ok(())
}

async fn fetch_category(pool: &SqlitePool, id: Uuid) -> AppResult<BlogCategory> {
    sqlx::query_as::<_, BlogCategory>(
        "SELECT id, name, slug, description, color, icon, created_at, updated_at FROM blog_categories WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::not_found("categoria nu a fost găsită"))
}
