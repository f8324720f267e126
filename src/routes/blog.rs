use axum::extract::{Path, Query, State};
use axum::Json;

use crate::app::AppState;
use crate::errors::{AppError, AppResult};
use crate::models::blog::{BlogCategory, BlogListQuery, BlogListResponse, BlogPost, DbBlogPost};
use crate::models::pagination::{PageMeta, PageQuery};
use crate::routes::content::fetch_tags;

#[utoipa::path(
    get,
    path = "/blog/posts",
    tag = "Blog",
    params(
        ("page" = Option<i64>, Query, description = "1-indexed page"),
        ("limit" = Option<i64>, Query, description = "Page size"),
        ("category" = Option<String>, Query, description = "Category slug"),
        ("search" = Option<String>, Query, description = "Search in title and excerpt"),
        ("featured" = Option<bool>, Query, description = "Only featured posts"),
    ),
    responses((status = 200, description = "Published posts", body = BlogListResponse))
)]
pub async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<BlogListQuery>,
) -> AppResult<Json<BlogListResponse>> {
    let page = PageQuery { page: query.page, limit: query.limit };
    let pattern = query.search.as_ref().map(|s| format!("%{s}%"));
    let featured = query.featured.map(i64::from);

    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(1) FROM blog_posts p LEFT JOIN blog_categories c ON c.id = p.category_id \
         WHERE p.published = 1 \
           AND (? IS NULL OR c.slug = ?) \
           AND (? IS NULL OR p.featured = ?) \
           AND (? IS NULL OR p.title LIKE ? OR p.excerpt LIKE ?)",
    )
    .bind(&query.category)
    .bind(&query.category)
    .bind(featured)
    .bind(featured)
    .bind(&pattern)
    .bind(&pattern)
    .bind(&pattern)
    .fetch_one(&state.pool)
    .await?;

    let rows = sqlx::query_as::<_, DbBlogPost>(
        "SELECT p.id, p.title, p.slug, p.excerpt, p.content, p.published, p.published_at, p.featured, p.category_id, p.author_id, p.created_at, p.updated_at \
         FROM blog_posts p LEFT JOIN blog_categories c ON c.id = p.category_id \
         WHERE p.published = 1 \
           AND (? IS NULL OR c.slug = ?) \
           AND (? IS NULL OR p.featured = ?) \
           AND (? IS NULL OR p.title LIKE ? OR p.excerpt LIKE ?) \
         ORDER BY p.published_at DESC LIMIT ? OFFSET ?",
    )
    .bind(&query.category)
    .bind(&query.category)
    .bind(featured)
    .bind(featured)
    .bind(&pattern)
    .bind(&pattern)
    .bind(&pattern)
    .bind(page.limit())
    .bind(page.offset())
    .fetch_all(&state.pool)
    .await?;

    let mut posts = Vec::with_capacity(rows.len());
    for row in rows {
        let tags = fetch_tags(&state.pool, row.id).await?;
        posts.push(row.into_post(tags));
    }

    Ok(Json(BlogListResponse {
        posts,
        pagination: PageMeta::new(total, page.page(), page.limit()),
    }))
}

#[utoipa::path(
    get,
    path = "/blog/posts/{slug}",
    tag = "Blog",
    params(("slug" = String, Path, description = "Post slug")),
    responses(
        (status = 200, description = "Published post", body = BlogPost),
        (status = 404, description = "No published post with this slug")
    )
)]
pub async fn get_post(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<BlogPost>> {
    let row = sqlx::query_as::<_, DbBlogPost>(
        "SELECT id, title, slug, excerpt, content, published, published_at, featured, category_id, author_id, created_at, updated_at \
         FROM blog_posts WHERE slug = ? AND published = 1",
    )
    .bind(&slug)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| AppError::not_found("articolul nu a fost găsit"))?;

    let tags = fetch_tags(&state.pool, row.id).await?;
    Ok(Json(row.into_post(tags)))
}

#[utoipa::path(
    get,
    path = "/blog/categories",
    operation_id = "list_blog_categories",
    tag = "Blog",
    responses((status = 200, description = "Blog categories", body = [BlogCategory]))
)]
pub async fn list_categories(State(state): State<AppState>) -> AppResult<Json<Vec<BlogCategory>>> {
    let categories = sqlx::query_as::<_, BlogCategory>(
        "SELECT id, name, slug, description, color, icon, created_at, updated_at FROM blog_categories ORDER BY name",
    )
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(categories))
}
