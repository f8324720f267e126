use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::pagination::PageMeta;

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BlogCategory {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub content: String,
    pub published: bool,
    /// Set on the first unpublished -> published transition, cleared again on
    /// unpublish.
    pub published_at: Option<DateTime<Utc>>,
    pub featured: bool,
    pub category_id: Option<Uuid>,
    pub author_id: Uuid,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct DbBlogPost {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub content: String,
    pub published: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub featured: bool,
    pub category_id: Option<Uuid>,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DbBlogPost {
    pub fn into_post(self, tags: Vec<String>) -> BlogPost {
        BlogPost {
            id: self.id,
            title: self.title,
            slug: self.slug,
            excerpt: self.excerpt,
            content: self.content,
            published: self.published,
            published_at: self.published_at,
            featured: self.featured,
            category_id: self.category_id,
            author_id: self.author_id,
            tags,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ArticleCreateRequest {
    #[schema(example = "Cum alegi meșterul potrivit")]
    pub title: String,
    /// Generated from the title when absent.
    pub slug: Option<String>,
    pub excerpt: Option<String>,
    pub content: String,
    pub category_id: Option<Uuid>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub published: bool,
    #[serde(default)]
    pub featured: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ArticleUpdateRequest {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub category_id: Option<Uuid>,
    pub tags: Option<Vec<String>>,
    pub featured: Option<bool>,
}

/// Explicit target state for the publication toggle; omitted means "flip".
#[derive(Debug, Deserialize, ToSchema)]
pub struct ToggleRequest {
    pub published: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ArticleActionResponse {
    pub success: bool,
    pub message: String,
    pub article: BlogPost,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCreateRequest {
    #[schema(example = "Instalații")]
    pub name: String,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryUpdateRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BlogListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    /// Category slug.
    pub category: Option<String>,
    pub search: Option<String>,
    pub featured: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BlogListResponse {
    pub posts: Vec<BlogPost>,
    pub pagination: PageMeta,
}
