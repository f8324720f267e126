//! Append-only activity log for privileged mutations.
//!
//! Every entry is written inside the same transaction as the mutation it
//! describes, so a recorded action always corresponds to a committed state
//! change. Entries are chained with SHA-256 over insertion order for
//! tamper-evidence; nothing ever updates or deletes a row.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use sqlx::{FromRow, Sqlite, SqlitePool, Transaction};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    CraftsmanApproved,
    CraftsmanRejected,
    TeamMemberCreated,
    TeamMemberUpdated,
    TeamMemberDeleted,
    UserStatusUpdated,
    ArticleCreated,
    ArticleUpdated,
    ArticleDeleted,
    ArticlePublished,
    ArticleUnpublished,
    CategoryCreated,
    CategoryUpdated,
    CategoryDeleted,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::CraftsmanApproved => "CRAFTSMAN_APPROVED",
            AuditAction::CraftsmanRejected => "CRAFTSMAN_REJECTED",
            AuditAction::TeamMemberCreated => "TEAM_MEMBER_CREATED",
            AuditAction::TeamMemberUpdated => "TEAM_MEMBER_UPDATED",
            AuditAction::TeamMemberDeleted => "TEAM_MEMBER_DELETED",
            AuditAction::UserStatusUpdated => "USER_STATUS_UPDATED",
            AuditAction::ArticleCreated => "ARTICLE_CREATED",
            AuditAction::ArticleUpdated => "ARTICLE_UPDATED",
            AuditAction::ArticleDeleted => "ARTICLE_DELETED",
            AuditAction::ArticlePublished => "ARTICLE_PUBLISHED",
            AuditAction::ArticleUnpublished => "ARTICLE_UNPUBLISHED",
            AuditAction::CategoryCreated => "CATEGORY_CREATED",
            AuditAction::CategoryUpdated => "CATEGORY_UPDATED",
            AuditAction::CategoryDeleted => "CATEGORY_DELETED",
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    pub id: Uuid,
    pub actor_id: Uuid,
    pub action: String,
    pub details: String,
    pub occurred_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev_hash: Option<String>,
    pub hash: String,
}

/// Append one entry as part of the caller's transaction.
pub async fn record(
    tx: &mut Transaction<'_, Sqlite>,
    actor_id: Uuid,
    action: AuditAction,
    details: impl Into<String>,
) -> Result<(), sqlx::Error> {
    let details = details.into();
    let id = Uuid::new_v4();
    let occurred_at = Utc::now();

    // Reading the chain head inside the transaction serializes concurrent
    // appends at the database level.
    let prev_hash: Option<String> =
        sqlx::query_scalar("SELECT hash FROM activity_log ORDER BY rowid DESC LIMIT 1")
            .fetch_optional(&mut **tx)
            .await?;

    let hash = chain_hash(prev_hash.as_deref(), actor_id, action.as_str(), &details, occurred_at);

    sqlx::query(
        "INSERT INTO activity_log (id, actor_id, action, details, occurred_at, prev_hash, hash) VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(actor_id)
    .bind(action.as_str())
    .bind(&details)
    .bind(occurred_at)
    .bind(&prev_hash)
    .bind(&hash)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

pub async fn list(
    pool: &SqlitePool,
    page: i64,
    limit: i64,
) -> Result<(Vec<ActivityEntry>, i64), sqlx::Error> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM activity_log")
        .fetch_one(pool)
        .await?;

    let entries = sqlx::query_as::<_, ActivityEntry>(
        "SELECT id, actor_id, action, details, occurred_at, prev_hash, hash FROM activity_log ORDER BY rowid DESC LIMIT ? OFFSET ?",
    )
    .bind(limit)
    .bind((page - 1) * limit)
    .fetch_all(pool)
    .await?;

    Ok((entries, total))
}

fn chain_hash(
    prev: Option<&str>,
    actor_id: Uuid,
    action: &str,
    details: &str,
    occurred_at: DateTime<Utc>,
) -> String {
    let mut hasher = Sha256::new();
    if let Some(prev) = prev {
        hasher.update(prev.as_bytes());
    }
    hasher.update(actor_id.as_bytes());
    hasher.update(action.as_bytes());
    hasher.update(details.as_bytes());
    hasher.update(occurred_at.to_rfc3339().as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_hash_depends_on_predecessor() {
        let actor = Uuid::new_v4();
        let at = Utc::now();
        let genesis = chain_hash(None, actor, "CRAFTSMAN_APPROVED", "x", at);
        let linked = chain_hash(Some(&genesis), actor, "CRAFTSMAN_APPROVED", "x", at);
        assert_ne!(genesis, linked);
        assert_eq!(genesis.len(), 64);
    }
}
