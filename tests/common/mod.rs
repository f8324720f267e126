#![allow(dead_code)]

use anyhow::{Context, Result};
use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot`
use uuid::Uuid;

use vasilestie_api::authz::Role;
use vasilestie_api::create_app;
use vasilestie_api::jwt::JwtConfig;

/// Fresh app over a tempfile SQLite database with all migrations applied.
/// The TempDir must stay alive for the duration of the test.
pub async fn setup() -> Result<(Router, SqlitePool, TempDir)> {
    let dir = tempfile::tempdir().context("failed to create tempdir")?;
    let db_path = dir.path().join("test.db");

    let opts = sqlx::sqlite::SqliteConnectOptions::new()
        .filename(&db_path)
        .create_if_missing(true);
    let pool = SqlitePool::connect_with(opts).await?;

    let migrator = sqlx::migrate::Migrator::new(
        std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations"),
    )
    .await?;
    migrator.run(&pool).await?;

    std::env::set_var("JWT_SECRET", "test-secret");
    let app = create_app(pool.clone()).await?;

    Ok((app, pool, dir))
}

/// Insert a staff account directly and mint a session token for it.
pub async fn staff_token(pool: &SqlitePool, role: Role) -> Result<(Uuid, String)> {
    let id = Uuid::new_v4();
    let now = chrono::Utc::now();

    sqlx::query(
        "INSERT INTO users (id, name, email, password_hash, role, status, created_at, updated_at) \
         VALUES (?, ?, ?, NULL, ?, 'ACTIVE', ?, ?)",
    )
    .bind(id)
    .bind(format!("Staff {}", role.as_str()))
    .bind(format!("{}@vasilestie.ro", Uuid::new_v4()))
    .bind(role.as_str())
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    let token = JwtConfig::from_env()?.encode(id, role)?;
    Ok((id, token))
}

pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body_json: Option<Value>,
) -> Result<(StatusCode, Value)> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }

    let request = match body_json {
        Some(body_json) => builder
            .header("content-type", "application/json")
            .body(Body::from(body_json.to_string()))?,
        None => builder.body(Body::empty())?,
    };

    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = body::to_bytes(response.into_body(), 10_485_760).await?;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };

    Ok((status, value))
}

pub fn str_field<'a>(value: &'a Value, field: &str) -> &'a str {
    value.get(field).and_then(Value::as_str).unwrap_or_default()
}

/// Register a craftsman through the public API; returns (craftsman row id, token).
pub async fn register_craftsman(
    app: &Router,
    pool: &SqlitePool,
    email: &str,
    business_name: &str,
) -> Result<(Uuid, String)> {
    let (status, body) = send(
        app,
        "POST",
        "/auth/register",
        None,
        Some(serde_json::json!({
            "name": "Meșter Test",
            "email": email,
            "password": "password123",
            "craftsman": {
                "businessName": business_name,
                "county": "Cluj",
                "category": "instalatii"
            }
        })),
    )
    .await?;
    anyhow::ensure!(status == StatusCode::CREATED, "register failed: {status} - {body}");

    let token = str_field(&body, "token").to_string();
    let user_id: Uuid = body
        .get("user")
        .and_then(|u| u.get("id"))
        .and_then(Value::as_str)
        .context("missing user id")?
        .parse()?;

    let craftsman_id: Uuid = sqlx::query_scalar("SELECT id FROM craftsmen WHERE user_id = ?")
        .bind(user_id)
        .fetch_one(pool)
        .await?;

    Ok((craftsman_id, token))
}
