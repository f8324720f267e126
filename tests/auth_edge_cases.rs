mod common;

use anyhow::Result;
use axum::http::StatusCode;
use common::*;
use serde_json::json;
use uuid::Uuid;

use vasilestie_api::authz::Role;

#[tokio::test]
async fn wrong_credentials_are_unauthorized() -> Result<()> {
    let (app, _pool, _dir) = setup().await?;

    send(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(json!({"name": "Ana", "email": "ana@example.com", "password": "password123"})),
    )
    .await?;

    let (status, _) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({"email": "ana@example.com", "password": "wrong-password"})),
    )
    .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({"email": "nobody@example.com", "password": "password123"})),
    )
    .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    Ok(())
}

#[tokio::test]
async fn suspended_accounts_cannot_log_in() -> Result<()> {
    let (app, pool, _dir) = setup().await?;
    let (_admin_id, admin) = staff_token(&pool, Role::Admin).await?;

    send(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(json!({"name": "Dan", "email": "dan@example.com", "password": "password123"})),
    )
    .await?;
    let user_id: Uuid = sqlx::query_scalar("SELECT id FROM users WHERE email = 'dan@example.com'")
        .fetch_one(&pool)
        .await?;

    // An out-of-range status is rejected before any write.
    let (status, body) = send(
        &app,
        "PUT",
        &format!("/admin/users/{user_id}/status"),
        Some(&admin),
        Some(json!({"status": "BANNED"})),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "status invalid");

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/admin/users/{user_id}/status"),
        Some(&admin),
        Some(json!({"status": "SUSPENDED"})),
    )
    .await?;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["user"]["status"], "SUSPENDED");

    let (status, _) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({"email": "dan@example.com", "password": "password123"})),
    )
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let audited: i64 =
        sqlx::query_scalar("SELECT COUNT(1) FROM activity_log WHERE action = 'USER_STATUS_UPDATED'")
            .fetch_one(&pool)
            .await?;
    assert_eq!(audited, 1);

    Ok(())
}

#[tokio::test]
async fn status_updates_respect_the_tier_rule() -> Result<()> {
    let (app, pool, _dir) = setup().await?;
    let (_admin_id, admin) = staff_token(&pool, Role::Admin).await?;
    let (super_id, _) = staff_token(&pool, Role::SuperAdmin).await?;

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/admin/users/{super_id}/status"),
        Some(&admin),
        Some(json!({"status": "SUSPENDED"})),
    )
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "protected_target_forbidden");

    let unchanged: String = sqlx::query_scalar("SELECT status FROM users WHERE id = ?")
        .bind(super_id)
        .fetch_one(&pool)
        .await?;
    assert_eq!(unchanged, "ACTIVE");

    Ok(())
}

#[tokio::test]
async fn protected_routes_demand_a_valid_session() -> Result<()> {
    let (app, _pool, _dir) = setup().await?;

    let (status, _) = send(&app, "GET", "/auth/me", None, None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, "GET", "/auth/me", Some("not-a-jwt"), None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    Ok(())
}

#[tokio::test]
async fn login_records_last_login() -> Result<()> {
    let (app, pool, _dir) = setup().await?;

    send(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(json!({"name": "Ioana", "email": "ioana@example.com", "password": "password123"})),
    )
    .await?;

    let before: Option<String> =
        sqlx::query_scalar("SELECT last_login FROM users WHERE email = 'ioana@example.com'")
            .fetch_one(&pool)
            .await?;
    assert!(before.is_none());

    let (status, body) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({"email": "ioana@example.com", "password": "password123"})),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert!(!str_field(&body["user"], "lastLogin").is_empty());

    Ok(())
}

#[tokio::test]
async fn duplicate_registration_conflicts() -> Result<()> {
    let (app, _pool, _dir) = setup().await?;

    let payload = json!({"name": "Ana", "email": "ana@example.com", "password": "password123"});
    let (status, _) = send(&app, "POST", "/auth/register", None, Some(payload.clone())).await?;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(&app, "POST", "/auth/register", None, Some(payload)).await?;
    assert_eq!(status, StatusCode::CONFLICT);

    Ok(())
}

#[tokio::test]
async fn session_cookie_is_accepted_as_fallback() -> Result<()> {
    use axum::body::Body;
    use axum::http::Request;
    use tower::util::ServiceExt;

    let (app, pool, _dir) = setup().await?;
    let (_id, token) = staff_token(&pool, Role::Admin).await?;

    let request = Request::builder()
        .method("GET")
        .uri("/admin/team")
        .header("cookie", format!("other=1; vs_session={token}"))
        .body(Body::empty())?;
    let response = app.clone().oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::OK);

    Ok(())
}
