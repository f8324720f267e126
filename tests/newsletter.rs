mod common;

use anyhow::Result;
use axum::http::StatusCode;
use common::*;
use serde_json::json;

#[tokio::test]
async fn unsubscribe_token_is_single_use() -> Result<()> {
    let (app, pool, _dir) = setup().await?;

    let (status, body) = send(
        &app,
        "POST",
        "/newsletter/subscribe",
        None,
        Some(json!({"email": "ana@example.com"})),
    )
    .await?;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["success"], true);

    let token: String =
        sqlx::query_scalar("SELECT unsubscribe_token FROM newsletter WHERE email = 'ana@example.com'")
            .fetch_one(&pool)
            .await?;

    let uri = format!("/newsletter/unsubscribe?token={token}");
    let (status, body) = send(&app, "POST", &uri, None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let subscribed: bool =
        sqlx::query_scalar("SELECT subscribed FROM newsletter WHERE email = 'ana@example.com'")
            .fetch_one(&pool)
            .await?;
    assert!(!subscribed);

    // Replaying the same token fails and changes nothing.
    let (status, body) = send(&app, "POST", &uri, None, None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Token invalid sau deja folosit");

    let subscribed: bool =
        sqlx::query_scalar("SELECT subscribed FROM newsletter WHERE email = 'ana@example.com'")
            .fetch_one(&pool)
            .await?;
    assert!(!subscribed);

    Ok(())
}

#[tokio::test]
async fn unknown_token_is_indistinguishable_from_a_used_one() -> Result<()> {
    let (app, _pool, _dir) = setup().await?;

    let (status, body) = send(&app, "POST", "/newsletter/unsubscribe?token=abc", None, None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Token invalid sau deja folosit");

    Ok(())
}

#[tokio::test]
async fn missing_token_is_a_bad_request() -> Result<()> {
    let (app, _pool, _dir) = setup().await?;

    let (status, body) = send(&app, "POST", "/newsletter/unsubscribe", None, None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    Ok(())
}

#[tokio::test]
async fn resubscribing_reactivates_with_a_fresh_token() -> Result<()> {
    let (app, pool, _dir) = setup().await?;

    send(&app, "POST", "/newsletter/subscribe", None, Some(json!({"email": "dan@example.com"}))).await?;
    let first: String =
        sqlx::query_scalar("SELECT unsubscribe_token FROM newsletter WHERE email = 'dan@example.com'")
            .fetch_one(&pool)
            .await?;

    let (status, _) = send(&app, "POST", &format!("/newsletter/unsubscribe?token={first}"), None, None).await?;
    assert_eq!(status, StatusCode::OK);

    // The row is kept, not deleted, and re-subscription issues a new token.
    send(&app, "POST", "/newsletter/subscribe", None, Some(json!({"email": "dan@example.com"}))).await?;
    let (count, second, subscribed): (i64, String, bool) = sqlx::query_as(
        "SELECT COUNT(1), unsubscribe_token, subscribed FROM newsletter WHERE email = 'dan@example.com'",
    )
    .fetch_one(&pool)
    .await?;
    assert_eq!(count, 1);
    assert!(subscribed);
    assert_ne!(first, second);

    // The burned token stays burned.
    let (status, _) = send(&app, "POST", &format!("/newsletter/unsubscribe?token={first}"), None, None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn invalid_email_is_rejected() -> Result<()> {
    let (app, _pool, _dir) = setup().await?;

    let (status, _) = send(
        &app,
        "POST",
        "/newsletter/subscribe",
        None,
        Some(json!({"email": "not-an-email"})),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    Ok(())
}
