mod common;

use anyhow::Result;
use axum::http::StatusCode;
use common::*;
use serde_json::json;

use vasilestie_api::authz::Role;

#[tokio::test]
async fn privileged_mutations_leave_a_chained_trail() -> Result<()> {
    let (app, pool, _dir) = setup().await?;
    let (_admin_id, admin) = staff_token(&pool, Role::Admin).await?;
    let (craftsman_id, _) = register_craftsman(&app, &pool, "mester@example.com", "Faianță Gheorghe").await?;

    // Three privileged mutations -> three entries, in order.
    send(&app, "PATCH", &format!("/admin/craftsmen/{craftsman_id}/approve"), Some(&admin), None).await?;
    send(&app, "PATCH", &format!("/admin/craftsmen/{craftsman_id}/reject"), Some(&admin), None).await?;
    send(
        &app,
        "POST",
        "/admin/content/articles",
        Some(&admin),
        Some(json!({"title": "Articol", "content": "text"})),
    )
    .await?;

    let rows: Vec<(String, Option<String>, String)> =
        sqlx::query_as("SELECT action, prev_hash, hash FROM activity_log ORDER BY rowid ASC")
            .fetch_all(&pool)
            .await?;

    let actions: Vec<&str> = rows.iter().map(|r| r.0.as_str()).collect();
    assert_eq!(actions, ["CRAFTSMAN_APPROVED", "CRAFTSMAN_REJECTED", "ARTICLE_CREATED"]);

    // The chain: genesis has no predecessor, every later entry links back.
    assert!(rows[0].1.is_none());
    assert_eq!(rows[1].1.as_deref(), Some(rows[0].2.as_str()));
    assert_eq!(rows[2].1.as_deref(), Some(rows[1].2.as_str()));

    Ok(())
}

#[tokio::test]
async fn log_listing_is_paginated_and_newest_first() -> Result<()> {
    let (app, pool, _dir) = setup().await?;
    let (_admin_id, admin) = staff_token(&pool, Role::Admin).await?;

    for i in 1..=7 {
        send(
            &app,
            "POST",
            "/admin/content/articles",
            Some(&admin),
            Some(json!({"title": format!("Articol {i}"), "content": "text"})),
        )
        .await?;
    }

    let (status, body) = send(&app, "GET", "/admin/logs?page=1&limit=5", Some(&admin), None).await?;
    assert_eq!(status, StatusCode::OK);
    let entries = body["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 5);
    assert_eq!(body["pagination"]["total"], 7);
    assert_eq!(body["pagination"]["totalPages"], 2);
    // Newest first: the last article created leads the page.
    assert!(str_field(&entries[0], "details").contains("Articol 7"));

    let (_, body) = send(&app, "GET", "/admin/logs?page=2&limit=5", Some(&admin), None).await?;
    assert_eq!(body["entries"].as_array().unwrap().len(), 2);

    Ok(())
}

#[tokio::test]
async fn viewing_logs_requires_the_capability() -> Result<()> {
    let (app, pool, _dir) = setup().await?;
    let (_collab_id, collab) = staff_token(&pool, Role::Collaborator).await?;
    let (_support_id, support) = staff_token(&pool, Role::Support).await?;

    let (status, _) = send(&app, "GET", "/admin/logs", Some(&collab), None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, "GET", "/admin/logs", Some(&support), None).await?;
    assert_eq!(status, StatusCode::OK);

    Ok(())
}
