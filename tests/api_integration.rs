mod common;

use anyhow::Result;
use axum::http::StatusCode;
use common::*;
use serde_json::json;

use vasilestie_api::authz::Role;

#[tokio::test]
async fn full_marketplace_flow() -> Result<()> {
    let (app, pool, _dir) = setup().await?;
    let (_admin_id, admin) = staff_token(&pool, Role::Admin).await?;

    // -- craftsman onboarding through the public API
    let (status, body) = send(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(json!({
            "name": "Vasile Marin",
            "email": "vasile@example.com",
            "password": "password123",
            "craftsman": {
                "businessName": "Construcții Marin",
                "description": "Zidărie și finisaje",
                "county": "Cluj",
                "city": "Cluj-Napoca",
                "category": "constructii",
                "experienceYears": 12
            }
        })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["user"]["role"], "craftsman");
    let craftsman_token = str_field(&body, "token").to_string();

    // -- the profile is not publicly listed until approved
    let (_, directory) = send(&app, "GET", "/craftsmen", None, None).await?;
    assert!(directory["craftsmen"].as_array().unwrap().is_empty());

    // -- back office sees it pending
    let (status, rows) = send(&app, "GET", "/admin/craftsmen", Some(&admin), None).await?;
    assert_eq!(status, StatusCode::OK);
    let rows = rows.as_array().unwrap().clone();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["craftsman"]["verified"], false);
    assert_eq!(rows[0]["craftsman"]["subscriptionStatus"], "INACTIVE");
    assert_eq!(rows[0]["user"]["email"], "vasile@example.com");
    let craftsman_id = str_field(&rows[0]["craftsman"], "id").to_string();

    // -- approve: verification plus a 30-day subscription window
    let (status, body) = send(
        &app,
        "PATCH",
        &format!("/admin/craftsmen/{craftsman_id}/approve"),
        Some(&admin),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["success"], true);
    assert_eq!(body["craftsman"]["verified"], true);
    assert_eq!(body["craftsman"]["subscriptionStatus"], "ACTIVE");

    // -- now the public directory lists the profile
    let (_, directory) = send(&app, "GET", "/craftsmen?category=constructii", None, None).await?;
    let listed = directory["craftsmen"].as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["businessName"], "Construcții Marin");
    assert_eq!(listed[0]["name"], "Vasile Marin");

    let (status, profile) = send(&app, "GET", &format!("/craftsmen/{craftsman_id}"), None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["verified"], true);

    // -- the craftsman can inspect its own session
    let (status, me) = send(&app, "GET", "/auth/me", Some(&craftsman_token), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], "vasile@example.com");

    // -- content: category + published article flow
    let (_, category) = send(
        &app,
        "POST",
        "/admin/content/categories",
        Some(&admin),
        Some(json!({"name": "Sfaturi"})),
    )
    .await?;
    let (status, article) = send(
        &app,
        "POST",
        "/admin/content/articles",
        Some(&admin),
        Some(json!({
            "title": "Cum verifici un meșter",
            "content": "Checklist complet.",
            "categoryId": str_field(&category, "id"),
            "published": true,
            "tags": ["ghid"]
        })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(article["published"], true);

    let (_, posts) = send(&app, "GET", "/blog/posts?category=sfaturi", None, None).await?;
    assert_eq!(posts["posts"].as_array().unwrap().len(), 1);

    // -- newsletter round trip
    let (status, _) = send(
        &app,
        "POST",
        "/newsletter/subscribe",
        None,
        Some(json!({"email": "cititor@example.com"})),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);

    // -- dashboard reflects all of it
    let (status, dashboard) = send(&app, "GET", "/admin/dashboard", Some(&admin), None).await?;
    assert_eq!(status, StatusCode::OK, "{dashboard}");
    assert_eq!(dashboard["totalCraftsmen"], 1);
    assert_eq!(dashboard["verifiedCraftsmen"], 1);
    assert_eq!(dashboard["activeSubscriptions"], 1);
    assert_eq!(dashboard["publishedPosts"], 1);
    assert_eq!(dashboard["newsletterSubscribers"], 1);

    // -- audit trail covers the privileged mutations
    let (_, logs) = send(&app, "GET", "/admin/logs?limit=50", Some(&admin), None).await?;
    let actions: Vec<String> = logs["entries"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| str_field(e, "action").to_string())
        .collect();
    assert!(actions.contains(&"CRAFTSMAN_APPROVED".to_string()));
    assert!(actions.contains(&"CATEGORY_CREATED".to_string()));
    assert!(actions.contains(&"ARTICLE_CREATED".to_string()));

    Ok(())
}
