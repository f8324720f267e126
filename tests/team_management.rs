mod common;

use anyhow::Result;
use axum::http::StatusCode;
use common::*;
use serde_json::json;

use vasilestie_api::authz::Role;

#[tokio::test]
async fn create_update_delete_team_member() -> Result<()> {
    let (app, pool, _dir) = setup().await?;
    let (_admin_id, admin) = staff_token(&pool, Role::Admin).await?;

    let (status, member) = send(
        &app,
        "POST",
        "/admin/team",
        Some(&admin),
        Some(json!({
            "name": "Colaborator Nou",
            "email": "colab@vasilestie.ro",
            "password": "password123",
            "role": "collaborator"
        })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED, "{member}");
    assert_eq!(member["role"], "collaborator");
    let member_id = str_field(&member, "id").to_string();

    // Duplicate email is a conflict, not a second row.
    let (status, _) = send(
        &app,
        "POST",
        "/admin/team",
        Some(&admin),
        Some(json!({
            "name": "Alt Cont",
            "email": "colab@vasilestie.ro",
            "password": "password123",
            "role": "support"
        })),
    )
    .await?;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, updated) = send(
        &app,
        "PUT",
        &format!("/admin/team/{member_id}"),
        Some(&admin),
        Some(json!({"role": "moderator", "status": "INACTIVE"})),
    )
    .await?;
    assert_eq!(status, StatusCode::OK, "{updated}");
    assert_eq!(updated["role"], "moderator");
    assert_eq!(updated["status"], "INACTIVE");

    let (status, body) = send(&app, "DELETE", &format!("/admin/team/{member_id}"), Some(&admin), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let remaining: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM users WHERE email = 'colab@vasilestie.ro'")
        .fetch_one(&pool)
        .await?;
    assert_eq!(remaining, 0);

    for action in ["TEAM_MEMBER_CREATED", "TEAM_MEMBER_UPDATED", "TEAM_MEMBER_DELETED"] {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM activity_log WHERE action = ?")
            .bind(action)
            .fetch_one(&pool)
            .await?;
        assert_eq!(count, 1, "expected one {action} entry");
    }

    Ok(())
}

#[tokio::test]
async fn self_deletion_is_rejected_with_no_side_effect() -> Result<()> {
    let (app, pool, _dir) = setup().await?;
    let (admin_id, admin) = staff_token(&pool, Role::Admin).await?;

    let (status, body) = send(&app, "DELETE", &format!("/admin/team/{admin_id}"), Some(&admin), None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "self_modification_forbidden");

    let still_there: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM users WHERE id = ?")
        .bind(admin_id)
        .fetch_one(&pool)
        .await?;
    assert_eq!(still_there, 1);

    let audited: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM activity_log").fetch_one(&pool).await?;
    assert_eq!(audited, 0);

    // Self-update is barred the same way.
    let (status, _) = send(
        &app,
        "PUT",
        &format!("/admin/team/{admin_id}"),
        Some(&admin),
        Some(json!({"status": "INACTIVE"})),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn higher_tier_accounts_are_protected() -> Result<()> {
    let (app, pool, _dir) = setup().await?;
    let (_admin_id, admin) = staff_token(&pool, Role::Admin).await?;
    let (super_id, _) = staff_token(&pool, Role::SuperAdmin).await?;

    let (status, body) = send(&app, "DELETE", &format!("/admin/team/{super_id}"), Some(&admin), None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "protected_target_forbidden");

    // An admin also cannot mint an account above its own tier.
    let (status, _) = send(
        &app,
        "POST",
        "/admin/team",
        Some(&admin),
        Some(json!({
            "name": "Root",
            "email": "root@vasilestie.ro",
            "password": "password123",
            "role": "super_admin"
        })),
    )
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    Ok(())
}

#[tokio::test]
async fn restricted_tier_cannot_manage_the_team() -> Result<()> {
    let (app, pool, _dir) = setup().await?;
    let (_collab_id, collab) = staff_token(&pool, Role::Collaborator).await?;
    let (target_id, _) = staff_token(&pool, Role::Support).await?;

    // Collaborators may view the roster but not edit it.
    let (status, _) = send(&app, "GET", "/admin/team", Some(&collab), None).await?;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, "DELETE", &format!("/admin/team/{target_id}"), Some(&collab), None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        "POST",
        "/admin/team",
        Some(&collab),
        Some(json!({
            "name": "X",
            "email": "x@vasilestie.ro",
            "password": "password123",
            "role": "support"
        })),
    )
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    Ok(())
}

#[tokio::test]
async fn non_staff_roles_are_not_team_members() -> Result<()> {
    let (app, pool, _dir) = setup().await?;
    let (_admin_id, admin) = staff_token(&pool, Role::Admin).await?;

    // A marketplace account is invisible to the team endpoints.
    let (_customer_craftsman, _) = register_craftsman(&app, &pool, "c@example.com", "Mester C").await?;
    let user_id: uuid::Uuid = sqlx::query_scalar("SELECT id FROM users WHERE email = 'c@example.com'")
        .fetch_one(&pool)
        .await?;

    let (status, _) = send(&app, "DELETE", &format!("/admin/team/{user_id}"), Some(&admin), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // And the team endpoints refuse to create one.
    let (status, _) = send(
        &app,
        "POST",
        "/admin/team",
        Some(&admin),
        Some(json!({
            "name": "Client",
            "email": "client@vasilestie.ro",
            "password": "password123",
            "role": "customer"
        })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    Ok(())
}
