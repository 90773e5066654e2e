mod common;

use anyhow::Result;
use axum::http::StatusCode;
use common::{acquire_db_lock, body_to_json, TestApp};
use serde_json::json;

#[tokio::test]
async fn summary_crud_roundtrip() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    app.insert_user("alice", "s3cret-pass", false).await?;
    let token = app.login_token("alice", "s3cret-pass").await?;

    let response = app
        .post_json(
            "/api/summaries",
            &json!({ "entry_title": "Primary", "content": "Seasoned engineer." }),
            Some(&token),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_to_json(response.into_body()).await?;
    let id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["entry_title"], "Primary");

    let response = app.get("/api/summaries", Some(&token)).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let listed = body_to_json(response.into_body()).await?;
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let response = app
        .patch_json(
            &format!("/api/summaries/{id}"),
            &json!({ "entry_title": "Primary", "content": "Updated content." }),
            Some(&token),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_to_json(response.into_body()).await?;
    assert_eq!(updated["content"], "Updated content.");

    let response = app
        .delete(&format!("/api/summaries/{id}"), Some(&token))
        .await?;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .get(&format!("/api/summaries/{id}"), Some(&token))
        .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn entry_titles_are_unique_per_owner_only() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    app.insert_user("alice", "s3cret-pass", false).await?;
    app.insert_user("bob", "s3cret-pass", false).await?;
    let alice = app.login_token("alice", "s3cret-pass").await?;
    let bob = app.login_token("bob", "s3cret-pass").await?;

    let payload = json!({ "entry_title": "Primary", "content": "text" });

    let response = app.post_json("/api/summaries", &payload, Some(&alice)).await?;
    assert_eq!(response.status(), StatusCode::CREATED);

    // Same title, same owner: conflict.
    let response = app.post_json("/api/summaries", &payload, Some(&alice)).await?;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Same title, different owner: fine.
    let response = app.post_json("/api/summaries", &payload, Some(&bob)).await?;
    assert_eq!(response.status(), StatusCode::CREATED);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn cross_user_access_is_not_found() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    app.insert_user("alice", "s3cret-pass", false).await?;
    app.insert_user("bob", "s3cret-pass", false).await?;
    let alice = app.login_token("alice", "s3cret-pass").await?;
    let bob = app.login_token("bob", "s3cret-pass").await?;

    let response = app
        .post_json(
            "/api/skills",
            &json!({
                "entry_title": "Core",
                "skill_group_title": "Backend",
                "description": "Rust, Postgres"
            }),
            Some(&alice),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_to_json(response.into_body()).await?;
    let id = created["id"].as_str().unwrap().to_string();

    // Bob cannot see, edit or delete Alice's entry; the responses do not
    // reveal that it exists.
    let response = app.get(&format!("/api/skills/{id}"), Some(&bob)).await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .patch_json(
            &format!("/api/skills/{id}"),
            &json!({
                "entry_title": "Core",
                "skill_group_title": "Hijacked",
                "description": "x"
            }),
            Some(&bob),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.delete(&format!("/api/skills/{id}"), Some(&bob)).await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Bob's listing stays empty.
    let response = app.get("/api/skills", Some(&bob)).await?;
    let listed = body_to_json(response.into_body()).await?;
    assert!(listed.as_array().unwrap().is_empty());

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn experience_description_is_rendered_and_sanitized_on_write() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    app.insert_user("alice", "s3cret-pass", false).await?;
    let token = app.login_token("alice", "s3cret-pass").await?;

    let response = app
        .post_json(
            "/api/experiences",
            &json!({
                "entry_title": "Acme",
                "job_title": "Engineer",
                "company_name": "Acme Corp",
                "date_started": "2020-01-15",
                "date_finished": "2023-06-30",
                "description": "Shipped **things**. See https://acme.example\n\n<script>alert(1)</script>"
            }),
            Some(&token),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_to_json(response.into_body()).await?;
    let description = created["description"].as_str().unwrap();

    assert!(description.contains("<strong>things</strong>"));
    assert!(description.contains("<a href=\"https://acme.example\""));
    assert!(!description.contains("<script>"));

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn experience_rejects_inverted_date_range() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    app.insert_user("alice", "s3cret-pass", false).await?;
    let token = app.login_token("alice", "s3cret-pass").await?;

    let response = app
        .post_json(
            "/api/experiences",
            &json!({
                "entry_title": "Acme",
                "job_title": "Engineer",
                "company_name": "Acme Corp",
                "date_started": "2023-01-01",
                "date_finished": "2020-01-01",
                "description": ""
            }),
            Some(&token),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn over_long_fields_are_rejected_before_the_database() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    app.insert_user("alice", "s3cret-pass", false).await?;
    let token = app.login_token("alice", "s3cret-pass").await?;

    // Entry titles are capped at 50 characters.
    let response = app
        .post_json(
            "/api/summaries",
            &json!({ "entry_title": "t".repeat(51), "content": "text" }),
            Some(&token),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Summary content is capped at 500.
    let response = app
        .post_json(
            "/api/summaries",
            &json!({ "entry_title": "Primary", "content": "c".repeat(501) }),
            Some(&token),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Boundary value still passes.
    let response = app
        .post_json(
            "/api/summaries",
            &json!({ "entry_title": "t".repeat(50), "content": "text" }),
            Some(&token),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn basic_info_validates_email_and_blank_fields() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    app.insert_user("alice", "s3cret-pass", false).await?;
    let token = app.login_token("alice", "s3cret-pass").await?;

    let response = app
        .post_json(
            "/api/basic_infos",
            &json!({
                "entry_title": "Main",
                "full_name": "Alice Smith",
                "job_title": "Engineer",
                "address": "1 Main St",
                "contact_email": "not-an-email",
                "contact_phone": "555-0100"
            }),
            Some(&token),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .post_json(
            "/api/basic_infos",
            &json!({
                "entry_title": "   ",
                "full_name": "Alice Smith",
                "job_title": "Engineer",
                "address": "1 Main St",
                "contact_email": "alice@example.com",
                "contact_phone": "555-0100"
            }),
            Some(&token),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .post_json(
            "/api/basic_infos",
            &json!({
                "entry_title": "Main",
                "full_name": "Alice Smith",
                "job_title": "Engineer",
                "address": "1 Main St",
                "contact_email": "alice@example.com",
                "contact_phone": "555-0100",
                "linkedin_url": "  "
            }),
            Some(&token),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_to_json(response.into_body()).await?;
    assert!(created["linkedin_url"].is_null());

    app.cleanup().await?;
    Ok(())
}
