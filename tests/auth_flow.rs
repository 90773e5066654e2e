mod common;

use anyhow::Result;
use axum::http::StatusCode;
use common::{acquire_db_lock, body_to_json, body_to_vec, TestApp};
use serde::Deserialize;
use serde_json::json;

#[derive(Deserialize)]
struct AuthenticatedUser {
    username: String,
    is_admin: bool,
}

#[tokio::test]
async fn register_login_me_roundtrip() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    let response = app
        .post_json(
            "/api/auth/register",
            &json!({ "username": "alice", "password": "s3cret-pass" }),
            None,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);

    let token = app.login_token("alice", "s3cret-pass").await?;

    let response = app.get("/api/auth/me", Some(&token)).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_to_vec(response.into_body()).await?;
    let user: AuthenticatedUser = serde_json::from_slice(&body)?;

    assert_eq!(user.username, "alice");
    assert!(!user.is_admin);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn register_rejects_duplicate_username() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    let payload = json!({ "username": "alice", "password": "s3cret-pass" });
    let response = app.post_json("/api/auth/register", &payload, None).await?;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app.post_json("/api/auth/register", &payload, None).await?;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn register_rejects_short_password() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    let response = app
        .post_json(
            "/api/auth/register",
            &json!({ "username": "alice", "password": "short" }),
            None,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn register_forbidden_when_disabled() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::with_config(|config| {
        config.registration_enabled = false;
    })
    .await?;

    let response = app
        .post_json(
            "/api/auth/register",
            &json!({ "username": "alice", "password": "s3cret-pass" }),
            None,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn invite_code_redeems_exactly_once() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    app.insert_invite_code("WELCOME-2026", "beta testers").await?;

    let response = app
        .post_json(
            "/api/auth/register/invite",
            &json!({
                "username": "bob",
                "password": "s3cret-pass",
                "invite_code": "WELCOME-2026"
            }),
            None,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);

    // Same code again, different user.
    let response = app
        .post_json(
            "/api/auth/register/invite",
            &json!({
                "username": "carol",
                "password": "s3cret-pass",
                "invite_code": "WELCOME-2026"
            }),
            None,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // The losing registration must not have created an account.
    let response = app
        .post_json(
            "/api/auth/login",
            &json!({ "username": "carol", "password": "s3cret-pass" }),
            None,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn invite_registration_with_unknown_code_not_found() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    let response = app
        .post_json(
            "/api/auth/register/invite",
            &json!({
                "username": "bob",
                "password": "s3cret-pass",
                "invite_code": "NO-SUCH-CODE"
            }),
            None,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn login_failures_do_not_reveal_account_existence() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    app.insert_user("alice", "s3cret-pass", false).await?;

    let response = app
        .post_json(
            "/api/auth/login",
            &json!({ "username": "alice", "password": "wrong-pass" }),
            None,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // An unknown username answers exactly like a wrong password.
    let response = app
        .post_json(
            "/api/auth/login",
            &json!({ "username": "nobody", "password": "s3cret-pass" }),
            None,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn deactivated_account_cannot_login() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    let user_id = app.insert_user("alice", "s3cret-pass", false).await?;
    app.set_user_active(user_id, false).await?;

    let response = app
        .post_json(
            "/api/auth/login",
            &json!({ "username": "alice", "password": "s3cret-pass" }),
            None,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_to_json(response.into_body()).await?;
    assert_eq!(body["error"], "account is deactivated");

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn protected_routes_require_token() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    let response = app.get("/api/summaries", None).await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app.get("/api/summaries", Some("not-a-token")).await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    app.cleanup().await?;
    Ok(())
}
