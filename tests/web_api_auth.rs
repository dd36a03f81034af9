//! Web API Authentication Tests
//!
//! Integration tests for sign-up, login and the profile endpoints.

mod common;

use axum::http::{header::AUTHORIZATION, StatusCode};
use serde_json::{json, Value};

use common::{bearer, TestApp, PASSWORD};

async fn register(app: &TestApp, username: &str) -> axum_test::TestResponse {
    app.server
        .post("/api/auth/register")
        .json(&json!({
            "username": username,
            "password": PASSWORD,
            "display_name": "Test User",
        }))
        .await
}

// ============================================================================
// Registration
// ============================================================================

#[tokio::test]
async fn test_register_success() {
    let app = TestApp::new().await;

    let response = register(&app, "testuser").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert!(body["data"]["access_token"].is_string());
    assert_eq!(body["data"]["expires_in"], 3600);
    assert_eq!(body["data"]["user"]["username"], "testuser");
    assert_eq!(body["data"]["user"]["display_name"], "Test User");
    assert_eq!(body["data"]["user"]["role"], "user");
    assert_eq!(body["data"]["user"]["theme"], "dark");
}

#[tokio::test]
async fn test_register_duplicate_username() {
    let app = TestApp::new().await;
    register(&app, "testuser").await.assert_status_ok();

    let response = register(&app, "TestUser").await;
    response.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_register_reserved_username() {
    let app = TestApp::new().await;

    let response = register(&app, "founder").await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_register_short_password() {
    let app = TestApp::new().await;

    let response = app
        .server
        .post("/api/auth/register")
        .json(&json!({
            "username": "testuser",
            "password": "short",
            "display_name": "Test User",
        }))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_register_missing_fields() {
    let app = TestApp::new().await;

    let response = app
        .server
        .post("/api/auth/register")
        .json(&json!({
            "username": "",
            "password": "",
            "display_name": "   ",
        }))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert!(body["error"]["details"]["username"].is_array());
    assert!(body["error"]["details"]["display_name"].is_array());
}

// ============================================================================
// Login
// ============================================================================

#[tokio::test]
async fn test_login_success() {
    let app = TestApp::new().await;
    app.user("alice").await;

    let response = app
        .server
        .post("/api/auth/login")
        .json(&json!({ "username": "alice", "password": PASSWORD }))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert!(body["data"]["access_token"].is_string());
    assert_eq!(body["data"]["user"]["username"], "alice");
}

#[tokio::test]
async fn test_login_wrong_password() {
    let app = TestApp::new().await;
    app.user("alice").await;

    let response = app
        .server
        .post("/api/auth/login")
        .json(&json!({ "username": "alice", "password": "wrong-password" }))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    assert_eq!(body["error"]["message"], "Invalid username or password");
}

#[tokio::test]
async fn test_login_unknown_user() {
    let app = TestApp::new().await;

    let response = app
        .server
        .post("/api/auth/login")
        .json(&json!({ "username": "nobody", "password": PASSWORD }))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_rate_limited() {
    let app = TestApp::with_config(|config| config.web.login_rate_limit = 2).await;

    for _ in 0..2 {
        app.server
            .post("/api/auth/login")
            .json(&json!({ "username": "nobody", "password": PASSWORD }))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    let response = app
        .server
        .post("/api/auth/login")
        .json(&json!({ "username": "nobody", "password": PASSWORD }))
        .await;
    response.assert_status(StatusCode::TOO_MANY_REQUESTS);
}

// ============================================================================
// Profile
// ============================================================================

#[tokio::test]
async fn test_me_requires_token() {
    let app = TestApp::new().await;

    let response = app.server.get("/api/auth/me").await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_me_rejects_bad_token() {
    let app = TestApp::new().await;

    let response = app
        .server
        .get("/api/auth/me")
        .add_header(AUTHORIZATION, bearer("not-a-jwt"))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_me_includes_plan() {
    let app = TestApp::new().await;
    let (_, token) = app.user("alice").await;

    let response = app
        .server
        .get("/api/auth/me")
        .add_header(AUTHORIZATION, bearer(&token))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["data"]["username"], "alice");
    assert_eq!(body["data"]["role"], "user");
    assert_eq!(body["data"]["plan"]["plan_type"], "free");
    assert_eq!(body["data"]["plan"]["storage_used"], 0);
}

#[tokio::test]
async fn test_update_theme() {
    let app = TestApp::new().await;
    let (_, token) = app.user("alice").await;

    let response = app
        .server
        .put("/api/me/theme")
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&json!({ "theme": "light" }))
        .await;
    response.assert_status_ok();

    let me: Value = app
        .server
        .get("/api/auth/me")
        .add_header(AUTHORIZATION, bearer(&token))
        .await
        .json();
    assert_eq!(me["data"]["theme"], "light");
}

#[tokio::test]
async fn test_update_theme_invalid() {
    let app = TestApp::new().await;
    let (_, token) = app.user("alice").await;

    let response = app
        .server
        .put("/api/me/theme")
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&json!({ "theme": "neon" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new().await;

    let response = app.server.get("/health").await;
    response.assert_status_ok();
    response.assert_text("OK");
}
