//! Web API Plan Tests
//!
//! Storage plans, activation key minting and redemption.

mod common;

use axum::http::{header::AUTHORIZATION, StatusCode};
use serde_json::{json, Value};

use common::{bearer, TestApp};
use pinpin::Role;

async fn mint(app: &TestApp, founder: &str, count: usize) -> Vec<String> {
    let response = app
        .server
        .post("/api/admin/keys")
        .add_header(AUTHORIZATION, bearer(founder))
        .json(&json!({ "count": count }))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    body["data"]["keys"]
        .as_array()
        .expect("keys array")
        .iter()
        .map(|k| k.as_str().expect("key string").to_string())
        .collect()
}

async fn redeem(app: &TestApp, token: &str, key: &str) -> axum_test::TestResponse {
    app.server
        .post("/api/plan/redeem")
        .add_header(AUTHORIZATION, bearer(token))
        .json(&json!({ "key": key }))
        .await
}

#[tokio::test]
async fn test_get_plan_free_by_default() {
    let app = TestApp::new().await;
    let (_, token) = app.user("alice").await;

    let response = app
        .server
        .get("/api/plan")
        .add_header(AUTHORIZATION, bearer(&token))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["data"]["plan_type"], "free");
    assert_eq!(body["data"]["storage_limit"], app.state.free_storage_limit);
    assert_eq!(body["data"]["storage_used"], 0);
    assert_eq!(body["data"]["usage_display"], "0 B of 100.0 MB");
    assert!(body["data"].get("validated_at").is_none());
}

#[tokio::test]
async fn test_get_plan_requires_login() {
    let app = TestApp::new().await;

    app.server
        .get("/api/plan")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_mint_keys_founder_only() {
    let app = TestApp::new().await;
    let (_, admin) = app.user_with_role("staffer", Role::Admin).await;

    app.server
        .post("/api/admin/keys")
        .add_header(AUTHORIZATION, bearer(&admin))
        .json(&json!({ "count": 1 }))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    app.server
        .get("/api/admin/keys")
        .add_header(AUTHORIZATION, bearer(&admin))
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_mint_keys_count_bounds() {
    let app = TestApp::new().await;
    let (_, founder) = app.user_with_role("owner", Role::Founder).await;

    for count in [0, 101] {
        app.server
            .post("/api/admin/keys")
            .add_header(AUTHORIZATION, bearer(&founder))
            .json(&json!({ "count": count }))
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }
}

#[tokio::test]
async fn test_mint_and_list_keys() {
    let app = TestApp::new().await;
    let (_, founder) = app.user_with_role("owner", Role::Founder).await;

    let keys = mint(&app, &founder, 3).await;
    assert_eq!(keys.len(), 3);
    for key in &keys {
        assert!(key.starts_with("PINPIN-"));
        assert_eq!(key.len(), "PINPIN-XXXX-XXXX-XXXX".len());
    }

    let body: Value = app
        .server
        .get("/api/admin/keys")
        .add_header(AUTHORIZATION, bearer(&founder))
        .add_query_param("used", false)
        .await
        .json();
    assert_eq!(body["data"].as_array().map(Vec::len), Some(3));
}

#[tokio::test]
async fn test_redeem_upgrades_plan() {
    let app = TestApp::new().await;
    let (_, founder) = app.user_with_role("owner", Role::Founder).await;
    let (_, token) = app.user("alice").await;
    let key = mint(&app, &founder, 1).await.remove(0);

    // Surrounding whitespace is ignored.
    let response = redeem(&app, &token, &format!("  {key}\n")).await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["data"]["plan_type"], "premium");
    assert_eq!(body["data"]["storage_limit"], app.state.premium_storage_limit);
    assert!(body["data"]["validated_at"].is_string());

    let used: Value = app
        .server
        .get("/api/admin/keys")
        .add_header(AUTHORIZATION, bearer(&founder))
        .add_query_param("used", true)
        .await
        .json();
    assert_eq!(used["data"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn test_redeem_key_only_once() {
    let app = TestApp::new().await;
    let (_, founder) = app.user_with_role("owner", Role::Founder).await;
    let (_, alice) = app.user("alice").await;
    let (_, bob) = app.user("bobby").await;
    let key = mint(&app, &founder, 1).await.remove(0);

    redeem(&app, &alice, &key).await.assert_status_ok();

    let response = redeem(&app, &bob, &key).await;
    response.assert_status(StatusCode::CONFLICT);

    let plan: Value = app
        .server
        .get("/api/plan")
        .add_header(AUTHORIZATION, bearer(&bob))
        .await
        .json();
    assert_eq!(plan["data"]["plan_type"], "free");
}

#[tokio::test]
async fn test_redeem_rejections() {
    let app = TestApp::new().await;
    let (_, token) = app.user("alice").await;

    redeem(&app, &token, "   ")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    redeem(&app, &token, "pinpin-abcd-efgh-ijkl")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    redeem(&app, &token, "PINPIN-AAAA-BBBB-CCCC")
        .await
        .assert_status(StatusCode::NOT_FOUND);

    // A missing key field counts as empty.
    app.server
        .post("/api/plan/redeem")
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&json!({}))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_redeem_rate_limited() {
    let app = TestApp::with_config(|config| config.web.redeem_rate_limit = 1).await;
    let (_, token) = app.user("alice").await;

    redeem(&app, &token, "PINPIN-AAAA-BBBB-CCCC")
        .await
        .assert_status(StatusCode::NOT_FOUND);
    redeem(&app, &token, "PINPIN-AAAA-BBBB-CCCC")
        .await
        .assert_status(StatusCode::TOO_MANY_REQUESTS);
}
