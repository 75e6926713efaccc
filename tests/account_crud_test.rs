mod common;

use axum::http::StatusCode;

use common::{register_school, test_email, test_password, TestContext};
use school_auth::modules::school::interface::SchoolRepository;

#[tokio::test]
async fn get_returns_public_record_without_hash() {
    let ctx = TestContext::new().await;
    let email = test_email();
    register_school(&ctx, &email, test_password()).await;
    let school = ctx.schools.find_by_email(&email).await.unwrap().unwrap();

    let response = ctx.server.get(&format!("/{}", school.id)).await;

    response.assert_status(StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert_eq!(body["id"], school.id);
    assert_eq!(body["email"], email);
    assert_eq!(body["name"], "Test School");
    assert!(body.get("password_hash").is_none());
    assert!(body.get("recovery_token").is_none());
}

#[tokio::test]
async fn get_unknown_id_returns_not_found() {
    let ctx = TestContext::new().await;

    let response = ctx.server.get("/no-such-id").await;

    response.assert_status(StatusCode::NOT_FOUND);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn list_returns_all_accounts_without_hashes() {
    let ctx = TestContext::new().await;
    register_school(&ctx, &test_email(), test_password()).await;
    register_school(&ctx, &test_email(), test_password()).await;

    let response = ctx.server.get("/").await;

    response.assert_status(StatusCode::OK);
    let body: serde_json::Value = response.json();
    let schools = body.as_array().unwrap();
    assert_eq!(schools.len(), 2);
    for school in schools {
        assert!(school.get("password_hash").is_none());
    }
}

#[tokio::test]
async fn delete_removes_account_and_is_idempotent() {
    let ctx = TestContext::new().await;
    let email = test_email();
    register_school(&ctx, &email, test_password()).await;
    let school = ctx.schools.find_by_email(&email).await.unwrap().unwrap();

    ctx.server
        .delete(&format!("/{}", school.id))
        .await
        .assert_status(StatusCode::OK);

    ctx.server
        .get(&format!("/{}", school.id))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    // Deleting again is not an error.
    let response = ctx.server.delete(&format!("/{}", school.id)).await;
    response.assert_status(StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert!(body.get("message").is_some());
}

#[tokio::test]
async fn health_endpoint_reports_ok() {
    let ctx = TestContext::new().await;

    let response = ctx.server.get("/health").await;

    response.assert_status(StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn responses_carry_security_headers() {
    let ctx = TestContext::new().await;

    let response = ctx.server.get("/health").await;

    assert!(response.headers().get("x-content-type-options").is_some());
    assert!(response.headers().get("x-frame-options").is_some());
}
