//! API integration tests against a running server
//!
//! Start the service (for example with `LOANS_DATABASE__IN_MEMORY=true`) and
//! working user/book services, then run: cargo test -- --ignored

use library_loans::models::UserClaims;
use reqwest::Client;
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8083/api/v1";

/// Bearer token signed with the server's secret
fn token(role: &str, user_id: i64) -> String {
    let secret = std::env::var("JWT_SECRET")
        .unwrap_or_else(|_| "change-this-secret-in-production".to_string());
    let now = chrono::Utc::now().timestamp();

    UserClaims {
        sub: format!("user{}@library.test", user_id),
        role: role.to_string(),
        user_id: Some(user_id),
        exp: now + 3600,
        iat: now,
    }
    .create_token(&secret)
    .expect("Failed to sign token")
}

async fn create_loan(client: &Client, token: &str, user_id: i64, book_id: i64) -> Value {
    let response = client
        .post(format!("{}/loans", BASE_URL))
        .bearer_auth(token)
        .json(&json!({ "user_id": user_id, "book_id": book_id }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 201);
    response.json().await.expect("Failed to parse response")
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_missing_token_rejected() {
    let client = Client::new();

    let response = client
        .get(format!("{}/loans/rules", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_business_rules() {
    let client = Client::new();

    let response = client
        .get(format!("{}/loans/rules", BASE_URL))
        .bearer_auth(token("USUARIO", 1))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["rules"].as_array().is_some_and(|rules| !rules.is_empty()));
}

#[tokio::test]
#[ignore]
async fn test_loan_lifecycle() {
    let client = Client::new();
    let reader = token("USUARIO", 1);

    let loan = create_loan(&client, &reader, 1, 1).await;
    assert_eq!(loan["status"], "ACTIVE");
    let id = loan["id"].as_i64().expect("No loan id");

    let response = client
        .post(format!("{}/loans/{}/extend", BASE_URL, id))
        .bearer_auth(&reader)
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let extended: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(extended["extensions_count"], 1);

    let response = client
        .post(format!("{}/loans/{}/return", BASE_URL, id))
        .bearer_auth(&reader)
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let returned: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(returned["status"], "RETURNED");

    let response = client
        .get(format!("{}/loans/{}/history", BASE_URL, id))
        .bearer_auth(&reader)
        .send()
        .await
        .expect("Failed to send request");
    let history: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(history.as_array().map(Vec::len), Some(3));
}

#[tokio::test]
#[ignore]
async fn test_cancel_then_return_conflicts() {
    let client = Client::new();
    let reader = token("USUARIO", 2);

    let loan = create_loan(&client, &reader, 2, 2).await;
    let id = loan["id"].as_i64().expect("No loan id");

    let response = client
        .post(format!("{}/loans/{}/cancel", BASE_URL, id))
        .bearer_auth(&reader)
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let response = client
        .post(format!("{}/loans/{}/return", BASE_URL, id))
        .bearer_auth(&reader)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);
}

#[tokio::test]
#[ignore]
async fn test_validate_reports_rules() {
    let client = Client::new();

    let response = client
        .post(format!("{}/loans/validate", BASE_URL))
        .bearer_auth(token("USUARIO", 3))
        .json(&json!({ "user_id": 3, "book_id": 3, "loan_days": 45 }))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["valid"], false);
    assert_eq!(body["valid_loan_days"], false);
}

#[tokio::test]
#[ignore]
async fn test_other_users_loans_forbidden() {
    let client = Client::new();

    let response = client
        .get(format!("{}/users/2/loans", BASE_URL))
        .bearer_auth(token("USUARIO", 1))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 403);
}
