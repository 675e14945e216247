use axum_test::TestServer;
use serde_json::{Value, json};

use edulearn_backend::api::{AppState, create_router};
use edulearn_backend::config::{AuthConfig, ModelConfig};
use edulearn_backend::model_client::{GenerativeProvider, ProviderKind};
use edulearn_backend::{
    AssistantService, AuthService, Database, ExplainerService, MentorService,
};

const TEST_SECRET: &str = "integration-test-secret";

/// Build a server plus a handle to the same auth service, so tests can
/// decode tokens issued over the wire.
async fn test_server_with_auth() -> (TestServer, AuthService) {
    let db = Database::new("sqlite::memory:").await.expect("in-memory db");

    let model_config = ModelConfig {
        api_key: "test-key".to_string(),
        base_url: Some("http://127.0.0.1:9".to_string()),
        provider: ProviderKind::Gemini,
        model: None,
        timeout_secs: 2,
    };
    let provider = GenerativeProvider::from_config(&model_config);

    let auth_config = AuthConfig {
        jwt_secret: TEST_SECRET.to_string(),
        token_ttl_minutes: 30,
    };
    let auth = AuthService::new(db, &auth_config);

    let state = AppState {
        assistant: AssistantService::new(provider.clone()),
        mentor: MentorService::new(provider.clone()),
        explainer: ExplainerService::new(provider),
        auth: auth.clone(),
    };

    (TestServer::new(create_router(state)).expect("test server"), auth)
}

fn signup_payload(email: &str) -> Value {
    json!({
        "username": "ada",
        "email": email,
        "password": "hunter2hunter2"
    })
}

#[tokio::test]
async fn signup_then_login_round_trip() {
    let (server, auth) = test_server_with_auth().await;

    let response = server
        .post("/auth/signup")
        .json(&signup_payload("ada@example.com"))
        .await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["msg"], "User created successfully");

    let response = server
        .post("/auth/login")
        .json(&json!({"email": "ada@example.com", "password": "hunter2hunter2"}))
        .await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["token_type"], "bearer");

    let token = body["access_token"].as_str().expect("access token");
    let claims = auth.decode_access_token(token).expect("valid token");
    assert_eq!(claims.sub, "ada@example.com");
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
    let (server, _auth) = test_server_with_auth().await;

    let response = server
        .post("/auth/signup")
        .json(&signup_payload("ada@example.com"))
        .await;
    assert_eq!(response.status_code(), 200);

    let response = server
        .post("/auth/signup")
        .json(&signup_payload("ada@example.com"))
        .await;
    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["error"], "Email already registered");
}

#[tokio::test]
async fn wrong_password_is_rejected() {
    let (server, _auth) = test_server_with_auth().await;

    server
        .post("/auth/signup")
        .json(&signup_payload("ada@example.com"))
        .await;

    let response = server
        .post("/auth/login")
        .json(&json!({"email": "ada@example.com", "password": "not the password"}))
        .await;
    assert_eq!(response.status_code(), 401);
    let body: Value = response.json();
    assert_eq!(body["error"], "Invalid credentials");
}

#[tokio::test]
async fn unknown_email_is_rejected() {
    let (server, _auth) = test_server_with_auth().await;

    let response = server
        .post("/auth/login")
        .json(&json!({"email": "nobody@example.com", "password": "whatever"}))
        .await;
    assert_eq!(response.status_code(), 401);
    let body: Value = response.json();
    assert_eq!(body["error"], "Invalid credentials");
}

#[tokio::test]
async fn tampered_token_fails_to_decode() {
    let (_server, auth) = test_server_with_auth().await;

    let token = auth
        .create_access_token("ada@example.com")
        .expect("token issued");
    assert!(auth.decode_access_token(&token).is_some());

    let mut tampered = token.clone();
    tampered.push('x');
    assert!(auth.decode_access_token(&tampered).is_none());
}
