//! Router-level tests for authorization and webhook verification.
//!
//! These drive the real router with `tower::ServiceExt::oneshot` over a lazy
//! connection pool; every path exercised here rejects (or acknowledges)
//! before touching the database, so no live `PostgreSQL` is needed.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use secrecy::SecretString;
use sha2::Sha256;
use sqlx::PgPool;
use tower::util::ServiceExt;

use clementine_server::config::{
    AdminAccessConfig, ClerkConfig, ImageKitConfig, ServerConfig,
};
use clementine_server::routes;
use clementine_server::state::AppState;

const WEBHOOK_KEY: &[u8] = b"integration-test-signing-key-123";

fn webhook_secret() -> String {
    format!("whsec_{}", BASE64.encode(WEBHOOK_KEY))
}

fn test_config(webhook: Option<String>) -> ServerConfig {
    ServerConfig {
        database_url: SecretString::from("postgres://postgres@localhost/clementine_test"),
        host: "127.0.0.1".parse().expect("addr"),
        port: 0,
        base_url: "http://localhost:3000".to_owned(),
        session_secret: SecretString::from("kJ8#mP2$vQ9!xR4@nL7%wT1&yU5*zB3^"),
        clerk: ClerkConfig {
            api_url: "http://127.0.0.1:1".to_owned(),
            secret_key: SecretString::from("sk_test_key"),
            webhook_secret: webhook.map(SecretString::from),
        },
        imagekit: ImageKitConfig {
            upload_url: "http://127.0.0.1:1/upload".to_owned(),
            url_endpoint: "https://ik.imagekit.io/test".to_owned(),
            private_key: SecretString::from("private_key"),
        },
        admin: AdminAccessConfig {
            sync_token: Some(SecretString::from("sync-token-123")),
            quick_sync_secret: Some(SecretString::from("quick-secret-123")),
            admin_emails: vec!["ops@clementine.shop".to_owned()],
        },
        sentry_dsn: None,
    }
}

fn test_app(webhook: Option<String>) -> Router {
    let config = test_config(webhook);
    // Lazy pool: never connects unless a handler actually queries
    let pool = PgPool::connect_lazy("postgres://postgres@localhost/clementine_test")
        .expect("lazy pool");
    let state = AppState::new(config, pool).expect("state");
    routes::app(state)
}

fn now_timestamp() -> String {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system time before epoch")
        .as_secs()
        .to_string()
}

fn sign(msg_id: &str, timestamp: &str, payload: &str) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(WEBHOOK_KEY).expect("valid key length");
    mac.update(format!("{msg_id}.{timestamp}.{payload}").as_bytes());
    format!("v1,{}", BASE64.encode(mac.finalize().into_bytes()))
}

fn signed_webhook_request(payload: &str) -> Request<Body> {
    let timestamp = now_timestamp();
    let signature = sign("msg_test", &timestamp, payload);

    Request::builder()
        .method("POST")
        .uri("/api/webhooks/clerk")
        .header(header::CONTENT_TYPE, "application/json")
        .header("svix-id", "msg_test")
        .header("svix-timestamp", timestamp)
        .header("svix-signature", signature)
        .body(Body::from(payload.to_owned()))
        .expect("request")
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}

#[tokio::test]
async fn webhook_fails_closed_without_configured_secret() {
    let app = test_app(None);

    let response = app
        .oneshot(signed_webhook_request(r#"{"type":"user.created","data":{}}"#))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert!(body["error"].as_str().is_some());
}

#[tokio::test]
async fn webhook_rejects_bad_signature() {
    let app = test_app(Some(webhook_secret()));

    let request = Request::builder()
        .method("POST")
        .uri("/api/webhooks/clerk")
        .header("svix-id", "msg_test")
        .header("svix-timestamp", now_timestamp())
        .header("svix-signature", "v1,bm90LWEtcmVhbC1zaWduYXR1cmU=")
        .body(Body::from(r#"{"type":"user.created","data":{}}"#))
        .expect("request");

    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn webhook_rejects_missing_signature_headers() {
    let app = test_app(Some(webhook_secret()));

    let request = Request::builder()
        .method("POST")
        .uri("/api/webhooks/clerk")
        .body(Body::from(r#"{"type":"user.created","data":{}}"#))
        .expect("request");

    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn webhook_rejects_profile_event_without_primary_email() {
    let app = test_app(Some(webhook_secret()));
    let payload = r#"{"type":"user.created","data":{"id":"user_1","email_addresses":[{"email_address":"x@example.com","primary":false}]}}"#;

    let response = app
        .oneshot(signed_webhook_request(payload))
        .await
        .expect("response");

    // Verified delivery, but no resolvable primary email: 400, no write
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn webhook_acknowledges_user_deleted_without_mutation() {
    let app = test_app(Some(webhook_secret()));
    let payload = r#"{"type":"user.deleted","data":{"id":"user_1"}}"#;

    let response = app
        .oneshot(signed_webhook_request(payload))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], serde_json::json!(true));
}

#[tokio::test]
async fn webhook_acknowledges_unknown_event_kinds() {
    let app = test_app(Some(webhook_secret()));
    let payload = r#"{"type":"session.created","data":{"id":"sess_1"}}"#;

    let response = app
        .oneshot(signed_webhook_request(payload))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn sync_users_rejects_wrong_bearer_token() {
    let app = test_app(None);

    let request = Request::builder()
        .method("POST")
        .uri("/api/admin/sync-clerk-users")
        .header(header::AUTHORIZATION, "Bearer wrong-token")
        .body(Body::empty())
        .expect("request");

    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn sync_users_rejects_anonymous_caller() {
    let app = test_app(None);

    let request = Request::builder()
        .method("POST")
        .uri("/api/admin/sync-clerk-users")
        .body(Body::empty())
        .expect("request");

    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn quick_sync_rejects_wrong_secret() {
    let app = test_app(None);

    let request = Request::builder()
        .method("GET")
        .uri("/api/admin/quick-sync-users?secret=wrong")
        .body(Body::empty())
        .expect("request");

    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert!(
        body["error"]
            .as_str()
            .is_some_and(|msg| msg.contains("secret"))
    );
}

#[tokio::test]
async fn welcome_settings_require_authentication() {
    let app = test_app(None);

    let request = Request::builder()
        .method("GET")
        .uri("/api/admin/welcome-settings")
        .body(Body::empty())
        .expect("request");

    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn store_orders_require_authentication() {
    let app = test_app(None);

    let request = Request::builder()
        .method("GET")
        .uri("/api/store/orders")
        .body(Body::empty())
        .expect("request");

    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn store_reviews_require_authentication() {
    let app = test_app(None);

    let request = Request::builder()
        .method("DELETE")
        .uri("/api/store/reviews?reviewId=abc")
        .body(Body::empty())
        .expect("request");

    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
