//! Endpoint-level tests for the session lifecycle API.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
};
use serde_json::{Value, json};
use tower::ServiceExt;

use tokengate::credentials::Credential;
use tokengate::jwt::{AccessClaims, TokenLifetimes, TokenType};
use tokengate::{ServerConfig, create_app};

const TEST_SECRET: &[u8] = b"test-jwt-secret-minimum-32-chars-long";

fn test_config() -> ServerConfig {
    ServerConfig {
        credentials: vec![
            Credential::new("frontend", "correct-pw"),
            Credential::new("oracle", "other-pw"),
        ],
        jwt_secret: TEST_SECRET.to_vec(),
        lifetimes: TokenLifetimes::default(),
        rate_limit_login: false,
    }
}

fn test_app() -> Router {
    create_app(&test_config())
}

async fn post_json(app: &Router, uri: &str, body: Value) -> Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn login(app: &Router) -> Value {
    let response = post_json(
        app,
        "/auth/login",
        json!({ "user": "frontend", "password": "correct-pw" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

// ---------------------------------------------------------------------------
// Login
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_login_returns_token_pair_with_access_lifetime() {
    let app = test_app();
    let body = login(&app).await;

    assert!(!body["accessToken"].as_str().unwrap().is_empty());
    assert!(!body["refreshToken"].as_str().unwrap().is_empty());
    // expiresIn is the access token lifetime in milliseconds, never the
    // refresh token lifetime.
    assert_eq!(body["expiresIn"].as_u64().unwrap(), 70_000);
}

#[tokio::test]
async fn test_login_expires_in_follows_configured_lifetime() {
    let mut config = test_config();
    config.lifetimes = TokenLifetimes {
        access: std::time::Duration::from_secs(5),
        refresh: std::time::Duration::from_secs(30),
    };
    let app = create_app(&config);

    let response = post_json(
        &app,
        "/auth/login",
        json!({ "user": "frontend", "password": "correct-pw" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["expiresIn"].as_u64().unwrap(), 5_000);
}

#[tokio::test]
async fn test_login_wrong_password() {
    let app = test_app();
    let response = post_json(
        &app,
        "/auth/login",
        json!({ "user": "frontend", "password": "wrong-pw" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Incorrect Password");
}

#[tokio::test]
async fn test_login_unknown_user() {
    let app = test_app();
    let response = post_json(
        &app,
        "/auth/login",
        json!({ "user": "ghost", "password": "x" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"], "User does not exist");
}

#[tokio::test]
async fn test_login_missing_fields() {
    let app = test_app();

    // Empty password counts as missing
    let response = post_json(
        &app,
        "/auth/login",
        json!({ "user": "frontend", "password": "" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Missing Request Fields");

    // Absent user
    let response = post_json(&app, "/auth/login", json!({ "password": "correct-pw" })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Empty body
    let response = post_json(&app, "/auth/login", json!({})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Refresh
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_refresh_rotates_the_pair() {
    let app = test_app();
    let granted = login(&app).await;
    let old_refresh = granted["refreshToken"].as_str().unwrap();

    let response = post_json(
        &app,
        "/auth/refresh",
        json!({ "user": "frontend", "refreshToken": old_refresh }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;

    assert_ne!(body["refreshToken"].as_str().unwrap(), old_refresh);
    assert!(!body["accessToken"].as_str().unwrap().is_empty());
    assert_eq!(body["expiresIn"].as_u64().unwrap(), 70_000);
}

#[tokio::test]
async fn test_refresh_is_single_use() {
    let app = test_app();
    let granted = login(&app).await;
    let refresh_token = granted["refreshToken"].as_str().unwrap();

    let first = post_json(
        &app,
        "/auth/refresh",
        json!({ "user": "frontend", "refreshToken": refresh_token }),
    )
    .await;
    assert_eq!(first.status(), StatusCode::OK);

    // Same token again: already consumed.
    let second = post_json(
        &app,
        "/auth/refresh",
        json!({ "user": "frontend", "refreshToken": refresh_token }),
    )
    .await;
    assert_eq!(second.status(), StatusCode::BAD_REQUEST);
    let body = body_json(second).await;
    assert_eq!(body["error"], "Invalid Refresh Token");
}

#[tokio::test]
async fn test_refresh_replacement_token_is_honored() {
    let app = test_app();
    let granted = login(&app).await;
    let refresh_token = granted["refreshToken"].as_str().unwrap();

    let first = post_json(
        &app,
        "/auth/refresh",
        json!({ "user": "frontend", "refreshToken": refresh_token }),
    )
    .await;
    let replacement = body_json(first).await;
    let replacement_token = replacement["refreshToken"].as_str().unwrap();

    let second = post_json(
        &app,
        "/auth/refresh",
        json!({ "user": "frontend", "refreshToken": replacement_token }),
    )
    .await;
    assert_eq!(second.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_with_never_issued_token() {
    let app = test_app();
    login(&app).await;

    let response = post_json(
        &app,
        "/auth/refresh",
        json!({ "user": "frontend", "refreshToken": "not-a-token" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_refresh_rejects_access_token() {
    let app = test_app();
    let granted = login(&app).await;
    let access_token = granted["accessToken"].as_str().unwrap();

    let response = post_json(
        &app,
        "/auth/refresh",
        json!({ "user": "frontend", "refreshToken": access_token }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_refresh_missing_fields() {
    let app = test_app();

    let response = post_json(&app, "/auth/refresh", json!({ "user": "frontend" })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Missing Request Fields");
}

#[tokio::test]
async fn test_tokens_from_two_logins_are_independently_honored() {
    let app = test_app();
    let first = login(&app).await;
    let second = login(&app).await;

    let first_token = first["refreshToken"].as_str().unwrap();
    let second_token = second["refreshToken"].as_str().unwrap();
    assert_ne!(first_token, second_token);

    for token in [first_token, second_token] {
        let response = post_json(
            &app,
            "/auth/refresh",
            json!({ "user": "frontend", "refreshToken": token }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}

// ---------------------------------------------------------------------------
// Logout
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_logout_retires_refresh_token() {
    let app = test_app();
    let granted = login(&app).await;
    let refresh_token = granted["refreshToken"].as_str().unwrap();

    let response = post_json(
        &app,
        "/auth/logout",
        json!({ "refreshToken": refresh_token }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // The retired token can no longer be exchanged.
    let response = post_json(
        &app,
        "/auth/refresh",
        json!({ "user": "frontend", "refreshToken": refresh_token }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_logout_is_idempotent() {
    let app = test_app();

    for _ in 0..2 {
        let response = post_json(
            &app,
            "/auth/logout",
            json!({ "refreshToken": "never-issued" }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }
}

#[tokio::test]
async fn test_logout_missing_fields() {
    let app = test_app();

    let response = post_json(&app, "/auth/logout", json!({})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Missing Request Fields");
}

// ---------------------------------------------------------------------------
// Token verifier (protected route)
// ---------------------------------------------------------------------------

async fn post_protected(app: &Router, auth_header: Option<&str>) -> Response {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/auth/test")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(value) = auth_header {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    app.clone()
        .oneshot(builder.body(Body::from("{}")).unwrap())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_protected_route_accepts_valid_bearer_token() {
    let app = test_app();
    let granted = login(&app).await;
    let access_token = granted["accessToken"].as_str().unwrap();

    let response = post_protected(&app, Some(&format!("Bearer {}", access_token))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn test_protected_route_missing_header() {
    let app = test_app();

    let response = post_protected(&app, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_route_garbage_token() {
    let app = test_app();

    let response = post_protected(&app, Some("Bearer garbage")).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = post_protected(&app, Some("Bearer")).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_protected_route_rejects_refresh_token() {
    let app = test_app();
    let granted = login(&app).await;
    let refresh_token = granted["refreshToken"].as_str().unwrap();

    let response = post_protected(&app, Some(&format!("Bearer {}", refresh_token))).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_protected_route_rejects_token_after_restart() {
    // Two apps model a process restart: each generates its own secret, so
    // a token signed before the restart fails verification afterwards.
    let app_before = test_app();
    let granted = login(&app_before).await;
    let access_token = granted["accessToken"].as_str().unwrap();

    let mut config = test_config();
    config.jwt_secret = tokengate::jwt::generate_secret();
    let app_after = create_app(&config);

    let response = post_protected(&app_after, Some(&format!("Bearer {}", access_token))).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_protected_route_rejects_expired_token() {
    let app = test_app();

    // Craft a syntactically valid but time-expired token with the app's
    // own secret.
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs();
    let claims = AccessClaims {
        sub: "frontend".to_string(),
        token_type: TokenType::Access,
        iat: now - 200,
        exp: now - 100,
    };
    let token = jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(TEST_SECRET),
    )
    .unwrap();

    let response = post_protected(&app, Some(&format!("Bearer {}", token))).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// ---------------------------------------------------------------------------
// Rate limiting
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_login_rate_limited_per_ip() {
    let mut config = test_config();
    config.rate_limit_login = true;
    let app = create_app(&config);

    let attempt = |ip: &'static str| {
        let app = app.clone();
        async move {
            app.oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/auth/login")
                    .header(header::CONTENT_TYPE, "application/json")
                    .header("x-forwarded-for", ip)
                    .body(Body::from(
                        json!({ "user": "frontend", "password": "wrong-pw" }).to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap()
        }
    };

    let mut limited = false;
    for _ in 0..30 {
        let response = attempt("10.0.0.1").await;
        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            limited = true;
            break;
        }
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
    assert!(limited, "expected the per-IP quota to be exhausted");

    // A different IP is unaffected.
    let response = attempt("10.0.0.2").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
