use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use httpmock::prelude::*;
use serde_json::{json, Value};
use tower::ServiceExt;
use url::Url;

use email_schedule_backend::{
    auth::{InMemorySessions, ATTEMPT_COOKIE},
    build_router,
    config::{OAuthSettings, ServerSettings, Settings},
    AppState,
};

fn settings(token_url: String) -> Settings {
    Settings {
        server: ServerSettings {
            host: "127.0.0.1".to_string(),
            port: 3000,
            cookie_secure: false,
            maintenance_interval_secs: 60,
            tls_cert_path: None,
            tls_key_path: None,
            shutdown_grace_secs: 10,
        },
        oauth: OAuthSettings {
            client_id: "client-1".to_string(),
            client_secret: None,
            redirect_uri: "http://localhost:3000/redirect-auth".to_string(),
            scope: None,
            authorize_url: "https://app.blackbaud.com/oauth/authorize".to_string(),
            token_url,
            use_pkce: true,
            pending_ttl_secs: 600,
            max_pending: 100,
            exchange_timeout_secs: 2,
            max_exchange_retries: 2,
            retry_backoff_ms: 1,
        },
    }
}

struct TestApp {
    app: Router,
    sessions: Arc<InMemorySessions>,
}

fn test_app(server: &MockServer) -> TestApp {
    let sessions = Arc::new(InMemorySessions::new());
    let state = AppState::with_sessions(settings(server.url("/token")), sessions.clone()).unwrap();
    TestApp {
        app: build_router(Arc::new(state)),
        sessions,
    }
}

async fn get(app: &Router, uri: &str, cookie: Option<&str>) -> Response {
    let mut request = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        request = request.header(header::COOKIE, format!("{}={}", ATTEMPT_COOKIE, cookie));
    }
    app.clone()
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Inicia o sign-up e devolve (attempt_id do cookie, parâmetros da URL de autorização)
async fn start_sign_up(app: &Router) -> (String, HashMap<String, String>) {
    let response = get(app, "/sign-up", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Lax"));

    let attempt_id = set_cookie
        .split(';')
        .next()
        .and_then(|pair| pair.strip_prefix(&format!("{}=", ATTEMPT_COOKIE)))
        .unwrap()
        .to_string();

    let location = response.headers().get(header::LOCATION).unwrap().to_str().unwrap();
    let url = Url::parse(location).unwrap();
    assert_eq!(url.host_str(), Some("app.blackbaud.com"));
    assert_eq!(url.path(), "/oauth/authorize");

    (attempt_id, url.query_pairs().into_owned().collect())
}

async fn mock_token_success(server: &MockServer) -> httpmock::Mock<'_> {
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/token")
                .body_contains("grant_type=authorization_code")
                .body_contains("code=XYZ")
                .body_contains("client_id=client-1");
            then.status(200).json_body(json!({
                "access_token": "tok1",
                "token_type": "bearer",
                "expires_in": 3600,
                "refresh_token": "ref1"
            }));
        })
        .await
}

#[tokio::test]
async fn test_full_sign_up_flow() {
    let server = MockServer::start_async().await;
    let mock = mock_token_success(&server).await;
    let test = test_app(&server);

    let (attempt_id, params) = start_sign_up(&test.app).await;
    assert_eq!(params["client_id"], "client-1");
    assert_eq!(params["response_type"], "code");
    assert_eq!(params["redirect_uri"], "http://localhost:3000/redirect-auth");
    assert_eq!(params["code_challenge_method"], "S256");

    let uri = format!("/redirect-auth?code=XYZ&state={}", params["state"]);
    let response = get(&test.app, &uri, Some(&attempt_id)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let cleared = response.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(cleared.starts_with(&format!("{}=", ATTEMPT_COOKIE)));
    assert!(body_text(response).await.contains("Sign-up complete"));

    mock.assert_async().await;
    assert_eq!(test.sessions.len(), 1);
}

#[tokio::test]
async fn test_replayed_callback_is_rejected() {
    let server = MockServer::start_async().await;
    let mock = mock_token_success(&server).await;
    let test = test_app(&server);

    let (attempt_id, params) = start_sign_up(&test.app).await;
    let uri = format!("/redirect-auth?code=XYZ&state={}", params["state"]);

    let first = get(&test.app, &uri, Some(&attempt_id)).await;
    assert_eq!(first.status(), StatusCode::OK);

    let replay = get(&test.app, &uri, Some(&attempt_id)).await;
    assert_eq!(replay.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(replay).await.contains("expired or was already used"));

    assert_eq!(mock.hits_async().await, 1);
    assert_eq!(test.sessions.len(), 1);
}

#[tokio::test]
async fn test_wrong_state_is_rejected_without_exchange() {
    let server = MockServer::start_async().await;
    let mock = mock_token_success(&server).await;
    let test = test_app(&server);

    let (attempt_id, _) = start_sign_up(&test.app).await;

    let response = get(&test.app, "/redirect-auth?code=XYZ&state=forged", Some(&attempt_id)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(mock.hits_async().await, 0);
    assert!(test.sessions.is_empty());
}

#[tokio::test]
async fn test_callback_without_cookie_is_rejected() {
    let server = MockServer::start_async().await;
    let mock = mock_token_success(&server).await;
    let test = test_app(&server);

    let (_, params) = start_sign_up(&test.app).await;
    let uri = format!("/redirect-auth?code=XYZ&state={}", params["state"]);

    let response = get(&test.app, &uri, None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(mock.hits_async().await, 0);
}

#[tokio::test]
async fn test_denied_authorization_shows_cancel_page() {
    let server = MockServer::start_async().await;
    let mock = mock_token_success(&server).await;
    let test = test_app(&server);

    let (attempt_id, params) = start_sign_up(&test.app).await;
    let uri = format!(
        "/redirect-auth?error=access_denied&error_description=User%20cancelled&state={}",
        params["state"]
    );

    let response = get(&test.app, &uri, Some(&attempt_id)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_text(response).await;
    assert!(body.contains("cancelled"));
    assert!(!body.contains("User cancelled"));
    assert_eq!(mock.hits_async().await, 0);
}

#[tokio::test]
async fn test_unreachable_provider_returns_bad_gateway() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/token");
            then.status(502);
        })
        .await;
    let test = test_app(&server);

    let (attempt_id, params) = start_sign_up(&test.app).await;
    let uri = format!("/redirect-auth?code=XYZ&state={}", params["state"]);

    let response = get(&test.app, &uri, Some(&attempt_id)).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(mock.hits_async().await, 3);
}

#[tokio::test]
async fn test_health_reports_pending_attempts() {
    let server = MockServer::start_async().await;
    let test = test_app(&server);

    start_sign_up(&test.app).await;
    start_sign_up(&test.app).await;

    let response = get(&test.app, "/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "email-schedule-backend");
    assert_eq!(body["pending_authorizations"], 2);
}

#[tokio::test]
async fn test_duplicated_query_params_fail_as_malformed_callback() {
    let server = MockServer::start_async().await;
    let mock = mock_token_success(&server).await;
    let test = test_app(&server);

    let (attempt_id, _) = start_sign_up(&test.app).await;

    let response = get(&test.app, "/redirect-auth?code=a&code=b&state=x", Some(&attempt_id)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let cleared = response.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(cleared.starts_with(&format!("{}=", ATTEMPT_COOKIE)));

    let body = body_text(response).await;
    assert!(body.contains("Sign-up failed"));
    assert!(!body.contains("deserialize"));
    assert_eq!(mock.hits_async().await, 0);

    // A tentativa foi consumida
    let health = get(&test.app, "/health", None).await;
    let health: Value = serde_json::from_str(&body_text(health).await).unwrap();
    assert_eq!(health["pending_authorizations"], 0);
}
