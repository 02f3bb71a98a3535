#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

use keyhub::config::{DeletePolicy, Settings};
use keyhub::services::accounts::RegisterRequest;
use keyhub::store::MemoryStore;
use keyhub::{create_app, AppState};

pub const TEST_PASSWORD: &str = "correct-horse";

pub fn test_settings(policy: &str) -> Settings {
    Settings::from_vars(vec![
        ("JWT_SECRET".to_string(), "integration-test-secret-0123".to_string()),
        ("BCRYPT_COST".to_string(), "10".to_string()),
        ("DELETE_POLICY".to_string(), policy.to_string()),
    ])
    .expect("test settings")
}

/// App state over a fresh in-memory store
pub fn memory_state(policy: DeletePolicy) -> AppState {
    let policy = match policy {
        DeletePolicy::AlwaysSucceed => "always_succeed",
        DeletePolicy::ReportMissing => "report_missing",
    };
    AppState::new(Arc::new(MemoryStore::new()), test_settings(policy))
}

pub fn register_request(username: &str) -> RegisterRequest {
    RegisterRequest {
        username: username.to_string(),
        email: format!("{}@example.com", username),
        password: TEST_PASSWORD.to_string(),
    }
}

/// Register `username` directly through the account service and return its id
pub async fn create_user(state: &AppState, username: &str) -> i64 {
    state
        .accounts
        .register(register_request(username))
        .await
        .expect("register user")
        .id
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub set_cookie: Option<String>,
    pub body: Value,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_policy(DeletePolicy::AlwaysSucceed).await
    }

    pub async fn with_policy(policy: DeletePolicy) -> Self {
        let state = memory_state(policy);
        let router = create_app(state.clone()).await;
        Self { router, state }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        self.send(request).await
    }

    /// Send `body` verbatim as `application/json`
    pub async fn request_raw(
        &self,
        method: Method,
        uri: &str,
        cookie: Option<&str>,
        body: &str,
    ) -> TestResponse {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = builder.body(Body::from(body.to_string())).unwrap();
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            set_cookie,
            body,
        }
    }

    /// Register and log in; returns the `auth-token=...` cookie pair
    pub async fn signed_in(&self, username: &str) -> String {
        let res = self
            .request(
                Method::POST,
                "/api/auth/register",
                None,
                Some(serde_json::json!({
                    "username": username,
                    "email": format!("{}@example.com", username),
                    "password": TEST_PASSWORD,
                })),
            )
            .await;
        assert_eq!(res.status, StatusCode::CREATED, "register: {}", res.body);

        let res = self
            .request(
                Method::POST,
                "/api/auth/login",
                None,
                Some(serde_json::json!({ "username": username, "password": TEST_PASSWORD })),
            )
            .await;
        assert_eq!(res.status, StatusCode::OK, "login: {}", res.body);

        let set_cookie = res.set_cookie.expect("login sets a cookie");
        set_cookie
            .split(';')
            .next()
            .expect("cookie pair")
            .to_string()
    }
}
