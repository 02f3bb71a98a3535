mod utils;

use axum::http::{header, Method, Request, StatusCode};
use keyhub::config::DeletePolicy;
use serde_json::json;
use tower::ServiceExt;
use utils::{TestApp, TEST_PASSWORD};

#[tokio::test]
async fn test_key_project_device_lifecycle() {
    let app = TestApp::new().await;
    let cookie = app.signed_in("alice").await;
    let cookie = Some(cookie.as_str());

    // Quota of three active keys
    for _ in 0..3 {
        let res = app
            .request(Method::POST, "/api/api-keys", cookie, Some(json!({})))
            .await;
        assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);
        assert_eq!(res.body["success"], true);
        assert_eq!(res.body["apiKey"]["api_key"].as_str().unwrap().len(), 10);
    }
    let res = app
        .request(Method::POST, "/api/api-keys", cookie, None)
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["kind"], "quota_exceeded");

    let res = app.request(Method::GET, "/api/api-keys", cookie, None).await;
    assert_eq!(res.status, StatusCode::OK);
    let keys = res.body["apiKeys"].as_array().unwrap();
    assert_eq!(keys.len(), 3);
    let key_id = keys[0]["id"].as_i64().unwrap();

    let res = app
        .request(
            Method::DELETE,
            &format!("/api/api-keys?id={}", key_id),
            cookie,
            None,
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["success"], true);

    let res = app
        .request(Method::POST, "/api/api-keys", cookie, None)
        .await;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);

    // Project with a device
    let res = app
        .request(
            Method::POST,
            "/api/projects",
            cookie,
            Some(json!({ "project_name": "Sensors", "remark": "roof" })),
        )
        .await;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);
    let project_id = res.body["project"]["id"].as_i64().unwrap();
    assert_eq!(
        res.body["project"]["project_serial"].as_str().unwrap().len(),
        16
    );

    let res = app
        .request(
            Method::POST,
            "/api/projects",
            cookie,
            Some(json!({ "project_name": "Sensors" })),
        )
        .await;
    assert_eq!(res.status, StatusCode::CONFLICT);
    assert_eq!(res.body["kind"], "duplicate_name");

    let devices_uri = format!("/api/projects/{}/devices", project_id);
    let res = app
        .request(
            Method::POST,
            &devices_uri,
            cookie,
            Some(json!({ "device_mac": "00-1b-44-11-3a-b7" })),
        )
        .await;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);
    assert_eq!(res.body["device"]["device_mac"], "00:1B:44:11:3A:B7");
    let device_id = res.body["device"]["id"].as_i64().unwrap();

    let res = app
        .request(
            Method::POST,
            &devices_uri,
            cookie,
            Some(json!({ "device_mac": "00:1B:44:11:3A:B7" })),
        )
        .await;
    assert_eq!(res.status, StatusCode::CONFLICT);
    assert_eq!(res.body["kind"], "duplicate_device");

    let res = app
        .request(
            Method::POST,
            &devices_uri,
            cookie,
            Some(json!({ "device_mac": "00:1B:44:11:3A" })),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["kind"], "validation");

    let res = app.request(Method::GET, "/api/projects", cookie, None).await;
    assert_eq!(res.body["projects"][0]["device_count"], 1);

    let res = app.request(Method::GET, &devices_uri, cookie, None).await;
    assert_eq!(res.body["devices"].as_array().unwrap().len(), 1);

    let res = app
        .request(
            Method::DELETE,
            &format!("{}?id={}", devices_uri, device_id),
            cookie,
            None,
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);

    let res = app
        .request(
            Method::DELETE,
            &format!("/api/projects?id={}", project_id),
            cookie,
            None,
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);

    let res = app.request(Method::GET, "/api/projects", cookie, None).await;
    assert!(res.body["projects"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_id_is_bad_request() {
    let app = TestApp::new().await;
    let cookie = app.signed_in("alice").await;

    for uri in ["/api/api-keys", "/api/projects"] {
        let res = app
            .request(Method::DELETE, uri, Some(cookie.as_str()), None)
            .await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(res.body["kind"], "validation");
    }
}

#[tokio::test]
async fn test_requires_session() {
    let app = TestApp::new().await;

    for (method, uri) in [
        (Method::GET, "/api/api-keys"),
        (Method::POST, "/api/api-keys"),
        (Method::GET, "/api/projects"),
        (Method::GET, "/api/projects/1/devices"),
        (Method::GET, "/api/auth/me"),
    ] {
        let res = app.request(method, uri, None, None).await;
        assert_eq!(res.status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(res.body["kind"], "unauthorized");
    }

    let cookie = app.signed_in("alice").await;
    // Flip the first character of the signature segment
    let sig_start = cookie.rfind('.').unwrap() + 1;
    let flipped = if cookie[sig_start..].starts_with('A') { "B" } else { "A" };
    let mut tampered = cookie.clone();
    tampered.replace_range(sig_start..sig_start + 1, flipped);

    let res = app
        .request(Method::GET, "/api/api-keys", Some(tampered.as_str()), None)
        .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_bearer_header_fallback() {
    let app = TestApp::new().await;
    let cookie = app.signed_in("alice").await;
    let token = cookie.trim_start_matches("auth-token=");

    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/auth/me")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(axum::body::Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_login_me_logout() {
    let app = TestApp::new().await;
    let cookie = app.signed_in("alice").await;

    let res = app
        .request(Method::GET, "/api/auth/me", Some(cookie.as_str()), None)
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["user"]["username"], "alice");
    assert_eq!(res.body["user"]["isAdmin"], false);

    // Login by email works too; a wrong password is a plain 401
    let res = app
        .request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "username": "alice@example.com", "password": TEST_PASSWORD })),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert!(res.set_cookie.unwrap().contains("HttpOnly"));

    let res = app
        .request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "username": "alice", "password": "wrong-password" })),
        )
        .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    let res = app
        .request(Method::POST, "/api/auth/logout", Some(cookie.as_str()), None)
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert!(res.set_cookie.unwrap().starts_with("auth-token="));
}

#[tokio::test]
async fn test_register_duplicate_and_invalid() {
    let app = TestApp::new().await;
    app.signed_in("alice").await;

    let res = app
        .request(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({
                "username": "alice",
                "email": "other@example.com",
                "password": TEST_PASSWORD,
            })),
        )
        .await;
    assert_eq!(res.status, StatusCode::CONFLICT);
    assert_eq!(res.body["kind"], "duplicate_account");

    let res = app
        .request(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "username": "al", "email": "not-an-email", "password": "123" })),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["kind"], "validation");
}

#[tokio::test]
async fn test_admin_setup_once() {
    let app = TestApp::new().await;

    let res = app.request(Method::GET, "/api/setup/check", None, None).await;
    assert_eq!(res.body["isSetupComplete"], false);

    let admin = json!({
        "username": "root",
        "email": "root@example.com",
        "password": TEST_PASSWORD,
    });
    let res = app
        .request(Method::POST, "/api/setup/create-admin", None, Some(admin))
        .await;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);

    let res = app.request(Method::GET, "/api/setup/check", None, None).await;
    assert_eq!(res.body["isSetupComplete"], true);

    let res = app
        .request(
            Method::POST,
            "/api/setup/create-admin",
            None,
            Some(json!({
                "username": "root2",
                "email": "root2@example.com",
                "password": TEST_PASSWORD,
            })),
        )
        .await;
    assert_eq!(res.status, StatusCode::CONFLICT);
    assert_eq!(res.body["kind"], "setup_complete");
}

#[tokio::test]
async fn test_strict_delete_policy_over_http() {
    let app = TestApp::with_policy(DeletePolicy::ReportMissing).await;
    let cookie = app.signed_in("alice").await;

    let res = app
        .request(
            Method::DELETE,
            "/api/api-keys?id=999",
            Some(cookie.as_str()),
            None,
        )
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.body["kind"], "not_found");
}

#[tokio::test]
async fn test_health_and_docs() {
    let app = TestApp::new().await;

    let res = app.request(Method::GET, "/api/health", None, None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["database"], "connected");

    let res = app
        .request(Method::GET, "/api-docs/openapi.json", None, None)
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert!(res.body["paths"]["/api/api-keys"].is_object());
}

#[tokio::test]
async fn test_malformed_key_body_issues_nothing() {
    let app = TestApp::new().await;
    let cookie = app.signed_in("alice").await;
    let cookie = Some(cookie.as_str());

    for body in [
        r#"{"expiration":"not-a-date","note":5}"#,
        r#"{"expiration": "2001-01-01""#,
        r#"{"expiration":"not-a-date"}"#,
    ] {
        let res = app
            .request_raw(Method::POST, "/api/api-keys", cookie, body)
            .await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(res.body["kind"], "validation", "{body}");
    }

    let res = app.request(Method::GET, "/api/api-keys", cookie, None).await;
    assert!(res.body["apiKeys"].as_array().unwrap().is_empty());

    // No body at all still means "all defaults"
    let res = app
        .request(Method::POST, "/api/api-keys", cookie, None)
        .await;
    assert_eq!(res.status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_extractor_failures_are_json_validation_errors() {
    let app = TestApp::new().await;
    let cookie = app.signed_in("alice").await;
    let cookie = Some(cookie.as_str());

    let res = app
        .request(Method::DELETE, "/api/api-keys?id=abc", cookie, None)
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["kind"], "validation");
    assert!(res.body["error"].is_string());

    let res = app
        .request(Method::POST, "/api/projects", cookie, Some(json!({})))
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["kind"], "validation");

    let res = app
        .request(Method::GET, "/api/projects/abc/devices", cookie, None)
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["kind"], "validation");

    let res = app
        .request_raw(Method::POST, "/api/auth/login", None, "{not json")
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["kind"], "validation");
}
