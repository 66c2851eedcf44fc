mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use common::{body_json, clears_cookie, cookie_value, login_as, TestApp};

fn login_body(username: &str, password: &str) -> Body {
    Body::from(serde_json::json!({ "username": username, "password": password }).to_string())
}

#[tokio::test]
async fn csrf_issue_sets_readable_cookie() {
    let app = TestApp::spawn().await;

    let res = app
        .request(
            Request::builder()
                .uri("/api/auth/csrf")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);

    let cookie = common::set_cookies(&res)
        .into_iter()
        .find(|c| c.starts_with("csrf-token="))
        .expect("csrf cookie missing");
    assert!(!cookie.to_ascii_lowercase().contains("httponly"));
    assert!(cookie.to_ascii_lowercase().contains("samesite=strict"));

    let body = body_json(res).await;
    let token = body["csrfToken"].as_str().expect("csrfToken missing");
    assert!(cookie.starts_with(&format!("csrf-token={}", token)));
}

#[tokio::test]
async fn login_round_trip_against_fixture_admin() {
    let app = TestApp::spawn().await;

    let res = app
        .request(
            Request::builder()
                .uri("/api/auth/csrf")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    let csrf = cookie_value(&res, "csrf-token").unwrap();

    let res = app
        .request(
            Request::builder()
                .method("POST")
                .uri("/api/auth/login")
                .header("content-type", "application/json")
                .header("cookie", format!("csrf-token={}", csrf))
                .header("x-csrf-token", csrf)
                .body(login_body("admin", "admin123"))
                .unwrap(),
        )
        .await;

    assert_eq!(res.status(), StatusCode::OK);

    // Session cookies are HTTP-only; the rotated CSRF cookie is not.
    let cookies = common::set_cookies(&res);
    let auth = cookies
        .iter()
        .find(|c| c.starts_with("auth-token="))
        .expect("auth-token missing");
    assert!(auth.to_ascii_lowercase().contains("httponly"));
    assert!(auth.to_ascii_lowercase().contains("samesite=strict"));
    assert!(cookies.iter().any(|c| c.starts_with("session-id=")));

    let body = body_json(res).await;
    assert_eq!(body["user"]["username"], "admin");
    assert_eq!(body["user"]["role"], "admin");
    assert!(body["user"]["lastLogin"].is_string());
    assert!(body["csrfToken"].is_string());
}

#[tokio::test]
async fn login_without_csrf_pair_is_403_before_credentials() {
    let app = TestApp::spawn().await;

    // Correct credentials but no CSRF pair at all.
    let res = app
        .request(
            Request::builder()
                .method("POST")
                .uri("/api/auth/login")
                .header("content-type", "application/json")
                .body(login_body("admin", "admin123"))
                .unwrap(),
        )
        .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn reissued_csrf_invalidates_the_old_value() {
    let app = TestApp::spawn().await;

    let res = app
        .request(
            Request::builder()
                .uri("/api/auth/csrf")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    let old_token = cookie_value(&res, "csrf-token").unwrap();

    // Re-issue: the cookie a browser holds is now the new token.
    let res = app
        .request(
            Request::builder()
                .uri("/api/auth/csrf")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    let new_token = cookie_value(&res, "csrf-token").unwrap();
    assert_ne!(old_token, new_token);

    // Header still carrying the replaced value fails.
    let res = app
        .request(
            Request::builder()
                .method("POST")
                .uri("/api/auth/login")
                .header("content-type", "application/json")
                .header("cookie", format!("csrf-token={}", new_token))
                .header("x-csrf-token", old_token)
                .body(login_body("admin", "admin123"))
                .unwrap(),
        )
        .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn login_missing_fields_is_400() {
    let app = TestApp::spawn().await;

    let res = app
        .request(
            Request::builder()
                .uri("/api/auth/csrf")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    let csrf = cookie_value(&res, "csrf-token").unwrap();

    let res = app
        .request(
            Request::builder()
                .method("POST")
                .uri("/api/auth/login")
                .header("content-type", "application/json")
                .header("cookie", format!("csrf-token={}", csrf))
                .header("x-csrf-token", csrf)
                .body(login_body("", ""))
                .unwrap(),
        )
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn wrong_password_and_unknown_user_are_indistinguishable() {
    let app = TestApp::spawn().await;

    let mut messages = Vec::new();
    for (username, password) in [("admin", "wrong-password"), ("nosuchuser", "admin123")] {
        let res = app
            .request(
                Request::builder()
                    .uri("/api/auth/csrf")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;
        let csrf = cookie_value(&res, "csrf-token").unwrap();

        let res = app
            .request(
                Request::builder()
                    .method("POST")
                    .uri("/api/auth/login")
                    .header("content-type", "application/json")
                    .header("cookie", format!("csrf-token={}", csrf))
                    .header("x-csrf-token", csrf)
                    .body(login_body(username, password))
                    .unwrap(),
            )
            .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        messages.push(body_json(res).await["error"].as_str().unwrap().to_string());
    }

    assert_eq!(messages[0], messages[1]);
}

#[tokio::test]
async fn validate_confirms_an_established_session() {
    let app = TestApp::spawn().await;
    let session = login_as(&app, "admin", "admin123").await;

    let res = app
        .request(
            Request::builder()
                .uri("/api/auth/validate")
                .header("cookie", session.cookie_header())
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    assert_eq!(body["user"]["username"], "admin");
    assert_eq!(body["user"]["role"], "admin");
}

#[tokio::test]
async fn validate_without_artifact_is_401_and_clears_cookies() {
    let app = TestApp::spawn().await;

    let res = app
        .request(
            Request::builder()
                .uri("/api/auth/validate")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(clears_cookie(&res, "auth-token"));
    assert!(clears_cookie(&res, "session-id"));
    assert!(clears_cookie(&res, "csrf-token"));
}

#[tokio::test]
async fn logout_succeeds_and_clears_cookies_without_a_session() {
    let app = TestApp::spawn().await;

    let res = app
        .request(
            Request::builder()
                .method("POST")
                .uri("/api/auth/logout")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(res.status(), StatusCode::OK);
    assert!(clears_cookie(&res, "auth-token"));
    assert!(clears_cookie(&res, "session-id"));
    assert!(clears_cookie(&res, "csrf-token"));
}

#[tokio::test]
async fn logout_revokes_the_session_server_side() {
    let app = TestApp::spawn().await;
    let session = login_as(&app, "admin", "admin123").await;

    let res = app
        .request(
            Request::builder()
                .method("POST")
                .uri("/api/auth/logout")
                .header("cookie", session.cookie_header())
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);

    // The artifact itself is now refused even though it has not expired.
    let res = app
        .request(
            Request::builder()
                .uri("/api/auth/validate")
                .header("cookie", session.cookie_header())
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}
