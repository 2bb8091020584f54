mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use serde_json::json;

use common::{
    body_json, body_text, cookie_pair, form_request, get, json_request, location, raw_json_request,
    set_cookie, TestApp, PASSWORD, SECRET,
};
use productiveflow::auth::{SessionUser, TokenCodec, SESSION_COOKIE};

#[tokio::test]
async fn sign_in_sets_day_cookie_and_opens_dashboard() {
    let app = TestApp::new();
    let user = app.member("alice@example.com").await;

    let response = app
        .send(json_request(
            "POST",
            "/api/auth/signin",
            None,
            &json!({ "email": "alice@example.com", "password": PASSWORD, "remember": false }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let header = set_cookie(&response).expect("Set-Cookie");
    assert!(header.starts_with(&format!("{SESSION_COOKIE}=")));
    assert!(header.contains("Max-Age=86400"));
    assert!(header.contains("HttpOnly"));
    assert!(header.contains("Path=/"));
    let cookie = cookie_pair(&response).expect("cookie");

    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["id"], user.id.to_string());
    assert_eq!(body["data"]["email"], "alice@example.com");
    assert_eq!(body["data"]["orgId"], user.org_id.expect("org").to_string());

    let page = app.send(get("/dashboard", Some(&cookie))).await;
    assert_eq!(page.status(), StatusCode::OK);
}

#[tokio::test]
async fn remember_me_extends_cookie_to_thirty_days() {
    let app = TestApp::new();
    app.member("bob@example.com").await;

    let response = app
        .send(json_request(
            "POST",
            "/api/auth/signin",
            None,
            &json!({ "email": "bob@example.com", "password": PASSWORD, "remember": true }),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let header = set_cookie(&response).expect("Set-Cookie");
    assert!(header.contains("Max-Age=2592000"));
}

#[tokio::test]
async fn wrong_password_and_unknown_email_look_the_same() {
    let app = TestApp::new();
    app.member("carol@example.com").await;

    for (email, password) in [
        ("carol@example.com", "wrong-password"),
        ("nobody@example.com", PASSWORD),
    ] {
        let response = app
            .send(json_request(
                "POST",
                "/api/auth/signin",
                None,
                &json!({ "email": email, "password": password }),
            ))
            .await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(set_cookie(&response).is_none());
        let body = body_json(response).await;
        assert_eq!(body["error"], "Invalid credentials");
    }
}

#[tokio::test]
async fn expired_cookie_redirects_to_sign_in() {
    let app = TestApp::new();
    let user = app.member("dave@example.com").await;

    let codec = TokenCodec::new(SECRET).expect("codec");
    let token = codec
        .issue_at(
            &SessionUser {
                id: user.id,
                email: Some(user.email.clone()),
                name: user.name.clone(),
                org_id: user.org_id,
            },
            Duration::hours(24),
            Utc::now() - Duration::hours(25),
        )
        .expect("token");

    let response = app
        .send(get("/dashboard", Some(&format!("{SESSION_COOKIE}={token}"))))
        .await;

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response).as_deref(), Some("/auth/signin"));
}

#[tokio::test]
async fn tampered_cookie_is_treated_as_absent() {
    let app = TestApp::new();
    let user = app.member("erin@example.com").await;

    let forged = TokenCodec::new("some-other-secret")
        .expect("codec")
        .issue(
            &SessionUser {
                id: user.id,
                email: Some(user.email.clone()),
                name: None,
                org_id: user.org_id,
            },
            Duration::hours(1),
        )
        .expect("token");
    let cookie = format!("{SESSION_COOKIE}={forged}");

    let page = app.send(get("/dashboard/projects", Some(&cookie))).await;
    assert_eq!(page.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&page).as_deref(), Some("/auth/signin"));

    let check = app.send(get("/api/auth/check", Some(&cookie))).await;
    assert_eq!(check.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn user_without_organization_is_sent_to_creation_page() {
    let app = TestApp::new();
    app.user("frank@example.com").await;
    let cookie = app.sign_in("frank@example.com").await;

    let dashboard = app.send(get("/dashboard", Some(&cookie))).await;
    assert_eq!(dashboard.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&dashboard).as_deref(), Some("/dashboard/organization/new"));

    let settings = app.send(get("/settings/profile", Some(&cookie))).await;
    assert_eq!(settings.status(), StatusCode::TEMPORARY_REDIRECT);

    let creation = app.send(get("/dashboard/organization/new", Some(&cookie))).await;
    assert_eq!(creation.status(), StatusCode::OK);
}

#[tokio::test]
async fn deleted_user_loses_session() {
    let app = TestApp::new();
    let user = app.member("gina@example.com").await;
    let cookie = app.sign_in("gina@example.com").await;

    app.directory.remove_user(user.id).await;

    let page = app.send(get("/dashboard", Some(&cookie))).await;
    assert_eq!(page.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&page).as_deref(), Some("/auth/signin"));
}

#[tokio::test]
async fn sign_up_creates_account_and_session() {
    let app = TestApp::new();

    let response = app
        .send(json_request(
            "POST",
            "/api/auth/signup",
            None,
            &json!({ "name": "Hana", "email": "Hana@Example.com", "password": "secret1" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let header = set_cookie(&response).expect("Set-Cookie");
    assert!(header.contains("Max-Age=86400"));
    let cookie = cookie_pair(&response).expect("cookie");

    let body = body_json(response).await;
    assert_eq!(body["data"]["email"], "hana@example.com");

    // A fresh account has no organization yet
    let check = app.send(get("/api/auth/check", Some(&cookie))).await;
    assert_eq!(check.status(), StatusCode::OK);
    let body = body_json(check).await;
    assert_eq!(body, json!({ "authorized": true, "needsOrg": true }));

    let duplicate = app
        .send(json_request(
            "POST",
            "/api/auth/signup",
            None,
            &json!({ "name": "Hana", "email": "hana@example.com", "password": "secret1" }),
        ))
        .await;
    assert_eq!(duplicate.status(), StatusCode::BAD_REQUEST);
    let body = body_json(duplicate).await;
    assert_eq!(body["error"], "User already exists");
}

#[tokio::test]
async fn sign_up_validates_input() {
    let app = TestApp::new();

    let short = app
        .send(json_request(
            "POST",
            "/api/auth/signup",
            None,
            &json!({ "name": "Ivan", "email": "ivan@example.com", "password": "123" }),
        ))
        .await;
    assert_eq!(short.status(), StatusCode::BAD_REQUEST);
    assert!(set_cookie(&short).is_none());

    let bad_email = app
        .send(json_request(
            "POST",
            "/api/auth/signup",
            None,
            &json!({ "name": "Ivan", "email": "not-an-email", "password": "secret1" }),
        ))
        .await;
    assert_eq!(bad_email.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn sign_out_clears_cookie() {
    let app = TestApp::new();

    let response = app
        .send(json_request("POST", "/api/auth/signout", None, &json!({})))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let header = set_cookie(&response).expect("Set-Cookie");
    assert!(header.starts_with(&format!("{SESSION_COOKIE}=;")));
    assert!(header.contains("Max-Age=0"));
}

#[tokio::test]
async fn check_reports_each_session_state() {
    let app = TestApp::new();
    let user = app.member("judy@example.com").await;

    let anonymous = app.send(get("/api/auth/check", None)).await;
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(anonymous).await, json!({ "authorized": false }));

    let cookie = app.sign_in("judy@example.com").await;
    let signed_in = app.send(get("/api/auth/check", Some(&cookie))).await;
    assert_eq!(signed_in.status(), StatusCode::OK);
    let body = body_json(signed_in).await;
    assert_eq!(body["authorized"], true);
    assert_eq!(body["user"]["id"], user.id.to_string());
    assert_eq!(body["user"]["role"], "ADMIN");
}

#[tokio::test]
async fn api_requires_session_and_organization() {
    let app = TestApp::new();

    let anonymous = app.send(get("/api/projects", None)).await;
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);
    assert!(location(&anonymous).is_none());
    let body = body_json(anonymous).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "UNAUTHORIZED");

    app.user("kim@example.com").await;
    let cookie = app.sign_in("kim@example.com").await;
    let org_less = app.send(get("/api/projects", Some(&cookie))).await;
    assert_eq!(org_less.status(), StatusCode::FORBIDDEN);
    let body = body_json(org_less).await;
    assert_eq!(body["error"], "Organization not found");
}

#[tokio::test]
async fn password_reset_replaces_credentials() {
    let app = TestApp::new();
    app.member("lee@example.com").await;

    let requested = app
        .send(json_request(
            "POST",
            "/api/auth/reset-password",
            None,
            &json!({ "email": "lee@example.com" }),
        ))
        .await;
    assert_eq!(requested.status(), StatusCode::OK);
    let body = body_json(requested).await;
    let token = body["data"]["resetToken"].as_str().expect("token exposed").to_string();

    let unknown = app
        .send(json_request(
            "POST",
            "/api/auth/reset-password",
            None,
            &json!({ "email": "ghost@example.com" }),
        ))
        .await;
    assert_eq!(unknown.status(), StatusCode::OK);
    assert!(body_json(unknown).await["data"].get("resetToken").is_none());

    let confirmed = app
        .send(json_request(
            "POST",
            "/api/auth/reset-password/confirm",
            None,
            &json!({ "token": token, "password": "new-password" }),
        ))
        .await;
    assert_eq!(confirmed.status(), StatusCode::OK);

    // Tokens are single use
    let replay = app
        .send(json_request(
            "POST",
            "/api/auth/reset-password/confirm",
            None,
            &json!({ "token": token, "password": "another-one" }),
        ))
        .await;
    assert_eq!(replay.status(), StatusCode::BAD_REQUEST);

    let old = app
        .send(json_request(
            "POST",
            "/api/auth/signin",
            None,
            &json!({ "email": "lee@example.com", "password": PASSWORD }),
        ))
        .await;
    assert_eq!(old.status(), StatusCode::UNAUTHORIZED);

    let new = app
        .send(json_request(
            "POST",
            "/api/auth/signin",
            None,
            &json!({ "email": "lee@example.com", "password": "new-password" }),
        ))
        .await;
    assert_eq!(new.status(), StatusCode::OK);
}

#[tokio::test]
async fn sign_in_page_form_starts_a_session() {
    let app = TestApp::new();
    app.member("form@example.com").await;

    let page = app.send(get("/auth/signin", None)).await;
    assert_eq!(page.status(), StatusCode::OK);
    let html = body_text(page).await;
    assert!(html.contains(r#"<form method="post" action="/api/auth/signin">"#));

    let response = app
        .send(form_request(
            "/api/auth/signin",
            &format!("email=form%40example.com&password={PASSWORD}&remember=true"),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response).as_deref(), Some("/dashboard"));
    let header = set_cookie(&response).expect("Set-Cookie");
    assert!(header.contains("Max-Age=2592000"));
    let cookie = cookie_pair(&response).expect("cookie");

    let dashboard = app.send(get("/dashboard", Some(&cookie))).await;
    assert_eq!(dashboard.status(), StatusCode::OK);
}

#[tokio::test]
async fn sign_in_page_form_reports_bad_credentials() {
    let app = TestApp::new();
    app.member("form-bad@example.com").await;

    let response = app
        .send(form_request(
            "/api/auth/signin",
            "email=form-bad%40example.com&password=nope-nope",
        ))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response).as_deref(), Some("/auth/signin?error=credentials"));
    assert!(set_cookie(&response).is_none());

    let page = app.send(get("/auth/signin?error=credentials", None)).await;
    assert!(body_text(page).await.contains("Invalid email or password"));
}

#[tokio::test]
async fn malformed_bodies_get_the_error_envelope() {
    let app = TestApp::new();

    for body in ["{}", "{not json", r#"{"email": 42, "password": "x"}"#] {
        let response = app.send(raw_json_request("/api/auth/signin", body)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(
            response.headers().get("content-type").and_then(|v| v.to_str().ok()),
            Some("application/json"),
        );
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["code"], "INVALID_JSON");
        assert!(json["error"].is_string());
    }

    let response = app
        .send(json_request(
            "POST",
            "/api/auth/signup",
            None,
            &json!({ "name": "  ", "email": "a@b.c..d", "password": "secret1" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["field_errors"]["name"], "This field is required");
    assert_eq!(json["field_errors"]["email"], "Invalid email address");
}
