mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{body_json, cookie_pair, get, json_request, location, TestApp};
use productiveflow::database::models::Role;
use productiveflow::database::Directory;

#[tokio::test]
async fn creating_an_organization_unlocks_the_dashboard() {
    let app = TestApp::new();
    let user = app.user("mia@example.com").await;
    let cookie = app.sign_in("mia@example.com").await;

    let before = app.send(get("/api/organizations", Some(&cookie))).await;
    assert_eq!(before.status(), StatusCode::OK);
    assert_eq!(body_json(before).await["data"], serde_json::Value::Null);

    let created = app
        .send(json_request(
            "POST",
            "/api/organizations",
            Some(&cookie),
            &json!({ "name": "Mia Co" }),
        ))
        .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let refreshed = cookie_pair(&created).expect("reissued cookie");
    let body = body_json(created).await;
    assert_eq!(body["data"]["name"], "Mia Co");

    let stored = app
        .directory
        .find_user_by_id(user.id)
        .await
        .expect("lookup")
        .expect("user");
    assert_eq!(stored.role, Role::Admin);
    assert_eq!(
        stored.org_id.map(|id| id.to_string()),
        body["data"]["id"].as_str().map(str::to_string)
    );

    let dashboard = app.send(get("/dashboard", Some(&refreshed))).await;
    assert_eq!(dashboard.status(), StatusCode::OK);

    // The old cookie is stale but identity is re-read on every request
    let stale = app.send(get("/dashboard", Some(&cookie))).await;
    assert_eq!(stale.status(), StatusCode::OK);

    let again = app
        .send(json_request(
            "POST",
            "/api/organizations",
            Some(&refreshed),
            &json!({ "name": "Second" }),
        ))
        .await;
    assert_eq!(again.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn organization_name_is_required() {
    let app = TestApp::new();
    app.user("noah@example.com").await;
    let cookie = app.sign_in("noah@example.com").await;

    let response = app
        .send(json_request("POST", "/api/organizations", Some(&cookie), &json!({ "name": "   " })))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let dashboard = app.send(get("/dashboard", Some(&cookie))).await;
    assert_eq!(dashboard.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&dashboard).as_deref(), Some("/dashboard/organization/new"));
}

#[tokio::test]
async fn anonymous_organization_creation_is_rejected() {
    let app = TestApp::new();

    let response = app
        .send(json_request("POST", "/api/organizations", None, &json!({ "name": "Nope" })))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
