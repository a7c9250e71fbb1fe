mod common;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use common::spawn_app;
use foodgram::models::Viewer;
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn test_health_endpoints() {
    let app = spawn_app().await;

    let (status, body) = app.get("/api/system/health/live", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "alive");

    let (status, body) = app.get("/api/system/health/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["ready"], true);
    assert_eq!(body["data"]["checks"]["database"], true);
}

#[tokio::test]
async fn test_register_login_and_logout() {
    let app = spawn_app().await;

    let (status, body) = app
        .post(
            "/api/users/",
            None,
            json!({
                "email": "Anna@Example.com",
                "username": "anna",
                "first_name": "Anna",
                "last_name": "Smith",
                "password": "secret-password",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["email"], "anna@example.com");
    assert_eq!(body["data"]["username"], "anna");
    assert!(body["data"].get("is_subscribed").is_none());
    assert!(body["data"].get("password").is_none());

    let (status, body) = app
        .post(
            "/api/auth/token/login/",
            None,
            json!({ "email": "anna@example.com", "password": "secret-password" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["data"]["auth_token"].as_str().unwrap().to_string();
    assert_eq!(token.len(), 40);

    // A second login hands back the same token
    let (_, body) = app
        .post(
            "/api/auth/token/login/",
            None,
            json!({ "email": "anna@example.com", "password": "secret-password" }),
        )
        .await;
    assert_eq!(body["data"]["auth_token"], token.as_str());

    let (status, body) = app.get("/api/users/me/", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], "anna");
    assert_eq!(body["data"]["is_subscribed"], false);

    let (status, _) = app
        .send(Method::POST, "/api/auth/token/logout/", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = app.get("/api/users/me/", Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_register_rejects_duplicates_and_bad_fields() {
    let app = spawn_app().await;
    app.register_and_login("anna").await;

    let (status, body) = app
        .post(
            "/api/users/",
            None,
            json!({
                "email": "ANNA@example.com",
                "username": "someone",
                "first_name": "A",
                "last_name": "B",
                "password": "secret-password",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fields"]["email"].is_array());

    let (status, body) = app
        .post(
            "/api/users/",
            None,
            json!({
                "email": "other@example.com",
                "username": "anna",
                "first_name": "A",
                "last_name": "B",
                "password": "secret-password",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fields"]["username"].is_array());

    let (status, body) = app
        .post(
            "/api/users/",
            None,
            json!({ "email": "bad", "username": "x y", "password": "short" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    for field in ["email", "username", "first_name", "last_name", "password"] {
        assert!(body["fields"][field].is_array(), "missing error for {field}");
    }
}

#[tokio::test]
async fn test_login_with_wrong_password() {
    let app = spawn_app().await;
    app.register_and_login("anna").await;

    let (status, body) = app
        .post(
            "/api/auth/token/login/",
            None,
            json!({ "email": "anna@example.com", "password": "not-the-password" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, _) = app
        .post(
            "/api/auth/token/login/",
            None,
            json!({ "email": "nobody@example.com", "password": "whatever-it-is" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_token_is_rejected_on_public_routes() {
    let app = spawn_app().await;

    let (status, _) = app.get("/api/tags/", Some("deadbeef")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.get("/api/tags/", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_bearer_prefix_is_accepted() {
    let app = spawn_app().await;
    let (_, token) = app.register_and_login("anna").await;

    let request = Request::builder()
        .uri("/api/users/me/")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_set_password() {
    let app = spawn_app().await;
    let (_, token) = app.register_and_login("anna").await;

    let (status, body) = app
        .post(
            "/api/users/set_password/",
            Some(&token),
            json!({ "current_password": "wrong-password", "new_password": "brand-new-secret" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fields"]["current_password"].is_array());

    let (status, _) = app
        .post(
            "/api/users/set_password/",
            Some(&token),
            json!({ "current_password": "secret-password", "new_password": "brand-new-secret" }),
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app
        .post(
            "/api/auth/token/login/",
            None,
            json!({ "email": "anna@example.com", "password": "brand-new-secret" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .post(
            "/api/users/set_password/",
            None,
            json!({ "current_password": "x", "new_password": "y" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_user_profiles() {
    let app = spawn_app().await;
    let (anna, _) = app.register_and_login("anna").await;
    app.register_and_login("boris").await;

    let (status, body) = app.get("/api/users/", None).await;
    assert_eq!(status, StatusCode::OK);
    let users = body["data"].as_array().unwrap();
    assert_eq!(users.len(), 2);
    assert_eq!(users[0]["username"], "anna");
    assert_eq!(users[0]["is_subscribed"], false);

    let (status, body) = app.get(&format!("/api/users/{anna}/"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], anna);

    let (status, _) = app.get("/api/users/999/", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.get("/api/users/me/", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_tags_are_read_only_reference_data() {
    let app = spawn_app().await;

    let (status, body) = app.get("/api/tags/", None).await;
    assert_eq!(status, StatusCode::OK);
    let tags = body["data"].as_array().unwrap();
    assert_eq!(tags.len(), 2);
    assert_eq!(tags[0]["slug"], "breakfast");
    assert_eq!(tags[0]["color"], "#E26C2D");

    let (status, body) = app.get("/api/tags/2/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Dinner");

    let (status, _) = app.get("/api/tags/999/", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .post("/api/tags/", None, json!({ "name": "x", "color": "#000", "slug": "x" }))
        .await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_ingredient_prefix_search() {
    let app = spawn_app().await;

    let (status, body) = app.get("/api/ingredients/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 3);

    let (status, body) = app.get("/api/ingredients/?name=FL", None).await;
    assert_eq!(status, StatusCode::OK);
    let found = body["data"].as_array().unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["name"], "flour");
    assert_eq!(found[0]["measurement_unit"], "g");

    let (_, body) = app.get("/api/ingredients/?name=ilk", None).await;
    assert!(body["data"].as_array().unwrap().is_empty());

    let (status, body) = app.get("/api/ingredients/2/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "milk");

    let (status, _) = app.get("/api/ingredients/0/", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_json_is_a_client_error() {
    let app = spawn_app().await;

    let response = app
        .send_raw(Method::POST, "/api/auth/token/login/", None, None)
        .await;
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_ingredient_search_folds_case_in_any_script() {
    let app = spawn_app().await;
    app.state.store().create_ingredient("Мука", "г").await.unwrap();
    app.state.store().create_ingredient("100% juice", "ml").await.unwrap();

    let encoded: String = url::form_urlencoded::byte_serialize("мУ".as_bytes()).collect();
    let (status, body) = app.get(&format!("/api/ingredients/?name={encoded}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let found = body["data"].as_array().unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["name"], "Мука");
    assert!(found[0].get("name_lower").is_none());

    // Wildcards in the prefix are matched literally
    let (_, body) = app.get("/api/ingredients/?name=%25", None).await;
    assert!(body["data"].as_array().unwrap().is_empty());

    let (_, body) = app.get("/api/ingredients/?name=_", None).await;
    assert!(body["data"].as_array().unwrap().is_empty());

    let (_, body) = app.get("/api/ingredients/?name=100%25", None).await;
    let found = body["data"].as_array().unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["name"], "100% juice");
}

#[tokio::test]
async fn test_non_numeric_ids_use_the_error_envelope() {
    let app = spawn_app().await;
    let (_, token) = app.register_and_login("anna").await;

    for uri in [
        "/api/recipes/abc/",
        "/api/tags/first/",
        "/api/ingredients/99999999999/",
        "/api/users/x/",
    ] {
        let (status, body) = app.get(uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(body["success"], false, "{uri}");
        assert!(body["error"].is_string(), "{uri}");
    }

    let (status, body) = app
        .send(Method::POST, "/api/recipes/abc/favorite/", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_responses_carry_the_resolved_viewer() {
    let app = spawn_app().await;
    let (anna_id, token) = app.register_and_login("anna").await;

    let response = app
        .send_raw(Method::GET, "/api/tags/", Some(&token), None)
        .await;
    let viewer = response.extensions().get::<Viewer>().unwrap();
    assert_eq!(viewer.id().map(i64::from), Some(anna_id));

    let response = app.send_raw(Method::GET, "/api/tags/", None, None).await;
    assert_eq!(
        response.extensions().get::<Viewer>(),
        Some(&Viewer::Anonymous)
    );

    let response = app
        .send_raw(Method::GET, "/api/tags/", Some("deadbeef"), None)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.extensions().get::<Viewer>().is_none());
}

async fn allow_origin_header(app: &common::TestApp) -> Option<String> {
    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/tags/")
        .header(header::ORIGIN, "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .map(|v| v.to_str().unwrap().to_string())
}

#[tokio::test]
async fn test_cors_follows_configured_origins() {
    let app = spawn_app().await;
    assert_eq!(
        allow_origin_header(&app).await.as_deref(),
        Some("http://localhost:3000")
    );

    let mut config = common::test_config();
    config.server.cors_allowed_origins = Vec::new();
    let app = common::spawn_app_with(config).await;
    assert_eq!(allow_origin_header(&app).await, None);

    let mut config = common::test_config();
    config.server.cors_allowed_origins = vec!["*".to_string()];
    let app = common::spawn_app_with(config).await;
    assert_eq!(allow_origin_header(&app).await.as_deref(), Some("*"));
}
