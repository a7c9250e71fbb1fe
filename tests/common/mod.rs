#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use foodgram::api::{self, AppState};
use foodgram::config::Config;
use foodgram::db::Store;
use foodgram::state::SharedState;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
}

pub fn test_config() -> Config {
    let path = std::env::temp_dir().join(format!("foodgram-test-{}.db", uuid::Uuid::new_v4()));

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}?mode=rwc", path.display());
    config.observability.metrics_enabled = false;
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;
    config.security.argon2_parallelism = 1;
    config
}

/// Builds the full router over a fresh database seeded with tags
/// (1 breakfast, 2 dinner) and ingredients (1 flour g, 2 milk ml, 3 sugar g).
pub async fn spawn_app() -> TestApp {
    spawn_app_with(test_config()).await
}

pub async fn spawn_app_with(config: Config) -> TestApp {
    let store = Store::with_pool_options(&config.general.database_path, 5, 1)
        .await
        .expect("Failed to open test database");

    store.create_tag("Breakfast", "#E26C2D", "breakfast").await.unwrap();
    store.create_tag("Dinner", "#49B64E", "dinner").await.unwrap();
    store.create_ingredient("flour", "g").await.unwrap();
    store.create_ingredient("milk", "ml").await.unwrap();
    store.create_ingredient("sugar", "g").await.unwrap();

    let shared = Arc::new(SharedState::with_store(config, store));
    let state = api::create_app_state(shared, None);

    TestApp {
        router: api::router(state.clone()),
        state,
    }
}

impl TestApp {
    pub async fn send_raw(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Token {token}"));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Sends a request and decodes the JSON envelope (`Value::Null` for an
    /// empty body).
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let response = self.send_raw(method, uri, token, body).await;
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, token, Some(body)).await
    }

    /// Registers `username` and returns `(user_id, token)`.
    pub async fn register_and_login(&self, username: &str) -> (i64, String) {
        let email = format!("{username}@example.com");
        let (status, body) = self
            .post(
                "/api/users/",
                None,
                json!({
                    "email": email,
                    "username": username,
                    "first_name": "Test",
                    "last_name": "Cook",
                    "password": "secret-password",
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
        let id = body["data"]["id"].as_i64().unwrap();

        let (status, body) = self
            .post(
                "/api/auth/token/login/",
                None,
                json!({ "email": email, "password": "secret-password" }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        let token = body["data"]["auth_token"].as_str().unwrap().to_string();

        (id, token)
    }

    /// Creates a recipe and returns its id.
    pub async fn create_recipe(
        &self,
        token: &str,
        name: &str,
        ingredients: &[(i64, i64)],
        tags: &[i64],
    ) -> i64 {
        let (status, body) = self
            .post("/api/recipes/", Some(token), recipe_body(name, ingredients, tags))
            .await;
        assert_eq!(status, StatusCode::CREATED, "create recipe failed: {body}");
        body["data"]["id"].as_i64().unwrap()
    }
}

pub fn recipe_body(name: &str, ingredients: &[(i64, i64)], tags: &[i64]) -> Value {
    json!({
        "name": name,
        "text": "Mix and bake.",
        "cooking_time": 30,
        "ingredients": ingredients
            .iter()
            .map(|(id, amount)| json!({ "id": id, "amount": amount }))
            .collect::<Vec<_>>(),
        "tags": tags,
    })
}
