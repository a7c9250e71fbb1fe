mod common;

use axum::http::{Method, StatusCode, header};
use common::{recipe_body, spawn_app};
use http_body_util::BodyExt;
use serde_json::{Value, json};

const FLOUR: i64 = 1;
const MILK: i64 = 2;
const SUGAR: i64 = 3;
const BREAKFAST: i64 = 1;
const DINNER: i64 = 2;

fn ingredient_ids(recipe: &Value) -> Vec<i64> {
    recipe["ingredients"]
        .as_array()
        .unwrap()
        .iter()
        .map(|line| line["id"].as_i64().unwrap())
        .collect()
}

#[tokio::test]
async fn test_create_and_read_back_recipe() {
    let app = spawn_app().await;
    let (anna, token) = app.register_and_login("anna").await;

    let (status, body) = app
        .post(
            "/api/recipes/",
            Some(&token),
            recipe_body("Pancakes", &[(FLOUR, 200), (MILK, 300)], &[BREAKFAST]),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let recipe = &body["data"];
    assert_eq!(recipe["name"], "Pancakes");
    assert_eq!(recipe["cooking_time"], 30);
    assert_eq!(recipe["author"]["id"], anna);
    assert_eq!(recipe["is_favorited"], false);

    let id = recipe["id"].as_i64().unwrap();
    let (status, body) = app.get(&format!("/api/recipes/{id}/"), None).await;
    assert_eq!(status, StatusCode::OK);
    let recipe = &body["data"];

    let lines = recipe["ingredients"].as_array().unwrap();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["name"], "flour");
    assert_eq!(lines[0]["measurement_unit"], "g");
    assert_eq!(lines[0]["amount"], 200);
    assert_eq!(lines[1]["name"], "milk");
    assert_eq!(lines[1]["amount"], 300);

    let tags = recipe["tags"].as_array().unwrap();
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0]["slug"], "breakfast");
}

#[tokio::test]
async fn test_create_requires_authentication() {
    let app = spawn_app().await;

    let (status, _) = app
        .post("/api/recipes/", None, recipe_body("Toast", &[(FLOUR, 1)], &[BREAKFAST]))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_invalid_recipe_writes_nothing() {
    let app = spawn_app().await;
    let (_, token) = app.register_and_login("anna").await;

    let cases = [
        (recipe_body("Empty", &[], &[BREAKFAST]), "ingredients"),
        (recipe_body("No tags", &[(FLOUR, 10)], &[]), "tags"),
        (
            recipe_body("Twice", &[(FLOUR, 10), (FLOUR, 20)], &[BREAKFAST]),
            "ingredients",
        ),
        (recipe_body("Zero", &[(FLOUR, 0)], &[BREAKFAST]), "ingredients"),
        (recipe_body("Ghost", &[(999, 10)], &[BREAKFAST]), "ingredients"),
        (recipe_body("Ghost tag", &[(FLOUR, 10)], &[999]), "tags"),
    ];

    for (body, field) in cases {
        let (status, response) = app.post("/api/recipes/", Some(&token), body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{response}");
        assert!(response["fields"][field].is_array(), "{response}");
    }

    let (status, body) = app
        .post(
            "/api/recipes/",
            Some(&token),
            json!({ "name": "", "text": "x", "cooking_time": 0 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    for field in ["name", "cooking_time", "ingredients", "tags"] {
        assert!(body["fields"][field].is_array(), "missing error for {field}");
    }

    let (_, body) = app.get("/api/recipes/", None).await;
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_update_replaces_ingredients_and_tags() {
    let app = spawn_app().await;
    let (_, token) = app.register_and_login("anna").await;
    let id = app
        .create_recipe(&token, "Pancakes", &[(FLOUR, 200), (MILK, 300)], &[BREAKFAST])
        .await;

    let (status, body) = app
        .send(
            Method::PATCH,
            &format!("/api/recipes/{id}/"),
            Some(&token),
            Some(json!({
                "name": "Sweet pancakes",
                "ingredients": [{ "id": SUGAR, "amount": 50 }],
                "tags": [DINNER],
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["name"], "Sweet pancakes");

    let (_, body) = app.get(&format!("/api/recipes/{id}/"), None).await;
    let recipe = &body["data"];
    assert_eq!(recipe["name"], "Sweet pancakes");
    assert_eq!(recipe["text"], "Mix and bake.");
    assert_eq!(ingredient_ids(recipe), vec![SUGAR]);
    assert_eq!(recipe["ingredients"][0]["amount"], 50);
    assert_eq!(recipe["tags"].as_array().unwrap().len(), 1);
    assert_eq!(recipe["tags"][0]["id"], DINNER);
}

#[tokio::test]
async fn test_update_with_unknown_reference_changes_nothing() {
    let app = spawn_app().await;
    let (_, token) = app.register_and_login("anna").await;
    let id = app
        .create_recipe(&token, "Pancakes", &[(FLOUR, 200), (MILK, 300)], &[BREAKFAST])
        .await;
    let uri = format!("/api/recipes/{id}/");

    let patches = [
        json!({
            "name": "Renamed",
            "ingredients": [{ "id": 999, "amount": 5 }],
            "tags": [DINNER],
        }),
        json!({
            "name": "Renamed",
            "ingredients": [{ "id": SUGAR, "amount": 5 }],
            "tags": [999],
        }),
    ];

    for patch in patches {
        let (status, body) = app
            .send(Method::PATCH, &uri, Some(&token), Some(patch))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

        let (_, body) = app.get(&uri, None).await;
        let recipe = &body["data"];
        assert_eq!(recipe["name"], "Pancakes");
        assert_eq!(ingredient_ids(recipe), vec![FLOUR, MILK]);
        assert_eq!(recipe["ingredients"][0]["amount"], 200);
        assert_eq!(recipe["tags"].as_array().unwrap().len(), 1);
        assert_eq!(recipe["tags"][0]["id"], BREAKFAST);
    }
}

#[tokio::test]
async fn test_shopping_cart_toggle() {
    let app = spawn_app().await;
    let (_, anna) = app.register_and_login("anna").await;
    let (_, boris) = app.register_and_login("boris").await;
    let id = app
        .create_recipe(&anna, "Pancakes", &[(FLOUR, 200)], &[BREAKFAST])
        .await;
    let cart = format!("/api/recipes/{id}/shopping_cart/");

    let (status, _) = app.send(Method::DELETE, &cart, Some(&anna), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app.send(Method::POST, &cart, Some(&anna), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["id"], id);

    let (status, body) = app.send(Method::POST, &cart, Some(&anna), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (_, body) = app.get(&format!("/api/recipes/{id}/"), Some(&anna)).await;
    assert_eq!(body["data"]["is_in_shopping_cart"], true);
    assert_eq!(body["data"]["is_favorited"], false);

    let (status, _) = app.send(Method::DELETE, &cart, Some(&boris), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.send(Method::DELETE, &cart, Some(&anna), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.send(Method::DELETE, &cart, Some(&anna), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(Method::DELETE, "/api/recipes/999/shopping_cart/", Some(&anna), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_and_delete_permissions() {
    let app = spawn_app().await;
    let (_, anna) = app.register_and_login("anna").await;
    let (_, boris) = app.register_and_login("boris").await;
    let id = app
        .create_recipe(&anna, "Pancakes", &[(FLOUR, 200)], &[BREAKFAST])
        .await;
    let uri = format!("/api/recipes/{id}/");
    let patch = json!({
        "name": "Mine now",
        "ingredients": [{ "id": FLOUR, "amount": 1 }],
        "tags": [BREAKFAST],
    });

    let (status, _) = app
        .send(Method::PATCH, &uri, Some(&boris), Some(patch.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.send(Method::PATCH, &uri, None, Some(patch.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .send(Method::PATCH, "/api/recipes/999/", Some(&anna), Some(patch))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.send(Method::DELETE, &uri, Some(&boris), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, body) = app.get(&uri, None).await;
    assert_eq!(body["data"]["name"], "Pancakes");

    let (status, _) = app.send(Method::DELETE, &uri, Some(&anna), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.get(&uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_favorite_toggle_and_viewer_flags() {
    let app = spawn_app().await;
    let (_, anna) = app.register_and_login("anna").await;
    let (_, boris) = app.register_and_login("boris").await;
    let id = app
        .create_recipe(&anna, "Pancakes", &[(FLOUR, 200)], &[BREAKFAST])
        .await;
    let favorite = format!("/api/recipes/{id}/favorite/");

    let (status, body) = app.send(Method::POST, &favorite, Some(&anna), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["id"], id);
    assert_eq!(body["data"]["name"], "Pancakes");

    let (status, _) = app.send(Method::POST, &favorite, Some(&anna), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = app.get(&format!("/api/recipes/{id}/"), Some(&anna)).await;
    assert_eq!(body["data"]["is_favorited"], true);
    assert_eq!(body["data"]["is_in_shopping_cart"], false);

    let (_, body) = app.get(&format!("/api/recipes/{id}/"), Some(&boris)).await;
    assert_eq!(body["data"]["is_favorited"], false);

    let (_, body) = app.get("/api/recipes/", None).await;
    for recipe in body["data"].as_array().unwrap() {
        assert_eq!(recipe["is_favorited"], false);
        assert_eq!(recipe["is_in_shopping_cart"], false);
    }

    let (status, _) = app.send(Method::DELETE, &favorite, Some(&boris), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.send(Method::DELETE, &favorite, Some(&anna), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.send(Method::DELETE, &favorite, Some(&anna), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(Method::POST, "/api/recipes/999/favorite/", Some(&anna), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.send(Method::POST, &favorite, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_list_filters() {
    let app = spawn_app().await;
    let (anna_id, anna) = app.register_and_login("anna").await;
    let (_, boris) = app.register_and_login("boris").await;

    let pancakes = app
        .create_recipe(&anna, "Pancakes", &[(FLOUR, 200)], &[BREAKFAST])
        .await;
    let stew = app
        .create_recipe(&boris, "Stew", &[(MILK, 100)], &[DINNER])
        .await;
    let porridge = app
        .create_recipe(&boris, "Porridge", &[(MILK, 300)], &[BREAKFAST, DINNER])
        .await;

    let ids = |body: Value| -> Vec<i64> {
        body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["id"].as_i64().unwrap())
            .collect()
    };

    let (_, body) = app.get("/api/recipes/", None).await;
    assert_eq!(ids(body), vec![porridge, stew, pancakes]);

    let (_, body) = app.get(&format!("/api/recipes/?author={anna_id}"), None).await;
    assert_eq!(ids(body), vec![pancakes]);

    let (_, body) = app.get("/api/recipes/?tags=breakfast", None).await;
    assert_eq!(ids(body), vec![porridge, pancakes]);

    let (_, body) = app
        .get("/api/recipes/?tags=breakfast&tags=dinner", None)
        .await;
    assert_eq!(ids(body), vec![porridge, stew, pancakes]);

    app.send(
        Method::POST,
        &format!("/api/recipes/{stew}/favorite/"),
        Some(&anna),
        None,
    )
    .await;
    app.send(
        Method::POST,
        &format!("/api/recipes/{porridge}/shopping_cart/"),
        Some(&anna),
        None,
    )
    .await;

    let (_, body) = app.get("/api/recipes/?is_favorited=1", Some(&anna)).await;
    assert_eq!(ids(body), vec![stew]);

    let (_, body) = app
        .get("/api/recipes/?is_in_shopping_cart=true", Some(&anna))
        .await;
    assert_eq!(ids(body), vec![porridge]);

    // Viewer-relative filters are ignored for anonymous requests
    let (_, body) = app.get("/api/recipes/?is_favorited=1", None).await;
    assert_eq!(ids(body).len(), 3);

    let (status, body) = app.get("/api/recipes/?is_favorited=maybe", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fields"]["is_favorited"].is_array());
}

async fn download(app: &common::TestApp, token: &str) -> (StatusCode, String, String) {
    let response = app
        .send_raw(
            Method::GET,
            "/api/recipes/download_shopping_cart/",
            Some(token),
            None,
        )
        .await;
    let status = response.status();
    let disposition = response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .map(|v| v.to_str().unwrap().to_string())
        .unwrap_or_default();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, disposition, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn test_shopping_list_aggregates_per_user() {
    let app = spawn_app().await;
    let (_, anna) = app.register_and_login("anna").await;
    let (_, boris) = app.register_and_login("boris").await;

    let (status, disposition, body) = download(&app, &anna).await;
    assert_eq!(status, StatusCode::OK);
    assert!(disposition.contains("foodgram_shopping_cart.txt"));
    assert!(body.is_empty());

    let first = app
        .create_recipe(&anna, "Bread", &[(FLOUR, 200), (MILK, 50)], &[BREAKFAST])
        .await;
    let second = app
        .create_recipe(&anna, "Cake", &[(FLOUR, 300), (SUGAR, 100)], &[BREAKFAST])
        .await;

    for id in [first, second] {
        let (status, _) = app
            .send(
                Method::POST,
                &format!("/api/recipes/{id}/shopping_cart/"),
                Some(&anna),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, _) = app
        .send(
            Method::POST,
            &format!("/api/recipes/{first}/shopping_cart/"),
            Some(&boris),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, _, body) = download(&app, &anna).await;
    assert_eq!(body, "flour (g) - 500\nmilk (ml) - 50\nsugar (g) - 100");

    let (_, _, body) = download(&app, &boris).await;
    assert_eq!(body, "flour (g) - 200\nmilk (ml) - 50");

    let (status, _) = app
        .send(
            Method::DELETE,
            &format!("/api/recipes/{second}/shopping_cart/"),
            Some(&anna),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, _, body) = download(&app, &anna).await;
    assert_eq!(body, "flour (g) - 200\nmilk (ml) - 50");

    let (status, _) = app
        .get("/api/recipes/download_shopping_cart/", None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_deleting_recipe_clears_collections() {
    let app = spawn_app().await;
    let (_, anna) = app.register_and_login("anna").await;
    let id = app
        .create_recipe(&anna, "Bread", &[(FLOUR, 200)], &[BREAKFAST])
        .await;

    app.send(
        Method::POST,
        &format!("/api/recipes/{id}/shopping_cart/"),
        Some(&anna),
        None,
    )
    .await;
    app.send(
        Method::POST,
        &format!("/api/recipes/{id}/favorite/"),
        Some(&anna),
        None,
    )
    .await;

    let (status, _) = app
        .send(Method::DELETE, &format!("/api/recipes/{id}/"), Some(&anna), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, _, body) = download(&app, &anna).await;
    assert!(body.is_empty());

    let (_, body) = app.get("/api/recipes/?is_favorited=1", Some(&anna)).await;
    assert!(body["data"].as_array().unwrap().is_empty());
}
