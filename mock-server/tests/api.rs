use axum::http::{self, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use mock_server::{app, app_with_db, Crop, SharedDb};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<String> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(http::header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(body.to_string()).unwrap()
}

fn get_request(uri: &str, token: Option<&str>) -> Request<String> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header(http::header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(String::new()).unwrap()
}

/// Register `ravi` and return the access token.
async fn register(app: &Router) -> String {
    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/register/",
            None,
            json!({
                "username": "ravi",
                "email": "ravi@example.com",
                "password": "harvest-2024",
                "password2": "harvest-2024",
                "first_name": "Ravi",
                "last_name": "Kumar",
                "location": "Nashik",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = body_json(resp).await;
    body["access"].as_str().unwrap().to_string()
}

// --- auth ---

#[tokio::test]
async fn register_returns_token_pair_and_user() {
    let app = app();
    let resp = app
        .oneshot(json_request(
            "POST",
            "/api/auth/register/",
            None,
            json!({ "username": "asha", "password": "pw", "password2": "pw" }),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = body_json(resp).await;
    assert!(body["access"].is_string());
    assert!(body["refresh"].is_string());
    assert_eq!(body["user"]["username"], "asha");
    assert_eq!(body["message"], "User registered successfully");
}

#[tokio::test]
async fn register_rejects_mismatched_passwords() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/api/auth/register/",
            None,
            json!({ "username": "asha", "password": "a", "password2": "b" }),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = body_json(resp).await;
    assert_eq!(body["password"][0], "Password fields didn't match.");
}

#[tokio::test]
async fn login_with_bad_password_is_401() {
    let app = app();
    register(&app).await;
    let resp = app
        .oneshot(json_request(
            "POST",
            "/api/auth/login/",
            None,
            json!({ "username": "ravi", "password": "nope" }),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn current_user_requires_token() {
    let resp = app().oneshot(get_request("/api/auth/user/", None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = app()
        .oneshot(get_request("/api/auth/user/", Some("forged")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn current_user_returns_user_and_profile() {
    let app = app();
    let token = register(&app).await;
    let resp = app.oneshot(get_request("/api/auth/user/", Some(&token))).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = body_json(resp).await;
    assert_eq!(body["user"]["first_name"], "Ravi");
    assert_eq!(body["profile"]["location"], "Nashik");
}

#[tokio::test]
async fn expired_access_token_is_401_but_refresh_still_works() {
    let db = SharedDb::default();
    let app = app_with_db(db.clone());
    let login = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/register/",
            None,
            json!({ "username": "ravi", "password": "pw", "password2": "pw" }),
        ))
        .await
        .unwrap();
    let tokens: Value = body_json(login).await;
    let access = tokens["access"].as_str().unwrap();
    let refresh = tokens["refresh"].as_str().unwrap();

    db.write().await.expire_access_tokens();

    let resp = app.clone().oneshot(get_request("/api/crops/", Some(access))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = app
        .oneshot(json_request("POST", "/api/auth/refresh/", None, json!({ "refresh": refresh })))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = body_json(resp).await;
    assert!(body["access"].is_string());
}

// --- profile ---

#[tokio::test]
async fn patch_profile_updates_only_given_fields() {
    let app = app();
    let token = register(&app).await;
    let resp = app
        .oneshot(json_request(
            "PATCH",
            "/api/profile/",
            Some(&token),
            json!({ "land_size": 4.5, "experience_years": 12 }),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = body_json(resp).await;
    assert_eq!(body["land_size"], "4.50");
    assert_eq!(body["experience_years"], 12);
    assert_eq!(body["location"], "Nashik");
}

// --- crops ---

#[tokio::test]
async fn create_crop_requires_fields() {
    let app = app();
    let token = register(&app).await;
    let resp = app
        .oneshot(json_request("POST", "/api/crops/", Some(&token), json!({ "name": "Wheat" })))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = body_json(resp).await;
    assert_eq!(body["area"][0], "This field is required.");
}

#[tokio::test]
async fn crop_crud_lifecycle() {
    let app = app();
    let token = register(&app).await;

    // create
    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/crops/",
            Some(&token),
            json!({
                "name": "Wheat",
                "area": "2.5",
                "planting_date": "2024-11-01",
                "expected_harvest_date": "2025-03-15",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Crop = body_json(resp).await;
    assert_eq!(created.area, "2.50");
    assert_eq!(created.status, "planning");
    assert_eq!(created.farmer_name, "ravi");
    let id = created.id;

    // partial update
    let resp = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/api/crops/{id}/"),
            Some(&token),
            json!({ "status": "growing" }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Crop = body_json(resp).await;
    assert_eq!(updated.status, "growing");
    assert_eq!(updated.name, "Wheat");

    // list
    let resp = app.clone().oneshot(get_request("/api/crops/", Some(&token))).await.unwrap();
    let crops: Vec<Crop> = body_json(resp).await;
    assert_eq!(crops, vec![updated]);

    // delete
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/crops/{id}/"))
                .header(http::header::AUTHORIZATION, format!("Bearer {token}"))
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    // gone after delete
    let resp = app
        .oneshot(get_request(&format!("/api/crops/{id}/"), Some(&token)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn crop_rejects_unknown_status() {
    let app = app();
    let token = register(&app).await;
    let resp = app
        .oneshot(json_request(
            "POST",
            "/api/crops/",
            Some(&token),
            json!({
                "name": "Rice",
                "area": 1,
                "planting_date": "2025-06-15",
                "expected_harvest_date": "2025-10-01",
                "status": "fallow",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- reference data ---

#[tokio::test]
async fn weather_defaults_to_delhi() {
    let app = app();
    let token = register(&app).await;
    let resp = app.oneshot(get_request("/api/weather/", Some(&token))).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = body_json(resp).await;
    assert_eq!(body["location"], "Delhi");
    assert!(body["current"]["temperature"].is_number());
}

#[tokio::test]
async fn weather_decodes_location() {
    let app = app();
    let token = register(&app).await;
    let resp = app
        .oneshot(get_request("/api/weather/?location=New%20Delhi", Some(&token)))
        .await
        .unwrap();
    let body: Value = body_json(resp).await;
    assert_eq!(body["location"], "New Delhi");
}

#[tokio::test]
async fn suggestions_single_all_and_unknown() {
    let app = app();
    let token = register(&app).await;

    let resp = app
        .clone()
        .oneshot(get_request("/api/suggestions/?crop=Wheat", Some(&token)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = body_json(resp).await;
    assert_eq!(body["crop"]["best_season"], "Rabi (Winter)");

    let resp = app
        .clone()
        .oneshot(get_request("/api/suggestions/", Some(&token)))
        .await
        .unwrap();
    let body: Value = body_json(resp).await;
    assert_eq!(body["crops"].as_object().unwrap().len(), 5);

    let resp = app
        .oneshot(get_request("/api/suggestions/?crop=barley", Some(&token)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = body_json(resp).await;
    assert_eq!(body["message"], "No suggestions available for barley");
}

#[tokio::test]
async fn chatbot_requires_message() {
    let app = app();
    let token = register(&app).await;

    let resp = app
        .clone()
        .oneshot(json_request("POST", "/api/chatbot/", Some(&token), json!({ "message": "" })))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = app
        .oneshot(json_request(
            "POST",
            "/api/chatbot/",
            Some(&token),
            json!({ "message": "Best fertilizer for tomato?" }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = body_json(resp).await;
    assert!(body["response"].as_str().unwrap().starts_with("Apply fertilizers"));
    assert!(body["note"].is_string());
}
