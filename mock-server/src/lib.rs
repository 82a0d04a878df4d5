//! In-memory stand-in for the farming-assistant backend.
//!
//! Serves the same routes under `/api` with the same status codes and body
//! shapes as the real service, so clients can be exercised end to end.
//! Weather is canned and the chatbot only has the keyword fallback.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};
use uuid::Uuid;

mod catalog;

pub use catalog::{chatbot_reply, crop_suggestions};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    pub id: i64,
    pub user: User,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub land_size: Option<String>,
    pub experience_years: Option<i32>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Crop {
    pub id: i64,
    pub farmer: i64,
    pub farmer_name: String,
    pub name: String,
    pub variety: Option<String>,
    pub area: String,
    pub planting_date: String,
    pub expected_harvest_date: String,
    pub status: String,
    pub notes: Option<String>,
}

struct Account {
    password: String,
    profile: Profile,
}

#[derive(Default)]
pub struct Db {
    accounts: HashMap<String, Account>,
    access: HashMap<String, String>,
    refresh: HashMap<String, String>,
    crops: BTreeMap<i64, Crop>,
    next_id: i64,
}

impl Db {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn issue_tokens(&mut self, username: &str) -> (String, String) {
        let access = Uuid::new_v4().to_string();
        let refresh = Uuid::new_v4().to_string();
        self.access.insert(access.clone(), username.to_string());
        self.refresh.insert(refresh.clone(), username.to_string());
        (access, refresh)
    }

    /// Invalidate every issued access token, as if they had all expired.
    /// Refresh tokens stay valid.
    pub fn expire_access_tokens(&mut self) {
        self.access.clear();
    }
}

pub type SharedDb = Arc<RwLock<Db>>;

type Failure = (StatusCode, Json<Value>);

const STATUS_CHOICES: [&str; 4] = ["planning", "planted", "growing", "harvested"];

pub fn app() -> Router {
    app_with_db(SharedDb::default())
}

/// Router over a caller-owned store, so tests can reach into it.
pub fn app_with_db(db: SharedDb) -> Router {
    let api = Router::new()
        .route("/auth/register/", post(register))
        .route("/auth/login/", post(login))
        .route("/auth/refresh/", post(refresh))
        .route("/auth/user/", get(current_user))
        .route("/profile/", get(get_profile).patch(update_profile))
        .route("/crops/", get(list_crops).post(create_crop))
        .route("/crops/{id}/", get(get_crop).patch(update_crop).delete(delete_crop))
        .route("/weather/", get(weather))
        .route("/suggestions/", get(suggestions))
        .route("/chatbot/", post(chatbot));
    Router::new().nest("/api", api).with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with_db(listener, SharedDb::default()).await
}

pub async fn run_with_db(listener: TcpListener, db: SharedDb) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "mock backend listening");
    }
    axum::serve(listener, app_with_db(db)).await
}

fn failure(status: StatusCode, body: Value) -> Failure {
    (status, Json(body))
}

fn not_authenticated() -> Failure {
    failure(
        StatusCode::UNAUTHORIZED,
        json!({ "detail": "Authentication credentials were not provided." }),
    )
}

fn required(field: &str) -> Failure {
    failure(StatusCode::BAD_REQUEST, json!({ field: ["This field is required."] }))
}

/// Resolve the bearer token to a username.
async fn authenticate(db: &SharedDb, headers: &HeaderMap) -> Result<String, Failure> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(not_authenticated)?;
    let db = db.read().await;
    db.access.get(token).cloned().ok_or_else(|| {
        debug!("rejected unknown access token");
        failure(
            StatusCode::UNAUTHORIZED,
            json!({ "detail": "Given token not valid for any token type", "code": "token_not_valid" }),
        )
    })
}

fn text(input: &Value, field: &str) -> Option<String> {
    input.get(field).and_then(Value::as_str).map(str::to_string)
}

fn non_empty(input: &Value, field: &str) -> Option<String> {
    text(input, field).filter(|s| !s.trim().is_empty())
}

// --- auth ---

async fn register(State(db): State<SharedDb>, Json(input): Json<Value>) -> Result<(StatusCode, Json<Value>), Failure> {
    let username = non_empty(&input, "username").ok_or_else(|| required("username"))?;
    let password = non_empty(&input, "password").ok_or_else(|| required("password"))?;
    let password2 = text(&input, "password2").ok_or_else(|| required("password2"))?;
    if password != password2 {
        return Err(failure(
            StatusCode::BAD_REQUEST,
            json!({ "password": ["Password fields didn't match."] }),
        ));
    }

    let mut db = db.write().await;
    if db.accounts.contains_key(&username) {
        return Err(failure(
            StatusCode::BAD_REQUEST,
            json!({ "username": ["A user with that username already exists."] }),
        ));
    }

    let user = User {
        id: db.next_id(),
        username: username.clone(),
        email: text(&input, "email").unwrap_or_default(),
        first_name: text(&input, "first_name").unwrap_or_default(),
        last_name: text(&input, "last_name").unwrap_or_default(),
    };
    let profile = Profile {
        id: db.next_id(),
        user: user.clone(),
        phone: text(&input, "phone"),
        location: text(&input, "location"),
        land_size: None,
        experience_years: None,
    };
    db.accounts.insert(username.clone(), Account { password, profile });
    let (access, refresh) = db.issue_tokens(&username);
    info!(%username, "registered account");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "user": user,
            "refresh": refresh,
            "access": access,
            "message": "User registered successfully",
        })),
    ))
}

async fn login(State(db): State<SharedDb>, Json(input): Json<Value>) -> Result<Json<Value>, Failure> {
    let username = non_empty(&input, "username").ok_or_else(|| required("username"))?;
    let password = text(&input, "password").ok_or_else(|| required("password"))?;

    let mut db = db.write().await;
    let valid = db
        .accounts
        .get(&username)
        .is_some_and(|account| account.password == password);
    if !valid {
        return Err(failure(
            StatusCode::UNAUTHORIZED,
            json!({ "detail": "No active account found with the given credentials" }),
        ));
    }
    let (access, refresh) = db.issue_tokens(&username);
    Ok(Json(json!({ "refresh": refresh, "access": access })))
}

async fn refresh(State(db): State<SharedDb>, Json(input): Json<Value>) -> Result<Json<Value>, Failure> {
    let token = text(&input, "refresh").ok_or_else(|| required("refresh"))?;
    let mut db = db.write().await;
    let username = db.refresh.get(&token).cloned().ok_or_else(|| {
        failure(
            StatusCode::UNAUTHORIZED,
            json!({ "detail": "Token is invalid or expired", "code": "token_not_valid" }),
        )
    })?;
    let access = Uuid::new_v4().to_string();
    db.access.insert(access.clone(), username);
    Ok(Json(json!({ "access": access })))
}

async fn current_user(State(db): State<SharedDb>, headers: HeaderMap) -> Result<Json<Value>, Failure> {
    let username = authenticate(&db, &headers).await?;
    let db = db.read().await;
    let profile = &db.accounts[&username].profile;
    Ok(Json(json!({ "user": profile.user, "profile": profile })))
}

// --- profile ---

async fn get_profile(State(db): State<SharedDb>, headers: HeaderMap) -> Result<Json<Profile>, Failure> {
    let username = authenticate(&db, &headers).await?;
    let db = db.read().await;
    Ok(Json(db.accounts[&username].profile.clone()))
}

async fn update_profile(
    State(db): State<SharedDb>,
    headers: HeaderMap,
    Json(input): Json<Value>,
) -> Result<Json<Profile>, Failure> {
    let username = authenticate(&db, &headers).await?;
    let mut db = db.write().await;
    let profile = &mut db
        .accounts
        .get_mut(&username)
        .ok_or_else(not_authenticated)?
        .profile;
    if let Some(phone) = text(&input, "phone") {
        profile.phone = Some(phone);
    }
    if let Some(location) = text(&input, "location") {
        profile.location = Some(location);
    }
    if let Some(size) = input.get("land_size") {
        profile.land_size = Some(decimal(size).ok_or_else(|| {
            failure(StatusCode::BAD_REQUEST, json!({ "land_size": ["A valid number is required."] }))
        })?);
    }
    if let Some(years) = input.get("experience_years").and_then(Value::as_i64) {
        profile.experience_years = i32::try_from(years).ok();
    }
    Ok(Json(profile.clone()))
}

// --- crops ---

/// Decimal fields travel as strings with two places, whichever way they came in.
fn decimal(value: &Value) -> Option<String> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    Some(format!("{number:.2}"))
}

fn apply_crop_fields(crop: &mut Crop, input: &Value) -> Result<(), Failure> {
    if let Some(name) = text(input, "name") {
        crop.name = name;
    }
    if let Some(variety) = input.get("variety") {
        crop.variety = variety.as_str().map(str::to_string);
    }
    if let Some(area) = input.get("area") {
        crop.area = decimal(area)
            .ok_or_else(|| failure(StatusCode::BAD_REQUEST, json!({ "area": ["A valid number is required."] })))?;
    }
    if let Some(date) = text(input, "planting_date") {
        crop.planting_date = date;
    }
    if let Some(date) = text(input, "expected_harvest_date") {
        crop.expected_harvest_date = date;
    }
    if let Some(status) = text(input, "status") {
        if !STATUS_CHOICES.contains(&status.as_str()) {
            return Err(failure(
                StatusCode::BAD_REQUEST,
                json!({ "status": [format!("\"{status}\" is not a valid choice.")] }),
            ));
        }
        crop.status = status;
    }
    if let Some(notes) = input.get("notes") {
        crop.notes = notes.as_str().map(str::to_string);
    }
    Ok(())
}

async fn list_crops(State(db): State<SharedDb>, headers: HeaderMap) -> Result<Json<Vec<Crop>>, Failure> {
    let username = authenticate(&db, &headers).await?;
    let db = db.read().await;
    let farmer = db.accounts[&username].profile.id;
    // Newest first.
    let crops = db.crops.values().rev().filter(|c| c.farmer == farmer).cloned().collect();
    Ok(Json(crops))
}

async fn create_crop(
    State(db): State<SharedDb>,
    headers: HeaderMap,
    Json(input): Json<Value>,
) -> Result<(StatusCode, Json<Crop>), Failure> {
    let username = authenticate(&db, &headers).await?;
    for field in ["name", "area", "planting_date", "expected_harvest_date"] {
        if input.get(field).is_none_or(Value::is_null) {
            return Err(required(field));
        }
    }

    let mut db = db.write().await;
    let farmer = db.accounts[&username].profile.id;
    let mut crop = Crop {
        id: db.next_id(),
        farmer,
        farmer_name: username,
        name: String::new(),
        variety: None,
        area: String::new(),
        planting_date: String::new(),
        expected_harvest_date: String::new(),
        status: "planning".to_string(),
        notes: None,
    };
    apply_crop_fields(&mut crop, &input)?;
    db.crops.insert(crop.id, crop.clone());
    Ok((StatusCode::CREATED, Json(crop)))
}

fn crop_not_found() -> Failure {
    failure(StatusCode::NOT_FOUND, json!({ "detail": "No Crop matches the given query." }))
}

async fn get_crop(
    State(db): State<SharedDb>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<Crop>, Failure> {
    let username = authenticate(&db, &headers).await?;
    let db = db.read().await;
    let farmer = db.accounts[&username].profile.id;
    db.crops
        .get(&id)
        .filter(|c| c.farmer == farmer)
        .cloned()
        .map(Json)
        .ok_or_else(crop_not_found)
}

async fn update_crop(
    State(db): State<SharedDb>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(input): Json<Value>,
) -> Result<Json<Crop>, Failure> {
    let username = authenticate(&db, &headers).await?;
    let mut db = db.write().await;
    let farmer = db.accounts[&username].profile.id;
    let crop = db
        .crops
        .get_mut(&id)
        .filter(|c| c.farmer == farmer)
        .ok_or_else(crop_not_found)?;
    let mut updated = crop.clone();
    apply_crop_fields(&mut updated, &input)?;
    *crop = updated.clone();
    Ok(Json(updated))
}

async fn delete_crop(
    State(db): State<SharedDb>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<StatusCode, Failure> {
    let username = authenticate(&db, &headers).await?;
    let mut db = db.write().await;
    let farmer = db.accounts[&username].profile.id;
    if !db.crops.get(&id).is_some_and(|c| c.farmer == farmer) {
        return Err(crop_not_found());
    }
    db.crops.remove(&id);
    Ok(StatusCode::NO_CONTENT)
}

// --- reference data ---

#[derive(Deserialize)]
struct WeatherQuery {
    location: Option<String>,
}

async fn weather(
    State(db): State<SharedDb>,
    headers: HeaderMap,
    Query(query): Query<WeatherQuery>,
) -> Result<Json<Value>, Failure> {
    authenticate(&db, &headers).await?;
    let location = query
        .location
        .filter(|l| !l.trim().is_empty())
        .unwrap_or_else(|| "Delhi".to_string());
    Ok(Json(catalog::weather_report(&location)))
}

#[derive(Deserialize)]
struct SuggestionQuery {
    crop: Option<String>,
}

async fn suggestions(
    State(db): State<SharedDb>,
    headers: HeaderMap,
    Query(query): Query<SuggestionQuery>,
) -> Result<Json<Value>, Failure> {
    authenticate(&db, &headers).await?;
    let table = crop_suggestions();
    let crop = query.crop.unwrap_or_default().to_lowercase();
    if crop.is_empty() {
        return Ok(Json(json!({ "crops": table, "success": true })));
    }
    match table.get(crop.as_str()) {
        Some(entry) => Ok(Json(json!({ "crop": entry, "success": true }))),
        None => Err(failure(
            StatusCode::NOT_FOUND,
            json!({
                "error": "Crop not found",
                "message": format!("No suggestions available for {crop}"),
                "available_crops": table.keys().collect::<Vec<_>>(),
            }),
        )),
    }
}

async fn chatbot(
    State(db): State<SharedDb>,
    headers: HeaderMap,
    Json(input): Json<Value>,
) -> Result<Json<Value>, Failure> {
    authenticate(&db, &headers).await?;
    let message = text(&input, "message").unwrap_or_default();
    if message.is_empty() {
        return Err(failure(StatusCode::BAD_REQUEST, json!({ "error": "Message is required" })));
    }
    let (response, note) = chatbot_reply(&message);
    Ok(Json(json!({ "response": response, "success": true, "note": note })))
}
