//! Domain DTOs for the farm API.
//!
//! # Design
//! The client treats every payload as opaque JSON; these types exist for the
//! callers that interpret responses and build request bodies. Field names
//! follow the backend's wire format. Optional fields default so partial
//! server payloads still deserialize.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Image host for weather condition icons.
pub const WEATHER_ICON_BASE: &str = "http://openweathermap.org/img/wn";

/// Large icon for the current-conditions panel.
pub fn icon_url(code: &str) -> String {
    format!("{WEATHER_ICON_BASE}/{code}@2x.png")
}

/// Small icon for a forecast entry.
pub fn forecast_icon_url(code: &str) -> String {
    format!("{WEATHER_ICON_BASE}/{code}.png")
}

// ---------------------------------------------------------------------------
// Auth & profile
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Registration payload. `password2` must repeat `password`; the server checks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewAccount {
    pub username: String,
    #[serde(default)]
    pub email: String,
    pub password: String,
    pub password2: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

impl User {
    /// "First Last", or the username when no name is on file.
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: i64,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    /// Acres, as a decimal string.
    #[serde(default)]
    pub land_size: Option<String>,
    #[serde(default)]
    pub experience_years: Option<i32>,
}

/// Response of `GET /auth/user/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub user: User,
    pub profile: Profile,
}

/// Partial profile update; omitted fields stay as they are.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub land_size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience_years: Option<i32>,
}

// ---------------------------------------------------------------------------
// Crops
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CropStatus {
    #[default]
    Planning,
    Planted,
    Growing,
    Harvested,
}

impl CropStatus {
    pub const ALL: [CropStatus; 4] = [
        CropStatus::Planning,
        CropStatus::Planted,
        CropStatus::Growing,
        CropStatus::Harvested,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CropStatus::Planning => "planning",
            CropStatus::Planted => "planted",
            CropStatus::Growing => "growing",
            CropStatus::Harvested => "harvested",
        }
    }
}

impl fmt::Display for CropStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CropStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CropStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown crop status '{s}' (expected planning, planted, growing or harvested)"))
    }
}

/// A crop record as returned by `/crops/`. Area and dates stay in their wire
/// form (decimal string, `YYYY-MM-DD`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Crop {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub variety: Option<String>,
    pub area: String,
    pub planting_date: String,
    pub expected_harvest_date: String,
    #[serde(default)]
    pub status: CropStatus,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Request body for creating a crop.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CropDraft {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variety: Option<String>,
    pub area: String,
    pub planting_date: String,
    pub expected_harvest_date: String,
    pub status: CropStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl From<&Crop> for CropDraft {
    fn from(crop: &Crop) -> Self {
        Self {
            name: crop.name.clone(),
            variety: crop.variety.clone(),
            area: crop.area.clone(),
            planting_date: crop.planting_date.clone(),
            expected_harvest_date: crop.expected_harvest_date.clone(),
            status: crop.status,
            notes: crop.notes.clone(),
        }
    }
}

/// Partial crop update for `PATCH /crops/{id}/`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CropUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variety: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub planting_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_harvest_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<CropStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

// ---------------------------------------------------------------------------
// Weather
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub current: CurrentWeather,
    #[serde(default)]
    pub forecast: Vec<ForecastEntry>,
    #[serde(default)]
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    pub temperature: f64,
    pub feels_like: f64,
    pub humidity: f64,
    #[serde(default)]
    pub pressure: Option<f64>,
    pub wind_speed: f64,
    pub icon: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    /// Unix timestamp, seconds.
    pub dt: i64,
    pub main: ForecastMain,
    #[serde(default)]
    pub weather: Vec<Condition>,
}

impl ForecastEntry {
    pub fn condition(&self) -> Option<&Condition> {
        self.weather.first()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastMain {
    pub temp: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub main: String,
    pub description: String,
    pub icon: String,
}

// ---------------------------------------------------------------------------
// Suggestions & chat
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropSuggestion {
    pub name: String,
    pub best_season: String,
    pub temperature: String,
    pub duration: String,
    pub soil: String,
    pub water: String,
    #[serde(default)]
    pub tips: Vec<String>,
    #[serde(default)]
    pub diseases: Vec<String>,
}

/// `GET /suggestions/?crop=x` answers with one crop, `GET /suggestions/` with all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SuggestionsResponse {
    One { crop: CropSuggestion },
    All { crops: BTreeMap<String, CropSuggestion> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
    #[serde(default)]
    pub note: Option<String>,
}
