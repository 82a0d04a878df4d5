//! Canned reference data: crop guides, chatbot fallback answers, weather.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{json, Value};

#[derive(Clone, Debug, Serialize)]
pub struct Suggestion {
    pub name: &'static str,
    pub best_season: &'static str,
    pub temperature: &'static str,
    pub soil: &'static str,
    pub water: &'static str,
    pub tips: Vec<&'static str>,
    pub diseases: Vec<&'static str>,
    pub duration: &'static str,
}

pub fn crop_suggestions() -> BTreeMap<&'static str, Suggestion> {
    BTreeMap::from([
        (
            "wheat",
            Suggestion {
                name: "Wheat",
                best_season: "Rabi (Winter)",
                temperature: "15-25°C",
                soil: "Well-drained loamy soil",
                water: "Moderate watering, avoid waterlogging",
                tips: vec![
                    "Sow seeds in rows 20-22 cm apart",
                    "Apply nitrogen fertilizer in 3 splits",
                    "Irrigate at critical growth stages (crown root, tillering, flowering)",
                    "Control weeds within first 30-40 days",
                    "Harvest when moisture content is 20-25%",
                ],
                diseases: vec!["Rust", "Powdery mildew", "Leaf blight"],
                duration: "120-150 days",
            },
        ),
        (
            "rice",
            Suggestion {
                name: "Rice",
                best_season: "Kharif (Monsoon)",
                temperature: "20-35°C",
                soil: "Clay or clay loam soil",
                water: "Heavy watering required, can withstand flooding",
                tips: vec![
                    "Transplant seedlings at 21-28 days old",
                    "Maintain 5-10 cm water level in field",
                    "Apply fertilizers based on soil test",
                    "Remove weeds regularly",
                    "Harvest when 80% grains turn golden yellow",
                ],
                diseases: vec!["Blast", "Sheath blight", "Brown spot"],
                duration: "90-120 days for short duration, 130-150 for long duration",
            },
        ),
        (
            "corn",
            Suggestion {
                name: "Corn (Maize)",
                best_season: "Kharif (Monsoon) or Rabi",
                temperature: "18-27°C",
                soil: "Well-drained loamy soil with good organic matter",
                water: "Regular watering, critical during tasseling and grain filling",
                tips: vec![
                    "Plant seeds 60-75 cm between rows, 20-25 cm between plants",
                    "Side dress with nitrogen at knee-high stage",
                    "Ensure proper drainage to avoid root rot",
                    "Control stem borers and fall armyworm",
                    "Harvest when kernels are at dough stage",
                ],
                diseases: vec!["Maydis leaf blight", "Common rust", "Stalk rot"],
                duration: "80-120 days",
            },
        ),
        (
            "cotton",
            Suggestion {
                name: "Cotton",
                best_season: "Kharif (Summer)",
                temperature: "21-30°C",
                soil: "Deep, well-drained black cotton soil",
                water: "Moderate watering, drought tolerant",
                tips: vec![
                    "Sow seeds with 60-90 cm row spacing",
                    "Apply nitrogen in 2-3 splits",
                    "Regular monitoring for bollworm",
                    "Pruning and defoliation for better yield",
                    "Harvest when bolls fully open",
                ],
                diseases: vec!["Wilt", "Leaf curl", "Root rot"],
                duration: "150-180 days",
            },
        ),
        (
            "tomato",
            Suggestion {
                name: "Tomato",
                best_season: "Year-round with protection",
                temperature: "20-25°C",
                soil: "Well-drained sandy loam with pH 6.0-7.0",
                water: "Regular watering, drip irrigation recommended",
                tips: vec![
                    "Transplant seedlings at 4-6 weeks",
                    "Stake plants for support",
                    "Prune suckers for better fruit development",
                    "Mulch to conserve moisture",
                    "Harvest when fruits are fully colored",
                ],
                diseases: vec!["Early blight", "Late blight", "Leaf curl virus"],
                duration: "60-85 days after transplanting",
            },
        ),
    ])
}

const CHAT_TOPICS: [(&str, &str); 7] = [
    ("weather", "Check the weather section on your dashboard for current conditions and forecasts. Plan your farming activities based on upcoming rain predictions."),
    ("irrigation", "Irrigation timing depends on your crop type and soil moisture. Generally, irrigate during early morning or evening. Use drip irrigation for water efficiency."),
    ("fertilizer", "Apply fertilizers based on soil test results. Use organic compost, NPK fertilizers in recommended doses, and split applications for better results."),
    ("pest", "For pest control, use integrated pest management (IPM). Monitor regularly, use biological controls when possible, and apply pesticides only when necessary."),
    ("soil", "Maintain soil health through crop rotation, adding organic matter, proper drainage, and regular soil testing. pH should be 6.0-7.5 for most crops."),
    ("harvest", "Harvest crops at the right maturity stage. Check for color, moisture content, and texture. Early morning is usually the best time for harvesting."),
    ("seed", "Use certified seeds from reliable sources. Treat seeds before sowing to prevent diseases. Store seeds in cool, dry places."),
];

const CHAT_DEFAULT: &str = "I can help you with farming questions about crops, weather, irrigation, fertilizers, pest control, soil management, and harvesting. Please ask a specific question!";

/// Keyword-matched answer plus the note that marks it as a basic reply.
pub fn chatbot_reply(message: &str) -> (&'static str, &'static str) {
    let lower = message.to_lowercase();
    CHAT_TOPICS
        .iter()
        .find(|(keyword, _)| lower.contains(keyword))
        .map(|(_, answer)| {
            (
                *answer,
                "This is a basic response. Configure OpenAI API key for advanced AI responses.",
            )
        })
        .unwrap_or((CHAT_DEFAULT, "Configure OpenAI API key in .env for advanced AI responses."))
}

/// Deterministic report shaped like the live weather proxy: current
/// conditions plus eight 3-hour forecast slots.
pub fn weather_report(location: &str) -> Value {
    let seed = location.bytes().map(u32::from).sum::<u32>() % 10;
    let base = 22.0 + f64::from(seed);
    let forecast: Vec<Value> = (0..8i64)
        .map(|slot| {
            let temp = base + if slot % 4 < 2 { 1.5 } else { -1.5 };
            json!({
                "dt": 1_700_000_000 + slot * 3 * 3600,
                "main": { "temp": temp, "humidity": 55 },
                "weather": [{ "id": 802, "main": "Clouds", "description": "scattered clouds", "icon": "03d" }],
            })
        })
        .collect();
    json!({
        "current": {
            "temperature": base,
            "feels_like": base + 1.0,
            "humidity": 55,
            "pressure": 1012,
            "description": "scattered clouds",
            "icon": "03d",
            "wind_speed": 3.4,
        },
        "forecast": forecast,
        "location": location,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn five_crops_in_table() {
        let table = crop_suggestions();
        assert_eq!(table.keys().copied().collect::<Vec<_>>(), vec!["corn", "cotton", "rice", "tomato", "wheat"]);
    }

    #[test]
    fn chatbot_matches_first_keyword() {
        let (answer, note) = chatbot_reply("How much IRRIGATION does wheat need?");
        assert!(answer.starts_with("Irrigation timing"));
        assert!(note.starts_with("This is a basic response"));
    }

    #[test]
    fn chatbot_default_answer() {
        let (answer, _) = chatbot_reply("When to plant wheat?");
        assert_eq!(answer, CHAT_DEFAULT);
    }

    #[test]
    fn weather_report_has_eight_slots() {
        let report = weather_report("Pune");
        assert_eq!(report["forecast"].as_array().unwrap().len(), 8);
        assert_eq!(report["location"], "Pune");
        assert_eq!(report["current"]["icon"], "03d");
    }
}
