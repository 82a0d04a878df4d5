use std::fmt::Write;

use farm_core::types::{CropSuggestion, SuggestionsResponse};
use farm_core::FarmApi;

use super::Slot;

/// Crops the guide has entries for.
pub const AVAILABLE_CROPS: [&str; 5] = ["wheat", "rice", "corn", "cotton", "tomato"];

#[derive(Debug, Default)]
pub struct SuggestionsView {
    pub selected: Option<String>,
    pub guides: Slot<Vec<CropSuggestion>>,
}

impl SuggestionsView {
    /// Fetch one crop's guide, or every guide when `crop` is `None`.
    pub fn select(&mut self, api: &FarmApi, crop: Option<&str>) {
        self.selected = crop.map(str::to_lowercase);
        self.guides.begin();
        let outcome = api
            .crop_suggestions(self.selected.as_deref())
            .and_then(|resp| resp.json::<SuggestionsResponse>())
            .map(|body| match body {
                SuggestionsResponse::One { crop } => vec![crop],
                SuggestionsResponse::All { crops } => crops.into_values().collect(),
            });
        self.guides.finish(outcome, |err| {
            err.server_message()
                .unwrap_or_else(|| "Error fetching suggestions.".to_string())
        });
    }

    pub fn render(&self) -> String {
        if self.guides.loading {
            return "Loading suggestions...".to_string();
        }
        let mut out = String::new();
        if let Some(error) = &self.guides.error {
            let _ = writeln!(out, "{error}");
            let _ = writeln!(out, "Available crops: {}", AVAILABLE_CROPS.join(", "));
            return out;
        }
        for guide in self.guides.data.iter().flatten() {
            let _ = writeln!(out, "{}", guide.name);
            let _ = writeln!(out, "  Best season:  {}", guide.best_season);
            let _ = writeln!(out, "  Temperature:  {}", guide.temperature);
            let _ = writeln!(out, "  Duration:     {}", guide.duration);
            let _ = writeln!(out, "  Soil:         {}", guide.soil);
            let _ = writeln!(out, "  Water:        {}", guide.water);
            if !guide.tips.is_empty() {
                let _ = writeln!(out, "  Tips:");
                for tip in &guide.tips {
                    let _ = writeln!(out, "    - {tip}");
                }
            }
            if !guide.diseases.is_empty() {
                let _ = writeln!(out, "  Watch for:    {}", guide.diseases.join(", "));
            }
        }
        out
    }
}
