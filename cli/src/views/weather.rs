use std::fmt::Write;

use chrono::DateTime;
use farm_core::types::{forecast_icon_url, icon_url, WeatherReport};
use farm_core::FarmApi;

use super::Slot;

/// Forecast slots shown under the current conditions.
const FORECAST_SLOTS: usize = 5;

#[derive(Debug)]
pub struct WeatherView {
    pub location: String,
    pub report: Slot<WeatherReport>,
}

impl WeatherView {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            report: Slot::default(),
        }
    }

    pub fn load(&mut self, api: &FarmApi) {
        self.report.begin();
        let outcome = api.weather(&self.location).and_then(|resp| resp.json());
        self.report.finish(outcome, |err| {
            err.server_message()
                .unwrap_or_else(|| "Failed to fetch weather data".to_string())
        });
    }

    pub fn render(&self) -> String {
        if self.report.loading {
            return "Loading weather...".to_string();
        }
        if let Some(error) = &self.report.error {
            return error.clone();
        }
        let Some(report) = &self.report.data else {
            return String::new();
        };

        let current = &report.current;
        let mut out = String::new();
        let _ = writeln!(out, "Weather in {}", report.location.as_deref().unwrap_or(&self.location));
        let _ = writeln!(
            out,
            "  {:.0}°C, {} ({})",
            current.temperature.round(),
            current.description,
            icon_url(&current.icon)
        );
        let _ = writeln!(out, "  Feels like {:.0}°C", current.feels_like.round());
        let _ = writeln!(out, "  Humidity {}%", current.humidity);
        let _ = writeln!(out, "  Wind {} m/s", current.wind_speed);

        if !report.forecast.is_empty() {
            let _ = writeln!(out, "Forecast");
        }
        for entry in report.forecast.iter().take(FORECAST_SLOTS) {
            let time = DateTime::from_timestamp(entry.dt, 0)
                .map(|t| t.format("%H:%M").to_string())
                .unwrap_or_else(|| "--:--".to_string());
            let (label, icon) = entry
                .condition()
                .map(|c| (c.main.as_str(), forecast_icon_url(&c.icon)))
                .unwrap_or(("", String::new()));
            let _ = writeln!(out, "  {time}  {:>3.0}°C  {label} {icon}", entry.main.temp.round());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::testing::signed_in;

    const REPORT: &str = r#"{
        "current":{"temperature":27.6,"feels_like":29.2,"humidity":61,"pressure":1009,
                   "description":"haze","icon":"50d","wind_speed":2.1},
        "forecast":[
            {"dt":1700000000,"main":{"temp":26.4},"weather":[{"main":"Haze","description":"haze","icon":"50d"}]},
            {"dt":1700010800,"main":{"temp":24.9},"weather":[{"main":"Clear","description":"clear sky","icon":"01n"}]}
        ],
        "location":"Pune"}"#;

    #[test]
    fn renders_current_and_forecast() {
        let f = signed_in();
        f.transport.reply(200, REPORT);
        let mut view = WeatherView::new("Pune");
        view.load(&f.api);

        let text = view.render();
        assert!(text.contains("Weather in Pune"));
        assert!(text.contains("28°C, haze"));
        assert!(text.contains("http://openweathermap.org/img/wn/50d@2x.png"));
        assert!(text.contains("22:13"));
        assert!(text.contains("http://openweathermap.org/img/wn/01n.png"));
    }

    #[test]
    fn shows_server_message_on_failure() {
        let f = signed_in();
        f.transport.reply(
            400,
            r#"{"error":"Failed to fetch weather data","message":"city not found"}"#,
        );
        let mut view = WeatherView::new("Atlantis");
        view.load(&f.api);
        assert_eq!(view.render(), "city not found");
    }

    #[test]
    fn falls_back_to_static_message() {
        let f = signed_in();
        f.transport.fail("connection refused");
        let mut view = WeatherView::new("Pune");
        view.load(&f.api);
        assert_eq!(view.render(), "Failed to fetch weather data");
        assert_eq!(f.transport.sent().len(), 1);
    }
}
