//! Per-day forecast summaries consumed by ranking and day annotation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use time::Date;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum WeatherCondition {
    Clear,
    Clouds,
    Rain,
    Storm,
    Snow,
    #[default]
    Unknown,
}

impl WeatherCondition {
    /// Classify a provider condition group or free-text description.
    pub fn classify(raw: &str) -> WeatherCondition {
        let d = raw.trim().to_lowercase();
        let has_any = |keys: &[&str]| keys.iter().any(|k| d.contains(k));
        if has_any(&["thunder", "storm", "squall", "tornado", "giông", "dông"]) {
            WeatherCondition::Storm
        } else if has_any(&["rain", "drizzle", "shower", "mưa"]) {
            WeatherCondition::Rain
        } else if has_any(&["snow", "sleet"]) {
            WeatherCondition::Snow
        } else if has_any(&["cloud", "overcast", "mist", "fog", "haze", "mây", "âm u"]) {
            WeatherCondition::Clouds
        } else if has_any(&["clear", "sun", "nắng"]) {
            WeatherCondition::Clear
        } else {
            WeatherCondition::Unknown
        }
    }

    /// Whether an indoor (or outdoor) POI suits this condition.
    pub fn favours(&self, outdoor: bool) -> bool {
        match self {
            WeatherCondition::Rain | WeatherCondition::Storm | WeatherCondition::Snow => !outdoor,
            WeatherCondition::Clear | WeatherCondition::Clouds | WeatherCondition::Unknown => true,
        }
    }

    /// One-line packing advice for the day.
    pub fn advice(&self) -> &'static str {
        match self {
            WeatherCondition::Rain | WeatherCondition::Storm => {
                "Rain expected: bring a raincoat or umbrella and keep electronics dry."
            }
            WeatherCondition::Snow => "Snow expected: dress warmly and wear shoes with grip.",
            WeatherCondition::Clear => "Sunny: wear sunscreen, a hat, and carry water.",
            WeatherCondition::Clouds => "Cloudy: pleasant conditions for walking.",
            WeatherCondition::Unknown => "Carry water and wear comfortable walking shoes.",
        }
    }
}

impl fmt::Display for WeatherCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WeatherCondition::Clear => "clear",
            WeatherCondition::Clouds => "clouds",
            WeatherCondition::Rain => "rain",
            WeatherCondition::Storm => "storm",
            WeatherCondition::Snow => "snow",
            WeatherCondition::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct DayForecast {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<Date>,
    pub condition: WeatherCondition,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature_c: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub humidity: Option<u8>,
    pub description: String,
}

impl DayForecast {
    pub fn new(condition: WeatherCondition) -> Self {
        DayForecast {
            condition,
            description: condition.to_string(),
            ..Default::default()
        }
    }

    pub fn with_temperature(mut self, temperature_c: f64) -> Self {
        self.temperature_c = Some(temperature_c);
        self
    }

    /// "light rain • 31°C • RH 70%"
    pub fn summary(&self) -> String {
        let mut bits = Vec::new();
        if !self.description.is_empty() {
            bits.push(self.description.clone());
        }
        if let Some(t) = self.temperature_c {
            bits.push(format!("{:.0}°C", t));
        }
        if let Some(h) = self.humidity {
            bits.push(format!("RH {}%", h));
        }
        bits.join(" • ")
    }
}

/// Forecast keyed by zero-based day index. Read-only during planning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct WeatherContext {
    days: BTreeMap<usize, DayForecast>,
}

impl WeatherContext {
    pub fn new(days: BTreeMap<usize, DayForecast>) -> Self {
        WeatherContext { days }
    }

    /// Neutral context used when no forecast is available.
    pub fn unknown() -> Self {
        WeatherContext::default()
    }

    pub fn from_days(forecasts: impl IntoIterator<Item = DayForecast>) -> Self {
        WeatherContext {
            days: forecasts.into_iter().enumerate().collect(),
        }
    }

    pub fn day(&self, index: usize) -> Option<&DayForecast> {
        self.days.get(&index)
    }

    pub fn condition(&self, index: usize) -> WeatherCondition {
        self.day(index)
            .map(|d| d.condition)
            .unwrap_or(WeatherCondition::Unknown)
    }

    pub fn is_unknown(&self) -> bool {
        self.days
            .values()
            .all(|d| d.condition == WeatherCondition::Unknown)
    }
}
