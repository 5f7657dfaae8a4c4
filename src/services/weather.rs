use crate::constants::{COLLABORATOR_TIMEOUT_SECONDS, DEFAULT_OPENWEATHER_BASE_URL, MAX_FORECAST_DAYS};
use crate::error::{AppError, Result};
use crate::models::{DayForecast, WeatherCondition, WeatherContext};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use time::{Date, OffsetDateTime};

/// Supplies per-day forecasts for the planned trip, day 0 being today.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn fetch_weather(&self, city: &str, days: usize) -> Result<WeatherContext>;

    fn backend_name(&self) -> &'static str;
}

// OpenWeather 5-day / 3-hour forecast payload (only the fields we read)

#[derive(Debug, Deserialize)]
pub struct ForecastResponse {
    #[serde(default)]
    pub list: Vec<ForecastSlot>,
    #[serde(default)]
    pub city: Option<ForecastCity>,
}

#[derive(Debug, Deserialize)]
pub struct ForecastSlot {
    pub dt: i64,
    pub main: SlotMain,
    #[serde(default)]
    pub weather: Vec<SlotWeather>,
}

#[derive(Debug, Deserialize)]
pub struct SlotMain {
    pub temp: f64,
    #[serde(default)]
    pub humidity: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct SlotWeather {
    #[serde(default)]
    pub main: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct ForecastCity {
    /// Shift from UTC in seconds
    #[serde(default)]
    pub timezone: i64,
}

#[derive(Default)]
struct DayGroup {
    temps: Vec<f64>,
    humidities: Vec<f64>,
    /// (description, main group, count) in order of first appearance
    descriptions: Vec<(String, String, usize)>,
}

impl DayGroup {
    fn add(&mut self, slot: &ForecastSlot) {
        self.temps.push(slot.main.temp);
        if let Some(h) = slot.main.humidity {
            self.humidities.push(h);
        }
        if let Some(w) = slot.weather.first() {
            let desc = w.description.trim().to_lowercase();
            match self.descriptions.iter_mut().find(|(d, _, _)| *d == desc) {
                Some(entry) => entry.2 += 1,
                None => self.descriptions.push((desc, w.main.clone(), 1)),
            }
        }
    }

    fn into_forecast(self, date: Date) -> DayForecast {
        let mean = |values: &[f64]| {
            (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
        };

        // Most frequent description; the earliest one wins ties
        let mut best: Option<&(String, String, usize)> = None;
        for entry in &self.descriptions {
            if best.map_or(true, |b| entry.2 > b.2) {
                best = Some(entry);
            }
        }
        let (description, condition) = match best {
            Some((desc, group, _)) => {
                let condition = match WeatherCondition::classify(desc) {
                    WeatherCondition::Unknown => WeatherCondition::classify(group),
                    known => known,
                };
                (desc.clone(), condition)
            }
            None => (String::new(), WeatherCondition::Unknown),
        };

        DayForecast {
            date: Some(date),
            condition,
            temperature_c: mean(&self.temps).map(|t| (t * 10.0).round() / 10.0),
            humidity: mean(&self.humidities).map(|h| h.round().clamp(0.0, 100.0) as u8),
            description,
        }
    }
}

/// Calendar date at `utc_seconds` in a city `offset` seconds east of UTC.
fn local_date(utc_seconds: i64, offset: i64) -> Option<Date> {
    let shifted = utc_seconds.checked_add(offset)?;
    OffsetDateTime::from_unix_timestamp(shifted)
        .ok()
        .map(|t| t.date())
}

/// Collapse 3-hour slots into one forecast per local calendar day.
///
/// Day `i` of the trip is the city's local date at `now`, plus `i` days.
/// Days the payload does not cover stay absent from the context and read as
/// unknown weather.
pub fn aggregate_forecast(
    response: &ForecastResponse,
    now: OffsetDateTime,
    days: usize,
) -> WeatherContext {
    let offset = response.city.as_ref().map_or(0, |c| c.timezone);
    let Some(today) = local_date(now.unix_timestamp(), offset) else {
        return WeatherContext::new(BTreeMap::new());
    };

    let mut groups: HashMap<Date, DayGroup> = HashMap::new();
    for slot in &response.list {
        let Some(date) = local_date(slot.dt, offset) else {
            continue;
        };
        groups.entry(date).or_default().add(slot);
    }

    let mut forecasts = BTreeMap::new();
    for day in 0..days.min(MAX_FORECAST_DAYS) {
        let Some(date) = today.checked_add(time::Duration::days(day as i64)) else {
            break;
        };
        if let Some(group) = groups.remove(&date) {
            forecasts.insert(day, group.into_forecast(date));
        }
    }

    WeatherContext::new(forecasts)
}

#[derive(Clone)]
pub struct OpenWeatherClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenWeatherClient {
    pub fn new(api_key: String) -> Self {
        Self::with_config(api_key, DEFAULT_OPENWEATHER_BASE_URL.to_string())
    }

    pub fn with_config(api_key: String, base_url: String) -> Self {
        OpenWeatherClient {
            client: Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn get_forecast(&self, city: &str) -> Result<ForecastResponse> {
        let url = format!("{}/forecast", self.base_url);
        tracing::debug!("OpenWeather request for {}", city);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("q", city),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
                ("lang", "en"),
            ])
            .timeout(Duration::from_secs(COLLABORATOR_TIMEOUT_SECONDS))
            .send()
            .await
            .map_err(|e| AppError::Weather(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::warn!(status = %status, "OpenWeather HTTP error {}: {}", status, error_text);
            return Err(AppError::Weather(format!("HTTP {}: {}", status, error_text)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Weather(format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl WeatherSource for OpenWeatherClient {
    async fn fetch_weather(&self, city: &str, days: usize) -> Result<WeatherContext> {
        let forecast = self.get_forecast(city).await?;
        let context = aggregate_forecast(&forecast, OffsetDateTime::now_utc(), days);
        tracing::debug!(slots = forecast.list.len(), "Aggregated forecast for {}", city);
        Ok(context)
    }

    fn backend_name(&self) -> &'static str {
        "openweather"
    }
}

/// Used when no weather API key is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoWeather;

#[async_trait]
impl WeatherSource for NoWeather {
    async fn fetch_weather(&self, _city: &str, _days: usize) -> Result<WeatherContext> {
        Err(AppError::Weather("no weather provider configured".to_string()))
    }

    fn backend_name(&self) -> &'static str {
        "none"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    // 2024-06-01 00:00 UTC
    const DAY0: i64 = 1_717_200_000;

    fn fixture() -> ForecastResponse {
        let slot = |dt: i64, temp: f64, humidity: f64, main: &str, desc: &str| {
            serde_json::json!({
                "dt": dt,
                "main": {"temp": temp, "humidity": humidity},
                "weather": [{"main": main, "description": desc}]
            })
        };
        serde_json::from_value(serde_json::json!({
            "city": {"timezone": 25200},
            "list": [
                slot(DAY0 + 3 * 3600, 30.0, 70.0, "Rain", "light rain"),
                slot(DAY0 + 6 * 3600, 32.0, 60.0, "Clouds", "broken clouds"),
                slot(DAY0 + 9 * 3600, 31.0, 65.0, "Rain", "light rain"),
                // 18:00 UTC is already the next local day at UTC+7
                slot(DAY0 + 18 * 3600, 27.0, 80.0, "Clear", "clear sky"),
                slot(DAY0 + 21 * 3600, 29.0, 80.0, "Clouds", "few clouds"),
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_aggregate_groups_by_local_day() {
        let ctx = aggregate_forecast(&fixture(), datetime!(2024-06-01 0:00 UTC), 3);

        let first = ctx.day(0).unwrap();
        assert_eq!(first.date, Some(date!(2024 - 06 - 01)));
        assert_eq!(first.condition, WeatherCondition::Rain);
        assert_eq!(first.description, "light rain");
        assert_eq!(first.temperature_c, Some(31.0));
        assert_eq!(first.humidity, Some(65));

        // Tie between "clear sky" and "few clouds": first seen wins
        let second = ctx.day(1).unwrap();
        assert_eq!(second.condition, WeatherCondition::Clear);
        assert_eq!(second.temperature_c, Some(28.0));

        assert!(ctx.day(2).is_none());
        assert_eq!(ctx.condition(2), WeatherCondition::Unknown);
    }

    #[test]
    fn test_aggregate_skips_days_before_today() {
        // 17:00 UTC is local midnight of June 2
        let ctx = aggregate_forecast(&fixture(), datetime!(2024-06-01 17:00 UTC), 2);
        assert_eq!(ctx.day(0).unwrap().condition, WeatherCondition::Clear);
        assert!(ctx.day(1).is_none());
    }

    #[test]
    fn test_today_is_the_city_local_date() {
        let response: ForecastResponse = serde_json::from_value(serde_json::json!({
            "city": {"timezone": 25200},
            "list": [{"dt": DAY0 + 19 * 3600, "main": {"temp": 26.0},
                      "weather": [{"main": "Rain", "description": "moderate rain"}]}]
        }))
        .unwrap();
        // Still June 1 in UTC, already 01:00 on June 2 locally
        let ctx = aggregate_forecast(&response, datetime!(2024-06-01 18:00 UTC), 2);

        let first = ctx.day(0).unwrap();
        assert_eq!(first.date, Some(date!(2024 - 06 - 02)));
        assert_eq!(first.condition, WeatherCondition::Rain);
        assert!(ctx.day(1).is_none());
    }

    #[test]
    fn test_condition_falls_back_to_group() {
        let response: ForecastResponse = serde_json::from_value(serde_json::json!({
            "list": [{"dt": DAY0, "main": {"temp": 20.0},
                      "weather": [{"main": "Thunderstorm", "description": "???"}]}]
        }))
        .unwrap();
        let ctx = aggregate_forecast(&response, datetime!(2024-06-01 0:00 UTC), 1);
        let day = ctx.day(0).unwrap();
        assert_eq!(day.condition, WeatherCondition::Storm);
        assert_eq!(day.humidity, None);
    }

    #[test]
    fn test_empty_payload_is_unknown() {
        let response: ForecastResponse = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(aggregate_forecast(&response, datetime!(2024-06-01 0:00 UTC), 5).is_unknown());
    }

    #[tokio::test]
    async fn test_no_weather_always_fails() {
        assert!(matches!(
            NoWeather.fetch_weather("Hue", 2).await,
            Err(AppError::Weather(_))
        ));
    }
}
