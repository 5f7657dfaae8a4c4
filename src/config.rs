use crate::constants::*;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum CatalogProvider {
    #[default]
    Json, // One JSON file per city under CATALOG_DIR
    Api, // Remote locations API
}

impl std::str::FromStr for CatalogProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" | "file" => Ok(CatalogProvider::Json),
            "api" | "http" => Ok(CatalogProvider::Api),
            _ => Err(format!(
                "Invalid catalog provider: {}. Use 'json' or 'api'",
                s
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub catalog_provider: CatalogProvider,
    pub catalog_dir: String,
    pub catalog_api_base_url: Option<String>,
    pub catalog_api_token: Option<String>,
    pub openweather_api_key: Option<String>, // Absent: every plan gets the neutral weather context
    pub openweather_base_url: String,
    pub graph_dir: String,
    pub planner: PlannerConfig,
}

/// Relative weights of the four ranking components.
///
/// JSON keys follow the public option names (`textWeight`, `budgetWeight`,
/// `weatherWeight`, `tagWeight`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingWeights {
    pub text_weight: f64,
    pub budget_weight: f64,
    pub weather_weight: f64,
    pub tag_weight: f64,
}

impl Default for RankingWeights {
    fn default() -> Self {
        Self {
            text_weight: DEFAULT_TEXT_WEIGHT,
            budget_weight: DEFAULT_BUDGET_WEIGHT,
            weather_weight: DEFAULT_WEATHER_WEIGHT,
            tag_weight: DEFAULT_TAG_WEIGHT,
        }
    }
}

impl RankingWeights {
    pub fn sum(&self) -> f64 {
        self.text_weight + self.budget_weight + self.weather_weight + self.tag_weight
    }

    /// Weights must be finite and non-negative, with a finite non-zero sum.
    pub fn validate(&self) -> Result<(), String> {
        let named = [
            ("textWeight", self.text_weight),
            ("budgetWeight", self.budget_weight),
            ("weatherWeight", self.weather_weight),
            ("tagWeight", self.tag_weight),
        ];
        for (name, value) in named {
            if !value.is_finite() {
                return Err(format!("{} must be a finite number, got {}", name, value));
            }
            if value < 0.0 {
                return Err(format!("{} must not be negative, got {}", name, value));
            }
        }
        let sum = self.sum();
        if !sum.is_finite() {
            return Err("ranking weights must sum to a finite number".to_string());
        }
        if sum <= 0.0 {
            return Err("ranking weights must not sum to 0".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct PlannerConfig {
    pub weights: RankingWeights,

    /// Share of the per-day budget one POI may consume before budget fit decays
    pub budget_fraction: f64,

    /// Budget fit hits 0 at `budget_fraction * budget_decay_multiple`
    pub budget_decay_multiple: f64,

    /// Weather fit for POIs unsuited to the forecast (0.0-1.0)
    pub weather_penalty: f64,

    /// Optional cap on POIs per day
    pub max_pois_per_day: Option<usize>,

    /// Upper bound on 2-opt segment evaluations for one day
    pub two_opt_max_iterations: usize,

    /// Walk-tolerance multiplier when the city runs on straight-line distances
    pub fallback_tolerance_factor: f64,

    /// Cost charged against the budget for POIs without a price estimate
    pub missing_price_cost: f64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            weights: RankingWeights::default(),
            budget_fraction: DEFAULT_BUDGET_FRACTION,
            budget_decay_multiple: DEFAULT_BUDGET_DECAY_MULTIPLE,
            weather_penalty: DEFAULT_WEATHER_PENALTY,
            max_pois_per_day: Some(DEFAULT_MAX_POIS_PER_DAY),
            two_opt_max_iterations: DEFAULT_TWO_OPT_MAX_ITERATIONS,
            fallback_tolerance_factor: DEFAULT_FALLBACK_TOLERANCE_FACTOR,
            missing_price_cost: 0.0,
        }
    }
}

impl PlannerConfig {
    /// Same configuration with the ranking weights replaced.
    pub fn with_weights(mut self, weights: RankingWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        self.weights.validate()?;

        if !(self.budget_fraction > 0.0 && self.budget_fraction.is_finite()) {
            return Err("budget_fraction must be a positive number".to_string());
        }
        if !(self.budget_decay_multiple > 1.0 && self.budget_decay_multiple.is_finite()) {
            return Err("budget_decay_multiple must be greater than 1".to_string());
        }
        if !(0.0..=1.0).contains(&self.weather_penalty) {
            return Err("weather_penalty must be between 0 and 1".to_string());
        }
        if self.max_pois_per_day == Some(0) {
            return Err("max_pois_per_day must be at least 1 when set".to_string());
        }
        if !(self.fallback_tolerance_factor >= 1.0 && self.fallback_tolerance_factor.is_finite()) {
            return Err("fallback_tolerance_factor must be at least 1".to_string());
        }
        if !(self.missing_price_cost >= 0.0 && self.missing_price_cost.is_finite()) {
            return Err("missing_price_cost must be a non-negative number".to_string());
        }
        Ok(())
    }

    pub fn from_env() -> Result<Self, String> {
        let defaults = Self::default();

        let weights = RankingWeights {
            text_weight: env::var("PLAN_TEXT_WEIGHT")
                .unwrap_or_else(|_| defaults.weights.text_weight.to_string())
                .parse()
                .map_err(|_| "Invalid PLAN_TEXT_WEIGHT")?,

            budget_weight: env::var("PLAN_BUDGET_WEIGHT")
                .unwrap_or_else(|_| defaults.weights.budget_weight.to_string())
                .parse()
                .map_err(|_| "Invalid PLAN_BUDGET_WEIGHT")?,

            weather_weight: env::var("PLAN_WEATHER_WEIGHT")
                .unwrap_or_else(|_| defaults.weights.weather_weight.to_string())
                .parse()
                .map_err(|_| "Invalid PLAN_WEATHER_WEIGHT")?,

            tag_weight: env::var("PLAN_TAG_WEIGHT")
                .unwrap_or_else(|_| defaults.weights.tag_weight.to_string())
                .parse()
                .map_err(|_| "Invalid PLAN_TAG_WEIGHT")?,
        };

        // "none" or "0" disables the cap
        let max_pois_per_day = match env::var("PLAN_MAX_POIS_PER_DAY") {
            Ok(raw) if raw.eq_ignore_ascii_case("none") || raw.trim() == "0" => None,
            Ok(raw) => Some(
                raw.trim()
                    .parse()
                    .map_err(|_| "Invalid PLAN_MAX_POIS_PER_DAY")?,
            ),
            Err(_) => defaults.max_pois_per_day,
        };

        let config = Self {
            weights,

            budget_fraction: env::var("PLAN_BUDGET_FRACTION")
                .unwrap_or_else(|_| defaults.budget_fraction.to_string())
                .parse()
                .map_err(|_| "Invalid PLAN_BUDGET_FRACTION")?,

            budget_decay_multiple: env::var("PLAN_BUDGET_DECAY_MULTIPLE")
                .unwrap_or_else(|_| defaults.budget_decay_multiple.to_string())
                .parse()
                .map_err(|_| "Invalid PLAN_BUDGET_DECAY_MULTIPLE")?,

            weather_penalty: env::var("PLAN_WEATHER_PENALTY")
                .unwrap_or_else(|_| defaults.weather_penalty.to_string())
                .parse()
                .map_err(|_| "Invalid PLAN_WEATHER_PENALTY")?,

            max_pois_per_day,

            two_opt_max_iterations: env::var("PLAN_TWO_OPT_MAX_ITERATIONS")
                .unwrap_or_else(|_| defaults.two_opt_max_iterations.to_string())
                .parse()
                .map_err(|_| "Invalid PLAN_TWO_OPT_MAX_ITERATIONS")?,

            fallback_tolerance_factor: env::var("PLAN_FALLBACK_TOLERANCE_FACTOR")
                .unwrap_or_else(|_| defaults.fallback_tolerance_factor.to_string())
                .parse()
                .map_err(|_| "Invalid PLAN_FALLBACK_TOLERANCE_FACTOR")?,

            missing_price_cost: env::var("PLAN_MISSING_PRICE_COST")
                .unwrap_or_else(|_| defaults.missing_price_cost.to_string())
                .parse()
                .map_err(|_| "Invalid PLAN_MISSING_PRICE_COST")?,
        };

        config.validate()?;
        Ok(config)
    }
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        dotenv::dotenv().ok();

        let catalog_provider: CatalogProvider = env::var("CATALOG_PROVIDER")
            .unwrap_or_else(|_| "json".to_string())
            .parse()?;

        let catalog_api_base_url = env::var("CATALOG_API_BASE_URL")
            .ok()
            .map(|url| url.trim_end_matches('/').to_string());

        if catalog_provider == CatalogProvider::Api && catalog_api_base_url.is_none() {
            return Err("CATALOG_API_BASE_URL must be set when CATALOG_PROVIDER=api".to_string());
        }

        Ok(Config {
            host: env::var("HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| DEFAULT_PORT.to_string())
                .parse()
                .map_err(|_| "Invalid PORT")?,
            catalog_provider,
            catalog_dir: env::var("CATALOG_DIR").unwrap_or_else(|_| DEFAULT_CATALOG_DIR.to_string()),
            catalog_api_base_url,
            catalog_api_token: env::var("CATALOG_API_TOKEN").ok().filter(|t| !t.is_empty()),
            openweather_api_key: env::var("OPENWEATHER_API_KEY")
                .ok()
                .filter(|k| !k.is_empty()),
            openweather_base_url: env::var("OPENWEATHER_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_OPENWEATHER_BASE_URL.to_string()),
            graph_dir: env::var("GRAPH_DIR").unwrap_or_else(|_| DEFAULT_GRAPH_DIR.to_string()),
            planner: PlannerConfig::from_env()?,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
