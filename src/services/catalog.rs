use crate::constants::COLLABORATOR_TIMEOUT_SECONDS;
use crate::error::{AppError, Result};
use crate::models::poi::normalize_records;
use crate::models::{city_slug, Poi, PoiCategory, RawPoiRecord};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Supplies candidate POIs for a city. An empty list is a valid answer.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn load_candidates(&self, city: &str, category: Option<PoiCategory>) -> Result<Vec<Poi>>;

    fn backend_name(&self) -> &'static str;
}

/// Unwrap a catalog payload: either a bare array or an object holding the
/// array under `data`, `items` or `locations`.
fn extract_records(payload: Value) -> Result<Vec<RawPoiRecord>> {
    let items = match payload {
        Value::Array(items) => items,
        Value::Object(mut map) => ["data", "items", "locations"]
            .iter()
            .find_map(|key| match map.remove(*key) {
                Some(Value::Array(items)) => Some(items),
                _ => None,
            })
            .ok_or_else(|| AppError::Catalog("payload holds no record array".to_string()))?,
        _ => return Err(AppError::Catalog("payload is not a record array".to_string())),
    };

    Ok(items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<RawPoiRecord>(item) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!("Rejected catalog record: {}", e);
                None
            }
        })
        .collect())
}

fn filter_category(pois: Vec<Poi>, category: Option<PoiCategory>) -> Vec<Poi> {
    match category {
        Some(wanted) => pois.into_iter().filter(|p| p.category == wanted).collect(),
        None => pois,
    }
}

/// One JSON file per city: `<dir>/<city-slug>.json`.
#[derive(Debug, Clone)]
pub struct JsonFileCatalog {
    dir: PathBuf,
}

impl JsonFileCatalog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        JsonFileCatalog { dir: dir.into() }
    }
}

#[async_trait]
impl CatalogSource for JsonFileCatalog {
    async fn load_candidates(&self, city: &str, category: Option<PoiCategory>) -> Result<Vec<Poi>> {
        let path = self.dir.join(format!("{}.json", city_slug(city)));
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No catalog file for {} at {}", city, path.display());
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(AppError::Catalog(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        let payload: Value = serde_json::from_str(&raw)
            .map_err(|e| AppError::Catalog(format!("Invalid JSON in {}: {}", path.display(), e)))?;
        let pois = filter_category(normalize_records(extract_records(payload)?, category), category);

        tracing::debug!("Loaded {} POIs for {} from {}", pois.len(), city, path.display());
        Ok(pois)
    }

    fn backend_name(&self) -> &'static str {
        "json"
    }
}

/// Remote locations API: `GET {base_url}/locations`.
#[derive(Clone)]
pub struct HttpCatalog {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpCatalog {
    pub fn new(base_url: String) -> Self {
        Self::with_token(base_url, None)
    }

    pub fn with_token(base_url: String, token: Option<String>) -> Self {
        HttpCatalog {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
        }
    }
}

#[async_trait]
impl CatalogSource for HttpCatalog {
    async fn load_candidates(&self, city: &str, category: Option<PoiCategory>) -> Result<Vec<Poi>> {
        let url = format!("{}/locations", self.base_url);
        tracing::debug!("Catalog API request: {} (city {})", url, city);

        let mut request = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .timeout(Duration::from_secs(COLLABORATOR_TIMEOUT_SECONDS));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Catalog(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::warn!(status = %status, "Catalog API HTTP error {}: {}", status, error_text);
            return Err(AppError::Catalog(format!("HTTP {}: {}", status, error_text)));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| AppError::Catalog(format!("Failed to parse response: {}", e)))?;

        // The API does not filter by category, so filter after normalization
        let pois = filter_category(normalize_records(extract_records(payload)?, category), category);
        tracing::debug!("Catalog API returned {} POIs for {}", pois.len(), city);
        Ok(pois)
    }

    fn backend_name(&self) -> &'static str {
        "api"
    }
}

/// Fixed catalog held in memory, keyed by city slug.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    cities: HashMap<String, Vec<Poi>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_city(mut self, city: &str, pois: Vec<Poi>) -> Self {
        self.cities.insert(city_slug(city), pois);
        self
    }
}

#[async_trait]
impl CatalogSource for InMemoryCatalog {
    async fn load_candidates(&self, city: &str, category: Option<PoiCategory>) -> Result<Vec<Poi>> {
        let pois = self.cities.get(&city_slug(city)).cloned().unwrap_or_default();
        Ok(filter_category(pois, category))
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
