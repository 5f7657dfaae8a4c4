use crate::models::Coordinates;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// Tags and categories that mark a place as open-air.
const OUTDOOR_HINTS: [&str; 6] = ["park", "garden", "viewpoint", "beach", "outdoor", "lake"];

/// Catalog identifier of a POI. Ordering is lexical and used for every
/// deterministic tie-break in the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PoiId(pub String);

impl PoiId {
    pub fn new(id: impl Into<String>) -> Self {
        PoiId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PoiId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum PoiCategory {
    Food,
    Cafe,
    Entertainment,
    Attraction,
    Shopping,
    Unknown,
}

impl PoiCategory {
    /// Map a free-form catalog category onto one of the canonical buckets.
    pub fn canonicalize(raw: &str) -> PoiCategory {
        let c = raw.trim().to_lowercase();
        if let Ok(exact) = c.parse() {
            return exact;
        }

        let has_any = |keys: &[&str]| keys.iter().any(|k| c.contains(k));
        if has_any(&["restaurant", "eatery", "food"]) {
            PoiCategory::Food
        } else if has_any(&["cafe", "coffee"]) {
            PoiCategory::Cafe
        } else if has_any(&["entertainment", "theater", "theatre", "cinema", "amusement", "game", "arcade"]) {
            PoiCategory::Entertainment
        } else if has_any(&["attraction", "museum", "landmark", "park", "sightseeing", "temple", "church", "beach"]) {
            PoiCategory::Attraction
        } else if has_any(&["shopping", "mall", "market", "boutique", "store"]) {
            PoiCategory::Shopping
        } else {
            PoiCategory::Unknown
        }
    }
}

impl fmt::Display for PoiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PoiCategory::Food => "food",
            PoiCategory::Cafe => "cafe",
            PoiCategory::Entertainment => "entertainment",
            PoiCategory::Attraction => "attraction",
            PoiCategory::Shopping => "shopping",
            PoiCategory::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for PoiCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "food" => Ok(PoiCategory::Food),
            "cafe" => Ok(PoiCategory::Cafe),
            "entertainment" => Ok(PoiCategory::Entertainment),
            "attraction" => Ok(PoiCategory::Attraction),
            "shopping" => Ok(PoiCategory::Shopping),
            "unknown" => Ok(PoiCategory::Unknown),
            _ => Err(format!("Invalid POI category: {}", s)),
        }
    }
}

/// A validated catalog entry. Immutable once loaded; later stages refer to it by [`PoiId`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Poi {
    pub id: PoiId,
    pub name: String,
    pub coordinates: Coordinates,
    pub category: PoiCategory,
    pub description: String,
    pub tags: BTreeSet<String>,
    /// Estimated spend in local currency units
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    /// Rating from 0-5
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f32>,
    pub outdoor: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Poi {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: PoiCategory,
        coordinates: Coordinates,
    ) -> Self {
        Poi {
            id: PoiId::new(id),
            name: name.into(),
            coordinates,
            category,
            description: String::new(),
            tags: BTreeSet::new(),
            price: None,
            rating: None,
            outdoor: category == PoiCategory::Attraction,
            address: None,
            image_url: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.tags = tags
            .into_iter()
            .map(|t| t.as_ref().trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        self
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    pub fn with_outdoor(mut self, outdoor: bool) -> Self {
        self.outdoor = outdoor;
        self
    }

    /// Text indexed for query similarity: name, tags, then description.
    pub fn searchable_text(&self) -> String {
        let tags: Vec<&str> = self.tags.iter().map(String::as_str).collect();
        format!("{} {} {}", self.name, tags.join(" "), self.description)
    }
}

/// Borrowed id → POI lookup over one candidate set.
pub struct PoiIndex<'a> {
    by_id: HashMap<&'a PoiId, &'a Poi>,
}

impl<'a> PoiIndex<'a> {
    pub fn new(pois: &'a [Poi]) -> Self {
        PoiIndex {
            by_id: pois.iter().map(|poi| (&poi.id, poi)).collect(),
        }
    }

    pub fn get(&self, id: &PoiId) -> Option<&'a Poi> {
        self.by_id.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Raw catalog records
// ---------------------------------------------------------------------------

/// Loosely typed catalog row as it arrives from a file or the locations API.
/// Every source deserializes into this struct and calls [`RawPoiRecord::into_poi`]
/// so field validation happens in exactly one place.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPoiRecord {
    #[serde(default, alias = "place_id")]
    pub id: Option<Value>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, alias = "tag", alias = "type")]
    pub tags: Option<Value>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "latitude")]
    pub lat: Option<Value>,
    #[serde(default, alias = "lon", alias = "longitude")]
    pub lng: Option<Value>,
    #[serde(default, alias = "avg_cost")]
    pub price: Option<Value>,
    #[serde(default)]
    pub rating: Option<Value>,
    #[serde(default)]
    pub outdoor: Option<bool>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default, alias = "image_url1")]
    pub image_url: Option<String>,
}

impl RawPoiRecord {
    /// Validate required fields and normalize the optional ones.
    ///
    /// `category_hint` fills in the category for rows that carry none.
    pub fn into_poi(self, category_hint: Option<PoiCategory>) -> Result<Poi, String> {
        let id = match self.id {
            Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
            Some(Value::Number(n)) => n.to_string(),
            _ => return Err("record has no identifier".to_string()),
        };

        let lat = self.lat.as_ref().and_then(parse_coordinate);
        let lng = self.lng.as_ref().and_then(parse_coordinate);
        let coordinates = match (lat, lng) {
            (Some(lat), Some(lng)) => Coordinates::new(lat, lng)
                .map_err(|e| format!("record {} has invalid coordinates: {}", id, e))?,
            _ => return Err(format!("record {} has no usable coordinates", id)),
        };

        let name = self
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .or_else(|| self.address.clone().filter(|a| !a.trim().is_empty()))
            .unwrap_or_else(|| id.clone());

        let category = match self.category.as_deref() {
            Some(raw) if !raw.trim().is_empty() => PoiCategory::canonicalize(raw),
            _ => category_hint.unwrap_or(PoiCategory::Unknown),
        };

        let tags: BTreeSet<String> = match self.tags {
            Some(Value::String(s)) => split_tags(&s).into_iter().collect(),
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .flat_map(split_tags)
                .collect(),
            _ => BTreeSet::new(),
        };

        let price = self.price.as_ref().and_then(parse_price);
        let rating = self
            .rating
            .as_ref()
            .and_then(parse_number)
            .map(|r| (r as f32).clamp(0.0, 5.0));

        let outdoor = self.outdoor.unwrap_or_else(|| {
            category == PoiCategory::Attraction
                || tags.iter().any(|t| OUTDOOR_HINTS.contains(&t.as_str()))
        });

        Ok(Poi {
            id: PoiId(id),
            name,
            coordinates,
            category,
            description: self.description.unwrap_or_default().trim().to_string(),
            tags,
            price,
            rating,
            outdoor,
            address: self.address.filter(|a| !a.trim().is_empty()),
            image_url: self
                .image_url
                .filter(|u| u.starts_with("http://") || u.starts_with("https://")),
        })
    }
}

/// Validate a batch of raw records. Rejected rows are logged and skipped;
/// later duplicates of (name, lat, lng) collapse onto the first occurrence.
pub fn normalize_records(
    records: Vec<RawPoiRecord>,
    category_hint: Option<PoiCategory>,
) -> Vec<Poi> {
    let mut seen = HashSet::new();
    let mut seen_ids = HashSet::new();
    let mut pois = Vec::with_capacity(records.len());

    for record in records {
        match record.into_poi(category_hint) {
            Ok(poi) => {
                let key = (
                    poi.name.to_lowercase(),
                    poi.coordinates.grid_key(6),
                );
                if seen.contains(&key) || seen_ids.contains(&poi.id) {
                    tracing::debug!(id = %poi.id, name = %poi.name, "Skipping duplicate catalog record");
                    continue;
                }
                seen.insert(key);
                seen_ids.insert(poi.id.clone());
                pois.push(poi);
            }
            Err(e) => {
                tracing::warn!("Rejected catalog record: {}", e);
            }
        }
    }

    pois
}

/// Split a tag string on `,`, `;` or `|` into lowercase, trimmed tags.
pub fn split_tags(raw: &str) -> Vec<String> {
    raw.split([',', ';', '|'])
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Parse a coordinate that may have been mangled by thousand separators,
/// e.g. `"10.791.858.651"` → `10.791858651`. The first `.` or `,` is the
/// decimal point; later separators are dropped.
pub fn parse_coordinate(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let s = s.trim();
            let mut out = String::with_capacity(s.len());
            let mut chars = s.chars().peekable();
            if let Some(&sign) = chars.peek() {
                if sign == '+' || sign == '-' {
                    out.push(sign);
                    chars.next();
                }
            }
            let mut used_decimal = false;
            for ch in chars {
                if ch.is_ascii_digit() {
                    out.push(ch);
                } else if (ch == '.' || ch == ',') && !used_decimal {
                    out.push('.');
                    used_decimal = true;
                }
            }
            out.parse().ok()
        }
        _ => None,
    }
}

/// Parse a price such as `120000`, `"120.000đ"` or `"45,5"`.
fn parse_price(value: &Value) -> Option<f64> {
    let price = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
                .collect();
            // "120.000" and "120,000" are thousand-separated amounts
            let parts: Vec<&str> = cleaned.split(['.', ',']).collect();
            if parts.len() > 1 && parts[1..].iter().all(|p| p.len() == 3) {
                parts.concat().parse().ok()
            } else {
                cleaned.replacen(',', ".", 1).parse().ok()
            }
        }
        _ => None,
    }?;
    (price.is_finite() && price >= 0.0).then_some(price)
}

fn parse_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', ".").parse().ok(),
        _ => None,
    }
}
