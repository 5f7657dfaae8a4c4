pub mod text_similarity;

use crate::config::{PlannerConfig, RankingWeights};
use crate::constants::{NEUTRAL_BUDGET_FIT, NEUTRAL_TAG_MATCH};
use crate::error::{AppError, Result};
use crate::models::{Poi, RankedCandidate, ScoreBreakdown, WeatherContext};
use text_similarity::TfIdfIndex;

/// Everything a ranking run scores against besides the candidates themselves.
#[derive(Debug, Clone, Copy)]
pub struct RankingContext<'a> {
    pub query_text: &'a str,
    pub tags: &'a [String],
    pub budget_per_day: f64,
    /// Number of planned days; weather fit averages over them
    pub days: usize,
    pub weather: &'a WeatherContext,
}

/// Scores candidate POIs and orders them best first.
#[derive(Debug, Clone)]
pub struct PoiRanker {
    weights: RankingWeights,
    budget_fraction: f64,
    budget_decay_multiple: f64,
    weather_penalty: f64,
}

impl PoiRanker {
    pub fn new(config: &PlannerConfig) -> Result<Self> {
        config.weights.validate().map_err(AppError::Config)?;
        Ok(PoiRanker {
            weights: config.weights,
            budget_fraction: config.budget_fraction,
            budget_decay_multiple: config.budget_decay_multiple,
            weather_penalty: config.weather_penalty,
        })
    }

    /// Rank every candidate. Output has the same length as the input and is
    /// sorted by score descending, then by POI id.
    pub fn rank(&self, candidates: &[Poi], ctx: &RankingContext<'_>) -> Vec<RankedCandidate> {
        if candidates.is_empty() {
            return Vec::new();
        }

        let documents: Vec<String> = candidates.iter().map(Poi::searchable_text).collect();
        let index = TfIdfIndex::fit(&documents);
        let query = build_query(ctx.query_text, ctx.tags);
        let similarities = index.similarities(&query);

        let wanted = normalized_tags(ctx.tags);
        let total_weight = self.weights.sum();

        let mut ranked: Vec<RankedCandidate> = candidates
            .iter()
            .zip(similarities)
            .map(|(poi, text_similarity)| {
                let breakdown = ScoreBreakdown {
                    text_similarity,
                    budget_fit: self.budget_fit(poi.price, ctx.budget_per_day),
                    weather_fit: self.weather_fit(poi.outdoor, ctx.weather, ctx.days),
                    tag_match: tag_match(poi, &wanted),
                };
                let w = &self.weights;
                let score = (w.text_weight * breakdown.text_similarity
                    + w.budget_weight * breakdown.budget_fit
                    + w.weather_weight * breakdown.weather_fit
                    + w.tag_weight * breakdown.tag_match)
                    / total_weight;
                RankedCandidate {
                    poi_id: poi.id.clone(),
                    score,
                    breakdown,
                }
            })
            .collect();

        ranked.sort_by(RankedCandidate::rank_cmp);

        tracing::debug!(
            candidates = ranked.len(),
            vocabulary = index.vocabulary_size(),
            "Ranked {} candidates",
            ranked.len()
        );
        ranked
    }

    /// 1.0 up to the reference share of the daily budget, then linear decay
    /// reaching 0 at `budget_decay_multiple` times that share.
    fn budget_fit(&self, price: Option<f64>, budget_per_day: f64) -> f64 {
        let Some(price) = price else {
            return NEUTRAL_BUDGET_FIT;
        };
        let reference = budget_per_day * self.budget_fraction;
        if price <= reference {
            return 1.0;
        }
        let limit = reference * self.budget_decay_multiple;
        if price >= limit || limit <= reference {
            return 0.0;
        }
        (1.0 - (price - reference) / (limit - reference)).clamp(0.0, 1.0)
    }

    /// Mean fit across the planned days; days without a forecast count as 1.0.
    fn weather_fit(&self, outdoor: bool, weather: &WeatherContext, days: usize) -> f64 {
        let days = days.max(1);
        let total: f64 = (0..days)
            .map(|day| {
                if weather.condition(day).favours(outdoor) {
                    1.0
                } else {
                    self.weather_penalty
                }
            })
            .sum();
        total / days as f64
    }
}

fn build_query(query_text: &str, tags: &[String]) -> String {
    let mut query = query_text.trim().to_string();
    for tag in tags {
        query.push(' ');
        query.push_str(tag);
    }
    query
}

fn normalized_tags(tags: &[String]) -> Vec<String> {
    let mut wanted: Vec<String> = tags
        .iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect();
    wanted.sort();
    wanted.dedup();
    wanted
}

/// Fraction of wanted tags the POI carries; a POI tag containing the wanted
/// tag counts ("vegan" matches "vegan-friendly").
fn tag_match(poi: &Poi, wanted: &[String]) -> f64 {
    if wanted.is_empty() {
        return NEUTRAL_TAG_MATCH;
    }
    let hits = wanted
        .iter()
        .filter(|w| poi.tags.iter().any(|t| t.contains(w.as_str())))
        .count();
    hits as f64 / wanted.len() as f64
}
