use crate::models::PoiId;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Per-component scores, each already normalized to [0, 1].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct ScoreBreakdown {
    pub text_similarity: f64,
    pub budget_fit: f64,
    pub weather_fit: f64,
    pub tag_match: f64,
}

/// A POI's position in one ranking run. Scores are only comparable with
/// other candidates produced by the same run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankedCandidate {
    pub poi_id: PoiId,
    pub score: f64,
    pub breakdown: ScoreBreakdown,
}

impl RankedCandidate {
    /// Descending by score, then ascending by POI id.
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .total_cmp(&self.score)
            .then_with(|| self.poi_id.cmp(&other.poi_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: &str, score: f64) -> RankedCandidate {
        RankedCandidate {
            poi_id: PoiId::new(id),
            score,
            breakdown: ScoreBreakdown::default(),
        }
    }

    #[test]
    fn test_rank_order_breaks_ties_by_id() {
        let mut ranked = vec![
            candidate("b", 0.5),
            candidate("c", 0.9),
            candidate("a", 0.5),
        ];
        ranked.sort_by(RankedCandidate::rank_cmp);
        let ids: Vec<&str> = ranked.iter().map(|c| c.poi_id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }
}
