use crate::config::PlannerConfig;
use crate::models::{DayBucket, Poi, PoiId, PoiIndex, RankedCandidate};
use std::collections::HashSet;

/// Budget charged for one POI.
pub fn poi_cost(poi: &Poi, missing_price_cost: f64) -> f64 {
    poi.price.unwrap_or(missing_price_cost).max(0.0)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    /// Exactly one bucket per day, members in rank order
    pub buckets: Vec<DayBucket>,
    /// Ranked candidates that fit no bucket, in rank order
    pub unallocated: Vec<PoiId>,
}

/// Greedy one-pass partition of ranked candidates into day buckets.
///
/// Each candidate goes to the cheapest bucket that still has room under the
/// per-day cap and can absorb its cost within the daily budget; the bucket
/// with fewer members, then the lowest day index, wins ties. A candidate that
/// fits nowhere is dropped, not deferred. This is a load-balancing heuristic,
/// not an optimal packing.
#[derive(Debug, Clone)]
pub struct DayAllocator {
    max_pois_per_day: Option<usize>,
    missing_price_cost: f64,
}

impl DayAllocator {
    pub fn new(config: &PlannerConfig) -> Self {
        DayAllocator {
            max_pois_per_day: config.max_pois_per_day,
            missing_price_cost: config.missing_price_cost,
        }
    }

    pub fn allocate(
        &self,
        ranked: &[RankedCandidate],
        pois: &PoiIndex<'_>,
        days: usize,
        budget_per_day: f64,
    ) -> Allocation {
        let mut buckets: Vec<DayBucket> = (0..days).map(DayBucket::new).collect();
        let mut unallocated = Vec::new();
        let mut seen: HashSet<&PoiId> = HashSet::new();

        for candidate in ranked {
            if !seen.insert(&candidate.poi_id) {
                continue;
            }
            let Some(poi) = pois.get(&candidate.poi_id) else {
                tracing::warn!("Ranked POI {} missing from candidate set", candidate.poi_id);
                continue;
            };
            let cost = poi_cost(poi, self.missing_price_cost);

            let target = buckets
                .iter_mut()
                .filter(|b| self.has_room(b) && b.total_cost + cost <= budget_per_day)
                .min_by(|a, b| {
                    a.total_cost
                        .total_cmp(&b.total_cost)
                        .then_with(|| a.len().cmp(&b.len()))
                        .then_with(|| a.day_index.cmp(&b.day_index))
                });

            match target {
                Some(bucket) => {
                    bucket.poi_ids.push(candidate.poi_id.clone());
                    bucket.total_cost += cost;
                }
                None => unallocated.push(candidate.poi_id.clone()),
            }
        }

        let empty_days = buckets.iter().filter(|b| b.is_empty()).count();
        if empty_days > 0 {
            tracing::warn!("{} of {} days received no POIs", empty_days, days);
        }
        tracing::debug!(
            allocated = ranked.len() - unallocated.len(),
            dropped = unallocated.len(),
            "Allocated candidates across {} days",
            days
        );

        Allocation {
            buckets,
            unallocated,
        }
    }

    fn has_room(&self, bucket: &DayBucket) -> bool {
        self.max_pois_per_day
            .map_or(true, |cap| bucket.len() < cap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Coordinates, PoiCategory, ScoreBreakdown};

    fn pois_priced(prices: &[Option<f64>]) -> Vec<Poi> {
        prices
            .iter()
            .enumerate()
            .map(|(i, price)| {
                let mut poi = Poi::new(
                    format!("p{:02}", i),
                    format!("Place {}", i),
                    PoiCategory::Food,
                    Coordinates::new(10.77 + i as f64 * 0.001, 106.70).unwrap(),
                );
                poi.price = *price;
                poi
            })
            .collect()
    }

    /// Candidates ranked in input order.
    fn ranked(pois: &[Poi]) -> Vec<RankedCandidate> {
        pois.iter()
            .enumerate()
            .map(|(i, p)| RankedCandidate {
                poi_id: p.id.clone(),
                score: 1.0 - i as f64 * 0.01,
                breakdown: ScoreBreakdown::default(),
            })
            .collect()
    }

    #[test]
    fn test_budget_limited_allocation() {
        let pois = pois_priced(&[Some(100_000.0); 10]);
        let allocator = DayAllocator::new(&PlannerConfig::default());
        let result = allocator.allocate(&ranked(&pois), &PoiIndex::new(&pois), 2, 300_000.0);

        assert_eq!(result.buckets.len(), 2);
        for bucket in &result.buckets {
            assert_eq!(bucket.len(), 3);
            assert!(bucket.total_cost <= 300_000.0);
        }
        // Round-robin: best candidate on day 0, second best on day 1
        assert_eq!(result.buckets[0].poi_ids[0].as_str(), "p00");
        assert_eq!(result.buckets[1].poi_ids[0].as_str(), "p01");
        assert!(result.unallocated.iter().any(|id| id.as_str() == "p09"));
        assert_eq!(result.unallocated.len(), 4);
    }

    #[test]
    fn test_exactly_days_buckets_without_duplicates() {
        let pois = pois_priced(&[Some(10.0), None, Some(20.0), Some(5.0), None]);
        let mut candidates = ranked(&pois);
        candidates.push(candidates[0].clone());

        let allocator = DayAllocator::new(&PlannerConfig::default());
        let result = allocator.allocate(&candidates, &PoiIndex::new(&pois), 4, 100.0);
        assert_eq!(result.buckets.len(), 4);

        let mut all: Vec<&PoiId> = result.buckets.iter().flat_map(|b| &b.poi_ids).collect();
        let before = all.len();
        all.sort();
        all.dedup();
        assert_eq!(all.len(), before);
        assert_eq!(before, 5);
    }

    #[test]
    fn test_unaffordable_candidates_leave_empty_days() {
        let pois = pois_priced(&[Some(500.0), Some(50.0)]);
        let allocator = DayAllocator::new(&PlannerConfig::default());
        let result = allocator.allocate(&ranked(&pois), &PoiIndex::new(&pois), 3, 100.0);

        assert_eq!(result.buckets[0].poi_ids, vec![PoiId::new("p01")]);
        assert!(result.buckets[1].is_empty());
        assert!(result.buckets[2].is_empty());
        assert_eq!(result.unallocated, vec![PoiId::new("p00")]);
    }

    #[test]
    fn test_cap_excludes_full_buckets() {
        let pois = pois_priced(&[None; 5]);
        let config = PlannerConfig {
            max_pois_per_day: Some(2),
            ..PlannerConfig::default()
        };
        let result = DayAllocator::new(&config).allocate(
            &ranked(&pois),
            &PoiIndex::new(&pois),
            2,
            0.0,
        );
        assert!(result.buckets.iter().all(|b| b.len() == 2));
        // Free POIs still spread across days
        assert_eq!(result.buckets[1].poi_ids[0].as_str(), "p01");
        assert_eq!(result.unallocated, vec![PoiId::new("p04")]);
    }

    #[test]
    fn test_missing_price_cost_is_charged() {
        let pois = pois_priced(&[None, None, None]);
        let config = PlannerConfig {
            missing_price_cost: 40.0,
            max_pois_per_day: None,
            ..PlannerConfig::default()
        };
        let result = DayAllocator::new(&config).allocate(
            &ranked(&pois),
            &PoiIndex::new(&pois),
            1,
            100.0,
        );
        assert_eq!(result.buckets[0].len(), 2);
        assert_eq!(result.buckets[0].total_cost, 80.0);
    }
}
