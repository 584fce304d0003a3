//! Weighted reciprocal rank fusion of the dense and sparse rankings.

use std::cmp::Ordering;
use std::collections::HashMap;

/// Combines two rankings with `score(d) = Σ weight_i / (c + rank_i(d))`.
#[derive(Debug, Clone, Copy)]
pub struct RankFusion {
    dense_weight: f32,
    sparse_weight: f32,
    /// RRF constant c (typically 60).
    constant: f32,
}

impl RankFusion {
    pub fn new(dense_weight: f32, sparse_weight: f32, constant: f32) -> Self {
        Self {
            dense_weight,
            sparse_weight,
            constant,
        }
    }

    /// Fuse two ranked `(position, score)` lists.
    ///
    /// Ties go to the chunk that starts earlier in the video (chunks without a
    /// timestamp last), then to the lower position. Each position appears once.
    pub fn fuse(
        &self,
        dense: &[(usize, f32)],
        sparse: &[(usize, f32)],
        start_of: impl Fn(usize) -> Option<f64>,
    ) -> Vec<(usize, f32)> {
        let mut scores: HashMap<usize, f32> = HashMap::new();

        for (weight, ranking) in [(self.dense_weight, dense), (self.sparse_weight, sparse)] {
            for (rank, (idx, _score)) in ranking.iter().enumerate() {
                *scores.entry(*idx).or_insert(0.0) +=
                    weight / (self.constant + rank as f32 + 1.0);
            }
        }

        let mut fused: Vec<(usize, f32)> = scores.into_iter().collect();
        fused.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| compare_start(start_of(a.0), start_of(b.0)))
                .then(a.0.cmp(&b.0))
        });
        fused
    }
}

impl Default for RankFusion {
    fn default() -> Self {
        Self::new(0.4, 0.6, 60.0)
    }
}

fn compare_start(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rrf_fusion_rewards_agreement() {
        let fusion = RankFusion::default();
        let dense = vec![(0, 0.9), (1, 0.8), (2, 0.7)];
        let sparse = vec![(2, 9.5), (0, 8.5), (3, 7.5)];

        let fused = fusion.fuse(&dense, &sparse, |_| None);

        // 0 and 2 appear in both lists, so they outrank the single-list hits.
        let order: Vec<usize> = fused.iter().map(|f| f.0).collect();
        assert_eq!(order, vec![0, 2, 3, 1]);
        for (_, score) in &fused {
            assert!(*score > 0.0);
        }
    }

    #[test]
    fn test_weights_decide_single_list_winners() {
        let dense = vec![(0, 0.9)];
        let sparse = vec![(1, 3.0)];

        let lexical_heavy = RankFusion::new(0.4, 0.6, 60.0).fuse(&dense, &sparse, |_| None);
        assert_eq!(lexical_heavy[0].0, 1);

        let semantic_heavy = RankFusion::new(0.9, 0.1, 60.0).fuse(&dense, &sparse, |_| None);
        assert_eq!(semantic_heavy[0].0, 0);
    }

    #[test]
    fn test_ties_prefer_earlier_timestamp() {
        let fusion = RankFusion::new(0.5, 0.5, 60.0);
        // Same rank in opposite lists: identical fused scores.
        let dense = vec![(4, 0.9)];
        let sparse = vec![(7, 2.0)];

        let starts = |idx: usize| match idx {
            4 => Some(120.0),
            7 => Some(30.0),
            _ => None,
        };
        let fused = fusion.fuse(&dense, &sparse, starts);
        assert_eq!(fused.iter().map(|f| f.0).collect::<Vec<_>>(), vec![7, 4]);

        let untimed = fusion.fuse(&dense, &sparse, |_| None);
        assert_eq!(untimed.iter().map(|f| f.0).collect::<Vec<_>>(), vec![4, 7]);
    }

    #[test]
    fn test_empty_rankings() {
        assert!(RankFusion::default().fuse(&[], &[], |_| None).is_empty());
    }
}
