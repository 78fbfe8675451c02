//! Helper functions for tree building.
//!
//! Every helper works on a node's sample indices into the training matrix
//! rather than on copied sub-matrices.

use rand::Rng;

use super::Criterion;
use crate::primitives::Matrix;

/// Class histogram of the samples at `indices`.
pub(super) fn class_counts(y: &[usize], indices: &[usize], n_classes: usize) -> Vec<usize> {
    let mut counts = vec![0; n_classes];
    for &i in indices {
        counts[y[i]] += 1;
    }
    counts
}

/// Gini impurity `1 - Σ pᵢ²`, 0 for an empty node.
pub(super) fn gini(counts: &[usize]) -> f64 {
    let n: usize = counts.iter().sum();
    if n == 0 {
        return 0.0;
    }
    let n = n as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / n;
            p * p
        })
        .sum::<f64>()
}

/// Shannon entropy `-Σ pᵢ log₂ pᵢ`, 0 for an empty node.
pub(super) fn entropy(counts: &[usize]) -> f64 {
    let n: usize = counts.iter().sum();
    if n == 0 {
        return 0.0;
    }
    let n = n as f64;
    counts
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / n;
            -p * p.log2()
        })
        .sum()
}

pub(super) fn impurity(criterion: Criterion, counts: &[usize]) -> f64 {
    match criterion {
        Criterion::Gini => gini(counts),
        Criterion::Entropy => entropy(counts),
    }
}

/// Most frequent class; ties go to the lowest label.
pub(super) fn majority_class(counts: &[usize]) -> usize {
    let mut best = 0;
    for (label, &count) in counts.iter().enumerate() {
        if count > counts[best] {
            best = label;
        }
    }
    best
}

/// A candidate split of one node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct Split {
    pub feature: usize,
    pub threshold: f32,
    /// Sample-weighted impurity of the two children
    pub weighted_impurity: f64,
}

/// Size constraints every child must satisfy.
#[derive(Debug, Clone, Copy)]
pub(super) struct SplitRules {
    pub criterion: Criterion,
    pub min_samples_leaf: usize,
    pub n_classes: usize,
}

impl SplitRules {
    fn weighted(&self, left: &[usize], right: &[usize]) -> f64 {
        let n_left: usize = left.iter().sum();
        let n_right: usize = right.iter().sum();
        let total = (n_left + n_right) as f64;
        (n_left as f64 * impurity(self.criterion, left)
            + n_right as f64 * impurity(self.criterion, right))
            / total
    }
}

/// Best threshold on `feature`, trying the midpoint between every pair of
/// consecutive distinct values. Ties keep the lowest threshold.
pub(super) fn best_split_for_feature(
    x: &Matrix<f32>,
    y: &[usize],
    indices: &[usize],
    feature: usize,
    rules: &SplitRules,
) -> Option<Split> {
    let mut sorted = indices.to_vec();
    sorted.sort_by(|&a, &b| x.get(a, feature).total_cmp(&x.get(b, feature)));

    let n = sorted.len();
    let mut left = vec![0; rules.n_classes];
    let mut right = class_counts(y, &sorted, rules.n_classes);
    let mut best: Option<Split> = None;

    for pos in 0..n.saturating_sub(1) {
        let label = y[sorted[pos]];
        left[label] += 1;
        right[label] -= 1;

        let n_left = pos + 1;
        if n_left < rules.min_samples_leaf || n - n_left < rules.min_samples_leaf {
            continue;
        }
        let lo = x.get(sorted[pos], feature);
        let hi = x.get(sorted[pos + 1], feature);
        if lo >= hi {
            continue;
        }

        let weighted_impurity = rules.weighted(&left, &right);
        if best.map_or(true, |b| weighted_impurity < b.weighted_impurity) {
            let mid = lo + (hi - lo) / 2.0;
            // Rounding can push the midpoint onto `hi`, which would move it left.
            let threshold = if mid < hi { mid } else { lo };
            best = Some(Split {
                feature,
                threshold,
                weighted_impurity,
            });
        }
    }
    best
}

/// One threshold drawn uniformly from `[min, max)` of `feature`.
pub(super) fn random_split_for_feature<R: Rng>(
    x: &Matrix<f32>,
    y: &[usize],
    indices: &[usize],
    feature: usize,
    rules: &SplitRules,
    rng: &mut R,
) -> Option<Split> {
    let (min, max) = indices.iter().fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &i| {
        let v = x.get(i, feature);
        (lo.min(v), hi.max(v))
    });
    if !(min < max) {
        return None;
    }
    let threshold = rng.gen_range(min..max);

    let mut left = vec![0; rules.n_classes];
    let mut right = vec![0; rules.n_classes];
    for &i in indices {
        if x.get(i, feature) <= threshold {
            left[y[i]] += 1;
        } else {
            right[y[i]] += 1;
        }
    }
    let n_left: usize = left.iter().sum();
    let n_right: usize = right.iter().sum();
    if n_left < rules.min_samples_leaf || n_right < rules.min_samples_leaf {
        return None;
    }

    Some(Split {
        feature,
        threshold,
        weighted_impurity: rules.weighted(&left, &right),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rules(min_samples_leaf: usize) -> SplitRules {
        SplitRules {
            criterion: Criterion::Gini,
            min_samples_leaf,
            n_classes: 2,
        }
    }

    #[test]
    fn test_gini() {
        assert_eq!(gini(&[4, 0]), 0.0);
        assert!((gini(&[2, 2]) - 0.5).abs() < 1e-12);
        assert!((gini(&[1, 3]) - 0.375).abs() < 1e-12);
        assert_eq!(gini(&[0, 0]), 0.0);
    }

    #[test]
    fn test_entropy() {
        assert_eq!(entropy(&[5, 0]), 0.0);
        assert!((entropy(&[3, 3]) - 1.0).abs() < 1e-12);
        let expected = -(0.25_f64 * 0.25_f64.log2() + 0.75 * 0.75_f64.log2());
        assert!((entropy(&[1, 3]) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_majority_ties_go_low() {
        assert_eq!(majority_class(&[2, 2]), 0);
        assert_eq!(majority_class(&[1, 3]), 1);
        assert_eq!(majority_class(&[0, 2, 2]), 1);
    }

    #[test]
    fn test_best_split_uses_midpoint() {
        let x = Matrix::from_vec(4, 1, vec![1.0, 2.0, 4.0, 8.0]).expect("4x1");
        let y = [0, 0, 1, 1];
        let split = best_split_for_feature(&x, &y, &[0, 1, 2, 3], 0, &rules(1)).expect("split");
        assert_eq!(split.threshold, 3.0);
        assert_eq!(split.weighted_impurity, 0.0);
    }

    #[test]
    fn test_best_split_respects_min_leaf() {
        let x = Matrix::from_vec(4, 1, vec![1.0, 2.0, 3.0, 4.0]).expect("4x1");
        let y = [0, 1, 1, 1];
        let split = best_split_for_feature(&x, &y, &[0, 1, 2, 3], 0, &rules(2)).expect("split");
        assert_eq!(split.threshold, 2.5);
    }

    #[test]
    fn test_constant_feature_has_no_split() {
        let x = Matrix::from_vec(3, 1, vec![5.0, 5.0, 5.0]).expect("3x1");
        let y = [0, 1, 0];
        assert!(best_split_for_feature(&x, &y, &[0, 1, 2], 0, &rules(1)).is_none());
        let mut rng = StdRng::seed_from_u64(0);
        assert!(random_split_for_feature(&x, &y, &[0, 1, 2], 0, &rules(1), &mut rng).is_none());
    }

    #[test]
    fn test_random_split_within_range() {
        let x = Matrix::from_vec(5, 1, vec![0.0, 1.0, 2.0, 3.0, 10.0]).expect("5x1");
        let y = [0, 0, 1, 1, 1];
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..20 {
            let split = random_split_for_feature(&x, &y, &[0, 1, 2, 3, 4], 0, &rules(1), &mut rng)
                .expect("range is non-empty");
            assert!((0.0..10.0).contains(&split.threshold));
        }
    }
}
