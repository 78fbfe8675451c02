//! Exact nearest-neighbor indexes under the Minkowski distance.
//!
//! Every index returns the same `k` neighbors, ordered by
//! `(distance, training index)`. The tree indexes only prune a subtree when
//! its lower bound is strictly larger than the current `k`-th distance, so
//! equidistant candidates are never lost.
//!
//! # Examples
//!
//! ```
//! use landfall::classification::neighbors::{BallTree, KdTree, NeighborSearch};
//! use landfall::primitives::Matrix;
//!
//! let points = Matrix::from_vec(4, 1, vec![0.0, 1.0, 2.0, 10.0]).expect("4x1 matrix");
//! let kd = KdTree::build(points.clone(), 2.0);
//! let ball = BallTree::build(points, 2.0);
//!
//! let near = kd.query(&[1.4], 2);
//! assert_eq!(near.iter().map(|n| n.index).collect::<Vec<_>>(), vec![1, 2]);
//! assert_eq!(near, ball.query(&[1.4], 2));
//! ```

use std::cmp::Ordering;

use crate::primitives::Matrix;

/// Points per leaf before a node is split.
const LEAF_SIZE: usize = 8;

/// Relative slack on pruning bounds, absorbing rounding in the distance.
const BOUND_SLACK: f64 = 1e-9;

/// One neighbor of a query point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Row of the training matrix
    pub index: usize,
    /// Minkowski distance to the query
    pub distance: f64,
}

impl Neighbor {
    fn cmp_key(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then(self.index.cmp(&other.index))
    }
}

/// Minkowski distance of power `p` (1 = Manhattan, 2 = Euclidean).
#[must_use]
pub fn minkowski(a: &[f32], b: &[f32], p: f64) -> f64 {
    let diffs = a.iter().zip(b).map(|(x, y)| (f64::from(*x) - f64::from(*y)).abs());
    if p == 1.0 {
        diffs.sum()
    } else if p == 2.0 {
        diffs.map(|d| d * d).sum::<f64>().sqrt()
    } else {
        diffs.map(|d| d.powf(p)).sum::<f64>().powf(1.0 / p)
    }
}

/// Sorts `indices` along the axis of widest spread and returns that axis.
/// Equal coordinates keep index order.
fn sort_on_widest_axis(points: &Matrix<f32>, indices: &mut [usize]) -> usize {
    let spread = |axis: usize| {
        let (lo, hi) = indices
            .iter()
            .map(|&i| points.get(i, axis))
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });
        hi - lo
    };
    let axis = (0..points.n_cols())
        .max_by(|&a, &b| spread(a).total_cmp(&spread(b)))
        .unwrap_or(0);
    indices.sort_by(|&a, &b| {
        points
            .get(a, axis)
            .total_cmp(&points.get(b, axis))
            .then(a.cmp(&b))
    });
    axis
}

/// The `k` best candidates seen so far, sorted ascending.
struct KBest {
    k: usize,
    items: Vec<Neighbor>,
}

impl KBest {
    fn new(k: usize) -> Self {
        Self {
            k,
            items: Vec::with_capacity(k + 1),
        }
    }

    /// Distance a candidate subtree must not exceed to be worth visiting.
    fn radius(&self) -> f64 {
        if self.items.len() < self.k {
            f64::INFINITY
        } else {
            self.items.last().map_or(f64::INFINITY, |n| n.distance)
        }
    }

    fn can_skip(&self, lower_bound: f64) -> bool {
        let radius = self.radius();
        lower_bound > radius + BOUND_SLACK * radius.max(1.0)
    }

    fn offer(&mut self, candidate: Neighbor) {
        if self.k == 0 {
            return;
        }
        if self.items.len() == self.k {
            match self.items.last() {
                Some(worst) if candidate.cmp_key(worst) == Ordering::Less => {
                    self.items.pop();
                }
                _ => return,
            }
        }
        let pos = self
            .items
            .partition_point(|n| n.cmp_key(&candidate) == Ordering::Less);
        self.items.insert(pos, candidate);
    }

    fn into_sorted(self) -> Vec<Neighbor> {
        self.items
    }
}

/// Exact `k`-nearest-neighbor query over a fixed point set.
pub trait NeighborSearch: Send + Sync {
    /// The `k` nearest rows to `point`, ordered by `(distance, index)`.
    ///
    /// Returns fewer than `k` neighbors only when the index holds fewer
    /// than `k` points.
    fn query(&self, point: &[f32], k: usize) -> Vec<Neighbor>;

    /// Number of indexed points.
    fn len(&self) -> usize;

    /// True when no points are indexed.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Linear scan over every point.
#[derive(Debug, Clone)]
pub struct BruteForce {
    points: Matrix<f32>,
    p: f64,
}

impl BruteForce {
    /// Indexes `points` for Minkowski power `p`.
    #[must_use]
    pub fn build(points: Matrix<f32>, p: f64) -> Self {
        Self { points, p }
    }
}

impl NeighborSearch for BruteForce {
    fn query(&self, point: &[f32], k: usize) -> Vec<Neighbor> {
        let mut best = KBest::new(k);
        for index in 0..self.points.n_rows() {
            best.offer(Neighbor {
                index,
                distance: minkowski(self.points.row_slice(index), point, self.p),
            });
        }
        best.into_sorted()
    }

    fn len(&self) -> usize {
        self.points.n_rows()
    }
}

#[derive(Debug, Clone)]
enum KdNode {
    Leaf(Vec<usize>),
    Split {
        axis: usize,
        threshold: f32,
        left: Box<KdNode>,
        right: Box<KdNode>,
    },
}

/// k-d tree splitting on the axis of widest spread at the median.
#[derive(Debug, Clone)]
pub struct KdTree {
    points: Matrix<f32>,
    p: f64,
    root: KdNode,
}

impl KdTree {
    /// Builds the tree over `points` for Minkowski power `p`.
    #[must_use]
    pub fn build(points: Matrix<f32>, p: f64) -> Self {
        let indices: Vec<usize> = (0..points.n_rows()).collect();
        let root = Self::build_node(&points, indices);
        Self { points, p, root }
    }

    fn build_node(points: &Matrix<f32>, mut indices: Vec<usize>) -> KdNode {
        if indices.len() <= LEAF_SIZE || points.n_cols() == 0 {
            return KdNode::Leaf(indices);
        }

        let axis = sort_on_widest_axis(points, &mut indices);
        let mid = indices.len() / 2;
        let threshold = points.get(indices[mid], axis);
        let right = indices.split_off(mid);

        KdNode::Split {
            axis,
            threshold,
            left: Box::new(Self::build_node(points, indices)),
            right: Box::new(Self::build_node(points, right)),
        }
    }

    fn search(&self, node: &KdNode, point: &[f32], best: &mut KBest) {
        match node {
            KdNode::Leaf(indices) => {
                for &index in indices {
                    best.offer(Neighbor {
                        index,
                        distance: minkowski(self.points.row_slice(index), point, self.p),
                    });
                }
            }
            KdNode::Split {
                axis,
                threshold,
                left,
                right,
            } => {
                let offset = f64::from(point[*axis]) - f64::from(*threshold);
                let (near, far) = if offset < 0.0 {
                    (left, right)
                } else {
                    (right, left)
                };
                self.search(near, point, best);
                // A single coordinate gap bounds every Minkowski distance from below.
                if !best.can_skip(offset.abs()) {
                    self.search(far, point, best);
                }
            }
        }
    }
}

impl NeighborSearch for KdTree {
    fn query(&self, point: &[f32], k: usize) -> Vec<Neighbor> {
        let mut best = KBest::new(k);
        self.search(&self.root, point, &mut best);
        best.into_sorted()
    }

    fn len(&self) -> usize {
        self.points.n_rows()
    }
}

#[derive(Debug, Clone)]
struct Ball {
    center: Vec<f32>,
    radius: f64,
    kind: BallKind,
}

#[derive(Debug, Clone)]
enum BallKind {
    Leaf(Vec<usize>),
    Inner(Box<Ball>, Box<Ball>),
}

/// Ball tree of nested hyperspheres around centroids.
#[derive(Debug, Clone)]
pub struct BallTree {
    points: Matrix<f32>,
    p: f64,
    root: Option<Ball>,
}

impl BallTree {
    /// Builds the tree over `points` for Minkowski power `p`.
    #[must_use]
    pub fn build(points: Matrix<f32>, p: f64) -> Self {
        let indices: Vec<usize> = (0..points.n_rows()).collect();
        let root = (!indices.is_empty()).then(|| Self::build_ball(&points, p, indices));
        Self { points, p, root }
    }

    fn build_ball(points: &Matrix<f32>, p: f64, mut indices: Vec<usize>) -> Ball {
        let d = points.n_cols();
        let mut center = vec![0.0_f64; d];
        for &i in &indices {
            for (c, v) in center.iter_mut().zip(points.row_slice(i)) {
                *c += f64::from(*v);
            }
        }
        let center: Vec<f32> = center
            .iter()
            .map(|c| (c / indices.len() as f64) as f32)
            .collect();
        let radius = indices
            .iter()
            .map(|&i| minkowski(points.row_slice(i), &center, p))
            .fold(0.0, f64::max);

        if indices.len() <= LEAF_SIZE || radius == 0.0 {
            return Ball {
                center,
                radius,
                kind: BallKind::Leaf(indices),
            };
        }

        sort_on_widest_axis(points, &mut indices);
        let right = indices.split_off(indices.len() / 2);

        Ball {
            center,
            radius,
            kind: BallKind::Inner(
                Box::new(Self::build_ball(points, p, indices)),
                Box::new(Self::build_ball(points, p, right)),
            ),
        }
    }

    fn lower_bound(&self, ball: &Ball, point: &[f32]) -> f64 {
        (minkowski(&ball.center, point, self.p) - ball.radius).max(0.0)
    }

    fn search(&self, ball: &Ball, point: &[f32], best: &mut KBest) {
        match &ball.kind {
            BallKind::Leaf(indices) => {
                for &index in indices {
                    best.offer(Neighbor {
                        index,
                        distance: minkowski(self.points.row_slice(index), point, self.p),
                    });
                }
            }
            BallKind::Inner(a, b) => {
                let (bound_a, bound_b) = (self.lower_bound(a, point), self.lower_bound(b, point));
                let (first, first_bound, second, second_bound) = if bound_a <= bound_b {
                    (a, bound_a, b, bound_b)
                } else {
                    (b, bound_b, a, bound_a)
                };
                if !best.can_skip(first_bound) {
                    self.search(first, point, best);
                }
                if !best.can_skip(second_bound) {
                    self.search(second, point, best);
                }
            }
        }
    }
}

impl NeighborSearch for BallTree {
    fn query(&self, point: &[f32], k: usize) -> Vec<Neighbor> {
        let mut best = KBest::new(k);
        if let Some(root) = &self.root {
            self.search(root, point, &mut best);
        }
        best.into_sorted()
    }

    fn len(&self) -> usize {
        self.points.n_rows()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_points(n: usize, d: usize, seed: u64) -> Matrix<f32> {
        let mut rng = StdRng::seed_from_u64(seed);
        let data = (0..n * d).map(|_| rng.gen_range(-5.0..5.0)).collect();
        Matrix::from_vec(n, d, data).expect("n x d matrix")
    }

    #[test]
    fn test_minkowski() {
        let a = [0.0, 0.0];
        let b = [3.0, 4.0];
        assert!((minkowski(&a, &b, 1.0) - 7.0).abs() < 1e-12);
        assert!((minkowski(&a, &b, 2.0) - 5.0).abs() < 1e-12);
        let p3 = (27.0_f64 + 64.0).powf(1.0 / 3.0);
        assert!((minkowski(&a, &b, 3.0) - p3).abs() < 1e-9);
    }

    #[test]
    fn test_trees_match_brute_force() {
        let points = random_points(200, 3, 7);
        let queries = random_points(25, 3, 8);
        for p in [1.0, 2.0, 3.0] {
            let brute = BruteForce::build(points.clone(), p);
            let kd = KdTree::build(points.clone(), p);
            let ball = BallTree::build(points.clone(), p);
            for q in 0..queries.n_rows() {
                let query = queries.row_slice(q);
                for k in [1, 5, 17] {
                    let expected = brute.query(query, k);
                    assert_eq!(expected.len(), k);
                    assert_eq!(kd.query(query, k), expected, "kd p={p} k={k}");
                    assert_eq!(ball.query(query, k), expected, "ball p={p} k={k}");
                }
            }
        }
    }

    #[test]
    fn test_ties_ordered_by_index() {
        // Every point sits at distance 1 from the origin.
        let points = Matrix::from_vec(
            12,
            1,
            vec![1.0, -1.0, 1.0, -1.0, 1.0, -1.0, 1.0, -1.0, 1.0, -1.0, 1.0, -1.0],
        )
        .expect("12x1 matrix");
        let indexes: Vec<Box<dyn NeighborSearch>> = vec![
            Box::new(BruteForce::build(points.clone(), 2.0)),
            Box::new(KdTree::build(points.clone(), 2.0)),
            Box::new(BallTree::build(points, 2.0)),
        ];
        for index in &indexes {
            let found: Vec<usize> = index.query(&[0.0], 4).iter().map(|n| n.index).collect();
            assert_eq!(found, vec![0, 1, 2, 3]);
        }
    }

    #[test]
    fn test_duplicate_points() {
        let points = Matrix::from_vec(20, 2, vec![1.0; 40]).expect("20x2 matrix");
        let kd = KdTree::build(points.clone(), 2.0);
        let ball = BallTree::build(points, 2.0);
        let expected: Vec<usize> = (0..5).collect();
        let kd_found: Vec<usize> = kd.query(&[0.0, 0.0], 5).iter().map(|n| n.index).collect();
        let ball_found: Vec<usize> = ball.query(&[0.0, 0.0], 5).iter().map(|n| n.index).collect();
        assert_eq!(kd_found, expected);
        assert_eq!(ball_found, expected);
    }

    #[test]
    fn test_k_larger_than_index() {
        let points = random_points(3, 2, 1);
        let kd = KdTree::build(points, 2.0);
        assert_eq!(kd.len(), 3);
        assert_eq!(kd.query(&[0.0, 0.0], 10).len(), 3);
    }

    #[test]
    fn test_empty_index() {
        let ball = BallTree::build(Matrix::zeros(0, 2), 2.0);
        assert!(ball.is_empty());
        assert!(ball.query(&[0.0, 0.0], 3).is_empty());
    }
}
