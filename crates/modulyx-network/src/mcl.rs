//! Graph clustering capability and a Markov clustering (MCL) implementation.

use modulyx_common::config::ClusteringConfig;
use tracing::debug;

/// Partitions a weighted graph into groups of node indices.
///
/// Implementations may return groups in any deterministic order; the
/// partitioner relies on that order to break size ties.
pub trait Clusterer: Send + Sync {
    fn cluster(&self, adjacency: &[Vec<f64>], inflation: f64) -> Vec<Vec<usize>>;
}

/// Markov clustering by alternating expansion and inflation of a
/// column-stochastic flow matrix.
#[derive(Debug, Clone)]
pub struct MarkovClustering {
    pub expansion: u32,
    pub max_iterations: usize,
    pub pruning_threshold: f64,
    pub self_loop_weight: f64,
}

impl Default for MarkovClustering {
    fn default() -> Self {
        Self::from_config(&ClusteringConfig::default())
    }
}

type Matrix = Vec<Vec<f64>>;

impl MarkovClustering {
    pub fn from_config(cfg: &ClusteringConfig) -> Self {
        Self {
            expansion: cfg.expansion,
            max_iterations: cfg.max_iterations,
            pruning_threshold: cfg.pruning_threshold,
            self_loop_weight: cfg.self_loop_weight,
        }
    }

    /// Run MCL to convergence and return the final flow matrix.
    pub fn run(&self, adjacency: &[Vec<f64>], inflation: f64) -> Matrix {
        let n = adjacency.len();
        let mut matrix: Matrix = adjacency.to_vec();
        for (i, row) in matrix.iter_mut().enumerate() {
            row[i] = self.self_loop_weight;
        }
        normalize_columns(&mut matrix);

        for iteration in 0..self.max_iterations {
            let last = matrix.clone();
            matrix = self.expand(&matrix);
            inflate(&mut matrix, inflation);
            if self.pruning_threshold > 0.0 {
                prune(&mut matrix, self.pruning_threshold);
            }
            if converged(&matrix, &last) {
                debug!(iteration, nodes = n, "MCL converged");
                break;
            }
        }
        matrix
    }

    fn expand(&self, matrix: &Matrix) -> Matrix {
        let mut result = matrix.clone();
        for _ in 1..self.expansion {
            result = multiply(&result, matrix);
        }
        result
    }
}

impl Clusterer for MarkovClustering {
    fn cluster(&self, adjacency: &[Vec<f64>], inflation: f64) -> Vec<Vec<usize>> {
        if adjacency.is_empty() {
            return Vec::new();
        }
        let matrix = self.run(adjacency, inflation);
        clusters_from_flow(&matrix)
    }
}

/// Attractors are nodes with non-zero self-flow; each attractor's row lists
/// the nodes it attracts. Identical groups collapse and the result is sorted.
pub fn clusters_from_flow(matrix: &[Vec<f64>]) -> Vec<Vec<usize>> {
    let mut clusters: Vec<Vec<usize>> = (0..matrix.len())
        .filter(|&i| matrix[i][i] > 0.0)
        .map(|att| {
            matrix[att]
                .iter()
                .enumerate()
                .filter(|(_, &v)| v != 0.0)
                .map(|(j, _)| j)
                .collect()
        })
        .collect();
    clusters.sort();
    clusters.dedup();
    clusters
}

fn multiply(a: &Matrix, b: &Matrix) -> Matrix {
    let n = a.len();
    let mut out = vec![vec![0.0; n]; n];
    for i in 0..n {
        for k in 0..n {
            let aik = a[i][k];
            if aik == 0.0 {
                continue;
            }
            for j in 0..n {
                out[i][j] += aik * b[k][j];
            }
        }
    }
    out
}

/// L1-normalise every column; all-zero columns are left untouched.
fn normalize_columns(matrix: &mut Matrix) {
    let n = matrix.len();
    for j in 0..n {
        let sum: f64 = matrix.iter().map(|row| row[j].abs()).sum();
        if sum > 0.0 {
            for row in matrix.iter_mut() {
                row[j] /= sum;
            }
        }
    }
}

fn inflate(matrix: &mut Matrix, power: f64) {
    for row in matrix.iter_mut() {
        for v in row.iter_mut() {
            *v = v.powf(power);
        }
    }
    normalize_columns(matrix);
}

/// Zero entries below `threshold`, keeping each column's maximum.
fn prune(matrix: &mut Matrix, threshold: f64) {
    let n = matrix.len();
    for j in 0..n {
        let mut argmax = 0;
        for i in 1..n {
            if matrix[i][j] > matrix[argmax][j] {
                argmax = i;
            }
        }
        for i in 0..n {
            if i != argmax && matrix[i][j] < threshold {
                matrix[i][j] = 0.0;
            }
        }
    }
}

fn converged(a: &Matrix, b: &Matrix) -> bool {
    const RTOL: f64 = 1e-5;
    const ATOL: f64 = 1e-8;
    a.iter().zip(b).all(|(ra, rb)| {
        ra.iter()
            .zip(rb)
            .all(|(x, y)| (x - y).abs() <= ATOL + RTOL * y.abs())
    })
}
