//! A module for computing current-flow (random walk) betweenness.

use std::fmt::Debug;

use itertools::Itertools;
use nalgebra::DMatrix;

use crate::{
    centrality::{CentralityMeasure, EdgeScores, NodeScores},
    edge::EdgeKey,
    error::CentralityError,
    graph::{edge_weight, Graph},
};

/// Current-flow betweenness, also known as random walk betweenness.
///
/// The graph is treated as an electrical network in which every edge is a resistor whose
/// conductance is the edge weight (1 when missing). For every pair of nodes `s`, `t` a unit
/// current enters at `s` and leaves at `t`:
///
/// - the score of an edge is the sum over all pairs of the absolute current it carries,
/// - the score of a node is the sum, over the pairs it isn't an end of, of the current flowing
///   through it (half the absolute current on its incident edges).
///
/// When normalized, node scores are divided by `(n - 1)(n - 2) / 2` and edge scores by
/// `(n - 1)(n - 2)`. Unnormalized edge scores are halved, as are normalized ones on graphs of
/// fewer than three nodes.
///
/// Only defined for undirected, connected graphs. The potentials come from inverting the reduced
/// laplacian, which costs `O(n³)` time and `O(n²)` memory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CurrentFlowBetweenness {
    normalized: bool,
}

impl Default for CurrentFlowBetweenness {
    fn default() -> Self {
        Self { normalized: true }
    }
}

impl CurrentFlowBetweenness {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn normalized(mut self, normalized: bool) -> Self {
        self.normalized = normalized;
        self
    }

    /// Computes both scores at once, nodes indexed like [`Graph::index`].
    fn compute<N>(
        &self,
        graph: &Graph<N>,
        weight_key: &str,
    ) -> Result<(Vec<f64>, EdgeScores<N>), CentralityError>
    where
        N: Clone + Ord + Debug,
    {
        if graph.is_directed() {
            return Err(CentralityError::Directed);
        }

        let n = graph.node_count();
        if n == 0 {
            return Ok((Vec::new(), EdgeScores::new()));
        }
        if !graph.is_connected() {
            return Err(CentralityError::NotConnected);
        }

        let potentials = potential_matrix(graph.weighted_laplacian(weight_key)?)?;
        let index = graph.index();

        // Resolve every edge once: its end indices and its conductance.
        let resistors: Vec<(EdgeKey<N>, usize, usize, f64)> = graph
            .edges()
            .filter(|(edge, _)| !edge.is_loop())
            .map(|(edge, attrs)| {
                let w = edge_weight(edge, attrs, weight_key)?;
                Ok((edge.clone(), index[edge.source()], index[edge.target()], w))
            })
            .collect::<Result<_, CentralityError>>()?;

        let mut node_scores = vec![0.0; n];
        let mut edge_totals = vec![0.0; resistors.len()];
        let mut throughput = vec![0.0; n];

        for (s, t) in (0..n).tuple_combinations() {
            throughput.iter_mut().for_each(|x| *x = 0.0);

            for (total, (_, i, j, conductance)) in edge_totals.iter_mut().zip(&resistors) {
                let p_i = potentials[(*i, s)] - potentials[(*i, t)];
                let p_j = potentials[(*j, s)] - potentials[(*j, t)];
                let current = (conductance * (p_i - p_j)).abs();

                *total += current;
                throughput[*i] += current;
                throughput[*j] += current;
            }

            for (v, flow) in throughput.iter().enumerate() {
                if v != s && v != t {
                    node_scores[v] += flow / 2.0;
                }
            }
        }

        if self.normalized && n > 2 {
            let pairs = ((n - 1) * (n - 2)) as f64 / 2.0;
            node_scores.iter_mut().for_each(|x| *x /= pairs);
        }

        let edge_scale = if self.normalized && n > 2 {
            ((n - 1) * (n - 2)) as f64
        } else {
            2.0
        };
        edge_totals.iter_mut().for_each(|x| *x /= edge_scale);

        let mut edge_scores: EdgeScores<N> = graph
            .edges()
            .map(|(edge, _)| (edge.clone(), 0.0))
            .collect();
        for ((edge, ..), total) in resistors.into_iter().zip(edge_totals) {
            edge_scores.insert(edge, total);
        }

        Ok((node_scores, edge_scores))
    }
}

impl<N> CentralityMeasure<N> for CurrentFlowBetweenness
where
    N: Clone + Ord + Debug,
{
    fn node_centrality(
        &self,
        graph: &Graph<N>,
        weight_key: &str,
    ) -> Result<NodeScores<N>, CentralityError> {
        let (scores, _) = self.compute(graph, weight_key)?;

        Ok(graph.index().into_keys().zip(scores).collect())
    }

    fn edge_centrality(
        &self,
        graph: &Graph<N>,
        weight_key: &str,
    ) -> Result<EdgeScores<N>, CentralityError> {
        let (_, scores) = self.compute(graph, weight_key)?;

        Ok(scores)
    }
}

/// Returns the matrix whose column `s` holds the node potentials when a unit current enters at
/// `s` and leaves at the first node, which is grounded.
///
/// Potential differences between two such columns give the potentials of any source-sink pair.
fn potential_matrix(laplacian: DMatrix<f64>) -> Result<DMatrix<f64>, CentralityError> {
    let n = laplacian.nrows();
    let mut potentials = DMatrix::<f64>::zeros(n, n);

    // Early return, grounding leaves nothing to invert.
    if n < 2 {
        return Ok(potentials);
    }

    // Grounding the first node removes the laplacian's null space.
    let reduced = laplacian.view((1, 1), (n - 1, n - 1)).into_owned();
    let inverse = reduced.try_inverse().ok_or(CentralityError::Singular)?;
    potentials.view_mut((1, 1), (n - 1, n - 1)).copy_from(&inverse);

    Ok(potentials)
}
