//! Evaluation of centrality measures over a graph.
//!
//! The evaluator doesn't compute anything itself: it runs a node centrality function and an edge
//! centrality function over the weighted graph and writes their scores back as the `centrality`
//! attribute of each element. Any pair of functions can be supplied; [`Measure`] names the ones
//! bundled with the crate.

use std::{collections::BTreeMap, fmt, fmt::Debug, str::FromStr};

use tracing::{debug, warn};

pub use crate::{betweenness::Betweenness, current_flow::CurrentFlowBetweenness};
use crate::{
    attr::{AttrValue, CENTRALITY},
    edge::EdgeKey,
    error::{CentralityError, Error},
    graph::Graph,
};

/// Centrality scores of nodes.
pub type NodeScores<N> = BTreeMap<N, f64>;
/// Centrality scores of edges.
pub type EdgeScores<N> = BTreeMap<EdgeKey<N>, f64>;

/// A centrality measure computing scores for both the nodes and the edges of a weighted graph.
pub trait CentralityMeasure<N> {
    fn node_centrality(
        &self,
        graph: &Graph<N>,
        weight_key: &str,
    ) -> Result<NodeScores<N>, CentralityError>;

    fn edge_centrality(
        &self,
        graph: &Graph<N>,
        weight_key: &str,
    ) -> Result<EdgeScores<N>, CentralityError>;
}

/// Runs the centrality functions over the graph and stores their scores as the `centrality`
/// attribute of the nodes and edges, overwriting previous values.
///
/// Both functions receive the graph and the name of the weight attribute. Their errors are
/// returned as is, in which case the graph is left untouched. Node and edge scores aren't made
/// comparable: each keeps the scale of the function that produced it. Scores for ids the graph
/// doesn't contain are skipped.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
///
/// use arterial::attr::{AttrValue, Attributes};
/// use arterial::centrality::evaluate_centrality;
/// use arterial::graph::Graph;
///
/// let mut graph = Graph::undirected();
/// let edge = graph.add_edge("a", "b", Attributes::new());
///
/// evaluate_centrality(
///     &mut graph,
///     |_, _| Ok::<_, ()>(BTreeMap::from([("a", 1.0), ("b", 2.0)])),
///     |_, _| Ok(BTreeMap::from([(edge.clone(), 0.5)])),
///     "travel_time",
/// )
/// .unwrap();
///
/// assert_eq!(graph.node_attr(&"b", "centrality"), Some(&AttrValue::Number(2.0)));
/// assert_eq!(graph.edge_attr(&edge, "centrality"), Some(&AttrValue::Number(0.5)));
/// ```
pub fn evaluate_centrality<N, FN, FE, E>(
    graph: &mut Graph<N>,
    node_centrality: FN,
    edge_centrality: FE,
    weight_key: &str,
) -> Result<(), E>
where
    N: Clone + Ord + Debug,
    FN: FnOnce(&Graph<N>, &str) -> Result<NodeScores<N>, E>,
    FE: FnOnce(&Graph<N>, &str) -> Result<EdgeScores<N>, E>,
{
    let node_scores = node_centrality(graph, weight_key)?;
    let edge_scores = edge_centrality(graph, weight_key)?;

    let mut skipped = 0;

    for (edge, score) in edge_scores {
        match graph.edge_mut(&edge) {
            Some(attrs) => {
                attrs.insert(CENTRALITY.to_owned(), AttrValue::Number(score));
            }
            None => skipped += 1,
        }
    }

    for (id, score) in node_scores {
        match graph.node_mut(&id) {
            Some(attrs) => {
                attrs.insert(CENTRALITY.to_owned(), AttrValue::Number(score));
            }
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        warn!(skipped, "centrality scores for unknown ids were ignored");
    }
    debug!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "evaluated centrality"
    );

    Ok(())
}

/// Same as [`evaluate_centrality`] but annotates a copy, the input graph is left untouched.
pub fn evaluate_centrality_copy<N, FN, FE, E>(
    graph: &Graph<N>,
    node_centrality: FN,
    edge_centrality: FE,
    weight_key: &str,
) -> Result<Graph<N>, E>
where
    N: Clone + Ord + Debug,
    FN: FnOnce(&Graph<N>, &str) -> Result<NodeScores<N>, E>,
    FE: FnOnce(&Graph<N>, &str) -> Result<EdgeScores<N>, E>,
{
    let mut annotated = graph.clone();
    evaluate_centrality(&mut annotated, node_centrality, edge_centrality, weight_key)?;

    Ok(annotated)
}

/// Evaluates a [`CentralityMeasure`] in place.
pub fn evaluate_measure<N, M>(
    graph: &mut Graph<N>,
    measure: &M,
    weight_key: &str,
) -> Result<(), CentralityError>
where
    N: Clone + Ord + Debug,
    M: CentralityMeasure<N>,
{
    evaluate_centrality(
        graph,
        |g, w| measure.node_centrality(g, w),
        |g, w| measure.edge_centrality(g, w),
        weight_key,
    )
}

/// The centrality measures bundled with the crate, addressable by name.
///
/// # Examples
///
/// ```
/// use arterial::centrality::Measure;
///
/// let measure: Measure = "random walk betweenness".parse().unwrap();
/// assert_eq!(measure.to_string(), "random walk betweenness");
/// assert!("closeness".parse::<Measure>().is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Measure {
    Betweenness(Betweenness),
    RandomWalkBetweenness(CurrentFlowBetweenness),
}

impl Measure {
    pub const NAMES: [&'static str; 2] = ["betweenness", "random walk betweenness"];

    /// Sets whether the scores are normalized.
    pub fn normalized(self, normalized: bool) -> Self {
        match self {
            Measure::Betweenness(m) => Measure::Betweenness(m.normalized(normalized)),
            Measure::RandomWalkBetweenness(m) => {
                Measure::RandomWalkBetweenness(m.normalized(normalized))
            }
        }
    }

    /// Sets the number of worker threads for the measures that use them.
    pub fn num_threads(self, num_threads: usize) -> Self {
        match self {
            Measure::Betweenness(m) => Measure::Betweenness(m.num_threads(num_threads)),
            other => other,
        }
    }
}

impl FromStr for Measure {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "betweenness" => Ok(Measure::Betweenness(Betweenness::new())),
            "random walk betweenness" => {
                Ok(Measure::RandomWalkBetweenness(CurrentFlowBetweenness::new()))
            }
            other => Err(Error::UnknownMeasure(other.to_owned())),
        }
    }
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Measure::Betweenness(_) => Self::NAMES[0],
            Measure::RandomWalkBetweenness(_) => Self::NAMES[1],
        };

        f.write_str(name)
    }
}

impl<N> CentralityMeasure<N> for Measure
where
    N: Clone + Ord + Debug,
{
    fn node_centrality(
        &self,
        graph: &Graph<N>,
        weight_key: &str,
    ) -> Result<NodeScores<N>, CentralityError> {
        match self {
            Measure::Betweenness(m) => m.node_centrality(graph, weight_key),
            Measure::RandomWalkBetweenness(m) => m.node_centrality(graph, weight_key),
        }
    }

    fn edge_centrality(
        &self,
        graph: &Graph<N>,
        weight_key: &str,
    ) -> Result<EdgeScores<N>, CentralityError> {
        match self {
            Measure::Betweenness(m) => m.edge_centrality(graph, weight_key),
            Measure::RandomWalkBetweenness(m) => m.edge_centrality(graph, weight_key),
        }
    }
}
