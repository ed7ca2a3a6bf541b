//! The road closure analysis: centrality before and after removing roads, and their difference.

use std::{
    collections::{hash_map::Entry, HashMap},
    fmt::Debug,
    io::Read,
};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    attr::{AttrValue, CENTRALITY, TRAVEL_TIME},
    centrality::{evaluate_measure, Measure},
    diff::difference,
    edge::EdgeKey,
    error::Result,
    features::engineer_features,
    graph::Graph,
    roads::{delete_road, MatchPolicy},
};

/// Settings of an analysis run, typically read from a JSON file.
///
/// Every field has a default, see [`AnalysisConfig::default`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// The area the street network covers.
    pub place: String,
    /// Distance within which the provider merges intersections, in meters.
    pub tolerance: f64,
    /// Name of the centrality measure, one of [`Measure::NAMES`].
    pub measure: String,
    /// Edge attribute used as the weight.
    pub weight_key: String,
    /// Roads to close, all of them are removed from the same edited graph.
    pub roads: Vec<String>,
    /// Also match roads by their `ref` attribute.
    pub match_ref: bool,
    pub normalized: bool,
    pub threads: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            place: String::new(),
            tolerance: 10.0,
            measure: Measure::NAMES[0].to_owned(),
            weight_key: TRAVEL_TIME.to_owned(),
            roads: Vec::new(),
            match_ref: false,
            normalized: true,
            threads: 1,
        }
    }
}

impl AnalysisConfig {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Resolves the configured measure with its options applied.
    pub fn measure(&self) -> Result<Measure> {
        let measure: Measure = self.measure.parse()?;

        Ok(measure
            .normalized(self.normalized)
            .num_threads(self.threads))
    }

    pub fn match_policy(&self) -> MatchPolicy {
        MatchPolicy {
            name: true,
            reference: self.match_ref,
        }
    }
}

/// The graphs produced by [`perform_centrality_analysis`].
#[derive(Clone, Debug)]
pub struct CentralityAnalysis<N> {
    /// The input graph annotated with its centrality.
    pub original: Graph<N>,
    /// The input graph without the closed roads, annotated with its centrality.
    pub edited: Graph<N>,
    /// `edited` minus `original`, positive values mark elements that gained importance.
    pub difference: Graph<N>,
    /// Number of edges the closures removed.
    pub removed_edges: usize,
}

/// Evaluates the configured centrality on the graph, closes the configured roads on a copy,
/// evaluates the centrality again and computes the difference. The input graph isn't modified.
pub fn perform_centrality_analysis<N>(
    graph: &Graph<N>,
    config: &AnalysisConfig,
) -> Result<CentralityAnalysis<N>>
where
    N: Clone + Ord + Debug,
{
    let measure = config.measure()?;
    let policy = config.match_policy();

    info!(%measure, "evaluating original centrality");
    let mut original = graph.clone();
    evaluate_measure(&mut original, &measure, &config.weight_key)?;

    info!(roads = config.roads.len(), "evaluating post edit centrality");
    let mut edited = graph.clone();
    let removed_edges: usize = config
        .roads
        .iter()
        .map(|road| delete_road(&mut edited, road, policy))
        .sum();
    evaluate_measure(&mut edited, &measure, &config.weight_key)?;

    info!("calculating difference");
    let difference = difference(&edited, &original);

    Ok(CentralityAnalysis {
        original,
        edited,
        difference,
        removed_edges,
    })
}

/// Returns the edges carrying a numeric `centrality`, highest first.
pub fn ranked_edges<N>(graph: &Graph<N>) -> Vec<(EdgeKey<N>, f64)>
where
    N: Clone + Ord + Debug,
{
    let mut ranked: Vec<(EdgeKey<N>, f64)> = graph
        .edges()
        .filter_map(|(edge, attrs)| {
            let score = attrs.get(CENTRALITY).and_then(AttrValue::as_number)?;
            Some((edge.clone(), score))
        })
        .collect();

    // Stable, ties keep the edge order.
    ranked.sort_by(|(_, a), (_, b)| b.total_cmp(a));

    ranked
}

/// Returns the `n` edges with the highest `centrality`.
///
/// # Examples
///
/// ```
/// use arterial::analysis::most_central_edges;
/// use arterial::attr::{AttrValue, Attributes};
/// use arterial::graph::Graph;
///
/// let scored = |c: f64| Attributes::from([("centrality".to_owned(), AttrValue::Number(c))]);
///
/// let mut graph = Graph::undirected();
/// graph.add_edge(1, 2, scored(0.2));
/// let top = graph.add_edge(2, 3, scored(0.9));
/// graph.add_edge(3, 4, Attributes::new());
///
/// assert_eq!(most_central_edges(&graph, 1), vec![(top, 0.9)]);
/// ```
pub fn most_central_edges<N>(graph: &Graph<N>, n: usize) -> Vec<(EdgeKey<N>, f64)>
where
    N: Clone + Ord + Debug,
{
    let mut ranked = ranked_edges(graph);
    ranked.truncate(n);

    ranked
}

/// Returns the smallest and the largest value of a numeric edge attribute, list items included.
pub fn attribute_range<N>(graph: &Graph<N>, key: &str) -> Option<(f64, f64)>
where
    N: Clone + Ord + Debug,
{
    graph
        .edges()
        .flat_map(|(_, attrs)| match attrs.get(key) {
            Some(AttrValue::Number(n)) => vec![*n],
            Some(AttrValue::Numbers(ns)) => ns.clone(),
            _ => Vec::new(),
        })
        .filter(|x| !x.is_nan())
        .fold(None, |range, x| match range {
            None => Some((x, x)),
            Some((min, max)) => Some((min.min(x), max.max(x))),
        })
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct CacheKey {
    place: String,
    tolerance: u64,
}

impl CacheKey {
    fn new(place: &str, tolerance: f64) -> Self {
        // Both zeroes name the same tolerance.
        let tolerance = if tolerance == 0.0 { 0.0 } else { tolerance };

        Self {
            place: place.to_owned(),
            tolerance: tolerance.to_bits(),
        }
    }
}

/// Loaded street networks, keyed by place and intersection tolerance.
///
/// Graphs are stored after feature engineering, ready to be analysed.
#[derive(Clone, Debug)]
pub struct GraphCache<N> {
    graphs: HashMap<CacheKey, Graph<N>>,
}

impl<N> Default for GraphCache<N> {
    fn default() -> Self {
        Self {
            graphs: HashMap::new(),
        }
    }
}

impl<N> GraphCache<N>
where
    N: Clone + Ord + Debug,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached graph, running the loader and the feature engineering on a miss.
    ///
    /// Nothing is cached when either step fails.
    pub fn get_or_load<F>(&mut self, place: &str, tolerance: f64, load: F) -> Result<&Graph<N>>
    where
        F: FnOnce(&str, f64) -> Result<Graph<N>>,
    {
        match self.graphs.entry(CacheKey::new(place, tolerance)) {
            Entry::Occupied(entry) => Ok(&*entry.into_mut()),
            Entry::Vacant(entry) => {
                let mut graph = load(place, tolerance)?;
                engineer_features(&mut graph)?;
                debug!(
                    place,
                    tolerance,
                    nodes = graph.node_count(),
                    edges = graph.edge_count(),
                    "loaded street network"
                );

                Ok(&*entry.insert(graph))
            }
        }
    }

    pub fn get(&self, place: &str, tolerance: f64) -> Option<&Graph<N>> {
        self.graphs.get(&CacheKey::new(place, tolerance))
    }

    /// Drops a cached graph and returns it.
    pub fn invalidate(&mut self, place: &str, tolerance: f64) -> Option<Graph<N>> {
        self.graphs.remove(&CacheKey::new(place, tolerance))
    }

    pub fn len(&self) -> usize {
        self.graphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graphs.is_empty()
    }
}
