//! A module for performing the multi-threaded computation of weighted betweenness.

use std::{
    cmp::Ordering,
    collections::{BTreeMap, BinaryHeap, HashMap},
    fmt::Debug,
    sync::Arc,
    thread,
};

use crate::{
    centrality::{CentralityMeasure, EdgeScores, NodeScores},
    edge::EdgeKey,
    error::CentralityError,
    graph::{edge_weight, Graph},
};

pub(crate) const MIN_NUM_THREADS: usize = 1;
pub(crate) const MAX_NUM_THREADS: usize = 128;

/// Shortest-path betweenness of nodes and edges, paths being measured with the edge weight.
///
/// Parallel edges collapse to the lightest one when searching for paths. The score of a pair of
/// nodes is then shared evenly by the parallel edges of minimal weight joining them, heavier ones
/// score zero. Edges missing the weight attribute weigh 1.
///
/// Scores are rescaled the usual way: when normalized, nodes by `1 / ((n - 1)(n - 2))` and edges
/// by `1 / (n (n - 1))`; otherwise undirected graphs are halved as each path is found from both
/// of its ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Betweenness {
    normalized: bool,
    num_threads: usize,
}

impl Default for Betweenness {
    fn default() -> Self {
        Self {
            normalized: true,
            num_threads: MIN_NUM_THREADS,
        }
    }
}

impl Betweenness {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn normalized(mut self, normalized: bool) -> Self {
        self.normalized = normalized;
        self
    }

    /// Sets how many worker threads share the single-source searches, clamped to `1..=128`.
    pub fn num_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = num_threads.clamp(MIN_NUM_THREADS, MAX_NUM_THREADS);
        self
    }
}

impl<N> CentralityMeasure<N> for Betweenness
where
    N: Clone + Ord + Debug,
{
    fn node_centrality(
        &self,
        graph: &Graph<N>,
        weight_key: &str,
    ) -> Result<NodeScores<N>, CentralityError> {
        let topology = Topology::new(graph, weight_key)?;
        let n = topology.nodes.len();
        let (counts, _) = compute_betweenness(topology.neighbours, self.num_threads);

        let scale = if self.normalized {
            (n > 2).then(|| 1.0 / ((n - 1) * (n - 2)) as f64)
        } else {
            (!graph.is_directed()).then_some(0.5)
        };

        Ok(topology
            .nodes
            .into_iter()
            .zip(counts)
            .map(|(id, count)| (id, scale.map_or(count, |s| count * s)))
            .collect())
    }

    fn edge_centrality(
        &self,
        graph: &Graph<N>,
        weight_key: &str,
    ) -> Result<EdgeScores<N>, CentralityError> {
        let topology = Topology::new(graph, weight_key)?;
        let n = topology.nodes.len();
        let directed = graph.is_directed();
        let (_, mut counts) = compute_betweenness(topology.neighbours, self.num_threads);

        let scale = if self.normalized {
            (n > 1).then(|| 1.0 / (n * (n - 1)) as f64)
        } else {
            (!directed).then_some(0.5)
        };

        let mut scores: EdgeScores<N> =
            graph.edges().map(|(edge, _)| (edge.clone(), 0.0)).collect();

        for ((i, j), lightest) in topology.lightest {
            let mut count = counts.remove(&(i, j)).unwrap_or_default();
            if !directed {
                // Undirected paths cross the pair in both directions.
                count += counts.remove(&(j, i)).unwrap_or_default();
            }

            let share = scale.map_or(count, |s| count * s) / lightest.len() as f64;
            for edge in lightest {
                scores.insert(edge, share);
            }
        }

        Ok(scores)
    }
}

/// The graph reduced to what the path searches need.
struct Topology<N> {
    /// Node ids, in index order.
    nodes: Vec<N>,
    /// Outgoing `(neighbour, weight)` pairs per node index, one per neighbour.
    neighbours: Vec<Vec<(usize, f64)>>,
    /// The minimal-weight parallel edges for each ordered pair, `i <= j` in undirected graphs.
    lightest: BTreeMap<(usize, usize), Vec<EdgeKey<N>>>,
}

impl<N> Topology<N>
where
    N: Clone + Ord + Debug,
{
    fn new(graph: &Graph<N>, weight_key: &str) -> Result<Self, CentralityError> {
        let index = graph.index();
        let mut links: BTreeMap<(usize, usize), (f64, Vec<EdgeKey<N>>)> = BTreeMap::new();

        for (edge, attrs) in graph.edges() {
            let w = edge_weight(edge, attrs, weight_key)?;
            if edge.is_loop() {
                continue;
            }

            let pair = (index[edge.source()], index[edge.target()]);
            let (lightest, edges) = links.entry(pair).or_insert((w, Vec::new()));

            match w.partial_cmp(lightest) {
                Some(Ordering::Less) => {
                    *lightest = w;
                    edges.clear();
                    edges.push(edge.clone());
                }
                Some(Ordering::Equal) => edges.push(edge.clone()),
                _ => {}
            }
        }

        let mut neighbours = vec![Vec::new(); index.len()];
        for (&(i, j), (w, _)) in &links {
            neighbours[i].push((j, *w));
            if !graph.is_directed() {
                neighbours[j].push((i, *w));
            }
        }

        Ok(Self {
            nodes: index.into_keys().collect(),
            neighbours,
            lightest: links
                .into_iter()
                .map(|(pair, (_, edges))| (pair, edges))
                .collect(),
        })
    }
}

/// A tentative distance in the search queue, ordered so that `BinaryHeap` pops the closest first.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Tentative {
    distance: f64,
    index: usize,
}

impl Eq for Tentative {}

impl Ord for Tentative {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .distance
            .total_cmp(&self.distance)
            .then_with(|| other.index.cmp(&self.index))
    }
}

impl PartialOrd for Tentative {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Per-worker accumulators: node counts by index and edge counts by ordered index pair.
type Counts = (Vec<f64>, HashMap<(usize, usize), f64>);

/// This is an implementation of Ulrik Brandes's
/// A Faster Algorithm for Betweenness Centrality
/// http://snap.stanford.edu/class/cs224w-readings/brandes01centrality.pdf
/// with the breadth-first search replaced by Dijkstra's algorithm for weighted graphs.
fn betweenness_for_node(index: usize, neighbours: &[Vec<(usize, f64)>], counts: &mut Counts) {
    let num_nodes = neighbours.len();

    let mut sigma: Vec<f64> = vec![0.0; num_nodes];
    let mut distance: Vec<Option<f64>> = vec![None; num_nodes];
    let mut settled: Vec<bool> = vec![false; num_nodes];
    let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); num_nodes];
    let mut delta: Vec<f64> = vec![0.0; num_nodes];
    let mut queue = BinaryHeap::new();
    let mut stack: Vec<usize> = Vec::new();

    sigma[index] = 1.0;
    distance[index] = Some(0.0);
    queue.push(Tentative {
        distance: 0.0,
        index,
    });

    while let Some(Tentative { distance: d, index: v }) = queue.pop() {
        if settled[v] {
            continue;
        }
        settled[v] = true;
        stack.push(v);

        for &(w, weight) in &neighbours[v] {
            if settled[w] {
                continue;
            }

            let candidate = d + weight;
            match distance[w] {
                Some(current) if candidate > current => {}
                Some(current) if candidate == current => {
                    sigma[w] += sigma[v];
                    predecessors[w].push(v);
                }
                _ => {
                    distance[w] = Some(candidate);
                    sigma[w] = sigma[v];
                    predecessors[w] = vec![v];
                    queue.push(Tentative {
                        distance: candidate,
                        index: w,
                    });
                }
            }
        }
    }

    let (node_counts, edge_counts) = counts;
    while let Some(w) = stack.pop() {
        let coefficient = (1.0 + delta[w]) / sigma[w];
        for &v in &predecessors[w] {
            let c = sigma[v] * coefficient;
            *edge_counts.entry((v, w)).or_default() += c;
            delta[v] += c;
        }
        if w != index {
            node_counts[w] += delta[w];
        }
    }
}

/// The thread task: source `offset`, then every `stride`-th source after it.
///
/// The assignment of sources is fixed, so the summation order doesn't depend on scheduling.
fn betweenness_task(
    offset: usize,
    stride: usize,
    neighbours: Arc<Vec<Vec<(usize, f64)>>>,
) -> Counts {
    let num_nodes = neighbours.len();

    // Each worker thread keeps its own accumulators, these are returned when the thread finishes
    // and then summed by the caller.
    let mut counts: Counts = (vec![0.0; num_nodes], HashMap::new());

    for index in (offset..num_nodes).step_by(stride) {
        betweenness_for_node(index, &neighbours, &mut counts);
    }

    counts
}

/// Runs the single-source searches over the worker threads and sums their unscaled counts.
///
/// Edge counts are keyed by the ordered index pair the paths crossed.
pub(crate) fn compute_betweenness(
    neighbours: Vec<Vec<(usize, f64)>>,
    num_threads: usize,
) -> Counts {
    let num_nodes = neighbours.len();
    let num_threads = num_threads.clamp(MIN_NUM_THREADS, MAX_NUM_THREADS);

    let mut totals: Counts = (vec![0.0; num_nodes], HashMap::new());
    let wrapped_neighbours = Arc::new(neighbours);

    let handles: Vec<_> = (0..num_threads)
        .map(|offset| {
            let neighbours = Arc::clone(&wrapped_neighbours);
            thread::spawn(move || betweenness_task(offset, num_threads, neighbours))
        })
        .collect();

    for handle in handles {
        let (node_counts, edge_counts) = handle
            .join()
            .unwrap_or_else(|panic| std::panic::resume_unwind(panic));

        for (total, count) in totals.0.iter_mut().zip(node_counts) {
            *total += count;
        }
        for (pair, count) in edge_counts {
            *totals.1.entry(pair).or_default() += count;
        }
    }

    totals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attr::{AttrValue, Attributes};

    const W: &str = "travel_time";

    fn weighted(w: f64) -> Attributes {
        Attributes::from([(W.to_owned(), AttrValue::Number(w))])
    }

    fn path(ids: &[&'static str]) -> Graph<&'static str> {
        let mut graph = Graph::undirected();
        for pair in ids.windows(2) {
            graph.add_edge(pair[0], pair[1], Attributes::new());
        }

        graph
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-12,
            "{actual} is not close to {expected}"
        );
    }

    #[test]
    fn node_betweenness_unnormalized() {
        let (a, b, c, d) = ("a", "b", "c", "d");
        let graph = path(&[a, b, c, d]);

        let betweenness = Betweenness::new()
            .normalized(false)
            .node_centrality(&graph, W)
            .unwrap();

        assert_eq!(betweenness.get_key_value(a), Some((&a, &0.0)));
        assert_eq!(betweenness.get_key_value(b), Some((&b, &2.0)));
        assert_eq!(betweenness.get_key_value(c), Some((&c, &2.0)));
        assert_eq!(betweenness.get_key_value(d), Some((&d, &0.0)));
    }

    #[test]
    fn node_betweenness_normalized() {
        let graph = path(&["a", "b", "c", "d"]);

        let betweenness = Betweenness::new().node_centrality(&graph, W).unwrap();

        assert_close(betweenness["b"], 2.0 / 3.0);
        assert_close(betweenness["c"], 2.0 / 3.0);
        assert_close(betweenness["a"], 0.0);
    }

    #[test]
    fn edge_betweenness_unnormalized() {
        let graph = path(&["a", "b", "c", "d"]);

        let betweenness = Betweenness::new()
            .normalized(false)
            .edge_centrality(&graph, W)
            .unwrap();

        assert_eq!(betweenness[&EdgeKey::new("a", "b", 0)], 3.0);
        assert_eq!(betweenness[&EdgeKey::new("b", "c", 0)], 4.0);
        assert_eq!(betweenness[&EdgeKey::new("c", "d", 0)], 3.0);
    }

    #[test]
    fn edge_betweenness_normalized() {
        let graph = path(&["a", "b", "c"]);

        let betweenness = Betweenness::new().edge_centrality(&graph, W).unwrap();

        // Each edge lies on two of the three pairs' paths.
        assert_close(betweenness[&EdgeKey::new("a", "b", 0)], 4.0 / 6.0);
        assert_close(betweenness[&EdgeKey::new("b", "c", 0)], 4.0 / 6.0);
    }

    #[test]
    fn weights_pick_the_path() {
        let mut graph = Graph::undirected();
        graph.add_edge("a", "b", weighted(1.0));
        graph.add_edge("b", "c", weighted(1.0));
        graph.add_edge("a", "c", weighted(5.0));

        let measure = Betweenness::new().normalized(false);
        let nodes = measure.node_centrality(&graph, W).unwrap();
        let edges = measure.edge_centrality(&graph, W).unwrap();

        assert_eq!(nodes["b"], 1.0);
        assert_eq!(edges[&EdgeKey::new("a", "c", 0)], 0.0);
        assert_eq!(edges[&EdgeKey::new("a", "b", 0)], 2.0);
    }

    #[test]
    fn equal_paths_split() {
        let mut graph = Graph::undirected();
        graph.add_edge("a", "b", weighted(1.0));
        graph.add_edge("b", "d", weighted(1.0));
        graph.add_edge("a", "c", weighted(1.0));
        graph.add_edge("c", "d", weighted(1.0));

        let nodes = Betweenness::new()
            .normalized(false)
            .node_centrality(&graph, W)
            .unwrap();

        assert_eq!(nodes["b"], 0.5);
        assert_eq!(nodes["c"], 0.5);
    }

    #[test]
    fn parallel_edges_share_the_pair() {
        let mut graph = Graph::undirected();
        let light = graph.add_edge("a", "b", weighted(1.0));
        let also_light = graph.add_edge("b", "a", weighted(1.0));
        let heavy = graph.add_edge("a", "b", weighted(5.0));
        let other = graph.add_edge("b", "c", weighted(1.0));

        let edges = Betweenness::new()
            .normalized(false)
            .edge_centrality(&graph, W)
            .unwrap();

        assert_eq!(edges[&light], 1.0);
        assert_eq!(edges[&also_light], 1.0);
        assert_eq!(edges[&heavy], 0.0);
        assert_eq!(edges[&other], 2.0);
    }

    #[test]
    fn self_loops_score_zero() {
        let mut graph = path(&["a", "b", "c"]);
        let lp = graph.add_edge("b", "b", Attributes::new());

        let edges = Betweenness::new().edge_centrality(&graph, W).unwrap();

        assert_eq!(edges[&lp], 0.0);
        assert_eq!(edges.len(), 3);
    }

    #[test]
    fn directed() {
        let mut graph = Graph::directed();
        graph.add_edge("a", "b", Attributes::new());
        graph.add_edge("b", "c", Attributes::new());

        let measure = Betweenness::new();
        let nodes = measure.node_centrality(&graph, W).unwrap();
        let edges = measure.edge_centrality(&graph, W).unwrap();

        assert_close(nodes["b"], 0.5);
        // (a, b) and (a, c) cross the first edge, out of n (n - 1) = 6 ordered pairs.
        assert_close(edges[&EdgeKey::new("a", "b", 0)], 2.0 / 6.0);

        let unnormalized = Betweenness::new()
            .normalized(false)
            .node_centrality(&graph, W)
            .unwrap();
        assert_eq!(unnormalized["b"], 1.0);
    }

    #[test]
    fn threads_agree() {
        let mut graph = Graph::undirected();
        for i in 0..6u32 {
            for j in 0..6u32 {
                let w = f64::from(1 + (i * 7 + j * 3) % 4);
                if i + 1 < 6 {
                    graph.add_edge((i, j), (i + 1, j), weighted(w));
                }
                if j + 1 < 6 {
                    graph.add_edge((i, j), (i, j + 1), weighted(w + 0.5));
                }
            }
        }

        let single = Betweenness::new().node_centrality(&graph, W).unwrap();
        let many = Betweenness::new()
            .num_threads(4)
            .node_centrality(&graph, W)
            .unwrap();

        for (id, score) in single {
            assert_close(many[&id], score);
        }
    }

    #[test]
    fn negative_weight_fails() {
        let mut graph = Graph::undirected();
        graph.add_edge("a", "b", weighted(-1.0));

        assert!(matches!(
            Betweenness::new().node_centrality(&graph, W),
            Err(CentralityError::NegativeWeight { .. })
        ));
    }

    #[test]
    fn num_threads_is_clamped() {
        assert_eq!(Betweenness::new().num_threads(0).num_threads, 1);
        assert_eq!(Betweenness::new().num_threads(1000).num_threads, 128);
    }
}
