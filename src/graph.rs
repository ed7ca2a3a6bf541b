//! A module for working with street network graphs.

use std::{
    collections::{BTreeMap, BTreeSet, VecDeque},
    fmt::Debug,
};

use nalgebra::DMatrix;

use crate::{
    attr::{AttrValue, Attributes},
    edge::EdgeKey,
    error::CentralityError,
};

/// A directed or undirected multigraph whose nodes and edges carry named attributes.
///
/// Any number of edges may join the same pair of nodes, each one addressed by its own
/// [`EdgeKey`]. Nodes and edges are kept in sorted collections, which gives every computation a
/// stable iteration order.
#[derive(Clone, Debug, PartialEq)]
pub struct Graph<N> {
    directed: bool,
    nodes: BTreeMap<N, Attributes>,
    edges: BTreeMap<EdgeKey<N>, Attributes>,
}

impl<N> Default for Graph<N>
where
    N: Clone + Ord + Debug,
{
    fn default() -> Self {
        Self::undirected()
    }
}

impl<N> Graph<N>
where
    N: Clone + Ord + Debug,
{
    /// Creates an empty graph.
    ///
    /// # Examples
    ///
    /// ```
    /// use arterial::graph::Graph;
    ///
    /// let graph: Graph<u64> = Graph::new(true);
    /// assert!(graph.is_directed());
    /// ```
    pub fn new(directed: bool) -> Self {
        Self {
            directed,
            nodes: Default::default(),
            edges: Default::default(),
        }
    }

    /// Creates an empty directed graph.
    pub fn directed() -> Self {
        Self::new(true)
    }

    /// Creates an empty undirected graph.
    pub fn undirected() -> Self {
        Self::new(false)
    }

    pub fn is_directed(&self) -> bool {
        self.directed
    }

    /// Inserts a node if it isn't present yet and returns its attributes.
    pub fn add_node(&mut self, id: N) -> &mut Attributes {
        self.nodes.entry(id).or_default()
    }

    /// Inserts an edge between two nodes and returns its key, the end nodes are created when
    /// missing.
    ///
    /// The parallel-edge index starts at the number of edges already joining the pair and is
    /// increased until it is unused, so it isn't necessarily the lowest free one.
    ///
    /// # Examples
    ///
    /// ```
    /// use arterial::attr::Attributes;
    /// use arterial::graph::Graph;
    ///
    /// let mut graph = Graph::undirected();
    /// let first = graph.add_edge("a", "b", Attributes::new());
    /// let second = graph.add_edge("b", "a", Attributes::new());
    ///
    /// assert_eq!(first.key(), 0);
    /// assert_eq!(second.key(), 1);
    /// assert_eq!(graph.edge_count(), 2);
    /// ```
    pub fn add_edge(&mut self, source: N, target: N, attrs: Attributes) -> EdgeKey<N> {
        let edge = self.normalize(EdgeKey::new(source, target, 0));
        let used: BTreeSet<usize> = self
            .edges_between(edge.source(), edge.target())
            .map(|(e, _)| e.key())
            .collect();

        // Start at the number of parallel edges and probe upwards.
        let mut key = used.len();
        while used.contains(&key) {
            key += 1;
        }

        let edge = EdgeKey::new(edge.source().clone(), edge.target().clone(), key);
        self.insert_edge(edge.clone(), attrs);

        edge
    }

    /// Inserts an edge under an explicit key and returns the attributes it replaced, if any.
    pub fn insert_edge(&mut self, edge: EdgeKey<N>, attrs: Attributes) -> Option<Attributes> {
        let edge = self.normalize(edge);
        self.add_node(edge.source().clone());
        self.add_node(edge.target().clone());

        self.edges.insert(edge, attrs)
    }

    /// Removes an edge and returns its attributes if it was present.
    ///
    /// # Examples
    ///
    /// ```
    /// use arterial::attr::Attributes;
    /// use arterial::edge::EdgeKey;
    /// use arterial::graph::Graph;
    ///
    /// let mut graph = Graph::undirected();
    /// graph.add_edge("a", "b", Attributes::new());
    ///
    /// assert!(graph.remove_edge(&EdgeKey::new("b", "a", 0)).is_some());
    /// assert!(graph.remove_edge(&EdgeKey::new("a", "c", 0)).is_none());
    /// ```
    pub fn remove_edge(&mut self, edge: &EdgeKey<N>) -> Option<Attributes> {
        let edge = self.normalize(edge.clone());
        self.edges.remove(&edge)
    }

    /// Removes a node together with its incident edges.
    pub fn remove_node(&mut self, id: &N) -> Option<Attributes> {
        let attrs = self.nodes.remove(id)?;
        self.edges.retain(|edge, _| !edge.contains(id));

        Some(attrs)
    }

    /// Keeps only the edges for which the predicate holds and returns how many were removed.
    pub fn retain_edges<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&EdgeKey<N>, &Attributes) -> bool,
    {
        let original_len = self.edge_count();
        self.edges.retain(|edge, attrs| keep(edge, attrs));

        original_len - self.edge_count()
    }

    pub fn contains_node(&self, id: &N) -> bool {
        self.nodes.contains_key(id)
    }

    /// Checks if the graph contains an edge, the vertex order is irrelevant for undirected graphs.
    pub fn contains_edge(&self, edge: &EdgeKey<N>) -> bool {
        self.edges.contains_key(&self.normalize(edge.clone()))
    }

    pub fn node(&self, id: &N) -> Option<&Attributes> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: &N) -> Option<&mut Attributes> {
        self.nodes.get_mut(id)
    }

    pub fn edge(&self, edge: &EdgeKey<N>) -> Option<&Attributes> {
        self.edges.get(&self.normalize(edge.clone()))
    }

    pub fn edge_mut(&mut self, edge: &EdgeKey<N>) -> Option<&mut Attributes> {
        let edge = self.normalize(edge.clone());
        self.edges.get_mut(&edge)
    }

    /// Reads a single edge attribute.
    pub fn edge_attr(&self, edge: &EdgeKey<N>, name: &str) -> Option<&AttrValue> {
        self.edge(edge).and_then(|attrs| attrs.get(name))
    }

    /// Reads a single node attribute.
    pub fn node_attr(&self, id: &N, name: &str) -> Option<&AttrValue> {
        self.node(id).and_then(|attrs| attrs.get(name))
    }

    /// Iterates over the nodes in ascending id order.
    pub fn nodes(&self) -> impl Iterator<Item = (&N, &Attributes)> {
        self.nodes.iter()
    }

    pub fn nodes_mut(&mut self) -> impl Iterator<Item = (&N, &mut Attributes)> {
        self.nodes.iter_mut()
    }

    /// Iterates over the edges in ascending key order.
    pub fn edges(&self) -> impl Iterator<Item = (&EdgeKey<N>, &Attributes)> {
        self.edges.iter()
    }

    pub fn edges_mut(&mut self) -> impl Iterator<Item = (&EdgeKey<N>, &mut Attributes)> {
        self.edges.iter_mut()
    }

    /// Iterates over the parallel edges joining two nodes.
    pub fn edges_between(
        &self,
        source: &N,
        target: &N,
    ) -> impl Iterator<Item = (&EdgeKey<N>, &Attributes)> {
        let first = self.normalize(EdgeKey::new(source.clone(), target.clone(), 0));
        let last = EdgeKey::new(first.source().clone(), first.target().clone(), usize::MAX);

        self.edges.range(first..=last)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Returns a mapping of nodes to their position, used to address the rows and columns of the
    /// matrices representing the graph.
    ///
    /// The index is sorted by `N`'s implementation of `Ord`.
    pub fn index(&self) -> BTreeMap<N, usize> {
        self.nodes
            .keys()
            .enumerate()
            .map(|(i, id)| (id.clone(), i))
            .collect()
    }

    /// Checks whether every node can reach every other node, ignoring edge direction.
    ///
    /// The empty graph isn't considered connected.
    ///
    /// # Examples
    ///
    /// ```
    /// use arterial::attr::Attributes;
    /// use arterial::graph::Graph;
    ///
    /// let mut graph = Graph::undirected();
    /// graph.add_edge("a", "b", Attributes::new());
    /// assert!(graph.is_connected());
    ///
    /// graph.add_node("c");
    /// assert!(!graph.is_connected());
    /// ```
    pub fn is_connected(&self) -> bool {
        let index = self.index();
        let n = index.len();
        if n == 0 {
            return false;
        }

        let mut neighbours: Vec<Vec<usize>> = vec![Vec::new(); n];
        for edge in self.edges.keys() {
            let (i, j) = (index[edge.source()], index[edge.target()]);
            neighbours[i].push(j);
            neighbours[j].push(i);
        }

        let mut visited = vec![false; n];
        let mut queue = VecDeque::from([0]);
        visited[0] = true;

        while let Some(m) = queue.pop_front() {
            for &k in &neighbours[m] {
                if !visited[k] {
                    visited[k] = true;
                    queue.push_back(k);
                }
            }
        }

        visited.into_iter().all(|v| v)
    }

    /// Constructs the weighted laplacian matrix for this graph, treating it as undirected.
    ///
    /// Parallel edges add up their weights, self-loops are ignored. Rows and columns follow
    /// [`index`](Graph::index).
    ///
    /// # Examples
    ///
    /// ```
    /// use nalgebra::dmatrix;
    /// use arterial::attr::{AttrValue, Attributes};
    /// use arterial::graph::Graph;
    ///
    /// let mut graph = Graph::undirected();
    /// let attrs = Attributes::from([("w".to_owned(), AttrValue::Number(2.0))]);
    /// graph.add_edge("a", "b", attrs);
    ///
    /// assert_eq!(
    ///     graph.weighted_laplacian("w").unwrap(),
    ///     dmatrix![2.0, -2.0;
    ///              -2.0, 2.0]
    /// );
    /// ```
    pub fn weighted_laplacian(&self, weight_key: &str) -> Result<DMatrix<f64>, CentralityError> {
        let index = self.index();
        let n = index.len();
        let mut matrix = DMatrix::<f64>::zeros(n, n);

        for (edge, attrs) in &self.edges {
            if edge.is_loop() {
                continue;
            }

            let w = edge_weight(edge, attrs, weight_key)?;
            // Safety: every edge end is inserted as a node, so the index must contain it.
            let i = index[edge.source()];
            let j = index[edge.target()];

            matrix[(i, j)] -= w;
            matrix[(j, i)] -= w;
            matrix[(i, i)] += w;
            matrix[(j, j)] += w;
        }

        Ok(matrix)
    }

    //
    // Private
    //

    /// Puts a key in the form it is stored under.
    fn normalize(&self, edge: EdgeKey<N>) -> EdgeKey<N> {
        if self.directed {
            edge
        } else {
            edge.canonical()
        }
    }
}

/// Reads the weight of an edge.
///
/// A missing attribute counts as a unit weight, non-numeric or negative values are rejected.
pub(crate) fn edge_weight<N: Debug>(
    edge: &EdgeKey<N>,
    attrs: &Attributes,
    weight_key: &str,
) -> Result<f64, CentralityError> {
    let weight = match attrs.get(weight_key) {
        None => 1.0,
        Some(AttrValue::Number(w)) => *w,
        Some(_) => {
            return Err(CentralityError::InvalidWeight {
                edge: edge.to_string(),
                key: weight_key.to_owned(),
            })
        }
    };

    if weight < 0.0 || weight.is_nan() {
        return Err(CentralityError::NegativeWeight {
            edge: edge.to_string(),
            weight,
        });
    }

    Ok(weight)
}
