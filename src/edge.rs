//! A module for working with edge identities.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The identity of an edge in a multigraph: its two end vertices and a parallel-edge index
/// telling apart edges that join the same pair of vertices.
///
/// The `source`-`target` nomenclature is only meaningful in directed graphs, undirected graphs
/// store their keys in [`canonical`](EdgeKey::canonical) form.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeKey<N> {
    source: N,
    target: N,
    key: usize,
}

impl<N> EdgeKey<N> {
    /// Creates a new edge key from two vertices and a parallel-edge index.
    ///
    /// # Examples
    ///
    /// ```
    /// use arterial::edge::EdgeKey;
    ///
    /// let edge = EdgeKey::new("a", "b", 0);
    /// assert_eq!(edge.key(), 0);
    /// ```
    pub fn new(source: N, target: N, key: usize) -> Self {
        Self {
            source,
            target,
            key,
        }
    }

    /// Returns the first vertex forming the edge.
    ///
    /// # Examples
    ///
    /// ```
    /// use arterial::edge::EdgeKey;
    ///
    /// let edge = EdgeKey::new("a", "b", 0);
    /// assert_eq!(edge.source(), &"a");
    /// ```
    pub fn source(&self) -> &N {
        &self.source
    }

    /// Returns the second vertex forming the edge.
    ///
    /// # Examples
    ///
    /// ```
    /// use arterial::edge::EdgeKey;
    ///
    /// let edge = EdgeKey::new("a", "b", 0);
    /// assert_eq!(edge.target(), &"b");
    /// ```
    pub fn target(&self) -> &N {
        &self.target
    }

    /// Returns the parallel-edge index.
    pub fn key(&self) -> usize {
        self.key
    }

    /// Returns whether the edge contains the given vertex.
    ///
    /// # Examples
    ///
    /// ```
    /// use arterial::edge::EdgeKey;
    ///
    /// let edge = EdgeKey::new("a", "b", 0);
    ///
    /// assert_eq!(edge.contains(&"a"), true);
    /// assert_eq!(edge.contains(&"b"), true);
    /// assert_eq!(edge.contains(&"c"), false);
    /// ```
    pub fn contains(&self, vertex: &N) -> bool
    where
        N: PartialEq,
    {
        self.source() == vertex || self.target() == vertex
    }

    /// Returns whether both ends of the edge are the same vertex.
    pub fn is_loop(&self) -> bool
    where
        N: PartialEq,
    {
        self.source == self.target
    }

    /// Returns the key with its vertices ordered so that `source <= target`.
    ///
    /// # Examples
    ///
    /// ```
    /// use arterial::edge::EdgeKey;
    ///
    /// assert_eq!(EdgeKey::new("b", "a", 1).canonical(), EdgeKey::new("a", "b", 1));
    /// ```
    pub fn canonical(self) -> Self
    where
        N: Ord,
    {
        if self.source > self.target {
            Self {
                source: self.target,
                target: self.source,
                key: self.key,
            }
        } else {
            self
        }
    }
}

impl<N: fmt::Debug> fmt::Display for EdgeKey<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:?}, {:?}, {})", self.source, self.target, self.key)
    }
}
