//! Road discovery and simulated road closures.
//!
//! Two different notions of matching live here. Discovery ([`find_roads`]) is lenient and looks
//! for a substring in every name an edge carries. Removal ([`delete_road`]) only takes out edges
//! whose scalar `name` (or `ref`, depending on the [`MatchPolicy`]) equals the road exactly.

use std::{collections::BTreeSet, fmt::Debug};

use tracing::info;

use crate::{
    attr::{AttrValue, Attributes, NAME, REF},
    graph::Graph,
};

/// Which attributes identify the edges of a road to remove, the enabled criteria are OR-combined.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MatchPolicy {
    /// Match edges whose `name` equals the road.
    pub name: bool,
    /// Match edges whose `ref` equals the road.
    pub reference: bool,
}

impl MatchPolicy {
    pub const NAME: MatchPolicy = MatchPolicy {
        name: true,
        reference: false,
    };

    pub const NAME_OR_REF: MatchPolicy = MatchPolicy {
        name: true,
        reference: true,
    };

    /// Returns whether the edge attributes identify the given road.
    ///
    /// # Examples
    ///
    /// ```
    /// use arterial::attr::{AttrValue, Attributes};
    /// use arterial::roads::MatchPolicy;
    ///
    /// let attrs = Attributes::from([("ref".to_owned(), AttrValue::from("A4"))]);
    ///
    /// assert!(!MatchPolicy::NAME.matches(&attrs, "A4"));
    /// assert!(MatchPolicy::NAME_OR_REF.matches(&attrs, "A4"));
    /// ```
    pub fn matches(&self, attrs: &Attributes, road_name: &str) -> bool {
        let equals = |key: &str| {
            attrs
                .get(key)
                .and_then(AttrValue::as_text)
                .is_some_and(|value| value == road_name)
        };

        (self.name && equals(NAME)) || (self.reference && equals(REF))
    }
}

/// Removes every edge of the named road from the graph and returns how many were removed.
///
/// Nodes are left in place, even when they end up isolated.
///
/// # Examples
///
/// ```
/// use arterial::attr::{AttrValue, Attributes};
/// use arterial::graph::Graph;
/// use arterial::roads::{delete_road, MatchPolicy};
///
/// let mut graph = Graph::undirected();
/// let main = Attributes::from([("name".to_owned(), AttrValue::from("Main St"))]);
/// graph.add_edge("a", "b", main.clone());
/// graph.add_edge("b", "c", main);
/// graph.add_edge("c", "d", Attributes::new());
///
/// assert_eq!(delete_road(&mut graph, "Main St", MatchPolicy::NAME), 2);
/// assert_eq!(graph.edge_count(), 1);
/// assert_eq!(graph.node_count(), 4);
/// ```
pub fn delete_road<N>(graph: &mut Graph<N>, road_name: &str, policy: MatchPolicy) -> usize
where
    N: Clone + Ord + Debug,
{
    let removed = graph.retain_edges(|_, attrs| !policy.matches(attrs, road_name));
    info!(road = road_name, removed, "deleted road edges");

    removed
}

/// Returns a copy of the graph without the named road, the input graph is left untouched.
pub fn delete_road_copy<N>(graph: &Graph<N>, road_name: &str, policy: MatchPolicy) -> Graph<N>
where
    N: Clone + Ord + Debug,
{
    let mut edited = graph.clone();
    delete_road(&mut edited, road_name, policy);

    edited
}

/// Returns the road names containing the query, list-valued names contribute each of their
/// matching items.
///
/// # Examples
///
/// ```
/// use arterial::attr::{AttrValue, Attributes};
/// use arterial::graph::Graph;
/// use arterial::roads::find_roads;
///
/// let mut graph = Graph::undirected();
/// let named = |name: AttrValue| Attributes::from([("name".to_owned(), name)]);
/// graph.add_edge(1, 2, named("Main Street".into()));
/// graph.add_edge(2, 3, named(vec!["Mainz Road", "Elm Street"].into()));
///
/// let found: Vec<String> = find_roads(&graph, "Main").into_iter().collect();
/// assert_eq!(found, vec!["Main Street", "Mainz Road"]);
/// ```
pub fn find_roads<N>(graph: &Graph<N>, query: &str) -> BTreeSet<String>
where
    N: Clone + Ord + Debug,
{
    let mut names = BTreeSet::new();

    for (_, attrs) in graph.edges() {
        match attrs.get(NAME) {
            Some(AttrValue::Text(name)) if name.contains(query) => {
                names.insert(name.clone());
            }
            Some(AttrValue::Texts(list)) => {
                names.extend(list.iter().filter(|name| name.contains(query)).cloned());
            }
            _ => {}
        }
    }

    names
}

/// Returns every scalar road name in the graph, the candidates for [`delete_road`].
///
/// Edges named by a list are skipped since removal never matches them.
pub fn all_roads<N>(graph: &Graph<N>) -> BTreeSet<String>
where
    N: Clone + Ord + Debug,
{
    graph
        .edges()
        .filter_map(|(_, attrs)| attrs.get(NAME).and_then(AttrValue::as_text))
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use quickcheck_macros::quickcheck;

    use super::*;
    use crate::edge::EdgeKey;

    fn named(name: AttrValue) -> Attributes {
        Attributes::from([(NAME.to_owned(), name)])
    }

    fn town() -> Graph<u32> {
        let mut graph = Graph::directed();
        graph.add_edge(1, 2, named("Main St".into()));
        graph.add_edge(2, 3, named("Main St".into()));
        graph.add_edge(2, 3, named("Elm St".into()));
        graph.add_edge(3, 4, named(vec!["Main St", "Elm St"].into()));
        graph.add_edge(
            4,
            5,
            Attributes::from([
                (NAME.to_owned(), "Ring Road".into()),
                (REF.to_owned(), "B27".into()),
            ]),
        );
        graph.add_edge(5, 1, named("Main Street".into()));
        graph.add_edge(
            5,
            6,
            Attributes::from([(REF.to_owned(), vec!["B27", "B10"].into())]),
        );

        graph
    }

    #[test]
    fn delete_by_name() {
        let mut graph = town();

        assert_eq!(delete_road(&mut graph, "Main St", MatchPolicy::NAME), 2);

        // The parallel Elm St edge survives, so does the list-named one.
        assert!(!graph.contains_edge(&EdgeKey::new(1, 2, 0)));
        assert!(!graph.contains_edge(&EdgeKey::new(2, 3, 0)));
        assert!(graph.contains_edge(&EdgeKey::new(2, 3, 1)));
        assert!(graph.contains_edge(&EdgeKey::new(3, 4, 0)));
        assert!(graph.contains_edge(&EdgeKey::new(5, 1, 0)));
        assert_eq!(graph.edge_count(), 5);
    }

    #[test]
    fn delete_by_ref() {
        let mut graph = town();

        assert_eq!(delete_road(&mut graph, "B27", MatchPolicy::NAME), 0);
        assert_eq!(delete_road(&mut graph, "B27", MatchPolicy::NAME_OR_REF), 1);
        assert!(!graph.contains_edge(&EdgeKey::new(4, 5, 0)));

        // A list of refs never matches.
        assert!(graph.contains_edge(&EdgeKey::new(5, 6, 0)));
        assert_eq!(delete_road(&mut graph, "B10", MatchPolicy::NAME_OR_REF), 0);
    }

    #[test]
    fn delete_nothing_when_disabled() {
        let mut graph = town();

        assert_eq!(delete_road(&mut graph, "Main St", MatchPolicy::default()), 0);
        assert_eq!(graph, town());
    }

    #[test]
    fn delete_unknown_road() {
        let graph = town();
        let edited = delete_road_copy(&graph, "Nowhere Lane", MatchPolicy::NAME_OR_REF);

        assert_eq!(edited, graph);
    }

    #[test]
    fn delete_copy_leaves_input() {
        let graph = town();
        let edited = delete_road_copy(&graph, "Elm St", MatchPolicy::NAME);

        assert_eq!(graph, town());
        assert_eq!(edited.edge_count(), graph.edge_count() - 1);
        assert_eq!(edited.node_count(), graph.node_count());
    }

    #[test]
    fn find() {
        let graph = town();

        let found: Vec<String> = find_roads(&graph, "Main").into_iter().collect();
        assert_eq!(found, vec!["Main St", "Main Street"]);

        let found: Vec<String> = find_roads(&graph, "Elm").into_iter().collect();
        assert_eq!(found, vec!["Elm St"]);

        assert!(find_roads(&graph, "B27").is_empty());
    }

    #[test]
    fn all() {
        let roads: Vec<String> = all_roads(&town()).into_iter().collect();

        assert_eq!(roads, vec!["Elm St", "Main St", "Main Street", "Ring Road"]);
    }

    #[quickcheck]
    fn delete_copy_never_mutates(names: Vec<(u8, u8, bool)>, target: bool) -> bool {
        let mut graph = Graph::undirected();
        for (u, v, main) in names {
            let name = if main { "Main St" } else { "Elm St" };
            graph.add_edge(u, v, named(name.into()));
        }
        let road = if target { "Main St" } else { "Elm St" };

        let before = graph.clone();
        let edited = delete_road_copy(&graph, road, MatchPolicy::NAME);

        let expected = graph
            .edges()
            .filter(|(_, attrs)| attrs[NAME].as_text() != Some(road))
            .count();

        graph == before && edited.edge_count() == expected
    }
}
