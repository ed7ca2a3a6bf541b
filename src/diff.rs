//! Signed differences between two centrality-annotated graphs.

use std::{collections::BTreeSet, fmt::Debug};

use tracing::debug;

use crate::{
    attr::{AttrValue, Attributes, CENTRALITY},
    edge::EdgeKey,
    graph::Graph,
};

/// Returns a graph holding, for every element of `a`, its centrality in `a` minus its centrality
/// in `b`.
///
/// The result starts as a copy of `a`. An element gets a difference only if it exists in both
/// graphs (edges are matched by their full key, parallel index included) with a numeric
/// `centrality` on both sides. Then:
///
/// - edges without a difference are removed,
/// - nodes without a difference are kept but lose their `centrality` attribute, so that removing
///   a road never removes the intersections whose own difference is known.
///
/// Pass the graphs as `(after, before)`: a positive value means the element gained importance,
/// a negative one that it lost some. Every other attribute is inherited from `a` unchanged.
///
/// # Examples
///
/// ```
/// use arterial::attr::{AttrValue, Attributes};
/// use arterial::diff::difference;
/// use arterial::graph::Graph;
///
/// let scored = |c: f64| Attributes::from([("centrality".to_owned(), AttrValue::Number(c))]);
///
/// let mut after = Graph::undirected();
/// let kept = after.add_edge("a", "b", scored(5.0));
///
/// let mut before = Graph::undirected();
/// before.add_edge("a", "b", scored(3.0));
///
/// let delta = difference(&after, &before);
/// assert_eq!(delta.edge_attr(&kept, "centrality"), Some(&AttrValue::Number(2.0)));
/// ```
pub fn difference<N>(a: &Graph<N>, b: &Graph<N>) -> Graph<N>
where
    N: Clone + Ord + Debug,
{
    let mut delta = a.clone();

    let mut paired_edges: BTreeSet<EdgeKey<N>> = BTreeSet::new();
    for (edge, attrs) in delta.edges_mut() {
        let diff = centrality(Some(&*attrs))
            .zip(centrality(b.edge(edge)))
            .map(|(ca, cb)| ca - cb);

        if let Some(diff) = diff {
            attrs.insert(CENTRALITY.to_owned(), AttrValue::Number(diff));
            paired_edges.insert(edge.clone());
        }
    }

    let mut unpaired_nodes = 0;
    for (id, attrs) in delta.nodes_mut() {
        let diff = centrality(Some(&*attrs))
            .zip(centrality(b.node(id)))
            .map(|(ca, cb)| ca - cb);

        match diff {
            Some(diff) => {
                attrs.insert(CENTRALITY.to_owned(), AttrValue::Number(diff));
            }
            None => {
                unpaired_nodes += attrs.remove(CENTRALITY).is_some() as usize;
            }
        }
    }

    let dropped = delta.retain_edges(|edge, _| paired_edges.contains(edge));
    debug!(
        edges = delta.edge_count(),
        dropped, unpaired_nodes, "computed centrality difference"
    );

    delta
}

fn centrality(attrs: Option<&Attributes>) -> Option<f64> {
    attrs
        .and_then(|attrs| attrs.get(CENTRALITY))
        .and_then(AttrValue::as_number)
}

#[cfg(test)]
mod tests {
    use quickcheck_macros::quickcheck;

    use super::*;
    use crate::attr::NAME;

    fn scored(c: f64) -> Attributes {
        Attributes::from([(CENTRALITY.to_owned(), AttrValue::Number(c))])
    }

    fn score_nodes(graph: &mut Graph<&'static str>, scores: &[(&'static str, f64)]) {
        for &(id, c) in scores {
            graph
                .add_node(id)
                .insert(CENTRALITY.to_owned(), AttrValue::Number(c));
        }
    }

    #[test]
    fn edge_difference() {
        let mut a = Graph::undirected();
        let edge = a.add_edge("u", "v", scored(5.0));
        let mut b = Graph::undirected();
        b.add_edge("u", "v", scored(3.0));

        let delta = difference(&a, &b);

        assert_eq!(delta.edge_attr(&edge, CENTRALITY), Some(&AttrValue::Number(2.0)));
    }

    #[test]
    fn negative_difference_survives() {
        let mut a = Graph::undirected();
        let edge = a.add_edge("u", "v", scored(1.0));
        let mut b = Graph::undirected();
        b.add_edge("u", "v", scored(4.0));

        let delta = difference(&a, &b);

        assert_eq!(delta.edge_attr(&edge, CENTRALITY), Some(&AttrValue::Number(-3.0)));
    }

    #[test]
    fn unpaired_edges_are_dropped() {
        let mut a = Graph::undirected();
        let shared = a.add_edge("u", "v", scored(2.0));
        let only_a = a.add_edge("v", "w", scored(2.0));
        let unscored = a.add_edge("w", "x", Attributes::new());
        let unscored_in_b = a.add_edge("x", "y", scored(1.0));

        let mut b = Graph::undirected();
        b.add_edge("u", "v", scored(2.0));
        b.add_edge("w", "x", scored(2.0));
        b.add_edge("x", "y", Attributes::new());

        let delta = difference(&a, &b);

        assert_eq!(delta.edge_attr(&shared, CENTRALITY), Some(&AttrValue::Number(0.0)));
        assert!(!delta.contains_edge(&only_a));
        assert!(!delta.contains_edge(&unscored));
        assert!(!delta.contains_edge(&unscored_in_b));
        assert_eq!(delta.edge_count(), 1);
    }

    #[test]
    fn parallel_edges_match_by_key() {
        let mut a = Graph::undirected();
        let first = a.add_edge("u", "v", scored(5.0));
        let second = a.add_edge("u", "v", scored(7.0));

        let mut b = Graph::undirected();
        b.add_edge("u", "v", scored(1.0));

        let delta = difference(&a, &b);

        assert_eq!(delta.edge_attr(&first, CENTRALITY), Some(&AttrValue::Number(4.0)));
        assert!(!delta.contains_edge(&second));
    }

    #[test]
    fn node_differences() {
        let mut a = Graph::undirected();
        a.add_edge("u", "v", scored(1.0));
        score_nodes(&mut a, &[("u", 0.5), ("v", 0.25), ("w", 1.0)]);

        let mut b = Graph::undirected();
        b.add_edge("u", "v", scored(1.0));
        score_nodes(&mut b, &[("u", 0.25), ("v", 0.5)]);

        let delta = difference(&a, &b);

        assert_eq!(delta.node_attr(&"u", CENTRALITY), Some(&AttrValue::Number(0.25)));
        assert_eq!(delta.node_attr(&"v", CENTRALITY), Some(&AttrValue::Number(-0.25)));

        // Unpaired nodes stay, without a score.
        assert!(delta.contains_node(&"w"));
        assert_eq!(delta.node_attr(&"w", CENTRALITY), None);
    }

    #[test]
    fn other_attributes_come_from_a() {
        let mut attrs = scored(3.0);
        attrs.insert(NAME.to_owned(), "Main St".into());

        let mut a = Graph::undirected();
        let edge = a.add_edge("u", "v", attrs);

        let mut b = Graph::undirected();
        let mut renamed = scored(1.0);
        renamed.insert(NAME.to_owned(), "High St".into());
        b.add_edge("u", "v", renamed);

        let delta = difference(&a, &b);

        assert_eq!(delta.edge_attr(&edge, NAME), Some(&AttrValue::from("Main St")));
    }

    #[test]
    fn inputs_are_untouched() {
        let mut a = Graph::undirected();
        a.add_edge("u", "v", scored(3.0));
        a.add_edge("v", "w", scored(3.0));
        let b = Graph::undirected();

        let (a_before, b_before) = (a.clone(), b.clone());
        let delta = difference(&a, &b);

        assert_eq!(a, a_before);
        assert_eq!(b, b_before);
        assert_eq!(delta.edge_count(), 0);
        assert_eq!(delta.node_count(), a.node_count());
    }

    #[quickcheck]
    fn self_difference_is_zero(scores: Vec<(u8, u8, u16)>) -> bool {
        let mut graph = Graph::directed();
        for (u, v, c) in scores {
            graph.add_edge(u, v, scored(f64::from(c)));
        }

        let delta = difference(&graph, &graph);

        delta.edge_count() == graph.edge_count()
            && delta
                .edges()
                .all(|(_, attrs)| attrs[CENTRALITY] == AttrValue::Number(0.0))
    }
}
