//! Arterial is a small toolkit for measuring how closing roads shifts the importance of the
//! remaining streets and intersections of a street network.
//!
//! # Basic usage
//!
//! The library is centered around the [`Graph`](graph::Graph) structure, a multigraph whose
//! nodes and edges carry named attributes. Once loaded, travel times are derived from the street
//! attributes, a road is closed on a copy of the graph and the centrality of both versions is
//! compared.
//!
//! ```rust
//! use arterial::attr::{AttrValue, Attributes};
//! use arterial::centrality::{evaluate_measure, Betweenness};
//! use arterial::diff::difference;
//! use arterial::features::engineer_features;
//! use arterial::graph::Graph;
//! use arterial::roads::{delete_road_copy, MatchPolicy};
//!
//! let street = |name: &str, length: f64| {
//!     Attributes::from([
//!         ("name".to_owned(), AttrValue::from(name)),
//!         ("length".to_owned(), AttrValue::Number(length)),
//!     ])
//! };
//!
//! // A block with a shortcut through its middle.
//! let mut graph = Graph::undirected();
//! graph.add_edge(1, 2, street("High St", 100.0));
//! graph.add_edge(2, 3, street("Mill Rd", 100.0));
//! graph.add_edge(3, 4, street("High St", 100.0));
//! graph.add_edge(4, 1, street("Mill Rd", 100.0));
//! let shortcut = graph.add_edge(1, 3, street("Cut Through", 120.0));
//!
//! // Derive travel times, they weigh the edges from now on.
//! engineer_features(&mut graph).unwrap();
//!
//! // Close the High St on a copy.
//! let mut closed = delete_road_copy(&graph, "High St", MatchPolicy::NAME);
//!
//! // Compute the betweenness of both graphs...
//! let measure = Betweenness::new();
//! evaluate_measure(&mut graph, &measure, "travel_time").unwrap();
//! evaluate_measure(&mut closed, &measure, "travel_time").unwrap();
//!
//! // ...and diff them, after minus before.
//! let delta = difference(&closed, &graph);
//!
//! // Only the roads that stayed open are compared, the shortcut took over some traffic.
//! assert_eq!(delta.edge_count(), 3);
//! let gain = delta.edge_attr(&shortcut, "centrality").and_then(AttrValue::as_number);
//! assert!(gain.unwrap() > 0.0);
//! ```

pub mod analysis;
pub mod attr;
mod betweenness;
pub mod centrality;
mod current_flow;
pub mod diff;
pub mod edge;
pub mod error;
pub mod features;
pub mod graph;
pub mod node_link;
pub mod roads;
