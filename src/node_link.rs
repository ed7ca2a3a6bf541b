//! Reading and writing graphs in the node-link JSON layout.
//!
//! This is the layout networkx produces with `node_link_data`, which makes it a convenient
//! exchange format with street network providers:
//!
//! ```json
//! {
//!   "directed": true,
//!   "multigraph": true,
//!   "nodes": [{"id": 1, "x": 3.4}, {"id": 2}],
//!   "links": [{"source": 1, "target": 2, "key": 0, "length": 120.5, "name": "Main St"}]
//! }
//! ```
//!
//! Every field of a node or link other than its identity becomes an attribute, `null` fields are
//! dropped. Links without a `key` get a fresh parallel index, see [`Graph::add_edge`].

use std::{
    fmt::Debug,
    io::{Read, Write},
};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    attr::{self, Attributes},
    edge::EdgeKey,
    error::{Error, Result},
    graph::Graph,
};

#[derive(Deserialize)]
#[serde(bound(deserialize = "N: Deserialize<'de>"))]
struct Document<N> {
    #[serde(default)]
    directed: bool,
    #[serde(default)]
    nodes: Vec<NodeRecord<N>>,
    #[serde(default, alias = "edges")]
    links: Vec<LinkRecord<N>>,
}

#[derive(Deserialize)]
struct NodeRecord<N> {
    id: N,
    #[serde(flatten)]
    attrs: Map<String, Value>,
}

#[derive(Deserialize)]
struct LinkRecord<N> {
    source: N,
    target: N,
    #[serde(default)]
    key: Option<usize>,
    #[serde(flatten)]
    attrs: Map<String, Value>,
}

#[derive(Serialize)]
struct DocumentRef<'a, N> {
    directed: bool,
    multigraph: bool,
    nodes: Vec<NodeRef<'a, N>>,
    links: Vec<LinkRef<'a, N>>,
}

#[derive(Serialize)]
struct NodeRef<'a, N> {
    id: &'a N,
    #[serde(flatten)]
    attrs: &'a Attributes,
}

#[derive(Serialize)]
struct LinkRef<'a, N> {
    source: &'a N,
    target: &'a N,
    key: usize,
    #[serde(flatten)]
    attrs: &'a Attributes,
}

/// Reads a graph from a node-link JSON document.
///
/// # Examples
///
/// ```
/// use arterial::attr::AttrValue;
/// use arterial::edge::EdgeKey;
/// use arterial::node_link::read_node_link;
///
/// let json = r#"{
///     "directed": false,
///     "nodes": [{"id": 1}, {"id": 2}],
///     "links": [{"source": 1, "target": 2, "length": 80, "maxspeed": ["30", "50"]}]
/// }"#;
///
/// let graph = read_node_link::<u64, _>(json.as_bytes()).unwrap();
///
/// assert_eq!(graph.edge_count(), 1);
/// assert_eq!(
///     graph.edge_attr(&EdgeKey::new(1, 2, 0), "length"),
///     Some(&AttrValue::Number(80.0))
/// );
/// ```
pub fn read_node_link<N, R>(reader: R) -> Result<Graph<N>>
where
    N: DeserializeOwned + Clone + Ord + Debug,
    R: Read,
{
    let document: Document<N> = serde_json::from_reader(reader)?;
    let mut graph = Graph::new(document.directed);

    for node in document.nodes {
        let attrs = attributes(node.attrs)?;
        graph.add_node(node.id).extend(attrs);
    }

    for link in document.links {
        let attrs = attributes(link.attrs)?;
        match link.key {
            Some(key) => {
                let edge = EdgeKey::new(link.source, link.target, key);
                if graph.contains_edge(&edge) {
                    return Err(Error::Load(format!("duplicate link {edge}")));
                }
                graph.insert_edge(edge, attrs);
            }
            None => {
                graph.add_edge(link.source, link.target, attrs);
            }
        }
    }

    Ok(graph)
}

/// Writes a graph as a node-link JSON document.
pub fn write_node_link<N, W>(graph: &Graph<N>, writer: W) -> Result<()>
where
    N: Serialize + Clone + Ord + Debug,
    W: Write,
{
    let document = DocumentRef {
        directed: graph.is_directed(),
        multigraph: true,
        nodes: graph
            .nodes()
            .map(|(id, attrs)| NodeRef { id, attrs })
            .collect(),
        links: graph
            .edges()
            .map(|(edge, attrs)| LinkRef {
                source: edge.source(),
                target: edge.target(),
                key: edge.key(),
                attrs,
            })
            .collect(),
    };

    serde_json::to_writer(writer, &document)?;

    Ok(())
}

fn attributes(fields: Map<String, Value>) -> Result<Attributes> {
    let mut attrs = Attributes::new();
    for (name, value) in fields {
        if let Some(value) = attr::from_json(value)? {
            attrs.insert(name, value);
        }
    }

    Ok(attrs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attr::AttrValue;

    const TOWN: &str = r#"{
        "directed": true,
        "multigraph": true,
        "graph": {"crs": "epsg:32633"},
        "nodes": [
            {"id": "a", "x": 1.5, "y": null},
            {"id": "b", "street_count": 3},
            {"id": "lonely"}
        ],
        "links": [
            {"source": "a", "target": "b", "key": 0, "length": 100, "name": "Main St", "oneway": true},
            {"source": "a", "target": "b", "length": 120, "maxspeed": {"forward": "50"}},
            {"source": "b", "target": "c", "ref": ["B27", "B10"]}
        ]
    }"#;

    #[test]
    fn read() {
        let graph: Graph<String> = read_node_link(TOWN.as_bytes()).unwrap();
        let (a, b, c) = ("a".to_owned(), "b".to_owned(), "c".to_owned());

        assert!(graph.is_directed());
        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.edge_count(), 3);

        assert_eq!(graph.node_attr(&a, "x"), Some(&AttrValue::Number(1.5)));
        assert_eq!(graph.node_attr(&a, "y"), None);

        let main = EdgeKey::new(a.clone(), b.clone(), 0);
        assert_eq!(graph.edge_attr(&main, "name"), Some(&AttrValue::from("Main St")));
        assert_eq!(graph.edge_attr(&main, "oneway"), Some(&AttrValue::Flag(true)));

        // The keyless link took the next parallel index.
        let second = EdgeKey::new(a, b.clone(), 1);
        assert!(matches!(
            graph.edge_attr(&second, "maxspeed"),
            Some(AttrValue::Map(_))
        ));

        // Link ends missing from the node list are created.
        assert!(graph.contains_node(&c));
        assert_eq!(
            graph.edge_attr(&EdgeKey::new(b, c, 0), "ref"),
            Some(&AttrValue::from(vec!["B27", "B10"]))
        );
    }

    #[test]
    fn write_then_read() {
        let graph: Graph<String> = read_node_link(TOWN.as_bytes()).unwrap();

        let mut buffer = Vec::new();
        write_node_link(&graph, &mut buffer).unwrap();
        let reread: Graph<String> = read_node_link(buffer.as_slice()).unwrap();

        assert_eq!(reread, graph);
    }

    #[test]
    fn undirected_by_default() {
        let json = r#"{"nodes": [], "links": [{"source": 2, "target": 1}]}"#;
        let graph: Graph<u32> = read_node_link(json.as_bytes()).unwrap();

        assert!(!graph.is_directed());
        assert!(graph.contains_edge(&EdgeKey::new(1, 2, 0)));
    }

    #[test]
    fn duplicate_link() {
        let json = r#"{"links": [
            {"source": 1, "target": 2, "key": 0},
            {"source": 2, "target": 1, "key": 0}
        ]}"#;

        assert!(matches!(
            read_node_link::<u32, _>(json.as_bytes()),
            Err(Error::Load(_))
        ));
    }

    #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
    struct OsmId(u64);

    #[test]
    fn read_ids_without_default() {
        let json = r#"{"nodes": [{"id": 7}], "links": [{"source": 7, "target": 9}]}"#;
        let graph: Graph<OsmId> = read_node_link(json.as_bytes()).unwrap();

        assert_eq!(graph.node_count(), 2);
        assert!(graph.contains_edge(&EdgeKey::new(OsmId(9), OsmId(7), 0)));
    }

    #[test]
    fn malformed() {
        assert!(matches!(
            read_node_link::<u32, _>("{\"nodes\": 3}".as_bytes()),
            Err(Error::Json(_))
        ));
    }
}
