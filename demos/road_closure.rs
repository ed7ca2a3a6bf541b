//! Closes roads in a street network and prints the streets that gain or lose the most importance.
//!
//! Usage:
//!   cargo run --example road_closure -- testdata/small_town.json --road "Main St"
//!   RUST_LOG=debug cargo run --example road_closure -- testdata/small_town.json \
//!       --road "Main St" --road "Mill Rd" --measure "random walk betweenness"
//!   cargo run --example road_closure -- testdata/small_town.json --config analysis.json

use std::{fs::File, io::BufReader, path::PathBuf};

use arterial::{
    analysis::{
        attribute_range, perform_centrality_analysis, ranked_edges, AnalysisConfig, GraphCache,
    },
    attr::{AttrValue, MAXSPEED, NAME},
    edge::EdgeKey,
    error::Result,
    graph::Graph,
    node_link::read_node_link,
    roads::all_roads,
};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Close roads in a node-link street network and compare centralities.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Node-link JSON file holding the street network
    graph: PathBuf,

    /// JSON analysis settings, the flags below override them
    #[arg(long)]
    config: Option<PathBuf>,

    /// Name of a road to close, may be repeated
    #[arg(long = "road")]
    roads: Vec<String>,

    /// Centrality measure, "betweenness" or "random walk betweenness"
    #[arg(long)]
    measure: Option<String>,

    /// Also match roads by their reference number
    #[arg(long)]
    match_ref: bool,

    /// Worker threads for the betweenness computation
    #[arg(long)]
    threads: Option<usize>,

    /// Number of streets to list on each side
    #[arg(long, default_value_t = 5)]
    top: usize,

    /// List the road names of the network and exit
    #[arg(long)]
    list_roads: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => AnalysisConfig::from_reader(BufReader::new(File::open(path)?))?,
        None => AnalysisConfig::default(),
    };
    config.place = args.graph.display().to_string();
    if !args.roads.is_empty() {
        config.roads = args.roads.clone();
    }
    if let Some(measure) = &args.measure {
        config.measure = measure.clone();
    }
    if let Some(threads) = args.threads {
        config.threads = threads;
    }
    config.match_ref |= args.match_ref;

    let mut cache = GraphCache::new();
    let graph: &Graph<u64> = cache.get_or_load(&config.place, config.tolerance, |place, _| {
        read_node_link(BufReader::new(File::open(place)?))
    })?;

    if args.list_roads {
        for road in all_roads(graph) {
            println!("{road}");
        }
        return Ok(());
    }

    if let Some((slowest, fastest)) = attribute_range(graph, MAXSPEED) {
        info!(slowest, fastest, "speed limits");
    }

    let analysis = perform_centrality_analysis(graph, &config)?;

    println!(
        "\nClosed {:?}, {} edges removed, measure: {}",
        config.roads, analysis.removed_edges, config.measure
    );

    let ranked = ranked_edges(&analysis.difference);
    println!("\nLargest gains:");
    for (edge, diff) in ranked.iter().take(args.top).filter(|(_, diff)| *diff > 0.0) {
        println!("  {:+.6}  {}  {}", diff, street_name(&analysis.difference, edge), edge);
    }

    println!("\nLargest losses:");
    for (edge, diff) in ranked.iter().rev().take(args.top).filter(|(_, diff)| *diff < 0.0) {
        println!("  {:+.6}  {}  {}", diff, street_name(&analysis.difference, edge), edge);
    }

    Ok(())
}

fn street_name(graph: &Graph<u64>, edge: &EdgeKey<u64>) -> String {
    match graph.edge_attr(edge, NAME) {
        Some(AttrValue::Text(name)) => name.clone(),
        Some(AttrValue::Texts(names)) => names.join(" / "),
        _ => "(unnamed)".to_owned(),
    }
}
