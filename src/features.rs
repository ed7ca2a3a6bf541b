//! Derivation of travel-time weights from raw street attributes.

use std::fmt::Debug;

use tracing::{debug, warn};

use crate::{
    attr::{AttrValue, LENGTH, MAXSPEED, TRAVEL_TIME},
    edge::EdgeKey,
    error::FeatureError,
    graph::Graph,
};

/// Speed limit assumed for edges that don't carry one.
pub const DEFAULT_MAXSPEED: f64 = 50.0;

/// Normalizes the speed limit of every edge to a single number and derives its travel time.
///
/// Travel time is `length / maxspeed`, a relative proxy rather than a physical duration since the
/// units of the two attributes aren't reconciled. The rules for `maxspeed`:
///
/// - absent, an empty list or a mapping without any numeric value: [`DEFAULT_MAXSPEED`],
/// - a list: its minimum, the slowest limit tagged on the road dominates,
/// - a mapping (limits keyed by direction or vehicle): the minimum of its numeric values,
/// - text: parsed as a floating point number.
///
/// The normalized limit is written back so the call is idempotent. Edges are updated in order
/// and the first failure is returned, leaving the edges visited before it updated.
///
/// # Examples
///
/// ```
/// use arterial::attr::{AttrValue, Attributes};
/// use arterial::features::engineer_features;
/// use arterial::graph::Graph;
///
/// let mut graph = Graph::undirected();
/// let attrs = Attributes::from([
///     ("length".to_owned(), AttrValue::Number(100.0)),
///     ("maxspeed".to_owned(), AttrValue::from(vec![40.0, 60.0])),
/// ]);
/// let edge = graph.add_edge("a", "b", attrs);
///
/// engineer_features(&mut graph).unwrap();
///
/// assert_eq!(graph.edge_attr(&edge, "travel_time"), Some(&AttrValue::Number(2.5)));
/// ```
pub fn engineer_features<N>(graph: &mut Graph<N>) -> Result<(), FeatureError>
where
    N: Clone + Ord + Debug,
{
    let mut defaulted = 0;

    for (edge, attrs) in graph.edges_mut() {
        let speed = match attrs.get(MAXSPEED) {
            Some(value) => normalize_speed(edge, value)?,
            None => None,
        };
        let speed = speed.unwrap_or_else(|| {
            defaulted += 1;
            DEFAULT_MAXSPEED
        });

        if !(speed.is_finite() && speed > 0.0) {
            return Err(FeatureError::InvalidSpeed {
                edge: edge.to_string(),
                speed,
            });
        }

        let length = match attrs.get(LENGTH) {
            Some(value) => number(edge, LENGTH, value)?,
            None => return Err(FeatureError::MissingLength(edge.to_string())),
        };

        attrs.insert(MAXSPEED.to_owned(), AttrValue::Number(speed));
        attrs.insert(TRAVEL_TIME.to_owned(), AttrValue::Number(length / speed));
    }

    debug!(
        edges = graph.edge_count(),
        defaulted, "derived travel times"
    );

    Ok(())
}

/// Reduces a speed limit to a single number, `None` means the default applies.
fn normalize_speed<N: Debug>(
    edge: &EdgeKey<N>,
    value: &AttrValue,
) -> Result<Option<f64>, FeatureError> {
    let speed = match value {
        AttrValue::Number(n) => Some(*n),
        AttrValue::Text(s) => Some(parse(edge, MAXSPEED, s)?),
        AttrValue::Numbers(speeds) => speeds.iter().copied().reduce(f64::min),
        AttrValue::Texts(speeds) => speeds
            .iter()
            .map(|s| parse(edge, MAXSPEED, s))
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .reduce(f64::min),
        AttrValue::Map(speeds) => {
            let speed = speeds
                .values()
                .filter_map(|v| normalize_speed(edge, v).ok().flatten())
                .reduce(f64::min);

            warn!(%edge, ?speed, "speed limit given as a mapping, using its minimum");
            speed
        }
        AttrValue::Flag(_) => {
            return Err(FeatureError::UnsupportedValue {
                edge: edge.to_string(),
                attribute: MAXSPEED,
            })
        }
    };

    Ok(speed)
}

fn number<N: Debug>(
    edge: &EdgeKey<N>,
    attribute: &'static str,
    value: &AttrValue,
) -> Result<f64, FeatureError> {
    match value {
        AttrValue::Number(n) => Ok(*n),
        AttrValue::Text(s) => parse(edge, attribute, s),
        _ => Err(FeatureError::UnsupportedValue {
            edge: edge.to_string(),
            attribute,
        }),
    }
}

fn parse<N: Debug>(
    edge: &EdgeKey<N>,
    attribute: &'static str,
    value: &str,
) -> Result<f64, FeatureError> {
    value.trim().parse().map_err(|_| FeatureError::Parse {
        edge: edge.to_string(),
        attribute,
        value: value.to_owned(),
    })
}
