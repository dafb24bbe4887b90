//! Edge routing contract.
//!
//! Routing algorithms compute bend points for edges after a layout has
//! produced positions. The standard factory ships with an empty registry:
//! it is the extension point concrete routers plug into, and an absent route
//! means "draw a straight line between the clipped endpoints".

use crate::error::{Error, Result};
use crate::geometry::{Point, Rect};
use crate::graph::CompoundGraph;
use crate::lifecycle::LayoutAlgorithm;
use crate::parameters::LayoutParameters;
use crate::{EdgeRoutes, VertexPositions, VertexSizes};
use indexmap::IndexSet;
use serde::Serialize;

/// Everything a routing algorithm sees: the laid-out graph.
#[derive(Debug, Clone, Copy)]
pub struct RoutingContext<'a> {
    pub graph: &'a CompoundGraph,
    pub positions: &'a VertexPositions,
    pub sizes: &'a VertexSizes,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct EdgeRoutingParameters {}

impl LayoutParameters for EdgeRoutingParameters {
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    fn changed_fields(&self, _other: &Self) -> Vec<&'static str> {
        Vec::new()
    }
}

/// A routing algorithm is a layout algorithm whose result is an edge → bend
/// point map.
pub trait EdgeRoutingAlgorithm: LayoutAlgorithm {
    fn routes(&self) -> &EdgeRoutes;
}

pub trait EdgeRoutingAlgorithmFactory {
    /// Names of the algorithm types this factory can create.
    fn algorithm_types(&self) -> Vec<String>;

    fn is_valid_algorithm(&self, name: &str) -> bool {
        self.algorithm_types().iter().any(|t| t == name)
    }

    /// Creates an algorithm instance bound to the given context, or fails
    /// with [`Error::UnknownAlgorithmType`].
    fn create_algorithm<'a>(
        &self,
        name: &str,
        context: RoutingContext<'a>,
        parameters: &EdgeRoutingParameters,
    ) -> Result<Box<dyn EdgeRoutingAlgorithm + 'a>>;

    /// Recovers the type name an instance was created under.
    fn algorithm_type(&self, algorithm: &dyn EdgeRoutingAlgorithm) -> Option<String>;
}

/// The standard factory supports no algorithm types. This is deliberate: the
/// registry is the place concrete routers get added, and until then every
/// edge is drawn as a straight line.
#[derive(Debug, Default)]
pub struct StandardEdgeRoutingFactory {
    types: IndexSet<String>,
}

impl StandardEdgeRoutingFactory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EdgeRoutingAlgorithmFactory for StandardEdgeRoutingFactory {
    fn algorithm_types(&self) -> Vec<String> {
        self.types.iter().cloned().collect()
    }

    fn create_algorithm<'a>(
        &self,
        name: &str,
        _context: RoutingContext<'a>,
        _parameters: &EdgeRoutingParameters,
    ) -> Result<Box<dyn EdgeRoutingAlgorithm + 'a>> {
        Err(Error::UnknownAlgorithmType {
            name: name.to_string(),
        })
    }

    fn algorithm_type(&self, _algorithm: &dyn EdgeRoutingAlgorithm) -> Option<String> {
        None
    }
}

/// The bend points of a straight-line edge: none. Kept as a function so the
/// "absent route means straight line" convention has a single home.
pub fn straight_line_route() -> Vec<Point> {
    Vec::new()
}

/// The clipped endpoints a straight-line edge is drawn between.
pub fn clipped_endpoints(source: &Rect, target: &Rect) -> (Point, Point) {
    (
        source.clip_point_towards(target.center),
        target.clip_point_towards(source.center),
    )
}
