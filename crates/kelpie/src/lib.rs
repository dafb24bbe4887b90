#![forbid(unsafe_code)]

//! Headless compound force-directed graph layout algorithms.
//!
//! `kelpie` computes 2D positions for graph vertices given topology and
//! per-vertex sizes. The centerpiece is a force-directed placement for
//! compound (nested) graphs; circular and random layouts, a gap-aware
//! overlap removal engine and layout quality metrics round out the crate.
//! Every algorithm shares one lifecycle: a small state machine with
//! cooperative cancellation and synchronous progress events.

pub mod circular;
pub mod compound;
pub mod error;
pub mod geometry;
pub mod graph;
pub mod lifecycle;
pub mod metrics;
pub mod overlap;
pub mod parameters;
pub mod random;
pub mod registry;
pub mod rng;
pub mod routing;

pub use circular::{CircularLayout, CircularLayoutParameters};
pub use compound::{CompoundFdpLayout, CompoundFdpParameters, CompoundVertexInnerLayoutType};
pub use error::{Error, Result};
pub use geometry::{Point, Rect, Size};
pub use graph::{CompoundGraph, Edge, VertexId};
pub use lifecycle::{
    AbortHandle, AlgorithmState, Control, LayoutAlgorithm, LayoutEvent, Lifecycle,
};
pub use metrics::LayoutMetrics;
pub use overlap::{
    OverlapItem, OverlapRemovalParameters, OverlapResolver, ScanResolver, remove_overlaps,
    remove_overlaps_with,
};
pub use parameters::LayoutParameters;
pub use random::{RandomLayout, RandomLayoutParameters, RandomVertexType};
pub use registry::LayoutRegistry;
pub use routing::{EdgeRoutingAlgorithmFactory, StandardEdgeRoutingFactory};

use rustc_hash::FxHashMap;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Final vertex center positions; may be pre-seeded by the caller.
pub type VertexPositions = FxHashMap<VertexId, Point>;

/// Caller-owned vertex sizes, read-only for the algorithms.
pub type VertexSizes = FxHashMap<VertexId, Size>;

/// Bend points per edge id; an absent or empty route means a straight line
/// between the clipped endpoints.
pub type EdgeRoutes = FxHashMap<String, Vec<Point>>;

/// Space each compound vertex reserves for its laid-out children.
pub type InnerCanvasSizes = FxHashMap<VertexId, Size>;

pub(crate) fn vertex_size(sizes: &VertexSizes, id: &str) -> Result<Size> {
    match sizes.get(id) {
        Some(size) if size.is_finite() && size.width >= 0.0 && size.height >= 0.0 => Ok(*size),
        Some(_) => Err(Error::NonFiniteInput {
            owner: id.to_string(),
        }),
        None => Err(Error::MissingVertexSize {
            vertex: id.to_string(),
        }),
    }
}
