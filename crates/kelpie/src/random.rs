//! Random layout: scatters free vertices uniformly inside a bound rectangle,
//! keeping pre-seeded "fixed" vertices exactly where they are.

use crate::error::Result;
use crate::geometry::Point;
use crate::graph::{CompoundGraph, VertexId};
use crate::lifecycle::{LayoutAlgorithm, Lifecycle};
use crate::parameters::{LayoutParameters, ensure_finite, ensure_non_negative, near_eq};
use crate::rng::XorShift64Star;
use crate::{VertexPositions, VertexSizes};
use rustc_hash::FxHashMap;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RandomVertexType {
    /// Receives a fresh random position inside the bound.
    #[default]
    Free,
    /// Keeps its pre-seeded position verbatim.
    Fixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RandomLayoutParameters {
    pub x_offset: f64,
    pub y_offset: f64,
    pub width: f64,
    pub height: f64,
    /// Seed for the position generator; the same seed reproduces the same
    /// layout.
    pub seed: u64,
}

impl Default for RandomLayoutParameters {
    fn default() -> Self {
        Self {
            x_offset: 0.0,
            y_offset: 0.0,
            width: 300.0,
            height: 300.0,
            seed: 1,
        }
    }
}

impl LayoutParameters for RandomLayoutParameters {
    fn validate(&self) -> Result<()> {
        ensure_finite("x_offset", self.x_offset)?;
        ensure_finite("y_offset", self.y_offset)?;
        ensure_non_negative("width", self.width)?;
        ensure_non_negative("height", self.height)?;
        Ok(())
    }

    fn changed_fields(&self, other: &Self) -> Vec<&'static str> {
        let mut changed = Vec::new();
        if !near_eq(self.x_offset, other.x_offset) {
            changed.push("x_offset");
        }
        if !near_eq(self.y_offset, other.y_offset) {
            changed.push("y_offset");
        }
        if !near_eq(self.width, other.width) {
            changed.push("width");
        }
        if !near_eq(self.height, other.height) {
            changed.push("height");
        }
        if self.seed != other.seed {
            changed.push("seed");
        }
        changed
    }
}

pub struct RandomLayout<'a> {
    graph: &'a CompoundGraph,
    sizes: &'a VertexSizes,
    seed_positions: &'a VertexPositions,
    vertex_types: FxHashMap<VertexId, RandomVertexType>,
    parameters: RandomLayoutParameters,
    lifecycle: Lifecycle,
    positions: VertexPositions,
}

impl<'a> RandomLayout<'a> {
    pub fn new(
        graph: &'a CompoundGraph,
        sizes: &'a VertexSizes,
        seed_positions: &'a VertexPositions,
        parameters: RandomLayoutParameters,
    ) -> Self {
        Self {
            graph,
            sizes,
            seed_positions,
            vertex_types: FxHashMap::default(),
            parameters,
            lifecycle: Lifecycle::new(),
            positions: VertexPositions::default(),
        }
    }

    /// Marks a vertex fixed or free; unmentioned vertices are free.
    pub fn set_vertex_type(&mut self, id: impl Into<VertexId>, kind: RandomVertexType) {
        self.vertex_types.insert(id.into(), kind);
    }

    pub fn positions(&self) -> &VertexPositions {
        &self.positions
    }

    pub fn into_positions(self) -> VertexPositions {
        self.positions
    }
}

impl LayoutAlgorithm for RandomLayout<'_> {
    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    fn lifecycle_mut(&mut self) -> &mut Lifecycle {
        &mut self.lifecycle
    }

    fn initialize(&mut self) -> Result<()> {
        self.parameters.validate()?;
        self.graph.validate()?;
        self.positions.clear();
        Ok(())
    }

    fn internal_compute(&mut self) -> Result<()> {
        let p = self.parameters;
        let mut rng = XorShift64Star::new(p.seed);

        for id in self.graph.vertex_ids() {
            let fixed = self.vertex_types.get(id).copied().unwrap_or_default()
                == RandomVertexType::Fixed;
            if fixed {
                if let Some(&seeded) = self.seed_positions.get(id) {
                    self.positions.insert(id.clone(), seeded);
                    continue;
                }
            }

            // Shrink the bound by the vertex's own half extents so the whole
            // box lands inside; a bound narrower than the vertex collapses
            // to its midline.
            let size = crate::vertex_size(self.sizes, id)?;
            let (half_w, half_h) = (size.width / 2.0, size.height / 2.0);
            let x = if p.width > size.width {
                rng.next_range(p.x_offset + half_w, p.x_offset + p.width - half_w)
            } else {
                p.x_offset + p.width / 2.0
            };
            let y = if p.height > size.height {
                rng.next_range(p.y_offset + half_h, p.y_offset + p.height - half_h)
            } else {
                p.y_offset + p.height / 2.0
            };
            self.positions.insert(id.clone(), Point::new(x, y));
        }

        self.lifecycle
            .report_iteration(1, 100.0, "scattered", &self.positions);
        Ok(())
    }
}
